use std::collections::BTreeSet;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use similar::{ChangeTag, TextDiff};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::{debug, info, warn};

use crate::dialect::Dialect;
use crate::error::{GosqlfmtError, Result};
use crate::mode::{Mode, Output};
use crate::report::{FileResult, Report};
use crate::rewriter::{self, Options, Rewrite};
use crate::scanner;

/// Directories never descended into when walking a tree.
const SKIPPED_DIRS: &[&str] = &["vendor", ".git", "testdata"];

/// Format the SQL literals of one Go source text according to the given mode.
/// This is the core API function.
pub fn format_source(source: &str, mode: &Mode) -> Result<String> {
    let dialect = mode.dialect()?;
    Ok(rewrite(source, mode, dialect.as_ref())?.source)
}

fn rewrite(source: &str, mode: &Mode, dialect: &dyn Dialect) -> Result<Rewrite> {
    let literals = scanner::find_raw_strings(source)?;
    Ok(rewriter::rewrite_source(
        source,
        &literals,
        &Options {
            indent: mode.indent,
            newline: mode.newline,
            dialect,
        },
    ))
}

/// Read Go source from `input` and write the formatted source to `output`.
pub fn format_reader<R: Read, W: Write>(mut input: R, mut output: W, mode: &Mode) -> Result<()> {
    let mut source = String::new();
    input.read_to_string(&mut source)?;
    let formatted = format_source(&source, mode)?;
    output.write_all(formatted.as_bytes())?;
    output.flush()?;
    Ok(())
}

/// Something to print once all files are processed, so that output from
/// parallel workers comes out in path order.
enum Emit {
    Source(String),
    Diff {
        path: PathBuf,
        original: String,
        formatted: String,
    },
}

struct Outcome {
    result: FileResult,
    emit: Option<Emit>,
}

impl From<FileResult> for Outcome {
    fn from(result: FileResult) -> Self {
        Self { result, emit: None }
    }
}

/// Run the formatter on every Go file the patterns resolve to.
pub fn run(patterns: &[String], mode: &Mode) -> Result<Report> {
    let dialect = mode.dialect()?;
    let paths = get_matching_paths(patterns, mode)?;
    debug!(files = paths.len(), "resolved patterns");

    let progress = progress_bar(paths.len(), mode);
    let process = |path: &PathBuf| -> Outcome {
        let outcome = process_file(path, mode, dialect.as_ref());
        progress.inc(1);
        outcome
    };

    let outcomes: Vec<Outcome> = if mode.single_process || paths.len() <= 1 {
        paths.iter().map(&process).collect()
    } else {
        // 0 lets rayon use all available cores
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(mode.threads)
            .build()
            .map_err(|e| GosqlfmtError::Config(format!("Failed to build thread pool: {}", e)))?;
        pool.install(|| paths.par_iter().map(&process).collect())
    };
    progress.finish_and_clear();

    let mut report = Report::new();
    for outcome in outcomes {
        if let Some(emit) = outcome.emit {
            if let Err(e) = print_emit(emit, mode) {
                warn!(error = %e, "failed to write output");
            }
        }
        report.add(outcome.result);
    }
    Ok(report)
}

/// Process a single file.
fn process_file(path: &Path, mode: &Mode, dialect: &dyn Dialect) -> Outcome {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "read failed");
            return FileResult::error(path.to_path_buf(), format!("Read error: {}", e)).into();
        }
    };

    let rewrite = match rewrite(&source, mode, dialect) {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "scan failed");
            return FileResult::error(path.to_path_buf(), e.to_string()).into();
        }
    };

    let output = mode.output();
    if rewrite.rewritten == 0 {
        debug!(path = %path.display(), "unchanged");
        return Outcome {
            result: FileResult::unchanged(path.to_path_buf()),
            emit: (output == Output::Stdout).then_some(Emit::Source(rewrite.source)),
        };
    }

    let changed = FileResult::changed(path.to_path_buf(), rewrite.rewritten);
    match output {
        Output::Write => match std::fs::write(path, &rewrite.source) {
            Ok(()) => {
                info!(path = %path.display(), literals = rewrite.rewritten, "reformatted");
                changed.into()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "write failed");
                FileResult::error(path.to_path_buf(), format!("Write error: {}", e)).into()
            }
        },
        Output::Check => changed.into(),
        Output::Diff => Outcome {
            result: changed,
            emit: Some(Emit::Diff {
                path: path.to_path_buf(),
                original: source,
                formatted: rewrite.source,
            }),
        },
        Output::Stdout => Outcome {
            result: changed,
            emit: Some(Emit::Source(rewrite.source)),
        },
    }
}

fn print_emit(emit: Emit, mode: &Mode) -> io::Result<()> {
    match emit {
        Emit::Source(source) => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(source.as_bytes())?;
            lock.flush()
        }
        Emit::Diff {
            path,
            original,
            formatted,
        } => print_diff(&path, &original, &formatted, color_choice(mode)),
    }
}

fn color_choice(mode: &Mode) -> ColorChoice {
    if !mode.color() {
        ColorChoice::Never
    } else if mode.force_color {
        ColorChoice::Always
    } else {
        ColorChoice::Auto
    }
}

/// Print a diff between original and formatted content.
fn print_diff(path: &Path, original: &str, formatted: &str, choice: ColorChoice) -> io::Result<()> {
    let stderr = StandardStream::stderr(choice);
    let mut out = stderr.lock();

    writeln!(out, "--- {}", path.display())?;
    writeln!(out, "+++ {}", path.display())?;

    let diff = TextDiff::from_lines(original, formatted);
    for change in diff.iter_all_changes() {
        let (sign, color) = match change.tag() {
            ChangeTag::Delete => ("-", Some(Color::Red)),
            ChangeTag::Insert => ("+", Some(Color::Green)),
            ChangeTag::Equal => (" ", None),
        };
        out.set_color(ColorSpec::new().set_fg(color))?;
        write!(out, "{}{}", sign, change)?;
        if change.missing_newline() {
            writeln!(out)?;
        }
    }
    out.reset()
}

fn progress_bar(len: usize, mode: &Mode) -> ProgressBar {
    if len < 2 || !mode.show_progress() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}") {
        bar.set_style(style);
    }
    bar
}

/// Resolve patterns into the sorted, de-duplicated list of Go files to
/// process. `dir/...` and directory arguments are walked recursively;
/// anything else is expanded as a glob.
pub fn get_matching_paths(patterns: &[String], mode: &Mode) -> Result<Vec<PathBuf>> {
    let extensions = mode.source_extensions();
    let exclude = build_exclude(&mode.exclude)?;
    let mut result = BTreeSet::new();

    for pattern in patterns {
        let before = result.len();

        let recursive = if pattern == "..." {
            Some("")
        } else {
            pattern.strip_suffix("/...")
        };

        if let Some(dir) = recursive {
            let dir = if dir.is_empty() { "." } else { dir };
            collect_source_files(Path::new(dir), extensions, &exclude, &mut result);
        } else if Path::new(pattern).is_dir() {
            collect_source_files(Path::new(pattern), extensions, &exclude, &mut result);
        } else {
            let entries = glob::glob(pattern)
                .map_err(|e| GosqlfmtError::Pattern(format!("{}: {}", pattern, e)))?;
            for path in entries.flatten() {
                if path.is_file()
                    && is_source_file(&path, extensions)
                    && !is_excluded(&path, &exclude)
                {
                    result.insert(path);
                }
            }
        }

        if result.len() == before {
            warn!(pattern = %pattern, "no Go files matched");
        }
    }

    Ok(result.into_iter().collect())
}

fn build_exclude(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| GosqlfmtError::Pattern(format!("{}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| GosqlfmtError::Pattern(e.to_string()))
}

/// Excluded when either the file name or the whole path matches.
fn is_excluded(path: &Path, exclude: &GlobSet) -> bool {
    if exclude.is_empty() {
        return false;
    }
    path.file_name().is_some_and(|name| exclude.is_match(name)) || exclude.is_match(path)
}

/// Check if a file has a Go source extension.
fn is_source_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

/// Recursively collect Go files from a directory.
fn collect_source_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &GlobSet,
    result: &mut BTreeSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_excluded(&path, exclude) {
            continue;
        }

        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if !skipped {
                collect_source_files(&path, extensions, exclude, result);
            }
        } else if is_source_file(&path, extensions) {
            result.insert(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package main\n").unwrap();
    }

    fn pattern(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_format_source() {
        let mode = Mode::default();
        let out = format_source("package main\n\nvar q = `select id from users`\n", &mode).unwrap();
        assert_eq!(
            out,
            "package main\n\nvar q = `\nSELECT\n  id\nFROM\n  users\n`\n"
        );
    }

    #[test]
    fn test_format_source_scan_error() {
        let mode = Mode::default();
        assert!(matches!(
            format_source("var q = `select", &mode),
            Err(GosqlfmtError::Scan { .. })
        ));
    }

    #[test]
    fn test_format_reader() {
        let mode = Mode {
            newline: false,
            ..Mode::default()
        };
        let mut out = Vec::new();
        format_reader("x := `delete from t`\n".as_bytes(), &mut out, &mode).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x := `DELETE FROM\n  t`\n");
    }

    #[test]
    fn test_is_source_file() {
        let extensions = &["go"];
        assert!(is_source_file(Path::new("main.go"), extensions));
        assert!(is_source_file(Path::new("a/b/repo_test.go"), extensions));
        assert!(!is_source_file(Path::new("algo"), extensions));
        assert!(!is_source_file(Path::new("main.sql"), extensions));
    }

    #[test]
    fn test_recursive_pattern_skips_vendor_git_testdata() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("main.go"));
        touch(&root.join("pkg/db/query.go"));
        touch(&root.join("pkg/db/notes.txt"));
        touch(&root.join("vendor/lib/lib.go"));
        touch(&root.join(".git/hooks/x.go"));
        touch(&root.join("testdata/input.go"));

        let paths =
            get_matching_paths(&[format!("{}/...", root.display())], &Mode::default()).unwrap();
        assert_eq!(
            paths,
            vec![root.join("main.go"), root.join("pkg/db/query.go")]
        );
    }

    #[test]
    fn test_directory_and_glob_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.go"));
        touch(&root.join("b.go"));
        touch(&root.join("c.txt"));
        touch(&root.join("sub/d.go"));

        let by_dir = get_matching_paths(&[pattern(root)], &Mode::default()).unwrap();
        assert_eq!(by_dir.len(), 3);

        let by_glob =
            get_matching_paths(&[pattern(&root.join("*"))], &Mode::default()).unwrap();
        assert_eq!(by_glob, vec![root.join("a.go"), root.join("b.go")]);
    }

    #[test]
    fn test_duplicates_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.go"));
        let file = pattern(&dir.path().join("a.go"));
        let paths = get_matching_paths(&[file.clone(), file], &Mode::default()).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_exclude_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("model.go"));
        touch(&root.join("model_gen.go"));
        touch(&root.join("mocks/mock.go"));

        let mode = Mode {
            exclude: vec!["*_gen.go".to_string(), "mocks".to_string()],
            ..Mode::default()
        };
        let paths = get_matching_paths(&[pattern(root)], &mode).unwrap();
        assert_eq!(paths, vec![root.join("model.go")]);
    }

    #[test]
    fn test_invalid_exclude_is_pattern_error() {
        let mode = Mode {
            exclude: vec!["[".to_string()],
            ..Mode::default()
        };
        assert!(matches!(
            get_matching_paths(&[".".to_string()], &mode),
            Err(GosqlfmtError::Pattern(_))
        ));
    }

    #[test]
    fn test_run_write_and_check() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("q.go");
        fs::write(&file, "package q\n\nvar q = `select 1 from t`\n").unwrap();

        let check = Mode {
            check: true,
            no_progressbar: true,
            ..Mode::default()
        };
        let report = run(&[pattern(dir.path())], &check).unwrap();
        assert_eq!(report.changed(), 1);
        assert!(fs::read_to_string(&file).unwrap().contains("select 1 from t"));

        let write = Mode {
            write: true,
            no_progressbar: true,
            ..Mode::default()
        };
        let report = run(&[pattern(dir.path())], &write).unwrap();
        assert_eq!(report.changed(), 1);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "package q\n\nvar q = `\nSELECT\n  1\nFROM\n  t\n`\n"
        );

        let report = run(&[pattern(dir.path())], &write).unwrap();
        assert_eq!(report.unchanged(), 1);
    }

    #[test]
    fn test_run_reports_scan_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.go"), "var q = `open").unwrap();
        fs::write(dir.path().join("good.go"), "var q = `select 1`").unwrap();

        let mode = Mode {
            check: true,
            single_process: true,
            ..Mode::default()
        };
        let report = run(&[pattern(dir.path())], &mode).unwrap();
        assert_eq!(report.errors(), 1);
        assert_eq!(report.changed(), 1);
    }
}
