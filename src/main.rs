use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gosqlfmt::mode::Mode;
use gosqlfmt::report::{FileStatus, Report};

/// gosqlfmt - Formats SQL embedded in Go raw string literals.
#[derive(Parser, Debug)]
#[command(name = "gosqlfmt", version, about)]
struct Cli {
    /// Files, directories, globs or `dir/...` patterns. Reads stdin when empty.
    patterns: Vec<String>,

    /// Overwrite files in place.
    #[arg(short = 'w', long)]
    write: bool,

    /// Spaces per SQL nesting level [default: 2].
    #[arg(long)]
    indent: Option<usize>,

    /// Put formatted SQL on lines of its own inside the backticks [default: true].
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    newline: Option<bool>,

    /// Check formatting without writing changes.
    #[arg(long)]
    check: bool,

    /// Show formatting diff.
    #[arg(long)]
    diff: bool,

    /// SQL dialect: mysql, generic [default: mysql].
    #[arg(short = 'd', long)]
    dialect: Option<String>,

    /// Glob patterns to exclude.
    #[arg(long)]
    exclude: Vec<String>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only).
    #[arg(short, long)]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progressbar: bool,

    /// Force color output.
    #[arg(long)]
    force_color: bool,

    /// Disable color output.
    #[arg(long)]
    no_color: bool,

    /// Number of threads for parallel processing (0 = all cores).
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Disable multi-threaded processing.
    #[arg(long)]
    single_process: bool,

    /// Path to config file (.gosqlfmt.toml or gosqlfmt.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{:#}", e);
        return ExitCode::from(2);
    }

    let mode = match build_mode(&cli) {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if cli.patterns.is_empty() {
        return match gosqlfmt::format_reader(io::stdin().lock(), io::stdout().lock(), &mode) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(2)
            }
        };
    }

    let report = match gosqlfmt::run(&cli.patterns, &mode) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if !mode.quiet {
        print_verbose_results(&report, &mode);
        eprintln!("{}", report.summary());
    }

    report.print_errors();

    if report.has_errors() {
        ExitCode::from(2)
    } else if mode.check && report.has_changes() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let default_filter = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}

/// Merge config file values under the command line flags.
fn build_mode(cli: &Cli) -> anyhow::Result<Mode> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let base = gosqlfmt::load_config(&cwd, cli.config.as_deref())?;

    let mode = Mode {
        indent: cli.indent.unwrap_or(base.indent),
        newline: cli.newline.unwrap_or(base.newline),
        dialect_name: cli.dialect.clone().unwrap_or(base.dialect_name),
        write: cli.write || base.write,
        check: cli.check,
        diff: cli.diff,
        exclude: if cli.exclude.is_empty() {
            base.exclude
        } else {
            cli.exclude.clone()
        },
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_progressbar: cli.no_progressbar,
        no_color: cli.no_color,
        force_color: cli.force_color,
        threads: cli.threads,
        single_process: cli.single_process,
    };
    mode.dialect()?;

    Ok(mode)
}

fn print_verbose_results(report: &Report, mode: &Mode) {
    if !mode.verbose {
        return;
    }
    for result in &report.results {
        match result.status {
            FileStatus::Changed => {
                eprintln!(
                    "reformatted {} ({} literal(s))",
                    result.path.display(),
                    result.literals
                );
            }
            FileStatus::Error => {
                eprintln!(
                    "error: {}: {}",
                    result.path.display(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            FileStatus::Unchanged => {}
        }
    }
}
