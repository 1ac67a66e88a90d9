//! End-to-end tests for the gosqlfmt binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const UNFORMATTED: &str = "package q\n\nvar q = `select id from users where id = ?`\n";
const FORMATTED: &str =
    "package q\n\nvar q = `\nSELECT\n  id\nFROM\n  users\nWHERE\n  id = ?\n`\n";

/// Helper: get a Command for the gosqlfmt binary.
fn gosqlfmt() -> Command {
    let mut cmd = Command::cargo_bin("gosqlfmt").expect("binary should exist");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Helper: create a temp directory holding the given files.
fn setup_temp_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
    dir
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

// ─── Output modes ───

#[test]
fn test_default_prints_formatted_source() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED)]);
    gosqlfmt()
        .arg(dir.path().join("q.go"))
        .assert()
        .success()
        .stdout(FORMATTED);
    assert_eq!(read(&dir, "q.go"), UNFORMATTED);
}

#[test]
fn test_write_rewrites_files_in_place() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED), ("pkg/r.go", UNFORMATTED)]);
    gosqlfmt()
        .arg("-w")
        .arg(dir.path())
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("2 reformatted"));
    assert_eq!(read(&dir, "q.go"), FORMATTED);
    assert_eq!(read(&dir, "pkg/r.go"), FORMATTED);
}

#[test]
fn test_write_twice_is_stable() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED)]);
    gosqlfmt().arg("-w").arg(dir.path()).assert().success();
    gosqlfmt()
        .arg("-w")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("1 unchanged"));
    assert_eq!(read(&dir, "q.go"), FORMATTED);
}

#[test]
fn test_check_fails_on_unformatted() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED)]);
    gosqlfmt().arg("--check").arg(dir.path()).assert().code(1);
    assert_eq!(read(&dir, "q.go"), UNFORMATTED);
}

#[test]
fn test_check_passes_on_formatted() {
    let dir = setup_temp_dir(&[("q.go", FORMATTED)]);
    gosqlfmt().arg("--check").arg(dir.path()).assert().success();
}

#[test]
fn test_diff_shows_changes() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED)]);
    gosqlfmt()
        .arg("--diff")
        .arg("--no-color")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("-var q = `select id from users where id = ?`"))
        .stderr(predicate::str::contains("+SELECT"));
    assert_eq!(read(&dir, "q.go"), UNFORMATTED);
}

#[test]
fn test_stdin_to_stdout() {
    gosqlfmt()
        .write_stdin(UNFORMATTED)
        .assert()
        .success()
        .stdout(FORMATTED);
}

// ─── Formatting options ───

#[test]
fn test_indent_option() {
    gosqlfmt()
        .arg("--indent")
        .arg("4")
        .write_stdin("var q = `delete from t`\n")
        .assert()
        .success()
        .stdout("var q = `\nDELETE FROM\n    t\n`\n");
}

#[test]
fn test_newline_false() {
    gosqlfmt()
        .arg("--newline=false")
        .write_stdin("var q = `delete from t`\n")
        .assert()
        .success()
        .stdout("var q = `DELETE FROM\n  t`\n");
}

#[test]
fn test_generic_dialect() {
    gosqlfmt()
        .args(["-d", "generic"])
        .write_stdin("var q = `delete from t`\n")
        .assert()
        .success()
        .stdout("var q = `\nDELETE FROM\n  t\n`\n");
}

#[test]
fn test_unknown_dialect_exits_2() {
    gosqlfmt()
        .args(["--dialect", "oracle"])
        .write_stdin("package q\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("oracle"));
}

// ─── Config file ───

#[test]
fn test_config_file_is_picked_up_from_cwd() {
    let dir = setup_temp_dir(&[
        ("q.go", "var q = `delete from t`\n"),
        (".gosqlfmt.toml", "indent = 4\nnewline = false\n"),
    ]);
    gosqlfmt()
        .current_dir(dir.path())
        .arg("q.go")
        .assert()
        .success()
        .stdout("var q = `DELETE FROM\n    t`\n");
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = setup_temp_dir(&[
        ("q.go", "var q = `delete from t`\n"),
        (".gosqlfmt.toml", "indent = 4\n"),
    ]);
    gosqlfmt()
        .current_dir(dir.path())
        .args(["--indent", "2", "q.go"])
        .assert()
        .success()
        .stdout("var q = `\nDELETE FROM\n  t\n`\n");
}

#[test]
fn test_explicit_config_path() {
    let dir = setup_temp_dir(&[("custom.toml", "write = true\n"), ("q.go", UNFORMATTED)]);
    gosqlfmt()
        .arg("--config")
        .arg(dir.path().join("custom.toml"))
        .arg(dir.path().join("q.go"))
        .assert()
        .success();
    assert_eq!(read(&dir, "q.go"), FORMATTED);
}

#[test]
fn test_invalid_config_exits_2() {
    let dir = setup_temp_dir(&[(".gosqlfmt.toml", "line_length = 80\n")]);
    gosqlfmt()
        .current_dir(dir.path())
        .write_stdin("package q\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration error"));
}

// ─── File selection and reporting ───

#[test]
fn test_exclude_skips_matching_files() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED), ("q_gen.go", UNFORMATTED)]);
    gosqlfmt()
        .args(["-w", "--exclude", "*_gen.go"])
        .arg(dir.path())
        .assert()
        .success();
    assert_eq!(read(&dir, "q.go"), FORMATTED);
    assert_eq!(read(&dir, "q_gen.go"), UNFORMATTED);
}

#[test]
fn test_recursive_pattern() {
    let dir = setup_temp_dir(&[
        ("a/q.go", UNFORMATTED),
        ("vendor/v.go", UNFORMATTED),
    ]);
    gosqlfmt()
        .current_dir(dir.path())
        .args(["-w", "./..."])
        .assert()
        .success();
    assert_eq!(read(&dir, "a/q.go"), FORMATTED);
    assert_eq!(read(&dir, "vendor/v.go"), UNFORMATTED);
}

#[test]
fn test_non_go_files_are_ignored() {
    let dir = setup_temp_dir(&[("notes.txt", "select id from users\n")]);
    gosqlfmt()
        .arg("-w")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("0 file(s) processed"));
    assert_eq!(read(&dir, "notes.txt"), "select id from users\n");
}

#[test]
fn test_scan_error_exits_2() {
    let dir = setup_temp_dir(&[("bad.go", "var q = `select id\n")]);
    gosqlfmt()
        .arg("--check")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("1 error(s)"));
}

#[test]
fn test_verbose_lists_reformatted_files() {
    let dir = setup_temp_dir(&[("q.go", UNFORMATTED)]);
    gosqlfmt()
        .args(["--check", "--verbose"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reformatted"))
        .stderr(predicate::str::contains("(1 literal(s))"));
}

#[test]
fn test_quiet_suppresses_summary() {
    let dir = setup_temp_dir(&[("q.go", FORMATTED)]);
    gosqlfmt()
        .args(["--check", "--quiet"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr("");
}

#[test]
fn test_single_process_and_threads() {
    let dir = setup_temp_dir(&[("a.go", UNFORMATTED), ("b.go", UNFORMATTED)]);
    gosqlfmt()
        .args(["-w", "--single-process"])
        .arg(dir.path())
        .assert()
        .success();
    assert_eq!(read(&dir, "a.go"), FORMATTED);

    let dir = setup_temp_dir(&[("a.go", UNFORMATTED), ("b.go", UNFORMATTED)]);
    gosqlfmt()
        .args(["-w", "-t", "2", "--no-progressbar"])
        .arg(dir.path())
        .assert()
        .success();
    assert_eq!(read(&dir, "b.go"), FORMATTED);
}
