use crate::dialect::{self, Dialect};
use crate::error::GosqlfmtError;

/// Mode holds all runtime settings for gosqlfmt.
#[derive(Debug, Clone)]
pub struct Mode {
    /// Spaces per nesting level.
    pub indent: usize,

    /// Put formatted SQL on lines of its own inside the backticks.
    pub newline: bool,

    pub dialect_name: String,

    /// Overwrite files in place.
    pub write: bool,

    pub check: bool,

    pub diff: bool,

    /// Glob patterns to exclude.
    pub exclude: Vec<String>,

    pub verbose: bool,

    pub quiet: bool,

    pub no_progressbar: bool,

    pub no_color: bool,

    pub force_color: bool,

    /// Number of threads for parallel processing (0 = all cores).
    pub threads: usize,

    pub single_process: bool,
}

/// What happens to a file whose formatted text differs from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Write,
    Check,
    Diff,
    Stdout,
}

impl Mode {
    /// Create the dialect for the configured dialect_name.
    pub fn dialect(&self) -> Result<Box<dyn Dialect>, GosqlfmtError> {
        dialect::dialect_from_name(&self.dialect_name)
    }

    /// Whether color output is enabled.
    pub fn color(&self) -> bool {
        if self.force_color {
            return true;
        }
        if self.no_color {
            return false;
        }
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        true
    }

    /// `--check` and `--diff` never write; `--diff` wins over `--check` for
    /// what gets printed.
    pub fn output(&self) -> Output {
        if self.diff {
            Output::Diff
        } else if self.check {
            Output::Check
        } else if self.write {
            Output::Write
        } else {
            Output::Stdout
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.no_progressbar && !self.quiet && self.output() != Output::Stdout
    }

    /// Host source file extensions to process.
    pub fn source_extensions(&self) -> &[&str] {
        &["go"]
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            indent: 2,
            newline: true,
            dialect_name: "mysql".to_string(),
            write: false,
            check: false,
            diff: false,
            exclude: Vec::new(),
            verbose: false,
            quiet: false,
            no_progressbar: false,
            no_color: false,
            force_color: false,
            threads: 0,
            single_process: false,
        }
    }
}
