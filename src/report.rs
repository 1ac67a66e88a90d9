use std::path::PathBuf;

/// Status of processing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Every SQL literal was already formatted.
    Unchanged,
    /// At least one literal was reformatted (or would be, in check mode).
    Changed,
    /// The file could not be read, scanned or written.
    Error,
}

/// Result of processing a single file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Number of literals whose text changed.
    pub literals: usize,
    pub error: Option<String>,
}

impl FileResult {
    pub fn unchanged(path: PathBuf) -> Self {
        Self {
            path,
            status: FileStatus::Unchanged,
            literals: 0,
            error: None,
        }
    }

    pub fn changed(path: PathBuf, literals: usize) -> Self {
        Self {
            path,
            status: FileStatus::Changed,
            literals,
            error: None,
        }
    }

    pub fn error(path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path,
            status: FileStatus::Error,
            literals: 0,
            error: Some(error.into()),
        }
    }
}

/// Aggregated report of a run.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    fn count(&self, status: FileStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn unchanged(&self) -> usize {
        self.count(FileStatus::Unchanged)
    }

    pub fn changed(&self) -> usize {
        self.count(FileStatus::Changed)
    }

    pub fn errors(&self) -> usize {
        self.count(FileStatus::Error)
    }

    /// Total literals changed across all files.
    pub fn literals(&self) -> usize {
        self.results.iter().map(|r| r.literals).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    pub fn has_changes(&self) -> bool {
        self.changed() > 0
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("{} file(s) processed", self.total()));
        if self.changed() > 0 {
            parts.push(format!(
                "{} reformatted ({} literal(s))",
                self.changed(),
                self.literals()
            ));
        }
        if self.unchanged() > 0 {
            parts.push(format!("{} unchanged", self.unchanged()));
        }
        if self.errors() > 0 {
            parts.push(format!("{} error(s)", self.errors()));
        }
        parts.join(", ")
    }

    /// Print error details.
    pub fn print_errors(&self) {
        for result in &self.results {
            if let Some(ref error) = result.error {
                eprintln!("error: {}: {}", result.path.display(), error);
            }
        }
    }
}
