use thiserror::Error;

/// User-facing errors.
#[derive(Error, Debug)]
pub enum GosqlfmtError {
    #[error("gosqlfmt config error: {0}")]
    Config(String),

    #[error("gosqlfmt scan error at byte {position}: {message}")]
    Scan { position: usize, message: String },

    #[error("gosqlfmt pattern error: {0}")]
    Pattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Formatter failures. Never surfaced past `format_sql`: they turn into an
/// unformatted `FormatResult` carrying the original text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unparseable SQL: {0}")]
    Unparseable(String),

    #[error("placeholder mismatch: expected {expected} in order, found {found}")]
    PlaceholderMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, GosqlfmtError>;
