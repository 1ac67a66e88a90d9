//! The SQL formatting pipeline: protect placeholders, parse, render,
//! restore placeholders, strip identifier quoting.

use tracing::debug;

use crate::dialect::{Dialect, MySql};
use crate::error::FormatError;
use crate::placeholder;
use crate::render;

/// Outcome of one formatting call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    pub text: String,
    /// False when the input was left alone; `text` is then the input verbatim.
    pub formatted: bool,
}

impl FormatResult {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            formatted: false,
        }
    }
}

/// Format `text` with the MySQL grammar, indenting each nesting level by
/// `indent` spaces.
pub fn format_sql(text: &str, indent: usize) -> FormatResult {
    format_sql_with(&MySql, text, indent)
}

/// Format `text` with an explicit grammar. Failures never escape: they are
/// logged and the input comes back untouched.
pub fn format_sql_with(dialect: &dyn Dialect, text: &str, indent: usize) -> FormatResult {
    match try_format(dialect, text, indent) {
        Ok(formatted) => FormatResult {
            text: formatted,
            formatted: true,
        },
        Err(e) => {
            debug!(dialect = dialect.name(), error = %e, "leaving SQL unformatted");
            FormatResult::unchanged(text)
        }
    }
}

fn try_format(dialect: &dyn Dialect, text: &str, indent: usize) -> Result<String, FormatError> {
    let protected = placeholder::protect(text)?;
    let tree = dialect.parse(&protected.text)?;
    let rendered = render::render(&tree, indent);
    let restored = placeholder::restore(&rendered, protected.count)?;

    Ok(match dialect.quote_char() {
        Some(quote) => restored.replace(quote, ""),
        None => restored,
    })
}
