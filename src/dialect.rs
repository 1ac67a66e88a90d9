use sqlparser::dialect::{GenericDialect, MySqlDialect};

use crate::error::{FormatError, GosqlfmtError};
use crate::parser;
use crate::tree::Statement;

/// A SQL grammar the formatter can parse with.
pub trait Dialect: Send + Sync {
    /// Name used in configuration and on the command line.
    fn name(&self) -> &'static str;

    /// Identifier quoting character the grammar re-serializes with. Every
    /// occurrence is stripped from the rendered text.
    fn quote_char(&self) -> Option<char> {
        None
    }

    /// Parse exactly one statement into the renderer's tree.
    fn parse(&self, sql: &str) -> Result<Statement, FormatError>;
}

/// MySQL grammar: backtick-quoted identifiers, `REPLACE INTO`,
/// `ON DUPLICATE KEY UPDATE` and `LIMIT offset, count`.
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> Option<char> {
        Some('`')
    }

    fn parse(&self, sql: &str) -> Result<Statement, FormatError> {
        parser::parse_with(&MySqlDialect {}, sql)
    }
}

/// ANSI-leaning grammar for code that does not target MySQL.
pub struct Generic;

impl Dialect for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn parse(&self, sql: &str) -> Result<Statement, FormatError> {
        parser::parse_with(&GenericDialect {}, sql)
    }
}

/// Create a dialect from a string name.
pub fn dialect_from_name(name: &str) -> Result<Box<dyn Dialect>, GosqlfmtError> {
    match name.to_ascii_lowercase().as_str() {
        "mysql" => Ok(Box::new(MySql)),
        "generic" => Ok(Box::new(Generic)),
        _ => Err(GosqlfmtError::Config(format!("Unknown dialect: {}", name))),
    }
}
