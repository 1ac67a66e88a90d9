pub mod api;
pub mod config;
pub mod detect;
pub mod dialect;
pub mod error;
pub mod formatter;
pub mod keywords;
pub mod mode;
pub mod parser;
pub mod placeholder;
pub mod render;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod tree;

// Re-export the main public API
pub use api::{format_reader, format_source, get_matching_paths, run};
pub use config::load_config;
pub use detect::might_be_sql;
pub use formatter::{format_sql, format_sql_with, FormatResult};
pub use mode::Mode;
