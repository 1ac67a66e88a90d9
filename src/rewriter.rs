use tracing::debug;

use crate::detect::might_be_sql;
use crate::dialect::Dialect;
use crate::formatter::format_sql_with;
use crate::scanner::RawString;

/// Settings for rewriting the literals of one file.
pub struct Options<'a> {
    pub indent: usize,
    /// Put the opening and closing backticks on lines of their own.
    pub newline: bool,
    pub dialect: &'a dyn Dialect,
}

/// New source text plus how many literals it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub source: String,
    pub rewritten: usize,
}

/// Replace the content of each SQL literal with its formatted form. Bytes
/// outside rewritten literal contents are copied unchanged.
///
/// `literals` must be in source order and non-overlapping, as returned by
/// [`crate::scanner::find_raw_strings`].
pub fn rewrite_source(src: &str, literals: &[RawString], options: &Options) -> Rewrite {
    let mut out = String::with_capacity(src.len() + src.len() / 4);
    let mut last = 0;
    let mut rewritten = 0;

    for literal in literals {
        let Some(replacement) = format_literal(&literal.content, options) else {
            continue;
        };
        if replacement == literal.content {
            continue;
        }
        out.push_str(&src[last..literal.span.start]);
        out.push_str(&replacement);
        last = literal.span.end;
        rewritten += 1;
    }
    out.push_str(&src[last..]);

    Rewrite {
        source: out,
        rewritten,
    }
}

fn format_literal(content: &str, options: &Options) -> Option<String> {
    if !might_be_sql(content) {
        return None;
    }

    let result = format_sql_with(options.dialect, content, options.indent);
    if !result.formatted {
        return None;
    }

    let text = result.text.trim_end_matches('\n');
    // A raw string cannot hold a backtick.
    if text.contains('`') {
        debug!("formatted SQL contains a backtick, keeping the original literal");
        return None;
    }

    if options.newline {
        Some(format!("\n{}\n", text))
    } else {
        Some(text.to_string())
    }
}
