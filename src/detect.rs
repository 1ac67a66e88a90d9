use std::sync::LazyLock;

use phf::phf_set;
use regex::Regex;

/// Statement keywords a candidate must start with.
static LEADING_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "SELECT",
    "INSERT",
    "UPDATE",
    "DELETE",
};

/// Go `fmt` directives such as `%s`, `%-10v` or `%.2f`. Strings carrying them
/// are templates that get completed at runtime, not literal SQL.
static FORMAT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%[+\-# 0]*[*]?[0-9]*[.*]?[0-9]*[vTtbcdoOqxXUeEfFgGsp]")
        .expect("format directive pattern is valid")
});

/// Cheap pre-filter deciding whether a string literal is worth handing to the
/// formatter. Rejects template strings and anything that does not open with a
/// SELECT/INSERT/UPDATE/DELETE keyword.
pub fn might_be_sql(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    if FORMAT_DIRECTIVE.is_match(trimmed) {
        return false;
    }

    starts_with_statement_keyword(trimmed)
}

fn starts_with_statement_keyword(text: &str) -> bool {
    // The first word ends at the first non-identifier character, which is
    // where a regex `\b` would sit.
    let end = text
        .char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let word = &text[..end];
    if word.len() > 6 {
        return false;
    }
    LEADING_KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
