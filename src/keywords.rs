use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, MatchKind};

/// Keyword tokens uppercased in parser-serialized expression text. Each entry
/// carries its surrounding spaces; entries without a trailing space also
/// match at the end of the text or before punctuation.
const KEYWORDS: &[&str] = &[
    " as ",
    " asc",
    " desc",
    " and ",
    " or ",
    " not ",
    " in ",
    " is ",
    " like ",
    " between ",
    " exists ",
    " null",
    " true",
    " false",
    " on ",
    " using ",
];

static KEYWORD_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build(KEYWORDS)
        .expect("keyword table is valid")
});

/// Uppercase the keyword table inside `text` by plain substring replacement.
///
/// This is not syntax-aware: a keyword inside a string literal is uppercased
/// too. Matches never overlap, so `is not` only uppercases `is`.
pub fn upper_keywords(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    KEYWORD_MATCHER.replace_all_with(text, &mut out, |mat, matched, dst| {
        let bounded = matched.ends_with(' ')
            || text[mat.end()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if bounded {
            dst.push_str(&matched.to_ascii_uppercase());
        } else {
            dst.push_str(matched);
        }
        true
    });
    out
}
