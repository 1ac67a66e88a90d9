//! Two-pass protection of positional `?` markers around the parser.
//!
//! Before parsing, every `?` is replaced with a numbered named parameter
//! (`:gosqlfmt_ph_0`, `:gosqlfmt_ph_1`, ...). After rendering, the sentinels
//! are turned back into `?`. Restoration checks that the rendered text still
//! holds every sentinel exactly once and in ascending order, since binding
//! values positionally depends on it.

use std::sync::LazyLock;

use memchr::memchr_iter;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::FormatError;

/// The positional parameter marker of the host language's SQL drivers.
pub const POSITIONAL_MARKER: &str = "?";

/// Reserved namespace for sentinel parameter names.
pub const SENTINEL_NAMESPACE: &str = "gosqlfmt_ph_";

static SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r":{}(\d+)", SENTINEL_NAMESPACE)).expect("sentinel pattern is valid")
});

/// Text with its positional markers swapped for sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    /// Number of markers replaced; sentinels are numbered `0..count`.
    pub count: usize,
}

/// Render a sentinel token for the placeholder at `index`.
pub fn sentinel(index: usize) -> String {
    format!(":{}{}", SENTINEL_NAMESPACE, index)
}

/// Replace each `?` with a numbered sentinel, left to right.
///
/// Text that already uses the sentinel namespace is refused: restoring it
/// later would turn user text into markers.
pub fn protect(text: &str) -> Result<Protected, FormatError> {
    if text.contains(SENTINEL_NAMESPACE) {
        return Err(FormatError::Unparseable(format!(
            "text already contains the reserved `{}` namespace",
            SENTINEL_NAMESPACE
        )));
    }

    let bytes = text.as_bytes();
    let mut result = String::with_capacity(text.len() + 16);
    let mut last = 0;
    let mut count = 0;
    for pos in memchr_iter(b'?', bytes) {
        result.push_str(&text[last..pos]);
        result.push_str(&sentinel(count));
        count += 1;
        last = pos + 1;
    }
    result.push_str(&text[last..]);

    Ok(Protected {
        text: result,
        count,
    })
}

/// Turn every sentinel back into `?`, after checking that the sentinels read
/// `0, 1, .., count - 1` from left to right.
pub fn restore(rendered: &str, count: usize) -> Result<String, FormatError> {
    let found: SmallVec<[usize; 16]> = SENTINEL
        .captures_iter(rendered)
        .map(|caps| caps[1].parse::<usize>().unwrap_or(usize::MAX))
        .collect();

    let in_order = found.len() == count && found.iter().enumerate().all(|(i, &n)| i == n);
    if !in_order {
        return Err(FormatError::PlaceholderMismatch {
            expected: count,
            found: found.len(),
        });
    }

    Ok(SENTINEL.replace_all(rendered, POSITIONAL_MARKER).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_numbers_markers_left_to_right() {
        let protected = protect("select * from t where a = ? and b = ?").unwrap();
        assert_eq!(
            protected.text,
            "select * from t where a = :gosqlfmt_ph_0 and b = :gosqlfmt_ph_1"
        );
        assert_eq!(protected.count, 2);
    }

    #[test]
    fn test_protect_without_markers() {
        let protected = protect("select 1").unwrap();
        assert_eq!(protected.text, "select 1");
        assert_eq!(protected.count, 0);
    }

    #[test]
    fn test_protect_markers_inside_string_literals() {
        let protected = protect("select 'why?' from t where id = ?").unwrap();
        assert_eq!(
            protected.text,
            "select 'why:gosqlfmt_ph_0' from t where id = :gosqlfmt_ph_1"
        );
        assert_eq!(protected.count, 2);
    }

    #[test]
    fn test_protect_refuses_reserved_namespace() {
        let err = protect("select :gosqlfmt_ph_0 from t").unwrap_err();
        assert!(matches!(err, FormatError::Unparseable(_)));
    }

    #[test]
    fn test_restore_replaces_all_sentinels() {
        let restored = restore("a = :gosqlfmt_ph_0\nAND b = :gosqlfmt_ph_1", 2).unwrap();
        assert_eq!(restored, "a = ?\nAND b = ?");
    }

    #[test]
    fn test_restore_detects_reordering() {
        let err = restore("LIMIT :gosqlfmt_ph_1 OFFSET :gosqlfmt_ph_0", 2).unwrap_err();
        assert_eq!(
            err,
            FormatError::PlaceholderMismatch {
                expected: 2,
                found: 2
            }
        );
    }

    #[test]
    fn test_restore_detects_dropped_and_duplicated() {
        assert!(restore("a = :gosqlfmt_ph_0", 2).is_err());
        assert!(restore("a = :gosqlfmt_ph_0 OR :gosqlfmt_ph_0", 1).is_err());
    }

    #[test]
    fn test_round_trip_preserves_text() {
        let source = "update t set a = ?, b = ? where c in (?, ?)";
        let protected = protect(source).unwrap();
        assert_eq!(restore(&protected.text, protected.count).unwrap(), source);
    }
}
