//! Locates raw (backtick) string literals in Go source.
//!
//! The scan is lexical only: comments, interpreted strings and rune literals
//! are skipped so that a backtick inside them is not mistaken for the start
//! of a raw string.

use std::ops::Range;

use memchr::{memchr, memchr2, memmem};

use crate::error::{GosqlfmtError, Result};

/// A raw string literal found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawString {
    /// Byte span of the content, between the backticks.
    pub span: Range<usize>,
    pub content: String,
}

/// Return every raw string literal in `src`, in source order.
pub fn find_raw_strings(src: &str) -> Result<Vec<RawString>> {
    let bytes = src.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = match memchr(b'\n', &bytes[i..]) {
                    Some(offset) => i + offset + 1,
                    None => bytes.len(),
                };
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                match memmem::find(&bytes[i + 2..], b"*/") {
                    Some(offset) => i = i + 2 + offset + 2,
                    None => return Err(scan_error(i, "unterminated block comment")),
                }
            }
            b'"' | b'\'' => {
                i = skip_quoted(bytes, i)?;
            }
            b'`' => {
                let start = i + 1;
                let end = match memchr(b'`', &bytes[start..]) {
                    Some(offset) => start + offset,
                    None => return Err(scan_error(i, "unterminated raw string literal")),
                };
                literals.push(RawString {
                    span: start..end,
                    content: src[start..end].to_string(),
                });
                i = end + 1;
            }
            _ => i += 1,
        }
    }

    Ok(literals)
}

/// Skip an interpreted string or rune literal starting at `i` (which must
/// point to `"` or `'`). Returns the position after the closing quote.
fn skip_quoted(bytes: &[u8], i: usize) -> Result<usize> {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        // Jump to the next quote or backslash
        match memchr2(quote, b'\\', &bytes[j..]) {
            Some(offset) => {
                let end = j + offset;
                if bytes[end] == b'\\' {
                    j = end + 2;
                    continue;
                }
                if memchr(b'\n', &bytes[j..end]).is_some() {
                    break;
                }
                return Ok(end + 1);
            }
            None => break,
        }
    }
    let what = if quote == b'"' {
        "unterminated string literal"
    } else {
        "unterminated rune literal"
    };
    Err(scan_error(i, what))
}

fn scan_error(position: usize, message: &str) -> GosqlfmtError {
    GosqlfmtError::Scan {
        position,
        message: message.to_string(),
    }
}
