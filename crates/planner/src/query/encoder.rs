//! Escaping of free-form text for embedding inside single-quoted SQL literals.
//!
//! The rules follow MySQL string-literal syntax under the default `sql_mode`
//! (backslash escapes enabled). Every input byte expands to at most two output
//! bytes, so a field of `n` bytes never encodes to more than `2 * n` bytes.

/// Maximum number of bytes kept from a single field before encoding.
pub const DEFAULT_MAX_LINE_SIZE: usize = 500;

/// Escapes fields into a reusable scratch buffer.
///
/// The buffer is allocated once with room for `2 * max_line_size + 1` bytes,
/// which is enough for the worst case after truncation, so repeated calls do
/// not reallocate.
#[derive(Debug)]
pub struct FieldEncoder {
    max_line_size: usize,
    scratch: String,
}

impl FieldEncoder {
    pub fn new(max_line_size: usize) -> Self {
        Self {
            max_line_size,
            scratch: String::with_capacity(Self::scratch_capacity(max_line_size)),
        }
    }

    /// Worst-case encoded size for a field of `max_line_size` bytes.
    pub fn scratch_capacity(max_line_size: usize) -> usize {
        2 * max_line_size + 1
    }

    pub fn max_line_size(&self) -> usize {
        self.max_line_size
    }

    /// Truncates `field` to `max_line_size` bytes and escapes it.
    ///
    /// Truncation is lossy and lands on the last UTF-8
    /// character boundary that fits. The returned slice borrows the scratch
    /// buffer and is valid until the next call.
    pub fn encode(&mut self, field: &str) -> &str {
        self.scratch.clear();
        let field = truncate_to_boundary(field, self.max_line_size);
        escape_into(field, &mut self.scratch);
        &self.scratch
    }
}

impl Default for FieldEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_SIZE)
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
pub fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Escapes `s` without any length cap.
pub fn escape_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    escape_into(s, &mut out);
    out
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '\0' => out.push_str(r"\0"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str(r"\Z"),
            _ => out.push(ch),
        }
    }
}

/// Reads an escaped literal body back the way the server does.
///
/// Unknown escapes resolve to the escaped character itself and a trailing
/// lone backslash is kept.
pub fn unescape_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('Z') => out.push('\x1a'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
