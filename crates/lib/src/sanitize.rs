//! Escaping of untrusted text for embedding inside a double-quoted AppleScript literal.
//!
//! [`SanitizedText`] can only be produced by [`sanitize`], so the script builder can require it
//! in its signature and raw request strings never reach a generated script.

use std::fmt;

/// Text that has been truncated, filtered and escaped exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitize `input` for a script string literal, keeping at most `max_len` characters.
///
/// - Truncates the input to `max_len` characters.
/// - Drops characters that are not printable (control, format and separator characters,
///   any whitespace other than a plain space).
/// - Replaces any remaining `\n` / `\r` with a space and backticks with `'`.
/// - Escapes `\` as `\\`, then `"` as `\"`.
///
/// Escaping can grow the text, so escaped pairs that would push the output past `max_len`
/// are dropped whole; an escape is never split from the character it protects.
pub fn sanitize(input: &str, max_len: usize) -> SanitizedText {
    let mut out = String::new();
    let mut used = 0usize;
    for c in input.chars().take(max_len) {
        if !is_printable(c) {
            continue;
        }
        let c = match c {
            '\n' | '\r' => ' ',
            '`' => '\'',
            c => c,
        };
        let escaped: &[char] = match c {
            '\\' => &['\\', '\\'],
            '"' => &['\\', '"'],
            _ => std::slice::from_ref(&c),
        };
        if used + escaped.len() > max_len {
            break;
        }
        out.extend(escaped);
        used += escaped.len();
    }
    SanitizedText(out)
}

/// Printable in the sense of "renders as a visible glyph or a plain space": control,
/// separator, format (Cf) and private-use characters are rejected. Unassigned code points
/// are not detected and pass through.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0000}'..='\u{E007F}'
            | '\u{E000}'..='\u{F8FF}'
            | '\u{F0000}'..='\u{10FFFF}'
    )
}
