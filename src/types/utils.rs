//! Small helpers shared across modules.

use crate::constants::extraction::CHARS_PER_TOKEN;

// =============================================================================
// String Utilities
// =============================================================================

/// Number of characters (not bytes) in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Rough token estimate used only for prompt annotations and debug logs.
#[inline]
pub fn estimate_tokens(content: &str) -> usize {
    content.len() / CHARS_PER_TOKEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(char_len("héllo"), 5);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcdefgh"), 2);
    }
}
