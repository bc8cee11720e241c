//! JSON extraction from raw model text.

use serde_json::Value;
use tracing::debug;

use crate::types::{AdrError, ErrorCategory, LlmError, Result};

/// Parse the JSON payload of a model response.
pub fn extract_json_from_response(content: &str) -> Result<Value> {
    JsonExtractor.extract(content)
}

/// Strips wrapping around a JSON payload. It never invents structure: a
/// truncated or unbalanced payload is reported, not patched.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn extract(&self, raw: &str) -> Result<Value> {
        let cleaned = Self::unwrap_fences(raw.trim().trim_start_matches('\u{feff}'));

        if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
            return Ok(value);
        }

        let candidates = [
            Some(Self::drop_trailing_commas(cleaned)),
            Self::outermost_block(cleaned).map(Self::drop_trailing_commas),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                debug!("Recovered JSON from wrapped response");
                return Ok(value);
            }
        }

        Err(AdrError::Provider(LlmError::new(
            ErrorCategory::ParseError,
            format!(
                "Response is not valid JSON. Preview: {}...",
                cleaned.chars().take(200).collect::<String>()
            ),
        )))
    }

    /// Remove a surrounding ```json fence if present.
    fn unwrap_fences(s: &str) -> &str {
        let Some(rest) = s.strip_prefix("```") else {
            return s;
        };
        let body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        body.trim_end().strip_suffix("```").unwrap_or(body).trim()
    }

    /// Remove commas that directly precede `}` or `]` outside of strings.
    fn drop_trailing_commas(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut pending_comma = false;
        let mut in_string = false;
        let mut escaped = false;

        for ch in s.chars() {
            if in_string {
                out.push(ch);
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match ch {
                ',' => {
                    if pending_comma {
                        out.push(',');
                    }
                    pending_comma = true;
                    continue;
                }
                c if c.is_whitespace() => {
                    out.push(c);
                    continue;
                }
                '}' | ']' => pending_comma = false,
                _ => {
                    if pending_comma {
                        out.push(',');
                        pending_comma = false;
                    }
                    if ch == '"' {
                        in_string = true;
                    }
                }
            }
            out.push(ch);
        }
        if pending_comma {
            out.push(',');
        }
        out
    }

    /// First balanced `{...}` or `[...]` block in `s`.
    fn outermost_block(s: &str) -> Option<&str> {
        let start = s.find(['{', '['])?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, ch) in s[start..].char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(&s[start..start + offset + ch.len_utf8()]);
                    }
                }
                _ => {}
            }
        }
        None
    }
}
