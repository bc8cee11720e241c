//! Schema instructions appended to prompts for structured calls.

use serde_json::Value;

/// Append JSON-schema instructions to `prompt`. A null schema leaves it unchanged.
pub fn build_schema_prompt(prompt: &str, schema: &Value) -> String {
    if schema.is_null() {
        return prompt.to_string();
    }

    let schema_str = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "{}\n\n---\n\nRespond with valid JSON matching this schema:\n```json\n{}\n```\n\nRespond ONLY with valid JSON, no explanation.",
        prompt, schema_str
    )
}
