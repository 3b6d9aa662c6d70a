//! Parsing of JSON objects returned by the reasoning backend.

use serde_json::{Map, Value};

/// Removes a surrounding markdown code fence (```` ```json ... ``` ````), if any.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...). The payload may share the
    // opening line with it.
    let (first_line, after) = rest.split_once('\n').unwrap_or((rest, ""));
    let info_end = first_line
        .find(|c: char| c.is_whitespace() || c == '{' || c == '[')
        .unwrap_or(first_line.len());
    let body = if first_line[info_end..].trim().is_empty() {
        after
    } else {
        &rest[info_end..]
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parses `reply` as a JSON object. Anything else is `None`.
pub fn parse_object(reply: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(reply)) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// String value of `key`, when present and a string.
pub fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

/// String items of the array at `key`. Non-string items are skipped.
pub fn string_list_field(object: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    object.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}
