//! The `allowed_types` payload stored on each question.
//!
//! Current rows hold a JSON array of strings. Rows written by the first
//! release hold a comma-separated list, which is still accepted on read.

/// Encodes a list for the `allowed_types` column.
pub fn encode_list(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

/// Decodes an `allowed_types` column value. Blank entries are dropped.
pub fn parse_list(payload: Option<&str>) -> Vec<String> {
    let payload = match payload.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => return Vec::new(),
    };

    match serde_json::from_str::<Vec<String>>(payload) {
        Ok(items) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => payload
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}
