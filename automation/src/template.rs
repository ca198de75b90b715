//! `{{field}}` template substitution for notification text and automation
//! comments. Paths use dot notation into the ticket snapshot; unresolved
//! placeholders are left as-is.

use regex::Regex;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid placeholder regex"))
}

pub fn render(template: &str, snapshot: &serde_json::Value) -> String {
    let mut result = template.to_string();
    for cap in placeholder_re().captures_iter(template) {
        let path = cap[1].trim();
        if let Some(value) = lookup(snapshot, path) {
            let replacement = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            result = result.replace(&cap[0], &replacement);
        }
    }
    result
}

fn lookup<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = json;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}
