//! Escaping for values embedded into inline `<script>`, `<style>` and URLs.
//!
//! Plain text and attribute values go through askama's HTML escaper instead.

use serde_json::Value;

/// Serializes `value` as JSON that cannot terminate the surrounding `<script>` element.
pub fn script_json(value: &Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// A quoted JavaScript string literal.
pub fn js_string(s: &str) -> String {
    script_json(&Value::String(s.to_owned()))
}

/// Percent-encodes `s` for use as a query parameter value.
pub fn query_param(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Only absolute http(s) URLs are used as link targets.
pub fn safe_href(url: &str) -> &str {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        url
    } else {
        "#"
    }
}
