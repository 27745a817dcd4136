//! Reply normalization — flattens heterogeneous engine replies to text.
//!
//! Engine backends reply with a plain string, a mapping with `text`,
//! `content`, or `message` keys, a list of content parts, or something
//! else entirely. [`render_reply`] normalizes all of these into plain text
//! with a total fallback, so rendering never fails.

use serde_json::Value;

/// Render any engine reply value as plain text.
///
/// Rules, applied recursively:
/// - strings pass through unchanged
/// - mappings try `text`, then `content`, then `message`, then fall back
///   to joining the renderings of all their values
/// - sequences render each element and join with newlines, dropping
///   empty renderings
/// - anything else is stringified
pub fn render_reply(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_non_empty(items.iter().map(render_reply)),
        Value::Object(map) => {
            if let Some(text) = map.get("text") {
                return match text {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
            if let Some(content) = map.get("content") {
                return render_reply(content);
            }
            if let Some(message) = map.get("message") {
                return render_reply(message);
            }
            // Tool outputs may wrap text inside nested structures
            join_non_empty(map.values().map(render_reply))
        }
    }
}

fn join_non_empty(parts: impl Iterator<Item = String>) -> String {
    parts
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_passes_through() {
        assert_eq!(render_reply(&json!("hello")), "hello");
    }

    #[test]
    fn null_renders_empty() {
        assert_eq!(render_reply(&Value::Null), "");
    }

    #[test]
    fn text_key_wins() {
        assert_eq!(render_reply(&json!({"text": "X"})), "X");
        // Non-string text values are stringified, not recursed
        assert_eq!(render_reply(&json!({"text": 7})), "7");
    }

    #[test]
    fn content_key_recurses() {
        assert_eq!(
            render_reply(&json!({"content": [{"text": "a"}, {"text": "b"}]})),
            "a\nb"
        );
    }

    #[test]
    fn message_key_recurses() {
        assert_eq!(
            render_reply(&json!({"message": {"content": "nested"}})),
            "nested"
        );
    }

    #[test]
    fn sequence_drops_empty_renders() {
        assert_eq!(render_reply(&json!(["a", "", "b"])), "a\nb");
    }

    #[test]
    fn mapping_without_known_keys_joins_values() {
        let value = json!({
            "first": {"inner": "alpha"},
            "second": "beta",
        });
        let rendered = render_reply(&value);
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("beta"));
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn deeply_nested_structures_flatten() {
        let value = json!([
            {"content": [{"text": "one"}, {"unknown": ["two", ""]}]},
            "three",
            {"message": "four"},
        ]);
        assert_eq!(render_reply(&value), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn scalars_stringify() {
        assert_eq!(render_reply(&json!(true)), "true");
        assert_eq!(render_reply(&json!(3.5)), "3.5");
    }
}
