use mongodb::bson::{self, Bson, Document};
use serde_json::Value;

/// Convert BSON → JSON Value (relaxed extended JSON)
pub fn bson_to_json(value: Bson) -> Value {
    value.into_relaxed_extjson()
}

/// Convert a JSON object → BSON Document
pub fn json_to_bson(value: Value) -> Result<Document, String> {
    bson::to_document(&value).map_err(|e| e.to_string())
}

/// Looks up a dotted path such as `address.city` in a JSON value.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

/// Looks up a dotted path in a BSON document.
pub fn get_bson_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut keys = path.split('.');
    let first = doc.get(keys.next()?)?;
    keys.try_fold(first, |current, key| current.as_document()?.get(key))
}

/// Renders a field value for log lines. Strings are printed without quotes.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// JSON array of at most `limit` messages.
pub fn render_messages(messages: &[String], limit: usize) -> String {
    let head = &messages[..messages.len().min(limit)];
    serde_json::to_string(head).unwrap_or_else(|_| format!("{:?}", head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    #[test]
    fn dotted_paths() {
        let value = json!({ "address": { "city": "Utrecht", "zip": 3511 }, "name": "x" });
        assert_eq!(get_path(&value, "address.city"), Some(&json!("Utrecht")));
        assert_eq!(get_path(&value, "name"), Some(&json!("x")));
        assert_eq!(get_path(&value, "address.street"), None);
        assert_eq!(get_path(&value, "name.first"), None);

        let doc = doc! { "address": { "zip": 3511 } };
        assert_eq!(get_bson_path(&doc, "address.zip"), Some(&Bson::Int32(3511)));
        assert_eq!(get_bson_path(&doc, "address.city"), None);
    }

    #[test]
    fn render_value_strips_string_quotes() {
        assert_eq!(render_value(&json!("a")), Some("a".to_string()));
        assert_eq!(render_value(&json!(12)), Some("12".to_string()));
        assert_eq!(render_value(&Value::Null), None);
    }

    #[test]
    fn render_messages_caps_output() {
        let messages: Vec<String> = (0..12).map(|i| format!("e{}", i)).collect();
        let rendered = render_messages(&messages, 10);
        assert!(rendered.starts_with(r#"["e0","e1""#));
        assert!(rendered.contains("e9"));
        assert!(!rendered.contains("e10"));
    }

    #[test]
    fn json_bson_round_trip_of_filter() {
        let filter = json_to_bson(json!({ "country": "NL" })).unwrap();
        assert_eq!(filter, doc! { "country": "NL" });
        assert_eq!(bson_to_json(Bson::Document(filter)), json!({ "country": "NL" }));
        assert!(json_to_bson(json!([1, 2])).is_err());
    }
}
