use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One role or permission entry as it appears in a claim.
///
/// Issuers emit either a bare string or an object carrying `code`, `name`
/// and/or `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthItem {
    #[serde(rename = "string")]
    Text { value: String },
    Object {
        code: Option<String>,
        name: Option<String>,
        id: Option<String>,
    },
}

impl AuthItem {
    pub fn text(value: impl Into<String>) -> Self {
        AuthItem::Text {
            value: value.into(),
        }
    }

    /// Split a raw claim value into items.
    ///
    /// Strings are split on any of `delimiters`, with blank pieces dropped.
    /// Arrays contribute one item per string, number or object element. A bare
    /// object is a single item. Anything else yields nothing.
    pub fn from_claim_value(value: &Value, delimiters: &[char]) -> Vec<AuthItem> {
        match value {
            Value::String(s) => split_delimited(s, delimiters),
            Value::Array(entries) => entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(s) => Some(AuthItem::text(s.trim())),
                    Value::Number(n) => Some(AuthItem::text(n.to_string())),
                    Value::Object(_) => Self::from_object(entry),
                    _ => None,
                })
                .collect(),
            Value::Object(_) => Self::from_object(value).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn from_object(value: &Value) -> Option<AuthItem> {
        let field = |key: &str| match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        value.as_object()?;
        Some(AuthItem::Object {
            code: field("code"),
            name: field("name"),
            id: field("id"),
        })
    }

    /// Lower-cased canonical form used for matching.
    ///
    /// Objects resolve to the first non-empty of `code`, `name`, `id`, or to
    /// an empty string when none is set.
    pub fn canonical(&self) -> String {
        match self {
            AuthItem::Text { value } => value.to_lowercase(),
            AuthItem::Object { code, name, id } => [code, name, id]
                .into_iter()
                .flatten()
                .find(|s| !s.is_empty())
                .map(|s| s.to_lowercase())
                .unwrap_or_default(),
        }
    }
}

fn split_delimited(value: &str, delimiters: &[char]) -> Vec<AuthItem> {
    value
        .split(|c: char| delimiters.contains(&c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AuthItem::text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(value: Value) -> Vec<String> {
        AuthItem::from_claim_value(&value, &[','])
            .iter()
            .map(AuthItem::canonical)
            .collect()
    }

    #[test]
    fn test_scalar_and_delimited() {
        assert_eq!(canonical(json!("Manager")), vec!["manager"]);
        assert_eq!(
            canonical(json!("Manager, Operator,,")),
            vec!["manager", "operator"]
        );
        assert!(canonical(json!("")).is_empty());
    }

    #[test]
    fn test_sequences() {
        assert_eq!(
            canonical(json!(["Route:Edit", " fare:view ", 7])),
            vec!["route:edit", "fare:view", "7"]
        );
    }

    #[test]
    fn test_object_priority() {
        assert_eq!(
            canonical(json!([
                { "code": "TICKET_ADMIN", "name": "Ticket admin", "id": 3 },
                { "name": "Dispatcher", "id": 9 },
                { "id": 12 },
                { "code": "", "name": "Auditor" },
                { "label": "nothing useful" }
            ])),
            vec!["ticket_admin", "dispatcher", "12", "auditor", ""]
        );
        assert_eq!(canonical(json!({ "code": "Solo" })), vec!["solo"]);
    }

    #[test]
    fn test_unusable_values() {
        assert!(canonical(json!(null)).is_empty());
        assert!(canonical(json!(true)).is_empty());
        assert!(canonical(json!(42)).is_empty());
        assert!(canonical(json!([null, false])).is_empty());
    }

    #[test]
    fn test_custom_delimiters() {
        let items = AuthItem::from_claim_value(&json!("a b;c"), &[' ', ';']);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_tagged_serde_shape() {
        let item: AuthItem = serde_json::from_value(json!({ "kind": "string", "value": "x" })).unwrap();
        assert_eq!(item, AuthItem::text("x"));
        let item: AuthItem =
            serde_json::from_value(json!({ "kind": "object", "id": "5", "code": null, "name": null }))
                .unwrap();
        assert_eq!(item.canonical(), "5");
    }
}
