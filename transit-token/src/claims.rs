use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which claim an authorization query is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    Role,
    Permission,
}

impl ClaimKind {
    /// Parse a claim kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "role" | "roles" => Some(Self::Role),
            "permission" | "permissions" => Some(Self::Permission),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Permission => "permission",
        }
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(crate) const EMAIL_KEYS: &[&str] = &[
    "email",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
];
pub(crate) const NAME_KEYS: &[&str] = &[
    "name",
    "unique_name",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name",
];
pub(crate) const SUBJECT_KEYS: &[&str] = &[
    "sub",
    "nameid",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];
pub(crate) const ROLE_KEYS: &[&str] = &[
    "roles",
    "role",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];
pub(crate) const PERMISSION_KEYS: &[&str] = &["permissions", "permission", "authorities"];

/// Structural projection of a bearer token's payload.
///
/// Role and permission claims are kept as raw JSON because issuers emit them
/// as a bare string, a delimited string, or an array of strings or objects.
/// The resolver normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedClaims {
    /// Issued at (Unix timestamp)
    pub issued_at: Option<i64>,
    /// Expiration, unparsed; see [`crate::expiry_seconds`]
    pub expires_at: Option<Value>,
    /// Not before (Unix timestamp)
    pub not_before: Option<i64>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub roles: Option<Value>,
    pub permissions: Option<Value>,
    /// Every payload field not mapped above
    pub extra: Map<String, Value>,
}

impl DecodedClaims {
    /// Project a JSON payload object onto the claim fields.
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let issued_at = take_first(&mut payload, &["iat"]).and_then(|v| as_timestamp(&v));
        let expires_at = take_first(&mut payload, &["exp"]).filter(|v| !v.is_null());
        let not_before = take_first(&mut payload, &["nbf"]).and_then(|v| as_timestamp(&v));
        let subject = take_first(&mut payload, SUBJECT_KEYS).and_then(as_text);
        let email = take_first(&mut payload, EMAIL_KEYS).and_then(as_text);
        let name = take_first(&mut payload, NAME_KEYS).and_then(as_text);
        let issuer = take_first(&mut payload, &["iss"]).and_then(as_text);
        let roles = take_first(&mut payload, ROLE_KEYS).filter(|v| !v.is_null());
        let permissions = take_first(&mut payload, PERMISSION_KEYS).filter(|v| !v.is_null());

        Self {
            issued_at,
            expires_at,
            not_before,
            subject,
            email,
            name,
            issuer,
            roles,
            permissions,
            extra: payload,
        }
    }

    /// Raw claim value for the given kind, if the token carries one.
    pub fn claim(&self, kind: ClaimKind) -> Option<&Value> {
        match kind {
            ClaimKind::Role => self.roles.as_ref(),
            ClaimKind::Permission => self.permissions.as_ref(),
        }
    }
}

/// Removes every alias from the map and keeps the first one present.
fn take_first(payload: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in keys {
        if let Some(value) = payload.remove(*key) {
            if found.is_none() {
                found = Some(value);
            }
        }
    }
    found
}

fn as_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(payload: Value) -> DecodedClaims {
        match payload {
            Value::Object(map) => DecodedClaims::from_payload(map),
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn test_standard_fields() {
        let c = claims(json!({
            "sub": "u-17",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600,
            "email": "ops@transit.example",
            "roles": ["Operator"],
            "depot": "north"
        }));
        assert_eq!(c.subject.as_deref(), Some("u-17"));
        assert_eq!(c.issued_at, Some(1_700_000_000));
        assert_eq!(c.expires_at, Some(json!(1_700_003_600)));
        assert_eq!(c.email.as_deref(), Some("ops@transit.example"));
        assert_eq!(c.roles, Some(json!(["Operator"])));
        assert_eq!(c.extra.get("depot"), Some(&json!("north")));
    }

    #[test]
    fn test_uri_claim_names() {
        let c = claims(json!({
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress": "a@b.example",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": "Manager",
            "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier": 42
        }));
        assert_eq!(c.email.as_deref(), Some("a@b.example"));
        assert_eq!(c.roles, Some(json!("Manager")));
        assert_eq!(c.subject.as_deref(), Some("42"));
        assert!(c.extra.is_empty());
    }

    #[test]
    fn test_bare_key_wins_over_alias() {
        let c = claims(json!({
            "role": "clerk",
            "roles": ["driver"],
        }));
        assert_eq!(c.claim(ClaimKind::Role), Some(&json!(["driver"])));
        assert_eq!(c.claim(ClaimKind::Permission), None);
    }

    #[test]
    fn test_claim_kind_parse() {
        assert_eq!(ClaimKind::parse("Role"), Some(ClaimKind::Role));
        assert_eq!(ClaimKind::parse("permissions"), Some(ClaimKind::Permission));
        assert_eq!(ClaimKind::parse("scope"), None);
    }
}
