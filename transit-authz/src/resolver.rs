use std::collections::BTreeSet;

use transit_config::AuthConfig;
use transit_token::{ClaimKind, DecodedClaims};

use crate::item::AuthItem;

/// Lower-cased role or permission entries derived from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentity {
    pub kind: ClaimKind,
    pub entries: BTreeSet<String>,
    /// Set when a wildcard role (or wildcard permission) is held
    pub all_powerful: bool,
}

impl NormalizedIdentity {
    /// Whether `item` is held, ignoring case. Wildcards are not consulted here.
    pub fn contains(&self, item: &str) -> bool {
        let item = item.trim().to_lowercase();
        !item.is_empty() && self.entries.contains(&item)
    }
}

/// Role values that always pass every check.
pub const BUILTIN_WILDCARDS: [&str; 2] = ["admin", "*"];

/// Turns raw role/permission claims into [`NormalizedIdentity`] values.
#[derive(Debug, Clone)]
pub struct Resolver {
    delimiters: Vec<char>,
    wildcards: BTreeSet<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new([','], BUILTIN_WILDCARDS)
    }
}

impl Resolver {
    /// `wildcards` extend [`BUILTIN_WILDCARDS`]; they never replace them.
    pub fn new<D, W, S>(delimiters: D, wildcards: W) -> Self
    where
        D: IntoIterator<Item = char>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            delimiters: delimiters.into_iter().collect(),
            wildcards: wildcards
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .chain(BUILTIN_WILDCARDS.iter().map(|w| w.to_string()))
                .collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.claim_delimiters.iter().copied(),
            config.wildcard_roles.iter(),
        )
    }

    /// Normalized entries of one claim, with empty canonical forms dropped.
    pub fn entries(&self, claims: &DecodedClaims, kind: ClaimKind) -> BTreeSet<String> {
        claims
            .claim(kind)
            .map(|value| AuthItem::from_claim_value(value, &self.delimiters))
            .unwrap_or_default()
            .iter()
            .map(AuthItem::canonical)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Resolve the entries for `kind`.
    ///
    /// The identity is all-powerful when the role claim holds a wildcard, or
    /// when the resolved set itself does.
    pub fn resolve(&self, claims: &DecodedClaims, kind: ClaimKind) -> NormalizedIdentity {
        let entries = self.entries(claims, kind);

        let all_powerful = self.has_wildcard(&entries)
            || (kind != ClaimKind::Role
                && self.has_wildcard(&self.entries(claims, ClaimKind::Role)));

        NormalizedIdentity {
            kind,
            entries,
            all_powerful,
        }
    }

    fn has_wildcard(&self, entries: &BTreeSet<String>) -> bool {
        entries.iter().any(|e| self.wildcards.contains(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn claims(roles: Option<Value>, permissions: Option<Value>) -> DecodedClaims {
        DecodedClaims {
            roles,
            permissions,
            ..Default::default()
        }
    }

    #[test]
    fn test_absent_claim_is_empty() {
        let identity = Resolver::default().resolve(&claims(None, None), ClaimKind::Role);
        assert!(identity.entries.is_empty());
        assert!(!identity.all_powerful);
    }

    #[test]
    fn test_case_insensitive_entries() {
        let identity =
            Resolver::default().resolve(&claims(Some(json!(["Manager"])), None), ClaimKind::Role);
        assert!(identity.contains("manager"));
        assert!(identity.contains("MANAGER"));
        assert!(!identity.contains(""));
    }

    #[test]
    fn test_admin_role_is_wildcard_for_both_kinds() {
        let c = claims(Some(json!("ADMIN")), Some(json!(["fare:view"])));
        let resolver = Resolver::default();
        assert!(resolver.resolve(&c, ClaimKind::Role).all_powerful);
        let perms = resolver.resolve(&c, ClaimKind::Permission);
        assert!(perms.all_powerful);
        assert!(perms.contains("fare:view"));
    }

    #[test]
    fn test_star_permission_is_wildcard() {
        let c = claims(Some(json!(["operator"])), Some(json!("*")));
        let resolver = Resolver::default();
        assert!(resolver.resolve(&c, ClaimKind::Permission).all_powerful);
        assert!(!resolver.resolve(&c, ClaimKind::Role).all_powerful);
    }

    #[test]
    fn test_object_entry_with_only_id() {
        let c = claims(None, Some(json!([{ "id": "route:delete" }, { "label": "x" }])));
        let identity = Resolver::default().resolve(&c, ClaimKind::Permission);
        assert!(identity.contains("ROUTE:DELETE"));
        assert_eq!(identity.entries.len(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig::builder()
            .wildcard_roles(["Root"])
            .claim_delimiters([';'])
            .build()
            .unwrap();
        let resolver = Resolver::from_config(&config);
        let c = claims(Some(json!("clerk;root")), None);
        let identity = resolver.resolve(&c, ClaimKind::Role);
        assert!(identity.all_powerful);
        assert_eq!(identity.entries.len(), 2);

        let c = claims(Some(json!("Admin")), None);
        assert!(resolver.resolve(&c, ClaimKind::Role).all_powerful);
    }

    #[test]
    fn test_empty_wildcard_config_keeps_builtins() {
        let config = AuthConfig::builder()
            .wildcard_roles(Vec::<String>::new())
            .build()
            .unwrap();
        let resolver = Resolver::from_config(&config);

        let c = claims(Some(json!(["Admin"])), None);
        assert!(resolver.resolve(&c, ClaimKind::Permission).all_powerful);
        let c = claims(Some(json!("*")), None);
        assert!(resolver.resolve(&c, ClaimKind::Role).all_powerful);
        let c = claims(Some(json!("clerk")), None);
        assert!(!resolver.resolve(&c, ClaimKind::Role).all_powerful);
    }
}
