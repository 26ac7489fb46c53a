use transit_authz::{AuthCheck, Resolver};
use transit_config::{get_default_config, AuthConfig};
use transit_session::SessionProvider;
use transit_token::{is_token_valid_at, token_status, ClaimKind, Clock, SystemClock};

fn active_config() -> AuthConfig {
    get_default_config().cloned().unwrap_or_default()
}

/// Whether `token` decodes and has not expired, against the wall clock.
pub fn is_token_valid(token: Option<&str>) -> bool {
    is_token_valid_at(token, &SystemClock)
}

/// Check a single permission directly against a raw token.
///
/// Uses the default configuration's check kind and wildcards.
pub fn has_permission(token: Option<&str>, permission: &str) -> bool {
    token_check(token, &active_config()).check(permission)
}

/// `true` if `permissions` is empty or any of them is granted by `token`.
pub fn has_any_permission<S: AsRef<str>>(token: Option<&str>, permissions: &[S]) -> bool {
    token_check(token, &active_config()).check_any(permissions)
}

/// Clear the session. A persistent session also drops its stored keys.
pub fn clear_session(session: &dyn SessionProvider) {
    session.clear();
}

/// Build the check engine for the session's current token.
pub fn use_auth_check(
    session: &dyn SessionProvider,
    kind: ClaimKind,
    resolver: &Resolver,
    clock: &dyn Clock,
) -> AuthCheck {
    let snapshot = session.snapshot();
    let status = token_status(snapshot.token(), clock);
    AuthCheck::from_status(&status, kind, resolver)
}

fn token_check(token: Option<&str>, config: &AuthConfig) -> AuthCheck {
    let status = token_status(token, &SystemClock);
    AuthCheck::from_status(
        &status,
        config.guard_check_kind,
        &Resolver::from_config(config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use transit_session::InMemorySession;
    use transit_token::{encode_claims, FixedClock};

    fn now_secs() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn test_is_token_valid() {
        assert!(!is_token_valid(None));
        assert!(!is_token_valid(Some("not-a-token")));
        let expired = encode_claims(&json!({ "exp": now_secs() - 5 }));
        assert!(!is_token_valid(Some(&expired)));
        let fresh = encode_claims(&json!({ "exp": now_secs() + 3600 }));
        assert!(is_token_valid(Some(&fresh)));
    }

    #[test]
    fn test_has_permission() {
        let token = encode_claims(&json!({
            "exp": now_secs() + 3600,
            "permissions": ["Ticket:Refund"]
        }));
        assert!(has_permission(Some(&token), "ticket:refund"));
        assert!(!has_permission(Some(&token), "ticket:void"));
        assert!(!has_permission(None, "ticket:refund"));

        assert!(has_any_permission(Some(&token), &["ticket:void", "TICKET:REFUND"]));
        assert!(!has_any_permission(Some(&token), &["ticket:void"]));
        assert!(has_any_permission::<&str>(None, &[]));
    }

    #[test]
    fn test_use_auth_check_follows_session() {
        let session = InMemorySession::default();
        let clock = FixedClock::at_timestamp(1_800_000_000);
        let resolver = Resolver::default();

        let check = use_auth_check(&session, ClaimKind::Role, &resolver, &clock);
        assert!(!check.check("manager"));

        session.set_token(&encode_claims(&json!({ "exp": 1_800_000_100, "role": "Manager" })));
        let check = use_auth_check(&session, ClaimKind::Role, &resolver, &clock);
        assert!(check.check("MANAGER"));

        clear_session(&session);
        let check = use_auth_check(&session, ClaimKind::Role, &resolver, &clock);
        assert!(!check.is_authenticated());
    }
}
