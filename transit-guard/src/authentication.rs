use tracing::debug;
use transit_config::AuthConfig;
use transit_token::TokenStatus;

use crate::decision::GuardDecision;
use crate::sink::{Notice, NoticeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Redirecting,
}

/// Gates a route subtree on holding a valid token.
///
/// Re-evaluated whenever the session token changes; each evaluation is
/// synchronous and ends in `Authorized` or `Redirecting`.
#[derive(Debug, Clone)]
pub struct AuthenticationGuard {
    state: GuardState,
}

impl Default for AuthenticationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Checking,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Decide without touching guard state.
    ///
    /// Any failure clears the session and redirects to login. Only a token
    /// that was present but unusable produces a notice; never having signed
    /// in redirects silently.
    pub fn decide(status: &TokenStatus, config: &AuthConfig) -> GuardDecision {
        let redirect = GuardDecision::redirect(&config.login_path).clearing_session();
        match status {
            TokenStatus::Valid(_) => GuardDecision::Render,
            TokenStatus::Absent => redirect,
            TokenStatus::Expired(_) => redirect.with_notice(Notice::new(
                NoticeKind::Warning,
                &config.expired_message,
            )),
            TokenStatus::Malformed => redirect.with_notice(Notice::new(
                NoticeKind::Warning,
                &config.invalid_message,
            )),
        }
    }

    pub fn evaluate(&mut self, status: &TokenStatus, config: &AuthConfig) -> GuardDecision {
        self.state = GuardState::Checking;
        let decision = Self::decide(status, config);
        self.state = if decision.is_render() {
            GuardState::Authorized
        } else {
            GuardState::Redirecting
        };
        debug!(state = ?self.state, "authentication guard evaluated");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_token::DecodedClaims;

    #[test]
    fn test_valid_token_renders() {
        let mut guard = AuthenticationGuard::new();
        assert_eq!(guard.state(), GuardState::Checking);
        let decision = guard.evaluate(
            &TokenStatus::Valid(DecodedClaims::default()),
            &AuthConfig::default(),
        );
        assert!(decision.is_render());
        assert_eq!(guard.state(), GuardState::Authorized);
    }

    #[test]
    fn test_absent_token_redirects_silently() {
        let mut guard = AuthenticationGuard::new();
        let decision = guard.evaluate(&TokenStatus::Absent, &AuthConfig::default());
        assert_eq!(decision.redirect_path(), Some("/auth/login"));
        assert!(decision.notice().is_none());
        assert_eq!(guard.state(), GuardState::Redirecting);
    }

    #[test]
    fn test_expired_token_notifies() {
        let config = AuthConfig::default();
        let decision = AuthenticationGuard::decide(
            &TokenStatus::Expired(DecodedClaims::default()),
            &config,
        );
        match decision {
            GuardDecision::Redirect(r) => {
                assert_eq!(r.path, "/auth/login");
                assert!(r.clear_session);
                assert_eq!(
                    r.notice,
                    Some(Notice::new(NoticeKind::Warning, config.expired_message))
                );
            }
            GuardDecision::Render => panic!("Expected redirect"),
        }
    }

    #[test]
    fn test_malformed_token_notifies_differently() {
        let config = AuthConfig::builder().login_path("/signin").build().unwrap();
        let decision = AuthenticationGuard::decide(&TokenStatus::Malformed, &config);
        assert_eq!(decision.redirect_path(), Some("/signin"));
        assert_eq!(
            decision.notice().map(|n| n.message.as_str()),
            Some(config.invalid_message.as_str())
        );
    }
}
