use std::sync::Arc;

use tracing::{debug, warn};
use transit_authz::{AuthCheck, Resolver};
use transit_config::AuthConfig;
use transit_session::SessionProvider;
use transit_token::{token_status, ClaimKind, Clock, SystemClock, TokenStatus};

use crate::authentication::AuthenticationGuard;
use crate::decision::GuardDecision;
use crate::permission::PermissionGuard;
use crate::sink::{Navigator, Notifier};

/// Runs guard decisions against the live session and the UI sinks.
///
/// The guards themselves are pure; this is the only place their side effects
/// (clearing the session, notifying, navigating) happen.
pub struct GuardAdapter {
    session: Arc<dyn SessionProvider>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: AuthConfig,
    resolver: Resolver,
    clock: Arc<dyn Clock>,
}

impl GuardAdapter {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: AuthConfig,
    ) -> Self {
        let resolver = Resolver::from_config(&config);
        Self {
            session,
            notifier,
            navigator,
            config,
            resolver,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock, mainly for tests
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.session
    }

    /// Status of the token the session holds right now
    pub fn token_status(&self) -> TokenStatus {
        let snapshot = self.session.snapshot();
        token_status(snapshot.token(), self.clock.as_ref())
    }

    /// Check engine for the current token
    pub fn auth_check(&self, kind: ClaimKind) -> AuthCheck {
        AuthCheck::from_status(&self.token_status(), kind, &self.resolver)
    }

    /// Evaluate an authentication guard and carry out its decision.
    ///
    /// Returns `true` when the protected subtree should render.
    pub fn authenticate(&self, guard: &mut AuthenticationGuard) -> bool {
        let decision = guard.evaluate(&self.token_status(), &self.config);
        self.apply(&decision)
    }

    /// Evaluate a permission guard and carry out its decision.
    pub fn authorize(&self, guard: &PermissionGuard) -> bool {
        let check = self.auth_check(self.config.guard_check_kind);
        let decision = guard.decide(&check, &self.config);
        self.apply(&decision)
    }

    /// Perform the side effects of `decision`.
    pub fn apply(&self, decision: &GuardDecision) -> bool {
        let GuardDecision::Redirect(redirect) = decision else {
            return true;
        };

        // persisted keys may outlive an empty in-memory snapshot
        if redirect.clear_session {
            if !self.session.snapshot().is_empty() {
                warn!("clearing session before redirect");
            }
            self.session.clear();
        }
        if let Some(notice) = &redirect.notice {
            self.notifier.notify(notice.kind, &notice.message);
        }
        debug!(path = redirect.path.as_str(), "guard redirect");
        self.navigator.redirect(&redirect.path, true);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingNavigator, RecordingNotifier};
    use serde_json::json;
    use transit_session::{InMemorySession, KeyStore, MemoryKeyStore, PersistentSession};
    use transit_token::{encode_claims, FixedClock};

    const NOW: i64 = 1_800_000_000;

    struct Harness {
        session: Arc<InMemorySession>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
        adapter: GuardAdapter,
    }

    fn harness() -> Harness {
        let session = Arc::new(InMemorySession::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let adapter = GuardAdapter::new(
            session.clone(),
            notifier.clone(),
            navigator.clone(),
            AuthConfig::default(),
        )
        .with_clock(Arc::new(FixedClock::at_timestamp(NOW)));
        Harness {
            session,
            notifier,
            navigator,
            adapter,
        }
    }

    #[test]
    fn test_render_has_no_side_effects() {
        let h = harness();
        h.session
            .set_token(&encode_claims(&json!({ "exp": NOW + 60, "roles": ["clerk"] })));

        let mut guard = AuthenticationGuard::new();
        assert!(h.adapter.authenticate(&mut guard));
        assert!(h.notifier.notices().is_empty());
        assert!(h.navigator.history().is_empty());
        assert!(h.session.token().is_some());
    }

    #[test]
    fn test_redirects_replace_history() {
        let h = harness();
        assert!(!h.adapter.authorize(&PermissionGuard::new()));
        let history = h.navigator.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].path, "/auth/login");
        assert!(history[0].replace);
    }

    #[test]
    fn test_redirect_removes_stale_persisted_keys() {
        let store = Arc::new(MemoryKeyStore::new());
        store.set("token", "stale.token.value").unwrap();
        store.set("user", "{}").unwrap();

        let config = AuthConfig::default();
        let session = Arc::new(PersistentSession::new(
            Arc::new(InMemorySession::default()),
            store.clone(),
            &config,
        ));
        let navigator = Arc::new(RecordingNavigator::new());
        let adapter = GuardAdapter::new(
            session,
            Arc::new(RecordingNotifier::new()),
            navigator.clone(),
            config,
        );

        let mut guard = AuthenticationGuard::new();
        assert!(!adapter.authenticate(&mut guard));
        assert!(store.get("token").unwrap().is_none());
        assert!(store.get("user").unwrap().is_none());
        assert_eq!(navigator.last_path().as_deref(), Some("/auth/login"));
    }

    #[test]
    fn test_permission_guard_uses_configured_kind() {
        let h = harness();
        h.session.set_token(&encode_claims(&json!({
            "exp": NOW + 60,
            "roles": ["Dispatcher"],
            "permissions": ["trip:view"]
        })));

        assert!(h.adapter.authorize(&PermissionGuard::new().permission("TRIP:VIEW")));
        assert!(!h.adapter.authorize(&PermissionGuard::new().permission("dispatcher")));
        assert_eq!(h.navigator.last_path().as_deref(), Some("/403"));
        assert_eq!(h.notifier.take().len(), 1);
    }
}
