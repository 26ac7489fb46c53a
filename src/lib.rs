//! # Transit Auth
//!
//! Client-side authorization core for the transit administration console.
//!
//! The console receives a bearer token at sign-in and relies on this crate to
//! decide, consistently across every protected view and route, whether the
//! holder may see something. Nothing here issues, refreshes or verifies the
//! signature of a token.
//!
//! This crate combines functionality from:
//! - `transit-token`: claim decoding and the validity oracle
//! - `transit-config`: configuration management
//! - `transit-authz`: role/permission resolution and checks
//! - `transit-session`: the session store and persisted session keys
//! - `transit-guard`: authentication and permission route guards
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use transit_auth::{
//!     encode_claims, AuthenticationGuard, PermissionGuard, RecordingNavigator, TransitAuth,
//! };
//!
//! # fn main() -> Result<(), transit_auth::AuthError> {
//! let navigator = Arc::new(RecordingNavigator::new());
//! let auth = TransitAuth::builder().navigator(navigator.clone()).build()?;
//!
//! let exp = chrono::Utc::now().timestamp() + 3600;
//! auth.login(&encode_claims(&json!({ "exp": exp, "roles": ["Operator"] })), None)?;
//!
//! let mut guard = AuthenticationGuard::new();
//! assert!(auth.authenticate(&mut guard));
//! assert!(!auth.authorize(&PermissionGuard::new().permission("fare:edit")));
//! assert_eq!(navigator.last_path().as_deref(), Some("/403"));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use transit_authz::{AuthCheck, AuthItem, NormalizedIdentity, Resolver};
pub use transit_config::{
    get_default_config, set_default_config, try_load_default_config, AuthConfig,
    AuthConfigBuilder, ConfigError,
};
pub use transit_guard::{
    clear_session, has_any_permission, has_permission, is_token_valid, use_auth_check,
    AuthenticationGuard, GuardAdapter, GuardDecision, GuardState, Navigation, Navigator, Notice,
    NoticeKind, Notifier, PermissionGuard, RecordingNavigator, RecordingNotifier, Redirect,
    TracingNotifier,
};
pub use transit_session::{
    FileKeyStore, InMemorySession, KeyStore, MemoryKeyStore, PersistentSession, SessionError,
    SessionIdentity, SessionProvider, SessionSnapshot,
};
pub use transit_token::{
    decode_claims, encode_claims, expiry_seconds, token_status, ClaimKind, Clock, DecodedClaims,
    FixedClock, SystemClock, TokenError, TokenStatus,
};

/// Errors that can occur in transit-auth
#[derive(Error, Debug)]
pub enum AuthError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session storage error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Token error
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// A required collaborator was not supplied
    #[error("Missing {0}")]
    Missing(&'static str),
}

/// Unified handle for the console
///
/// Owns the persistent session and the guard adapter, so view code only needs
/// this one value to sign users in and out, run guards, and query checks.
pub struct TransitAuth {
    session: Arc<PersistentSession>,
    adapter: GuardAdapter,
}

impl TransitAuth {
    /// Create a builder for a TransitAuth instance
    pub fn builder() -> TransitAuthBuilder {
        TransitAuthBuilder::new()
    }

    /// Start a session with a token obtained from the sign-in flow.
    ///
    /// When no profile is supplied one is derived from the token's claims.
    ///
    /// # Errors
    ///
    /// Fails if the token cannot be decoded or the session cannot be persisted.
    pub fn login(&self, token: &str, identity: Option<SessionIdentity>) -> Result<(), AuthError> {
        let claims = decode_claims(token)?;
        let identity = identity.unwrap_or_else(|| SessionIdentity::from_claims(&claims));
        self.session.login(token, Some(identity))?;
        info!(subject = ?claims.subject, "signed in");
        Ok(())
    }

    /// Reload the persisted session, e.g. after a restart.
    pub fn restore(&self) -> Result<SessionSnapshot, AuthError> {
        Ok(self.session.restore()?)
    }

    /// End the session and remove its persisted keys.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.session.try_clear()?;
        info!("signed out");
        Ok(())
    }

    /// Check engine over the current token for `kind`
    pub fn auth_check(&self, kind: ClaimKind) -> AuthCheck {
        self.adapter.auth_check(kind)
    }

    pub fn token_status(&self) -> TokenStatus {
        self.adapter.token_status()
    }

    pub fn is_token_valid(&self) -> bool {
        self.token_status().is_valid()
    }

    /// Check a permission with the configured guard check kind
    pub fn has_permission(&self, permission: &str) -> bool {
        self.auth_check(self.config().guard_check_kind)
            .check(permission)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        self.auth_check(self.config().guard_check_kind)
            .check_any(permissions)
    }

    /// Run an authentication guard; `true` means render
    pub fn authenticate(&self, guard: &mut AuthenticationGuard) -> bool {
        self.adapter.authenticate(guard)
    }

    /// Run a permission guard; `true` means render
    pub fn authorize(&self, guard: &PermissionGuard) -> bool {
        self.adapter.authorize(guard)
    }

    pub fn session(&self) -> &Arc<PersistentSession> {
        &self.session
    }

    pub fn config(&self) -> &AuthConfig {
        self.adapter.config()
    }
}

/// Builder for TransitAuth instances
#[derive(Default)]
pub struct TransitAuthBuilder {
    config: Option<AuthConfig>,
    store: Option<Arc<dyn KeyStore>>,
    use_file_store: bool,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TransitAuthBuilder {
    /// Create a new TransitAuth builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of the default configuration
    pub fn config(mut self, config: AuthConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Persist session keys in `store`
    pub fn key_store(mut self, store: Arc<dyn KeyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist session keys in the configured session file
    pub fn file_store(mut self) -> Self {
        self.use_file_store = true;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build a TransitAuth instance
    ///
    /// Without an explicit configuration the global default is used, falling
    /// back to [`AuthConfig::default`]. Without a key store, keys live in
    /// memory. Without a notifier, notices go to the log.
    pub fn build(self) -> Result<TransitAuth, AuthError> {
        let config = match self.config {
            Some(config) => config,
            None => get_default_config().cloned().unwrap_or_default(),
        };
        config.validate()?;

        let navigator = self.navigator.ok_or(AuthError::Missing("navigator"))?;
        let store: Arc<dyn KeyStore> = match self.store {
            Some(store) => store,
            None if self.use_file_store => Arc::new(FileKeyStore::from_config(&config)?),
            None => Arc::new(MemoryKeyStore::new()),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let session = Arc::new(PersistentSession::new(
            Arc::new(InMemorySession::default()),
            store,
            &config,
        ));

        let mut adapter = GuardAdapter::new(session.clone(), notifier, navigator, config);
        if let Some(clock) = self.clock {
            adapter = adapter.with_clock(clock);
        }

        Ok(TransitAuth { session, adapter })
    }
}
