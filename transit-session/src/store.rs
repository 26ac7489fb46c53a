use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use transit_token::DecodedClaims;

/// Profile of the signed-in user, as shown by the console chrome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub subject: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Anything else the login response carried
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub profile: serde_json::Value,
}

impl SessionIdentity {
    pub fn from_claims(claims: &DecodedClaims) -> Self {
        Self {
            subject: claims.subject.clone(),
            display_name: claims.name.clone(),
            email: claims.email.clone(),
            profile: serde_json::Value::Null,
        }
    }
}

/// Token and identity, always observed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<Arc<str>>,
    pub identity: Option<Arc<SessionIdentity>>,
}

impl SessionSnapshot {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(Arc::from(token)),
            identity: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.identity.is_none()
    }
}

/// Single owner of the current session.
///
/// Writers replace the snapshot wholesale; readers always see a consistent
/// token/identity pair.
pub trait SessionProvider: Send + Sync {
    fn snapshot(&self) -> SessionSnapshot;

    fn replace(&self, snapshot: SessionSnapshot);

    /// Apply `f` to the current snapshot as one atomic replacement.
    fn modify(&self, f: &mut dyn FnMut(&mut SessionSnapshot));

    /// Receiver notified on every replacement
    fn subscribe(&self) -> watch::Receiver<SessionSnapshot>;

    fn clear(&self) {
        self.replace(SessionSnapshot::default());
    }

    fn token(&self) -> Option<Arc<str>> {
        self.snapshot().token
    }

    /// Start a new session with `token`; any previous identity is dropped.
    fn set_token(&self, token: &str) {
        self.replace(SessionSnapshot::with_token(token));
    }

    fn set_identity(&self, identity: SessionIdentity) {
        let identity = Arc::new(identity);
        self.modify(&mut |s: &mut SessionSnapshot| s.identity = Some(identity.clone()));
    }
}

/// Process-local session backed by a `watch` channel.
#[derive(Debug)]
pub struct InMemorySession {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for InMemorySession {
    fn default() -> Self {
        Self::new(SessionSnapshot::default())
    }
}

impl InMemorySession {
    pub fn new(initial: SessionSnapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn with_token(token: &str) -> Self {
        Self::new(SessionSnapshot::with_token(token))
    }
}

impl SessionProvider for InMemorySession {
    fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    fn replace(&self, snapshot: SessionSnapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Subscribers are only notified if there was something to clear.
    fn clear(&self) {
        self.tx.send_if_modified(|s| {
            if s.is_empty() {
                return false;
            }
            *s = SessionSnapshot::default();
            true
        });
    }

    fn modify(&self, f: &mut dyn FnMut(&mut SessionSnapshot)) {
        self.tx.send_modify(|s| f(s));
    }

    fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let session = InMemorySession::default();
        assert!(session.snapshot().is_empty());

        session.set_token("a.b.c");
        assert_eq!(session.token().as_deref(), Some("a.b.c"));

        session.set_identity(SessionIdentity {
            subject: Some("u-1".into()),
            ..Default::default()
        });
        let snapshot = session.snapshot();
        assert_eq!(snapshot.token(), Some("a.b.c"));
        assert_eq!(
            snapshot.identity.as_ref().and_then(|i| i.subject.as_deref()),
            Some("u-1")
        );

        session.clear();
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_new_token_drops_old_identity() {
        let session = InMemorySession::with_token("old.token.x");
        session.set_identity(SessionIdentity::default());
        session.set_token("new.token.y");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.token(), Some("new.token.y"));
        assert!(snapshot.identity.is_none());
    }

    #[test]
    fn test_subscribers_see_replacements() {
        let session = InMemorySession::default();
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.set_token("t.o.k");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().token(), Some("t.o.k"));

        session.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_clearing_empty_session_is_silent() {
        let session = InMemorySession::default();
        let mut rx = session.subscribe();

        session.clear();
        assert!(!rx.has_changed().unwrap());

        session.set_token("t.o.k");
        rx.borrow_and_update();
        session.clear();
        assert!(rx.has_changed().unwrap());
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_identity_from_claims() {
        let claims = DecodedClaims {
            subject: Some("42".into()),
            email: Some("ops@transit.example".into()),
            ..Default::default()
        };
        let identity = SessionIdentity::from_claims(&claims);
        assert_eq!(identity.subject.as_deref(), Some("42"));
        assert_eq!(identity.email.as_deref(), Some("ops@transit.example"));
        assert!(identity.display_name.is_none());
    }
}
