use tracing::trace;
use transit_token::{ClaimKind, TokenStatus};

use crate::resolver::{NormalizedIdentity, Resolver};

/// Single/any/all predicates over one resolved identity.
///
/// Built once per render from the current token. Without an identity (no
/// token, or a token that failed validation) every non-vacuous query is
/// `false`.
#[derive(Debug, Clone)]
pub struct AuthCheck {
    identity: Option<NormalizedIdentity>,
}

impl AuthCheck {
    pub fn new(identity: Option<NormalizedIdentity>) -> Self {
        Self { identity }
    }

    /// A check that denies everything
    pub fn unauthenticated() -> Self {
        Self { identity: None }
    }

    /// Resolve `kind` from the claims of a valid token.
    pub fn from_status(status: &TokenStatus, kind: ClaimKind, resolver: &Resolver) -> Self {
        Self::new(status.claims().map(|claims| resolver.resolve(claims, kind)))
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&NormalizedIdentity> {
        self.identity.as_ref()
    }

    pub fn kind(&self) -> Option<ClaimKind> {
        self.identity.as_ref().map(|i| i.kind)
    }

    pub fn check(&self, item: &str) -> bool {
        let Some(identity) = &self.identity else {
            return false;
        };
        if identity.all_powerful {
            return true;
        }
        let granted = identity.contains(item);
        trace!(kind = %identity.kind, item, granted, "authorization check");
        granted
    }

    /// `true` for an empty list, otherwise `true` if any item passes.
    pub fn check_any<S: AsRef<str>>(&self, items: &[S]) -> bool {
        if items.is_empty() || self.is_all_powerful() {
            return true;
        }
        items.iter().any(|item| self.check(item.as_ref()))
    }

    /// `true` for an empty list, otherwise `true` if every item passes.
    pub fn check_all<S: AsRef<str>>(&self, items: &[S]) -> bool {
        if items.is_empty() || self.is_all_powerful() {
            return true;
        }
        items.iter().all(|item| self.check(item.as_ref()))
    }

    fn is_all_powerful(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.all_powerful)
    }
}
