use tracing::debug;
use transit_authz::AuthCheck;
use transit_config::AuthConfig;

use crate::decision::GuardDecision;
use crate::sink::{Notice, NoticeKind};

/// Gates a route subtree on a permission (or role) check.
///
/// With nothing configured it only requires a valid token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGuard {
    pub permission: Option<String>,
    pub any_permission: Option<Vec<String>>,
    pub fallback_path: Option<String>,
}

impl PermissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a single permission
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Require at least one of `permissions`
    pub fn any_permission<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_permission = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    /// Where to send denied users instead of the configured forbidden page
    pub fn fallback_path(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = Some(path.into());
        self
    }

    /// Decide what to do for the identity behind `check`.
    ///
    /// Authentication failure always wins and goes to login, never to the
    /// forbidden page.
    pub fn decide(&self, check: &AuthCheck, config: &AuthConfig) -> GuardDecision {
        if !check.is_authenticated() {
            return GuardDecision::redirect(&config.login_path);
        }

        // a blank permission is no requirement, like an empty any-of list
        if let Some(permission) = self.permission.as_deref().filter(|p| !p.trim().is_empty()) {
            if !check.check(permission) {
                debug!(permission, "permission denied");
                return self.deny(config);
            }
        }

        if let Some(any) = &self.any_permission {
            if !check.check_any(any.as_slice()) {
                debug!(?any, "none of the permissions granted");
                return self.deny(config);
            }
        }

        GuardDecision::Render
    }

    fn deny(&self, config: &AuthConfig) -> GuardDecision {
        let path = self
            .fallback_path
            .as_deref()
            .unwrap_or(&config.forbidden_path);
        GuardDecision::redirect(path).with_notice(Notice::new(
            NoticeKind::Error,
            &config.denied_message,
        ))
    }
}
