//! # Transit Guard
//!
//! Route guards for the transit administration console.
//!
//! Two guards compose by nesting:
//!
//! - [`AuthenticationGuard`] renders its subtree only while the session holds
//!   a valid token. Otherwise it clears the session and redirects to login,
//!   notifying the user only when a token was present but unusable.
//! - [`PermissionGuard`] additionally requires a permission, or any of a list
//!   of permissions, and redirects denied users to a forbidden page.
//!
//! Both produce a [`GuardDecision`]; [`GuardAdapter`] executes it against a
//! session, a [`Notifier`] and a [`Navigator`].

mod adapter;
mod authentication;
mod decision;
mod helpers;
mod permission;
mod sink;

pub use adapter::GuardAdapter;
pub use authentication::{AuthenticationGuard, GuardState};
pub use decision::{GuardDecision, Redirect};
pub use helpers::{clear_session, has_any_permission, has_permission, is_token_valid, use_auth_check};
pub use permission::PermissionGuard;
pub use sink::{
    Navigation, Navigator, Notice, NoticeKind, Notifier, RecordingNavigator, RecordingNotifier,
    TracingNotifier,
};
