//! # Transit Authz
//!
//! Role and permission resolution for decoded transit tokens.
//!
//! [`Resolver`] normalizes the role or permission claim into a lower-cased set
//! and detects wildcard roles. [`AuthCheck`] answers single, any-of and all-of
//! queries against that set.
//!
//! ```
//! use serde_json::json;
//! use transit_authz::{AuthCheck, Resolver};
//! use transit_token::{encode_claims, token_status, ClaimKind, FixedClock};
//!
//! let token = encode_claims(&json!({ "exp": 2_000_000_000, "roles": ["Dispatcher"] }));
//! let status = token_status(Some(&token), &FixedClock::at_timestamp(1_900_000_000));
//! let check = AuthCheck::from_status(&status, ClaimKind::Role, &Resolver::default());
//!
//! assert!(check.check("dispatcher"));
//! assert!(!check.check("admin"));
//! ```

mod check;
mod item;
mod resolver;

pub use check::AuthCheck;
pub use item::AuthItem;
pub use resolver::{NormalizedIdentity, Resolver, BUILTIN_WILDCARDS};
