//! # Transit Session
//!
//! Holds the current bearer token and user profile for the console.
//!
//! [`InMemorySession`] is the single owner of the live value; readers call
//! [`SessionProvider::snapshot`] or subscribe for changes. [`PersistentSession`]
//! layers durable keys on top so a reload can restore the session and a logout
//! removes every trace of it.

mod error;
mod persist;
mod store;

pub use error::SessionError;
pub use persist::{FileKeyStore, KeyStore, MemoryKeyStore, PersistentSession};
pub use store::{InMemorySession, SessionIdentity, SessionProvider, SessionSnapshot};
