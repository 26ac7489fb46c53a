//! # Transit Token
//!
//! Bearer token decoding and validity checks for the transit administration
//! console.
//!
//! The crate reads the payload of a `header.payload.signature` token, projects
//! it onto [`DecodedClaims`], and answers whether the token is still usable.
//! Signatures are not verified; the token is trusted as delivered by the login
//! flow and only interpreted here.
//!
//! ## Usage
//!
//! ```
//! use transit_token::{encode_claims, token_status, FixedClock};
//! use serde_json::json;
//!
//! let token = encode_claims(&json!({ "sub": "u-1", "exp": 2_000_000_000 }));
//! let status = token_status(Some(&token), &FixedClock::at_timestamp(1_900_000_000));
//! assert!(status.is_valid());
//! ```

mod claims;
mod codec;
mod error;
mod validity;

pub use claims::{ClaimKind, DecodedClaims};
pub use codec::{decode_claims, decode_segment, encode_claims};
pub use error::TokenError;
pub use validity::{
    epoch_seconds, expiry_seconds, is_token_valid_at, is_valid, token_status, Clock, FixedClock,
    SystemClock, TokenStatus,
};
