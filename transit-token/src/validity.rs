use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use crate::claims::DecodedClaims;
use crate::codec::decode_claims;

/// Expiry values above this are taken to be epoch milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin the clock at a Unix timestamp in seconds.
    ///
    /// Out-of-range timestamps pin it at the epoch.
    pub fn at_timestamp(secs: i64) -> Self {
        Self(
            Utc.timestamp_opt(secs, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Outcome of inspecting the token currently held by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    /// No token at all
    Absent,
    /// A token was present but could not be decoded
    Malformed,
    /// A token decoded but is expired, not yet valid, or carries no usable expiry
    Expired(DecodedClaims),
    /// A token that passed every check
    Valid(DecodedClaims),
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid(_))
    }

    /// Whether a token was held, valid or not.
    pub fn was_present(&self) -> bool {
        !matches!(self, TokenStatus::Absent)
    }

    /// Claims of a valid token.
    pub fn claims(&self) -> Option<&DecodedClaims> {
        match self {
            TokenStatus::Valid(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Expiry of `claims` in epoch seconds.
///
/// Accepts integers, floats, and numeric strings. Millisecond values are
/// normalized to seconds. Returns `None` when the claim is missing or
/// unparseable.
pub fn expiry_seconds(claims: &DecodedClaims) -> Option<i64> {
    let raw = match claims.expires_at.as_ref()? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64))?,
        Value::String(s) => {
            let f = s.trim().parse::<f64>().ok()?;
            if !f.is_finite() {
                return None;
            }
            f.floor() as i64
        }
        _ => return None,
    };

    Some(epoch_seconds(raw))
}

/// Normalize an epoch timestamp that may be in milliseconds to seconds.
pub fn epoch_seconds(raw: i64) -> i64 {
    if raw > MILLIS_THRESHOLD {
        raw / 1000
    } else {
        raw
    }
}

/// Whether the claims describe a token that is usable right now.
///
/// Fails closed: no expiry, an unparseable expiry, or `now >= exp` all yield
/// `false`. There is no clock-skew allowance.
pub fn is_valid(claims: &DecodedClaims, clock: &dyn Clock) -> bool {
    let now = clock.now().timestamp();

    let Some(exp) = expiry_seconds(claims) else {
        debug!("token has no usable expiry");
        return false;
    };
    if now >= exp {
        debug!(exp, now, "token expired");
        return false;
    }
    if let Some(nbf) = claims.not_before.map(epoch_seconds) {
        if now < nbf {
            debug!(nbf, now, "token not yet valid");
            return false;
        }
    }
    true
}

/// Decode and validate `token` in one step.
pub fn token_status(token: Option<&str>, clock: &dyn Clock) -> TokenStatus {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        return TokenStatus::Absent;
    };

    match decode_claims(token) {
        Ok(claims) if is_valid(&claims, clock) => TokenStatus::Valid(claims),
        Ok(claims) => TokenStatus::Expired(claims),
        Err(e) => {
            debug!(error = %e, "token failed to decode");
            TokenStatus::Malformed
        }
    }
}

/// Shorthand for `token_status(token, clock).is_valid()`.
pub fn is_token_valid_at(token: Option<&str>, clock: &dyn Clock) -> bool {
    token_status(token, clock).is_valid()
}
