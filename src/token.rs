//! Best-effort reading of JWT payloads.
//!
//! The signature is never checked: the expiry read here only decides
//! whether the client should bother sending the token. The backend stays
//! the authority on whether a token is accepted.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Result, StorefrontError};

/// Base64url decoder that accepts payloads with or without padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The registered claims the client cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<f64>,
    /// Issue time as seconds since the Unix epoch.
    #[serde(default)]
    pub iat: Option<f64>,
    /// Subject, usually the user id.
    #[serde(default)]
    pub sub: Option<String>,
}

impl TokenClaims {
    /// Returns `true` if the token expired strictly before `now`.
    ///
    /// A token without an `exp` claim never expires on the client.
    #[inline]
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let now_secs = unix_seconds(now);
        self.exp.is_some_and(|exp| exp < now_secs)
    }
}

/// Seconds since the epoch with millisecond precision, built from
/// 32-bit halves so the conversion to `f64` is exact.
fn unix_seconds(now: DateTime<Utc>) -> f64 {
    let secs = now.timestamp();
    let high = i32::try_from(secs >> 32_i32).unwrap_or_default();
    let low = u32::try_from(secs & 0xFFFF_FFFF_i64).unwrap_or_default();
    let millis = now.timestamp_subsec_millis();
    f64::from(high).mul_add(
        2.0_f64.powi(32_i32),
        f64::from(low) + f64::from(millis) / 1000.0_f64,
    )
}

/// Outcome of a client-side token check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidity {
    /// Decodable and not yet expired.
    Valid,
    /// Decodable but past its `exp`.
    Expired,
    /// Not a readable JWT.
    Malformed,
    /// No token held.
    Missing,
}

impl TokenValidity {
    /// Returns `true` only for [`TokenValidity::Valid`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Decodes the payload segment of a JWT.
///
/// # Errors
///
/// Returns [`StorefrontError::TokenDecode`] if the token does not have a
/// base64url payload segment holding a JSON object.
#[inline]
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| StorefrontError::TokenDecode("missing payload segment".to_owned()))?;
    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|err| StorefrontError::TokenDecode(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| StorefrontError::TokenDecode(err.to_string()))
}

/// Classifies `token` against the current time.
#[inline]
#[must_use]
pub fn check(token: &str, now: DateTime<Utc>) -> TokenValidity {
    match decode_claims(token) {
        Ok(claims) if claims.is_expired_at(now) => TokenValidity::Expired,
        Ok(_) => TokenValidity::Valid,
        Err(err) => {
            tracing::debug!(error = %err, "token payload unreadable");
            TokenValidity::Malformed
        }
    }
}
