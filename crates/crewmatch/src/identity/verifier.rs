use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use super::claims::{LegacyClaims, NativeClaims, NormalizedClaim, VerifiedToken};
use crate::config::AuthConfig;

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why a credential was rejected. Only ever logged, never returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureReason {
    Missing,
    Malformed,
    BadSignature,
    MissingExpiry,
    UnusableSubject,
    NotYetValid,
    Expired,
}

/// Rejected credential. Displays identically whatever the reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not authenticated")]
pub struct VerificationFailure {
    reason: FailureReason,
}

impl VerificationFailure {
    pub fn reason(&self) -> FailureReason {
        self.reason
    }
}

/// Accepts bearer tokens minted by either the native platform or the legacy CMS.
pub struct CredentialVerifier {
    native_key: DecodingKey,
    legacy_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    pub fn new(native_secret: &[u8], legacy_secret: &[u8]) -> Self {
        // Expiry is checked against our own clock so both schemes share one leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            native_key: DecodingKey::from_secret(native_secret),
            legacy_key: DecodingKey::from_secret(legacy_secret),
            validation,
            leeway_seconds: 0,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.native_secret.as_bytes(),
            config.legacy_secret.as_bytes(),
        )
        .with_leeway(config.leeway_seconds)
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verifies `token` against the native secret first, then the legacy secret.
    pub fn verify(&self, token: &str) -> Result<NormalizedClaim, VerificationFailure> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerificationFailure {
                reason: FailureReason::Missing,
            });
        }

        let native = match self.attempt(token, &self.native_key, |payload| {
            NativeClaims::from_payload(payload).map(VerifiedToken::Native)
        }) {
            Ok(verified) => return Ok(verified.normalize()),
            Err(reason) => reason,
        };

        let legacy = match self.attempt(token, &self.legacy_key, |payload| {
            LegacyClaims::from_payload(payload).map(VerifiedToken::Legacy)
        }) {
            Ok(verified) => return Ok(verified.normalize()),
            Err(reason) => reason,
        };

        Err(VerificationFailure {
            reason: native.max(legacy),
        })
    }

    fn attempt<F>(
        &self,
        token: &str,
        key: &DecodingKey,
        extract: F,
    ) -> Result<VerifiedToken, FailureReason>
    where
        F: FnOnce(&Value) -> Option<VerifiedToken>,
    {
        let payload = decode::<Value>(token, key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    FailureReason::BadSignature
                }
                _ => FailureReason::Malformed,
            })?
            .claims;

        self.check_lifetime(&payload)?;
        extract(&payload).ok_or(FailureReason::UnusableSubject)
    }

    fn check_lifetime(&self, payload: &Value) -> Result<(), FailureReason> {
        let now = self.clock.now().timestamp();
        let expires_at = payload
            .get("exp")
            .and_then(epoch_seconds)
            .ok_or(FailureReason::MissingExpiry)?;
        if now > expires_at.saturating_add(self.leeway_seconds) {
            return Err(FailureReason::Expired);
        }

        if let Some(not_before) = payload.get("nbf").and_then(epoch_seconds) {
            if now.saturating_add(self.leeway_seconds) < not_before {
                return Err(FailureReason::NotYetValid);
            }
        }

        Ok(())
    }
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|seconds| seconds as i64)),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}
