//! Dual-scheme bearer credential verification.
//!
//! Tokens minted by the legacy CMS and by the current platform are both accepted and
//! normalized into a single [`NormalizedClaim`] at the boundary; nothing downstream branches on
//! the scheme again.

mod claims;
mod extract;
mod verifier;

pub use claims::{CredentialScheme, NormalizedClaim};
pub use extract::{bearer_token, session_router, AuthRejection, Authenticated};
pub use verifier::{
    Clock, CredentialVerifier, FailureReason, FixedClock, SystemClock, VerificationFailure,
};
