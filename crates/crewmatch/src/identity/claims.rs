use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::directory::AccountRole;

/// Which issuer produced a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    Legacy,
    Native,
}

impl CredentialScheme {
    pub const fn label(self) -> &'static str {
        match self {
            CredentialScheme::Legacy => "legacy",
            CredentialScheme::Native => "native",
        }
    }
}

/// Request-scoped identity produced by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedClaim {
    pub subject_id: String,
    pub subject_email: Option<String>,
    pub subject_role: String,
    pub scheme: CredentialScheme,
}

impl NormalizedClaim {
    /// Account role named by the claim, falling back to the lowest-privilege role for names
    /// neither issuer documents.
    pub fn account_role(&self) -> AccountRole {
        AccountRole::from_role_name(&self.subject_role).unwrap_or(AccountRole::LOWEST_PRIVILEGE)
    }
}

/// Payload minted by the current platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NativeClaims {
    pub subject_id: String,
    pub subject_email: String,
    pub subject_role: String,
}

impl NativeClaims {
    pub(crate) fn from_payload(payload: &Value) -> Option<Self> {
        let claims = NativeClaims::deserialize(payload).ok()?;
        if claims.subject_id.trim().is_empty() {
            return None;
        }
        Some(claims)
    }
}

/// Subject extracted from a legacy CMS payload, in either of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LegacyClaims {
    pub subject_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl LegacyClaims {
    /// Tries `data.user.{id,user_email,roles}` first, then the flat
    /// `user_id|userId` / `user_email|email` form.
    pub(crate) fn from_payload(payload: &Value) -> Option<Self> {
        Self::nested(payload).or_else(|| Self::flat(payload))
    }

    fn nested(payload: &Value) -> Option<Self> {
        let user = payload.pointer("/data/user")?;
        let subject_id = user.get("id").and_then(subject_id)?;
        Some(Self {
            subject_id,
            email: user.get("user_email").and_then(non_empty_str),
            role: user.get("roles").and_then(first_role),
        })
    }

    fn flat(payload: &Value) -> Option<Self> {
        let subject_id = ["user_id", "userId"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(subject_id))?;
        let email = ["user_email", "email"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(non_empty_str));
        let role = ["role", "roles"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(first_role));
        Some(Self {
            subject_id,
            email,
            role,
        })
    }
}

/// Outcome of a successful signature check, before normalization.
#[derive(Debug, Clone)]
pub(crate) enum VerifiedToken {
    Native(NativeClaims),
    Legacy(LegacyClaims),
}

impl VerifiedToken {
    pub(crate) fn normalize(self) -> NormalizedClaim {
        match self {
            VerifiedToken::Native(claims) => NormalizedClaim {
                subject_id: claims.subject_id,
                subject_email: Some(claims.subject_email),
                subject_role: claims.subject_role,
                scheme: CredentialScheme::Native,
            },
            VerifiedToken::Legacy(claims) => NormalizedClaim {
                subject_id: claims.subject_id,
                subject_email: claims.email,
                subject_role: claims
                    .role
                    .unwrap_or_else(|| AccountRole::LOWEST_PRIVILEGE.label().to_string()),
                scheme: CredentialScheme::Legacy,
            },
        }
    }
}

/// Legacy ids arrive as numbers or numeric strings; zero means "no user".
fn subject_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .filter(|id| *id > 0)
            .map(|id| id.to_string()),
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty() && trimmed != "0").then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

fn first_role(value: &Value) -> Option<String> {
    match value {
        Value::Array(roles) => roles.iter().find_map(non_empty_str),
        Value::String(_) => non_empty_str(value),
        // Some exports serialize roles as {"0": "employer"}.
        Value::Object(map) => map.values().find_map(non_empty_str),
        _ => None,
    }
}
