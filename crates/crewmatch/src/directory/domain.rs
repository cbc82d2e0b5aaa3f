use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matching::distance::GeoPoint;
use crate::matching::location::parse_location_blob;

/// Identifier assigned by the current data store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeId(pub String);

impl NativeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric identifier issued by the legacy content-management system. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LegacyId(pub u64);

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to an entity in either id space.
///
/// Deserializes from a JSON number (legacy) or a JSON string (native).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Legacy(LegacyId),
    Native(NativeId),
}

impl EntityRef {
    /// Interprets a path segment or CLI argument. All-digit positive values are legacy ids
    /// unless zero-padded, since a legacy id never renders with leading zeros.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if !trimmed.starts_with('0') && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            if let Ok(value) = trimmed.parse::<u64>() {
                if value > 0 {
                    return Some(Self::Legacy(LegacyId(value)));
                }
            }
        }
        Some(Self::Native(NativeId::new(trimmed)))
    }

    pub fn native(value: impl Into<String>) -> Self {
        Self::Native(NativeId::new(value))
    }

    pub fn legacy(value: u64) -> Self {
        Self::Legacy(LegacyId(value))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Legacy(id) => write!(f, "legacy:{id}"),
            EntityRef::Native(id) => write!(f, "native:{id}"),
        }
    }
}

/// Both id forms of an entity, so old and new clients can be served from one payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIds {
    pub id: NativeId,
    pub legacy_id: Option<LegacyId>,
}

/// Entity families addressable through the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFamily {
    Account,
    Skill,
    Equipment,
    Opening,
}

impl EntityFamily {
    pub const fn label(self) -> &'static str {
        match self {
            EntityFamily::Account => "account",
            EntityFamily::Skill => "skill",
            EntityFamily::Equipment => "equipment",
            EntityFamily::Opening => "opening",
        }
    }
}

impl fmt::Display for EntityFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two taxonomy trees share one node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyFamily {
    Skill,
    Equipment,
}

impl TaxonomyFamily {
    pub const fn label(self) -> &'static str {
        match self {
            TaxonomyFamily::Skill => "skill",
            TaxonomyFamily::Equipment => "equipment",
        }
    }
}

impl From<TaxonomyFamily> for EntityFamily {
    fn from(value: TaxonomyFamily) -> Self {
        match value {
            TaxonomyFamily::Skill => EntityFamily::Skill,
            TaxonomyFamily::Equipment => EntityFamily::Equipment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Candidate,
    Poster,
    Admin,
}

impl AccountRole {
    /// Role assumed when a credential does not state one.
    pub const LOWEST_PRIVILEGE: AccountRole = AccountRole::Candidate;

    pub const fn label(self) -> &'static str {
        match self {
            AccountRole::Candidate => "candidate",
            AccountRole::Poster => "poster",
            AccountRole::Admin => "admin",
        }
    }

    /// Maps role names from either credential generation onto the account role.
    pub fn from_role_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "candidate" | "talent" | "crew" | "subscriber" | "contributor" => {
                Some(AccountRole::Candidate)
            }
            "poster" | "employer" | "author" | "editor" => Some(AccountRole::Poster),
            "admin" | "administrator" => Some(AccountRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
}

/// Platform user as read from account storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: NativeId,
    #[serde(default)]
    pub legacy_id: Option<LegacyId>,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl Account {
    pub fn ids(&self) -> EntityIds {
        EntityIds {
            id: self.id.clone(),
            legacy_id: self.legacy_id,
        }
    }

    pub fn is_in_candidate_pool(&self) -> bool {
        self.role == AccountRole::Candidate && self.status == AccountStatus::Active
    }
}

/// Skill or equipment node. Category nodes have no parent; item nodes reference one category,
/// declared by native id, by legacy id, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub family: TaxonomyFamily,
    pub id: NativeId,
    #[serde(default)]
    pub legacy_id: Option<LegacyId>,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub parent: Option<NativeId>,
    #[serde(default)]
    pub legacy_parent: Option<LegacyId>,
}

impl TaxonomyNode {
    pub fn ids(&self) -> EntityIds {
        EntityIds {
            id: self.id.clone(),
            legacy_id: self.legacy_id,
        }
    }

    pub fn has_declared_parent(&self) -> bool {
        self.parent.is_some() || self.legacy_parent.is_some()
    }

    /// True when this node's parent link names `parent` in either id space.
    pub fn declares_parent(&self, parent: &TaxonomyNode) -> bool {
        self.parent.as_ref() == Some(&parent.id)
            || (self.legacy_parent.is_some() && self.legacy_parent == parent.legacy_id)
    }
}

/// Link between a candidate account and one skill node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillAssignment {
    pub account: NativeId,
    pub skill: NativeId,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default)]
    pub years_experience: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningStatus {
    Draft,
    Open,
    Filled,
    Closed,
}

/// Job posting. `location` is the raw blob saved by the posting form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: NativeId,
    #[serde(default)]
    pub legacy_id: Option<LegacyId>,
    pub title: String,
    pub poster: NativeId,
    #[serde(default)]
    pub required_skills: Vec<EntityRef>,
    #[serde(default)]
    pub location: Option<serde_json::Value>,
    pub status: OpeningStatus,
}

impl Opening {
    pub fn ids(&self) -> EntityIds {
        EntityIds {
            id: self.id.clone(),
            legacy_id: self.legacy_id,
        }
    }

    pub fn geolocation(&self) -> Option<GeoPoint> {
        self.location.as_ref().and_then(parse_location_blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_prefers_legacy_for_digits() {
        assert_eq!(EntityRef::parse("42"), Some(EntityRef::legacy(42)));
        assert_eq!(EntityRef::parse(" sk-mic "), Some(EntityRef::native("sk-mic")));
        assert_eq!(EntityRef::parse("0"), Some(EntityRef::native("0")));
        assert_eq!(EntityRef::parse("00123"), Some(EntityRef::native("00123")));
        assert_eq!(EntityRef::parse("   "), None);
    }

    #[test]
    fn entity_refs_deserialize_by_json_type() {
        let refs: Vec<EntityRef> = serde_json::from_value(json!([12, "sk-mic"])).expect("refs");
        assert_eq!(refs, vec![EntityRef::legacy(12), EntityRef::native("sk-mic")]);
    }

    #[test]
    fn role_aliases_cover_both_generations() {
        assert_eq!(AccountRole::from_role_name("employer"), Some(AccountRole::Poster));
        assert_eq!(
            AccountRole::from_role_name("Administrator"),
            Some(AccountRole::Admin)
        );
        assert_eq!(
            AccountRole::from_role_name("subscriber"),
            Some(AccountRole::Candidate)
        );
        assert_eq!(AccountRole::from_role_name("shop_manager"), None);
    }

    #[test]
    fn parent_link_matches_either_id_space() {
        let category = TaxonomyNode {
            family: TaxonomyFamily::Skill,
            id: NativeId::new("cat-audio"),
            legacy_id: Some(LegacyId(10)),
            name: "Audio".to_string(),
            category: "Audio".to_string(),
            parent: None,
            legacy_parent: None,
        };
        let by_legacy = TaxonomyNode {
            id: NativeId::new("sk-mic"),
            legacy_id: Some(LegacyId(11)),
            name: "Microphones".to_string(),
            legacy_parent: Some(LegacyId(10)),
            ..category.clone()
        };
        let by_native = TaxonomyNode {
            id: NativeId::new("sk-mix"),
            legacy_id: None,
            name: "Mixing Boards".to_string(),
            parent: Some(NativeId::new("cat-audio")),
            ..category.clone()
        };

        assert!(by_legacy.declares_parent(&category));
        assert!(by_native.declares_parent(&category));
        assert!(!category.declares_parent(&category));
    }
}
