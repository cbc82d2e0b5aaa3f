//! Arena-style in-process directory.
//!
//! Each family keeps one canonical map keyed by native id plus a legacy→native index. Taxonomy
//! children are indexed under the parent key they were declared with, so a lookup by either id
//! space reaches the same child set.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{
    Account, LegacyId, NativeId, Opening, SkillAssignment, TaxonomyFamily, TaxonomyNode,
};
use super::repository::{
    AccountRepository, AssignmentRepository, OpeningRepository, StoreError, TaxonomyRepository,
};

/// Serializable seed for [`InMemoryDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyNode>,
    #[serde(default)]
    pub assignments: Vec<SkillAssignment>,
    #[serde(default)]
    pub openings: Vec<Opening>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("unable to read directory snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {family} native id '{id}'")]
    DuplicateNativeId { family: &'static str, id: NativeId },
    #[error("duplicate {family} legacy id {id}")]
    DuplicateLegacyId { family: &'static str, id: LegacyId },
    #[error("duplicate skill assignment ({account}, {skill})")]
    DuplicateAssignment { account: NativeId, skill: NativeId },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ParentKey {
    Native(NativeId),
    Legacy(LegacyId),
}

#[derive(Debug)]
struct Arena<T> {
    by_native: BTreeMap<NativeId, T>,
    legacy_index: HashMap<LegacyId, NativeId>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            by_native: BTreeMap::new(),
            legacy_index: HashMap::new(),
        }
    }
}

impl<T> Arena<T> {
    fn insert(
        &mut self,
        family: &'static str,
        id: NativeId,
        legacy: Option<LegacyId>,
        value: T,
    ) -> Result<(), SnapshotError> {
        if self.by_native.contains_key(&id) {
            return Err(SnapshotError::DuplicateNativeId { family, id });
        }
        if let Some(legacy) = legacy {
            if self.legacy_index.contains_key(&legacy) {
                return Err(SnapshotError::DuplicateLegacyId { family, id: legacy });
            }
            self.legacy_index.insert(legacy, id.clone());
        }
        self.by_native.insert(id, value);
        Ok(())
    }

    fn get(&self, id: &NativeId) -> Option<&T> {
        self.by_native.get(id)
    }

    fn native_for(&self, legacy: LegacyId) -> Option<NativeId> {
        self.legacy_index.get(&legacy).cloned()
    }
}

#[derive(Debug, Default)]
struct TaxonomyArena {
    nodes: Arena<TaxonomyNode>,
    children: HashMap<ParentKey, Vec<NativeId>>,
}

/// In-memory [`DirectoryStore`](super::repository::DirectoryStore) built from a snapshot.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: Arena<Account>,
    skills: TaxonomyArena,
    equipment: TaxonomyArena,
    openings: Arena<Opening>,
    assignments: HashMap<NativeId, Vec<SkillAssignment>>,
}

impl InMemoryDirectory {
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self, SnapshotError> {
        let mut directory = Self::default();

        for account in snapshot.accounts {
            directory
                .accounts
                .insert("account", account.id.clone(), account.legacy_id, account)?;
        }

        for node in snapshot.taxonomy {
            let family = node.family.label();
            let arena = directory.taxonomy_mut(node.family);
            if let Some(parent) = &node.parent {
                arena
                    .children
                    .entry(ParentKey::Native(parent.clone()))
                    .or_default()
                    .push(node.id.clone());
            }
            if let Some(legacy_parent) = node.legacy_parent {
                arena
                    .children
                    .entry(ParentKey::Legacy(legacy_parent))
                    .or_default()
                    .push(node.id.clone());
            }
            arena
                .nodes
                .insert(family, node.id.clone(), node.legacy_id, node)?;
        }

        for opening in snapshot.openings {
            directory
                .openings
                .insert("opening", opening.id.clone(), opening.legacy_id, opening)?;
        }

        let mut seen = HashSet::new();
        for assignment in snapshot.assignments {
            if !seen.insert((assignment.account.clone(), assignment.skill.clone())) {
                return Err(SnapshotError::DuplicateAssignment {
                    account: assignment.account,
                    skill: assignment.skill,
                });
            }
            directory
                .assignments
                .entry(assignment.account.clone())
                .or_default()
                .push(assignment);
        }

        Ok(directory)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: DirectorySnapshot = serde_json::from_str(raw)?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.by_native.len()
    }

    pub fn opening_count(&self) -> usize {
        self.openings.by_native.len()
    }

    fn taxonomy(&self, family: TaxonomyFamily) -> &TaxonomyArena {
        match family {
            TaxonomyFamily::Skill => &self.skills,
            TaxonomyFamily::Equipment => &self.equipment,
        }
    }

    fn taxonomy_mut(&mut self, family: TaxonomyFamily) -> &mut TaxonomyArena {
        match family {
            TaxonomyFamily::Skill => &mut self.skills,
            TaxonomyFamily::Equipment => &mut self.equipment,
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryDirectory {
    async fn account(&self, id: &NativeId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).cloned())
    }

    async fn account_id_for_legacy(
        &self,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        Ok(self.accounts.native_for(legacy))
    }

    async fn candidate_pool(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .accounts
            .by_native
            .values()
            .filter(|account| account.is_in_candidate_pool())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaxonomyRepository for InMemoryDirectory {
    async fn node(
        &self,
        family: TaxonomyFamily,
        id: &NativeId,
    ) -> Result<Option<TaxonomyNode>, StoreError> {
        Ok(self.taxonomy(family).nodes.get(id).cloned())
    }

    async fn node_id_for_legacy(
        &self,
        family: TaxonomyFamily,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        Ok(self.taxonomy(family).nodes.native_for(legacy))
    }

    async fn nodes_with_parent(
        &self,
        family: TaxonomyFamily,
        parent: &NativeId,
        legacy_parent: Option<LegacyId>,
    ) -> Result<Vec<TaxonomyNode>, StoreError> {
        let arena = self.taxonomy(family);
        let mut keys = vec![ParentKey::Native(parent.clone())];
        if let Some(legacy) = legacy_parent {
            keys.push(ParentKey::Legacy(legacy));
        }

        let ids: HashSet<&NativeId> = keys
            .iter()
            .filter_map(|key| arena.children.get(key))
            .flatten()
            .collect();

        ids.into_iter()
            .map(|id| {
                arena.nodes.get(id).cloned().ok_or_else(|| {
                    StoreError::Corrupt(format!("child index references missing node '{id}'"))
                })
            })
            .collect()
    }
}

#[async_trait]
impl OpeningRepository for InMemoryDirectory {
    async fn opening(&self, id: &NativeId) -> Result<Option<Opening>, StoreError> {
        Ok(self.openings.get(id).cloned())
    }

    async fn opening_id_for_legacy(
        &self,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        Ok(self.openings.native_for(legacy))
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryDirectory {
    async fn skill_assignments(
        &self,
        account: &NativeId,
    ) -> Result<Vec<SkillAssignment>, StoreError> {
        Ok(self.assignments.get(account).cloned().unwrap_or_default())
    }
}
