use async_trait::async_trait;

use super::domain::{
    Account, LegacyId, NativeId, Opening, SkillAssignment, TaxonomyFamily, TaxonomyNode,
};

/// Failure of the backing store to answer. Never used to signal a missing entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("directory store unavailable: {0}")]
    Unavailable(String),
    #[error("directory store timed out")]
    Timeout,
    #[error("directory store returned corrupt data: {0}")]
    Corrupt(String),
}

/// Read access to account storage.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn account(&self, id: &NativeId) -> Result<Option<Account>, StoreError>;
    async fn account_id_for_legacy(&self, legacy: LegacyId)
        -> Result<Option<NativeId>, StoreError>;
    /// Accounts with role candidate and status active.
    async fn candidate_pool(&self) -> Result<Vec<Account>, StoreError>;
}

/// Read access to the skill and equipment taxonomies.
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    async fn node(
        &self,
        family: TaxonomyFamily,
        id: &NativeId,
    ) -> Result<Option<TaxonomyNode>, StoreError>;
    async fn node_id_for_legacy(
        &self,
        family: TaxonomyFamily,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError>;
    /// Nodes whose declared parent is `parent` (by native id) or `legacy_parent`.
    async fn nodes_with_parent(
        &self,
        family: TaxonomyFamily,
        parent: &NativeId,
        legacy_parent: Option<LegacyId>,
    ) -> Result<Vec<TaxonomyNode>, StoreError>;
}

#[async_trait]
pub trait OpeningRepository: Send + Sync {
    async fn opening(&self, id: &NativeId) -> Result<Option<Opening>, StoreError>;
    async fn opening_id_for_legacy(&self, legacy: LegacyId)
        -> Result<Option<NativeId>, StoreError>;
}

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn skill_assignments(&self, account: &NativeId)
        -> Result<Vec<SkillAssignment>, StoreError>;
}

/// Everything the resolver and matcher read, combined.
pub trait DirectoryStore:
    AccountRepository + TaxonomyRepository + OpeningRepository + AssignmentRepository
{
}

impl<T> DirectoryStore for T where
    T: AccountRepository + TaxonomyRepository + OpeningRepository + AssignmentRepository
{
}
