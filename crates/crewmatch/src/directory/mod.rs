//! Entity lookup across the legacy numeric id space and the native id space.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod resolver;
pub mod router;

pub use domain::{
    Account, AccountRole, AccountStatus, EntityFamily, EntityIds, EntityRef, LegacyId, NativeId,
    Opening, OpeningStatus, SkillAssignment, TaxonomyFamily, TaxonomyNode,
};
pub use memory::{DirectorySnapshot, InMemoryDirectory, SnapshotError};
pub use repository::{
    AccountRepository, AssignmentRepository, DirectoryStore, OpeningRepository, StoreError,
    TaxonomyRepository,
};
pub use resolver::{IdentifierResolver, RequiredSkills, ResolveError};
pub use router::directory_router;
