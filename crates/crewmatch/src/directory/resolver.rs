use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, warn};

use super::domain::{
    Account, EntityFamily, EntityRef, LegacyId, NativeId, Opening, TaxonomyFamily, TaxonomyNode,
};
use super::repository::{DirectoryStore, StoreError};

/// Resolution failure. `NotFound` is an ordinary miss; the other variants are faults.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{family} {reference} not found")]
    NotFound {
        family: EntityFamily,
        reference: EntityRef,
    },
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("inconsistent {family} taxonomy at '{node}': {detail}")]
    InconsistentTaxonomy {
        family: EntityFamily,
        node: NativeId,
        detail: String,
    },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }

    fn not_found(family: EntityFamily, reference: EntityRef) -> Self {
        ResolveError::NotFound { family, reference }
    }

    fn inconsistent(node: &TaxonomyNode, detail: String) -> Self {
        error!(
            family = node.family.label(),
            node = %node.id,
            %detail,
            "taxonomy disagrees between legacy and native id spaces"
        );
        ResolveError::InconsistentTaxonomy {
            family: node.family.into(),
            node: node.id.clone(),
            detail,
        }
    }
}

/// Skills an opening requires, expanded to canonical nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequiredSkills {
    /// Whether the opening declared any requirement at all.
    pub declared: bool,
    /// Canonical skill id to display name.
    pub skills: BTreeMap<NativeId, String>,
    pub unresolved: Vec<EntityRef>,
}

impl RequiredSkills {
    pub fn is_unrestricted(&self) -> bool {
        !self.declared
    }
}

/// Looks entities up by native or legacy id. All traversal happens in native-id space once the
/// entry point has been translated.
pub struct IdentifierResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for IdentifierResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> IdentifierResolver<S>
where
    S: DirectoryStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn account_by_native_id(&self, id: &NativeId) -> Result<Account, ResolveError> {
        self.store.account(id).await?.ok_or_else(|| {
            ResolveError::not_found(EntityFamily::Account, EntityRef::Native(id.clone()))
        })
    }

    pub async fn account_by_legacy_id(&self, legacy: LegacyId) -> Result<Account, ResolveError> {
        let reference = EntityRef::Legacy(legacy);
        let id = self
            .store
            .account_id_for_legacy(legacy)
            .await?
            .ok_or_else(|| ResolveError::not_found(EntityFamily::Account, reference.clone()))?;
        let account = self.store.account(&id).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("legacy account {legacy} maps to missing '{id}'"))
        })?;
        check_legacy_echo(EntityFamily::Account, legacy, account.legacy_id, &id)?;
        Ok(account)
    }

    pub async fn account(&self, reference: &EntityRef) -> Result<Account, ResolveError> {
        match reference {
            EntityRef::Native(id) => self.account_by_native_id(id).await,
            EntityRef::Legacy(legacy) => match self.account_by_legacy_id(*legacy).await {
                Err(err) if err.is_not_found() => self
                    .account_by_native_id(&digits_as_native(*legacy))
                    .await
                    .map_err(|err| restate_miss(err, EntityFamily::Account, reference)),
                other => other,
            },
        }
    }

    pub async fn opening_by_native_id(&self, id: &NativeId) -> Result<Opening, ResolveError> {
        self.store.opening(id).await?.ok_or_else(|| {
            ResolveError::not_found(EntityFamily::Opening, EntityRef::Native(id.clone()))
        })
    }

    pub async fn opening_by_legacy_id(&self, legacy: LegacyId) -> Result<Opening, ResolveError> {
        let reference = EntityRef::Legacy(legacy);
        let id = self
            .store
            .opening_id_for_legacy(legacy)
            .await?
            .ok_or_else(|| ResolveError::not_found(EntityFamily::Opening, reference.clone()))?;
        let opening = self.store.opening(&id).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("legacy opening {legacy} maps to missing '{id}'"))
        })?;
        check_legacy_echo(EntityFamily::Opening, legacy, opening.legacy_id, &id)?;
        Ok(opening)
    }

    pub async fn opening(&self, reference: &EntityRef) -> Result<Opening, ResolveError> {
        match reference {
            EntityRef::Native(id) => self.opening_by_native_id(id).await,
            EntityRef::Legacy(legacy) => match self.opening_by_legacy_id(*legacy).await {
                Err(err) if err.is_not_found() => self
                    .opening_by_native_id(&digits_as_native(*legacy))
                    .await
                    .map_err(|err| restate_miss(err, EntityFamily::Opening, reference)),
                other => other,
            },
        }
    }

    pub async fn node_by_native_id(
        &self,
        family: TaxonomyFamily,
        id: &NativeId,
    ) -> Result<TaxonomyNode, ResolveError> {
        let node = self.store.node(family, id).await?.ok_or_else(|| {
            ResolveError::not_found(family.into(), EntityRef::Native(id.clone()))
        })?;
        self.canonical_parent(&node).await?;
        Ok(node)
    }

    pub async fn node_by_legacy_id(
        &self,
        family: TaxonomyFamily,
        legacy: LegacyId,
    ) -> Result<TaxonomyNode, ResolveError> {
        let reference = EntityRef::Legacy(legacy);
        let id = self
            .store
            .node_id_for_legacy(family, legacy)
            .await?
            .ok_or_else(|| ResolveError::not_found(family.into(), reference.clone()))?;
        let node = self.store.node(family, &id).await?.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "legacy {} {legacy} maps to missing '{id}'",
                family.label()
            ))
        })?;
        check_legacy_echo(family.into(), legacy, node.legacy_id, &id)?;
        self.canonical_parent(&node).await?;
        Ok(node)
    }

    pub async fn node(
        &self,
        family: TaxonomyFamily,
        reference: &EntityRef,
    ) -> Result<TaxonomyNode, ResolveError> {
        match reference {
            EntityRef::Native(id) => self.node_by_native_id(family, id).await,
            EntityRef::Legacy(legacy) => match self.node_by_legacy_id(family, *legacy).await {
                Err(err) if err.is_not_found() => self
                    .node_by_native_id(family, &digits_as_native(*legacy))
                    .await
                    .map_err(|err| restate_miss(err, family.into(), reference)),
                other => other,
            },
        }
    }

    /// Children of `parent`, ordered by native id. The result does not depend on which id space
    /// was used to locate `parent`.
    pub async fn children_of(
        &self,
        parent: &TaxonomyNode,
    ) -> Result<Vec<TaxonomyNode>, ResolveError> {
        let mut children = self
            .store
            .nodes_with_parent(parent.family, &parent.id, parent.legacy_id)
            .await?;

        if !children.is_empty() && parent.has_declared_parent() {
            return Err(ResolveError::inconsistent(
                parent,
                format!(
                    "node has a parent and {} child node(s); taxonomy must be two levels",
                    children.len()
                ),
            ));
        }

        for child in &children {
            let canonical = self.canonical_parent(child).await?;
            if canonical.as_ref() != Some(&parent.id) {
                return Err(ResolveError::inconsistent(
                    child,
                    format!(
                        "listed under '{}' but its canonical parent is {:?}",
                        parent.id,
                        canonical.map(|id| id.0)
                    ),
                ));
            }
        }

        children.sort_by(|left, right| left.id.cmp(&right.id));
        children.dedup_by(|left, right| left.id == right.id);
        Ok(children)
    }

    /// Resolves an opening's requirement list. Category references expand to their child
    /// skills; references that no longer resolve are reported in `unresolved`.
    pub async fn expand_requirements(
        &self,
        references: &[EntityRef],
    ) -> Result<RequiredSkills, ResolveError> {
        let mut required = RequiredSkills {
            declared: !references.is_empty(),
            ..RequiredSkills::default()
        };

        for reference in references {
            let node = match self.node(TaxonomyFamily::Skill, reference).await {
                Ok(node) => node,
                Err(err) if err.is_not_found() => {
                    warn!(%reference, "required skill does not resolve in either id space");
                    required.unresolved.push(reference.clone());
                    continue;
                }
                Err(err) => return Err(err),
            };

            if !node.has_declared_parent() {
                for child in self.children_of(&node).await? {
                    required.skills.insert(child.id, child.name);
                }
            }
            required.skills.insert(node.id, node.name);
        }

        Ok(required)
    }

    /// Parent id agreed on by both id spaces, or an inconsistency error.
    async fn canonical_parent(
        &self,
        node: &TaxonomyNode,
    ) -> Result<Option<NativeId>, ResolveError> {
        let via_legacy = match node.legacy_parent {
            Some(legacy_parent) => {
                match self
                    .store
                    .node_id_for_legacy(node.family, legacy_parent)
                    .await?
                {
                    Some(id) => Some(id),
                    None => {
                        return Err(ResolveError::inconsistent(
                            node,
                            format!("legacy parent {legacy_parent} does not resolve"),
                        ))
                    }
                }
            }
            None => None,
        };

        if let Some(native) = &node.parent {
            if self.store.node(node.family, native).await?.is_none() {
                return Err(ResolveError::inconsistent(
                    node,
                    format!("native parent '{native}' does not resolve"),
                ));
            }
        }

        match (&node.parent, via_legacy) {
            (Some(native), Some(legacy)) if *native != legacy => Err(ResolveError::inconsistent(
                node,
                format!("native parent '{native}' disagrees with legacy parent '{legacy}'"),
            )),
            (Some(native), _) => Ok(Some(native.clone())),
            (None, legacy) => Ok(legacy),
        }
    }
}

fn digits_as_native(legacy: LegacyId) -> NativeId {
    NativeId(legacy.0.to_string())
}

fn restate_miss(err: ResolveError, family: EntityFamily, reference: &EntityRef) -> ResolveError {
    if err.is_not_found() {
        ResolveError::not_found(family, reference.clone())
    } else {
        err
    }
}

fn check_legacy_echo(
    family: EntityFamily,
    requested: LegacyId,
    stored: Option<LegacyId>,
    id: &NativeId,
) -> Result<(), StoreError> {
    if stored == Some(requested) {
        Ok(())
    } else {
        Err(StoreError::Corrupt(format!(
            "legacy {family} index maps {requested} to '{id}' which carries {stored:?}"
        )))
    }
}
