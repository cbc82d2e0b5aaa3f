use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::MatchPolicy;
use super::engine::{evaluate_candidate, rank, CandidateMatch, Exclusion, MatchCriteria};
use crate::directory::{
    DirectoryStore, EntityIds, EntityRef, IdentifierResolver, ResolveError, StoreError,
};

/// Candidates for one opening plus the parameters that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub opening: EntityIds,
    pub radius_km: f64,
    pub strict_radius: bool,
    pub opening_located: bool,
    pub unresolved_requirements: Vec<EntityRef>,
    pub candidates: Vec<CandidateMatch>,
}

/// Error raised by the candidate matcher.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("opening {0} not found")]
    OpeningNotFound(EntityRef),
    #[error("maximum distance must be a non-negative number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Directory(ResolveError),
}

impl From<ResolveError> for MatchError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::Storage(err) => MatchError::Storage(err),
            other => MatchError::Directory(other),
        }
    }
}

/// Selects eligible candidates for an opening by skill overlap and distance.
pub struct CandidateMatcher<S> {
    resolver: IdentifierResolver<S>,
    policy: MatchPolicy,
}

impl<S> CandidateMatcher<S>
where
    S: DirectoryStore + 'static,
{
    pub fn new(store: Arc<S>, policy: MatchPolicy) -> Self {
        Self::with_resolver(IdentifierResolver::new(store), policy)
    }

    pub fn with_resolver(resolver: IdentifierResolver<S>, policy: MatchPolicy) -> Self {
        Self { resolver, policy }
    }

    /// Match the candidate pool against `opening`. `max_distance_km` overrides the configured
    /// default radius.
    pub async fn match_candidates(
        &self,
        opening: &EntityRef,
        max_distance_km: Option<f64>,
    ) -> Result<MatchReport, MatchError> {
        let radius_km = match max_distance_km {
            Some(km) if !km.is_finite() || km < 0.0 => return Err(MatchError::InvalidRadius(km)),
            Some(km) => km,
            None => self.policy.default_radius_km,
        };

        let opening = self.resolver.opening(opening).await.map_err(|err| match err {
            ResolveError::NotFound { reference, .. } => MatchError::OpeningNotFound(reference),
            other => MatchError::from(other),
        })?;

        let required = self
            .resolver
            .expand_requirements(&opening.required_skills)
            .await?;
        let opening_location = opening.geolocation();
        let criteria = MatchCriteria {
            required: &required,
            opening_location,
            radius_km,
            strict_radius: self.policy.strict_radius,
        };

        let store = self.resolver.store();
        let pool = store.candidate_pool().await.map_err(|err| {
            warn!(opening = %opening.id, error = %err, "candidate pool read failed");
            err
        })?;

        let mut candidates = Vec::new();
        for candidate in &pool {
            let assignments = store.skill_assignments(&candidate.id).await?;
            match evaluate_candidate(candidate, &assignments, &criteria) {
                Ok(matched) => candidates.push(matched),
                Err(Exclusion::OutsideRadius { distance_km }) => {
                    debug!(candidate = %candidate.id, distance_km, "outside strict radius");
                }
                Err(reason) => {
                    debug!(candidate = %candidate.id, ?reason, "candidate excluded");
                }
            }
        }
        rank(&mut candidates);

        info!(
            opening = %opening.id,
            pool = pool.len(),
            matched = candidates.len(),
            radius_km,
            strict = self.policy.strict_radius,
            "candidate match complete"
        );

        Ok(MatchReport {
            opening: opening.ids(),
            radius_km,
            strict_radius: self.policy.strict_radius,
            opening_located: opening_location.is_some(),
            unresolved_requirements: required.unresolved,
            candidates,
        })
    }
}
