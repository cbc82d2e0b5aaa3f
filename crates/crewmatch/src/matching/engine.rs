use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use super::distance::GeoPoint;
use crate::directory::{
    Account, AccountRole, AccountStatus, LegacyId, NativeId, RequiredSkills, SkillAssignment,
};

/// Distance between candidate and opening, or `Unknown` when either side has no location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Km(f64),
    Unknown,
}

impl Distance {
    pub fn km(&self) -> Option<f64> {
        match self {
            Distance::Km(km) => Some(*km),
            Distance::Unknown => None,
        }
    }
}

impl Serialize for Distance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Distance::Km(km) => serializer.serialize_f64(*km),
            Distance::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// One eligible candidate, carrying both id forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    pub id: NativeId,
    pub legacy_id: Option<LegacyId>,
    pub display_name: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    #[serde(rename = "distanceKm")]
    pub distance: Distance,
    pub within_radius: Option<bool>,
    pub skill_overlap: bool,
    pub matched_skills: Vec<String>,
}

/// Why a pooled candidate was left out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Exclusion {
    NoSkills,
    NoSkillOverlap,
    OutsideRadius { distance_km: f64 },
}

/// Inputs that stay fixed across the candidate pool for one request.
pub(crate) struct MatchCriteria<'a> {
    pub required: &'a RequiredSkills,
    pub opening_location: Option<GeoPoint>,
    pub radius_km: f64,
    pub strict_radius: bool,
}

pub(crate) fn evaluate_candidate(
    candidate: &Account,
    assignments: &[SkillAssignment],
    criteria: &MatchCriteria<'_>,
) -> Result<CandidateMatch, Exclusion> {
    if assignments.is_empty() {
        return Err(Exclusion::NoSkills);
    }

    let held: BTreeSet<&NativeId> = assignments
        .iter()
        .map(|assignment| &assignment.skill)
        .collect();
    let matched_skills: Vec<String> = criteria
        .required
        .skills
        .iter()
        .filter(|(id, _)| held.contains(id))
        .map(|(_, name)| name.clone())
        .collect();
    let skill_overlap = !matched_skills.is_empty();

    if !criteria.required.is_unrestricted() && !skill_overlap {
        return Err(Exclusion::NoSkillOverlap);
    }

    let distance = match (candidate.location, criteria.opening_location) {
        (Some(candidate_at), Some(opening_at)) => {
            Distance::Km(candidate_at.distance_km(&opening_at))
        }
        _ => Distance::Unknown,
    };
    let within_radius = distance.km().map(|km| km <= criteria.radius_km);

    if criteria.strict_radius && within_radius == Some(false) {
        return Err(Exclusion::OutsideRadius {
            distance_km: distance.km().unwrap_or_default(),
        });
    }

    Ok(CandidateMatch {
        id: candidate.id.clone(),
        legacy_id: candidate.legacy_id,
        display_name: candidate.display_name.clone(),
        role: candidate.role,
        status: candidate.status,
        distance,
        within_radius,
        skill_overlap,
        matched_skills,
    })
}

/// Nearest first, unknown distances last, ties by native id.
pub(crate) fn rank(matches: &mut [CandidateMatch]) {
    matches.sort_by(|left, right| {
        let by_distance = match (left.distance.km(), right.distance.km()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_distance.then_with(|| left.id.cmp(&right.id))
    });
}
