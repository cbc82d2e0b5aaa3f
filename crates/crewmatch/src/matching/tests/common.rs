use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use axum::{Extension, Router};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::directory::{
    Account, AccountRepository, AssignmentRepository, InMemoryDirectory, LegacyId, NativeId,
    Opening, OpeningRepository, SkillAssignment, StoreError, TaxonomyFamily, TaxonomyNode,
    TaxonomyRepository,
};
use crate::identity::{CredentialVerifier, FixedClock};
use crate::matching::{matching_router, CandidateMatcher, MatchPolicy};

pub(super) const NATIVE_SECRET: &[u8] = b"native-test-secret";
pub(super) const LEGACY_SECRET: &[u8] = b"legacy-test-secret";

pub(super) const SYDNEY: (f64, f64) = (-33.8688, 151.2093);
pub(super) const PARRAMATTA: (f64, f64) = (-33.8150, 151.0011);
pub(super) const MELBOURNE: (f64, f64) = (-37.8136, 144.9631);

/// Two skill categories, five candidates and a handful of openings that exercise both id spaces.
pub(super) fn snapshot() -> Value {
    json!({
        "accounts": [
            { "id": "acct-poster", "legacy_id": 100, "role": "poster", "status": "active",
              "display_name": "Harbour Productions", "email": "jobs@harbour.test" },
            { "id": "cand-a", "legacy_id": 201, "role": "candidate", "status": "active",
              "display_name": "Ari", "email": "ari@crew.test" },
            { "id": "cand-b", "legacy_id": 202, "role": "candidate", "status": "active",
              "display_name": "Bea", "email": "bea@crew.test",
              "location": { "lat": PARRAMATTA.0, "lng": PARRAMATTA.1 } },
            { "id": "cand-c", "legacy_id": 203, "role": "candidate", "status": "active",
              "display_name": "Cal", "email": "cal@crew.test",
              "location": { "lat": SYDNEY.0, "lng": SYDNEY.1 } },
            { "id": "cand-d", "role": "candidate", "status": "active",
              "display_name": "Dev", "email": "dev@crew.test",
              "location": { "lat": MELBOURNE.0, "lng": MELBOURNE.1 } },
            { "id": "cand-e", "legacy_id": 205, "role": "candidate", "status": "active",
              "display_name": "Eli", "email": "eli@crew.test",
              "location": { "lat": SYDNEY.0, "lng": SYDNEY.1 } },
            { "id": "cand-f", "legacy_id": 206, "role": "candidate", "status": "suspended",
              "display_name": "Fen", "email": "fen@crew.test",
              "location": { "lat": SYDNEY.0, "lng": SYDNEY.1 } }
        ],
        "taxonomy": [
            { "family": "skill", "id": "cat-audio", "legacy_id": 10, "name": "Audio", "category": "Audio" },
            { "family": "skill", "id": "sk-mic", "legacy_id": 11, "name": "Microphones",
              "category": "Audio", "legacy_parent": 10 },
            { "family": "skill", "id": "sk-mix", "name": "Mixing Boards",
              "category": "Audio", "parent": "cat-audio" },
            { "family": "skill", "id": "cat-video", "legacy_id": 20, "name": "Video", "category": "Video" },
            { "family": "skill", "id": "sk-edit", "legacy_id": 21, "name": "Video Editing",
              "category": "Video", "parent": "cat-video", "legacy_parent": 20 }
        ],
        "assignments": [
            { "account": "cand-a", "skill": "sk-mic", "proficiency": "expert" },
            { "account": "cand-a", "skill": "sk-mix" },
            { "account": "cand-b", "skill": "sk-edit", "years_experience": 4 },
            { "account": "cand-c", "skill": "sk-mic" },
            { "account": "cand-d", "skill": "sk-mic" },
            { "account": "cand-f", "skill": "sk-mic" }
        ],
        "openings": [
            { "id": "op-sound", "legacy_id": 500, "title": "Sound recordist", "poster": "acct-poster",
              "required_skills": [11], "location": { "lat": SYDNEY.0, "lng": SYDNEY.1 },
              "status": "open" },
            { "id": "op-roaming", "legacy_id": 501, "title": "Roaming boom operator",
              "poster": "acct-poster", "required_skills": ["sk-mic"], "status": "open" },
            { "id": "op-runner", "legacy_id": 502, "title": "Set runner", "poster": "acct-poster",
              "location": format!("{},{}", SYDNEY.0, SYDNEY.1), "status": "open" },
            { "id": "op-audio", "legacy_id": 503, "title": "Audio crew", "poster": "acct-poster",
              "required_skills": ["cat-audio"], "location": { "lat": SYDNEY.0, "lng": SYDNEY.1 },
              "status": "open" },
            { "id": "op-ghost", "legacy_id": 504, "title": "Retired brief", "poster": "acct-poster",
              "required_skills": [999, "sk-gone"], "status": "open" }
        ]
    })
}

pub(super) fn directory() -> Arc<InMemoryDirectory> {
    Arc::new(InMemoryDirectory::from_json_str(&snapshot().to_string()).expect("seed loads"))
}

pub(super) fn matcher(policy: MatchPolicy) -> CandidateMatcher<InMemoryDirectory> {
    CandidateMatcher::new(directory(), policy)
}

pub(super) fn ids(report: &crate::matching::MatchReport) -> Vec<&str> {
    report
        .candidates
        .iter()
        .map(|candidate| candidate.id.as_str())
        .collect()
}

pub(super) fn verifier() -> Arc<CredentialVerifier> {
    Arc::new(
        CredentialVerifier::new(NATIVE_SECRET, LEGACY_SECRET)
            .with_clock(Arc::new(FixedClock(Utc::now()))),
    )
}

pub(super) fn router_with<S>(store: Arc<S>, timeout: Duration) -> Router
where
    S: crate::directory::DirectoryStore + 'static,
{
    let matcher = Arc::new(CandidateMatcher::new(store, MatchPolicy::default()));
    matching_router(matcher, timeout).layer(Extension(verifier()))
}

pub(super) fn native_token(role: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "exp": Utc::now().timestamp() + 600,
            "subjectId": "acct-poster",
            "subjectEmail": "jobs@harbour.test",
            "subjectRole": role
        }),
        &EncodingKey::from_secret(NATIVE_SECRET),
    )
    .expect("native token")
}

pub(super) fn legacy_token(user_id: u64, roles: &[&str]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "exp": Utc::now().timestamp() + 600,
            "data": { "user": { "id": user_id, "user_email": "legacy@crew.test", "roles": roles } }
        }),
        &EncodingKey::from_secret(LEGACY_SECRET),
    )
    .expect("legacy token")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Debug, Clone, Copy)]
pub(super) enum PoolFault {
    Unavailable,
    Stalled,
}

/// Serves everything from the seed except the candidate pool.
pub(super) struct FaultyPool {
    pub(super) inner: Arc<InMemoryDirectory>,
    pub(super) fault: PoolFault,
}

impl FaultyPool {
    pub(super) fn new(fault: PoolFault) -> Self {
        Self {
            inner: directory(),
            fault,
        }
    }
}

#[async_trait]
impl AccountRepository for FaultyPool {
    async fn account(&self, id: &NativeId) -> Result<Option<Account>, StoreError> {
        self.inner.account(id).await
    }

    async fn account_id_for_legacy(
        &self,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        self.inner.account_id_for_legacy(legacy).await
    }

    async fn candidate_pool(&self) -> Result<Vec<Account>, StoreError> {
        match self.fault {
            PoolFault::Unavailable => Err(StoreError::Unavailable("replica offline".to_string())),
            PoolFault::Stalled => std::future::pending().await,
        }
    }
}

#[async_trait]
impl TaxonomyRepository for FaultyPool {
    async fn node(
        &self,
        family: TaxonomyFamily,
        id: &NativeId,
    ) -> Result<Option<TaxonomyNode>, StoreError> {
        self.inner.node(family, id).await
    }

    async fn node_id_for_legacy(
        &self,
        family: TaxonomyFamily,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        self.inner.node_id_for_legacy(family, legacy).await
    }

    async fn nodes_with_parent(
        &self,
        family: TaxonomyFamily,
        parent: &NativeId,
        legacy_parent: Option<LegacyId>,
    ) -> Result<Vec<TaxonomyNode>, StoreError> {
        self.inner
            .nodes_with_parent(family, parent, legacy_parent)
            .await
    }
}

#[async_trait]
impl OpeningRepository for FaultyPool {
    async fn opening(&self, id: &NativeId) -> Result<Option<Opening>, StoreError> {
        self.inner.opening(id).await
    }

    async fn opening_id_for_legacy(
        &self,
        legacy: LegacyId,
    ) -> Result<Option<NativeId>, StoreError> {
        self.inner.opening_id_for_legacy(legacy).await
    }
}

#[async_trait]
impl AssignmentRepository for FaultyPool {
    async fn skill_assignments(
        &self,
        account: &NativeId,
    ) -> Result<Vec<SkillAssignment>, StoreError> {
        self.inner.skill_assignments(account).await
    }
}
