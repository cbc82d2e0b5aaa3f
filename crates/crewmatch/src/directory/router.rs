use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use super::domain::{
    Account, AccountRole, AccountStatus, EntityFamily, EntityIds, EntityRef, TaxonomyFamily,
    TaxonomyNode,
};
use super::repository::DirectoryStore;
use super::resolver::{IdentifierResolver, ResolveError};
use crate::error::{integrity_fault, retryable_unavailable};
use crate::identity::Authenticated;
use crate::matching::GeoPoint;

/// Account as exposed to API clients, carrying both id forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub ids: EntityIds,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub display_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub children: Vec<EntityIds>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            ids: account.ids(),
            role: account.role,
            status: account.status,
            display_name: account.display_name,
            email: account.email,
            phone: account.phone,
            location: account.location,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyNodeView {
    #[serde(flatten)]
    pub ids: EntityIds,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityIds>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyLookupView {
    #[serde(flatten)]
    pub node: TaxonomyNodeView,
    pub children: Vec<TaxonomyNodeView>,
}

/// Router exposing id lookups for accounts and both taxonomies.
pub fn directory_router<S>(resolver: Arc<IdentifierResolver<S>>) -> Router
where
    S: DirectoryStore + 'static,
{
    Router::new()
        .route("/api/v1/accounts/:reference", get(account_handler::<S>))
        .route("/api/v1/skills/:reference", get(skill_handler::<S>))
        .route("/api/v1/equipment/:reference", get(equipment_handler::<S>))
        .with_state(resolver)
}

pub(crate) async fn account_handler<S>(
    State(resolver): State<Arc<IdentifierResolver<S>>>,
    _caller: Authenticated,
    Path(reference): Path<String>,
) -> Response
where
    S: DirectoryStore + 'static,
{
    let Some(parsed) = EntityRef::parse(&reference) else {
        return not_found(EntityFamily::Account);
    };

    match resolver.account(&parsed).await {
        Ok(account) => (StatusCode::OK, Json(AccountView::from(account))).into_response(),
        Err(err) => resolve_error_response(err),
    }
}

pub(crate) async fn skill_handler<S>(
    State(resolver): State<Arc<IdentifierResolver<S>>>,
    _caller: Authenticated,
    Path(reference): Path<String>,
) -> Response
where
    S: DirectoryStore + 'static,
{
    taxonomy_lookup(&resolver, TaxonomyFamily::Skill, &reference).await
}

pub(crate) async fn equipment_handler<S>(
    State(resolver): State<Arc<IdentifierResolver<S>>>,
    _caller: Authenticated,
    Path(reference): Path<String>,
) -> Response
where
    S: DirectoryStore + 'static,
{
    taxonomy_lookup(&resolver, TaxonomyFamily::Equipment, &reference).await
}

async fn taxonomy_lookup<S>(
    resolver: &IdentifierResolver<S>,
    family: TaxonomyFamily,
    reference: &str,
) -> Response
where
    S: DirectoryStore + 'static,
{
    let Some(parsed) = EntityRef::parse(reference) else {
        return not_found(family.into());
    };

    let node = match resolver.node(family, &parsed).await {
        Ok(node) => node,
        Err(err) => return resolve_error_response(err),
    };
    let parent = match parent_view(resolver, &node).await {
        Ok(parent) => parent,
        Err(err) => return resolve_error_response(err),
    };
    let children = match resolver.children_of(&node).await {
        Ok(children) => children,
        Err(err) => return resolve_error_response(err),
    };

    let own_ids = node.ids();
    let view = TaxonomyLookupView {
        node: node_view(node, parent),
        children: children
            .into_iter()
            .map(|child| node_view(child, Some(own_ids.clone())))
            .collect(),
    };
    (StatusCode::OK, Json(view)).into_response()
}

async fn parent_view<S>(
    resolver: &IdentifierResolver<S>,
    node: &TaxonomyNode,
) -> Result<Option<EntityIds>, ResolveError>
where
    S: DirectoryStore + 'static,
{
    let reference = match (&node.parent, node.legacy_parent) {
        (Some(native), _) => EntityRef::Native(native.clone()),
        (None, Some(legacy)) => EntityRef::Legacy(legacy),
        (None, None) => return Ok(None),
    };
    let parent = resolver.node(node.family, &reference).await?;
    Ok(Some(parent.ids()))
}

fn node_view(node: TaxonomyNode, parent: Option<EntityIds>) -> TaxonomyNodeView {
    TaxonomyNodeView {
        ids: node.ids(),
        name: node.name,
        category: node.category,
        parent,
    }
}

fn not_found(family: EntityFamily) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{family} not found") })),
    )
        .into_response()
}

/// Maps resolver failures onto HTTP responses; storage faults are retryable.
pub(crate) fn resolve_error_response(err: ResolveError) -> Response {
    match err {
        ResolveError::NotFound { family, .. } => not_found(family),
        ResolveError::Storage(err) => {
            warn!(error = %err, "directory lookup hit a storage fault");
            retryable_unavailable()
        }
        ResolveError::InconsistentTaxonomy { .. } => {
            error!(error = %err, "directory lookup hit a taxonomy integrity fault");
            integrity_fault()
        }
    }
}
