use axum::Json;
use axum::extract::{Query, State};
use vic_api::ListTarget;

use crate::dto::{ListQueryParams, ListViewResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_hosts(
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<ListViewResponse>, ApiError> {
    refresh_list(&state, ListTarget::Hosts, params).await
}

pub async fn list_containers(
    State(state): State<AppState>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<ListViewResponse>, ApiError> {
    refresh_list(&state, ListTarget::Containers, params).await
}

pub async fn hosts_status(State(state): State<AppState>) -> Json<ListViewResponse> {
    Json(state.hosts.snapshot().into())
}

pub async fn containers_status(State(state): State<AppState>) -> Json<ListViewResponse> {
    Json(state.containers.snapshot().into())
}

/// Refreshes with the given parameters and renders the resulting snapshot.
/// Retrieval failures are part of the snapshot, not an error response.
async fn refresh_list(
    state: &AppState,
    target: ListTarget,
    params: ListQueryParams,
) -> Result<Json<ListViewResponse>, ApiError> {
    let query = params.into_query(state.config.page_size)?;
    let svc = state.list(target);
    if let Err(e) = svc.refresh(query).await {
        tracing::debug!(list = %target, error = %e, "rendering failed refresh");
    }
    Ok(Json(svc.snapshot().into()))
}
