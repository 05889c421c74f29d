use axum::Json;
use axum::extract::{Path, Query, State};
use vic_api::RootInfo;
use vic_model::VirtualMachineSummary;

use crate::dto::VmQueryParams;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_vm(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<VmQueryParams>,
) -> Result<Json<VirtualMachineSummary>, ApiError> {
    let vm = vic_sync::fetch_vm(state.platform.as_ref(), &id, params.kind).await?;
    Ok(Json(vm))
}

pub async fn get_root(State(state): State<AppState>) -> Result<Json<RootInfo>, ApiError> {
    let root = vic_sync::fetch_root_info(state.platform.as_ref()).await?;
    Ok(Json(root))
}
