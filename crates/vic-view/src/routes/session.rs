use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use vic_platform::{Preference, Preferences};

use crate::dto::{ClientIdRequest, NavigateRequest, SessionResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let platform = &state.platform;
    let preferences = platform.preferences();
    Json(SessionResponse {
        platform: platform.kind(),
        client: platform.client_kind(),
        session: platform.user_session(),
        root_path: platform.root_path(),
        web_context_path: platform.web_context_path(),
        live_data: platform.use_live_data(),
        show_sidenav: preferences.show_sidenav(),
        preferences,
    })
}

pub async fn toggle_preference(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Preferences>, ApiError> {
    let preference: Preference = name.parse().map_err(ApiError::BadRequest)?;
    Ok(Json(state.platform.toggle_preference(preference)?))
}

pub async fn set_client_id(
    State(state): State<AppState>,
    Json(req): Json<ClientIdRequest>,
) -> Result<Json<Preferences>, ApiError> {
    if req.client_id.trim().is_empty() {
        return Err(ApiError::BadRequest("clientId must not be empty".into()));
    }
    Ok(Json(state.platform.set_client_id(req.client_id.trim())?))
}

pub async fn request_refresh(State(state): State<AppState>) -> StatusCode {
    state.platform.request_refresh();
    StatusCode::ACCEPTED
}

pub async fn navigate(
    State(state): State<AppState>,
    Json(req): Json<NavigateRequest>,
) -> StatusCode {
    state
        .platform
        .send_navigation_request(&req.target_view_id, &req.object_id);
    StatusCode::ACCEPTED
}
