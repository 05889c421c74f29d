pub mod lists;
pub mod session;
pub mod vms;

use axum::Router;
use axum::routing::{get, post, put};

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Lists
        .route("/vchs", get(lists::list_hosts))
        .route("/vchs/status", get(lists::hosts_status))
        .route("/containers", get(lists::list_containers))
        .route("/containers/status", get(lists::containers_status))
        // Single objects
        .route("/vms/{id}", get(vms::get_vm))
        .route("/root", get(vms::get_root))
        // Session
        .route("/session", get(session::get_session))
        .route("/prefs/{name}/toggle", post(session::toggle_preference))
        .route("/prefs/client-id", put(session::set_client_id))
        .route("/refresh", post(session::request_refresh))
        .route("/navigate", post(session::navigate))
        .with_state(state)
}
