mod config;
mod dto;
mod error;
mod routes;
mod state;
mod ticker;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use vic_platform::{ExecutionContext, HostBridge, RemoteHost, SessionInfo};

use crate::config::AppConfig;
use crate::routes::api_router;
use crate::state::AppState;
use crate::ticker::spawn_ticker;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().expect("invalid configuration");

    // Platform
    let platform = vic_platform::init(execution_context(&config));
    tracing::info!(
        platform = %platform.kind(),
        live_data = platform.use_live_data(),
        "platform ready"
    );

    spawn_ticker(platform.clone(), config.refresh_interval_secs);

    let state = AppState::new(platform, config.clone());

    let app = api_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!(addr = %config.listen_addr, "starting vic view");

    axum::serve(listener, app).await.expect("server error");
}

fn execution_context(config: &AppConfig) -> ExecutionContext {
    let Some(host) = &config.host else {
        return ExecutionContext {
            nested: false,
            host: None,
            service_url: config.service_url.clone(),
            prefs_path: Some(config.prefs_path.clone()),
        };
    };

    let mut bridge = RemoteHost::new(host.root_path.clone())
        .with_client(host.client_type.clone(), host.client_version.clone());
    if let Some(user) = &host.session_user {
        bridge = bridge.with_session(SessionInfo {
            user_name: user.clone(),
            client_id: host.session_client_id.clone().unwrap_or_default(),
            locale: host.session_locale.clone(),
        });
    }

    ExecutionContext {
        nested: true,
        host: Some(Arc::new(bridge) as Arc<dyn HostBridge>),
        service_url: host.url.clone(),
        prefs_path: None,
    }
}
