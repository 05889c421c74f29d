pub mod canned;
pub mod embedded;
pub mod host;
pub mod prefs;
pub mod standalone;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vic_api::{ListResponse, ListTarget, PropertyBag, QueryState, RootInfo};

pub use embedded::EmbeddedPlatform;
pub use host::{HostBridge, NavigationRequest, RemoteHost};
pub use prefs::{Preference, Preferences};
pub use standalone::StandalonePlatform;

/// Name under which the plugin is mounted below the client root path.
pub const PLUGIN_NAME: &str = "vic";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vic api error: {0}")]
    Api(#[from] vic_api::Error),

    #[error("preferences io error: {0}")]
    PrefsIo(#[from] std::io::Error),

    #[error("preferences file is malformed: {0}")]
    PrefsFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Which runtime environment the process was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Embedded,
    Standalone,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Standalone => "standalone",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host client flavour and version, e.g. `html` / `6.5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientKind {
    #[serde(rename = "type")]
    pub client_type: String,
    pub version: String,
}

/// Session of the user logged into the host client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_name: String,
    pub client_id: String,
    pub locale: String,
}

pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Fan-out list of "refresh requested" callbacks.
#[derive(Default)]
pub struct RefreshHub {
    callbacks: Mutex<Vec<RefreshCallback>>,
}

impl RefreshHub {
    pub fn register(&self, callback: RefreshCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    /// Invokes every registered callback. Callbacks run outside the lock so
    /// they may register further callbacks.
    pub fn notify(&self) {
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        tracing::debug!(count = callbacks.len(), "refresh requested");
        for callback in callbacks {
            callback();
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform capability set over the two runtime environments.
#[async_trait]
pub trait PlatformAdapter: Send + Sync + 'static {
    fn kind(&self) -> PlatformKind;

    fn client_kind(&self) -> ClientKind;

    fn root_path(&self) -> String;

    /// Path under which the plugin's own endpoints are served.
    fn web_context_path(&self) -> String {
        format!("{}/{PLUGIN_NAME}", self.root_path())
    }

    /// Data-service URL for one object and a list of its properties.
    fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String;

    fn user_session(&self) -> Option<SessionInfo>;

    fn send_navigation_request(&self, target_view_id: &str, object_id: &str);

    fn on_refresh_requested(&self, callback: RefreshCallback);

    /// Raises the same signal the host raises when it wants views refreshed.
    fn request_refresh(&self);

    /// Whether retrieval goes to the remote endpoints or to canned data.
    fn use_live_data(&self) -> bool;

    fn preferences(&self) -> Preferences;

    /// Flips one session preference. A no-op returning the current values
    /// when the environment pins them.
    fn toggle_preference(&self, preference: Preference) -> Result<Preferences>;

    fn set_client_id(&self, client_id: &str) -> Result<Preferences>;

    async fn fetch_list(&self, path_and_query: &str) -> Result<ListResponse>;

    async fn fetch_properties(&self, data_url: &str) -> Result<PropertyBag>;

    async fn fetch_root_info(&self, data_url: &str) -> Result<RootInfo>;

    fn canned_list(&self, target: ListTarget, query: &QueryState) -> ListResponse {
        canned::list_page(target, query)
    }

    fn canned_vm(&self, target: ListTarget) -> PropertyBag {
        canned::vm(target)
    }

    fn canned_root_info(&self) -> RootInfo {
        canned::root_info()
    }
}

/// What the process can observe about where it runs.
pub struct ExecutionContext {
    /// Running nested inside another client context.
    pub nested: bool,
    /// Capability object published by the enclosing client, if reachable.
    pub host: Option<Arc<dyn HostBridge>>,
    /// Origin serving the data endpoints.
    pub service_url: String,
    /// Where standalone session preferences are persisted.
    pub prefs_path: Option<PathBuf>,
}

/// Embedded only when nested and the host's capability object is reachable.
pub fn is_embedded(ctx: &ExecutionContext) -> bool {
    ctx.nested && ctx.host.is_some()
}

pub fn select_platform(ctx: ExecutionContext) -> Arc<dyn PlatformAdapter> {
    let embedded = is_embedded(&ctx);
    let client = vic_api::VicClient::new(ctx.service_url);

    match ctx.host {
        Some(host) if embedded => {
            let platform = EmbeddedPlatform::new(host, client);
            tracing::info!(
                client = ?platform.client_kind(),
                "running embedded in host client"
            );
            Arc::new(platform)
        }
        _ => {
            if ctx.nested {
                tracing::warn!("nested without a host capability object, running standalone");
            }
            let platform = StandalonePlatform::new(client, ctx.prefs_path);
            tracing::info!(live_data = platform.use_live_data(), "running standalone");
            Arc::new(platform)
        }
    }
}

static PLATFORM: OnceLock<Arc<dyn PlatformAdapter>> = OnceLock::new();

/// Selects the platform on first call; later calls return the same instance
/// and ignore `ctx`.
pub fn init(ctx: ExecutionContext) -> Arc<dyn PlatformAdapter> {
    PLATFORM.get_or_init(|| select_platform(ctx)).clone()
}

pub fn global() -> Option<Arc<dyn PlatformAdapter>> {
    PLATFORM.get().cloned()
}
