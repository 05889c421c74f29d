use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use vic_api::{ListResponse, PropertyBag, RootInfo, VicClient};

use crate::{
    ClientKind, PlatformAdapter, PlatformKind, Preference, Preferences, RefreshCallback,
    RefreshHub, Result, SessionInfo,
};

pub const STANDALONE_ROOT_PATH: &str = "/ui";

/// Runs outside any host client, against canned data unless live data is
/// switched on in the session preferences.
pub struct StandalonePlatform {
    client: VicClient,
    prefs: Mutex<Preferences>,
    prefs_path: Option<PathBuf>,
    refresh: RefreshHub,
}

impl StandalonePlatform {
    /// Loads preferences from `prefs_path`. Unreadable files fall back to
    /// the defaults and are overwritten on the next toggle.
    pub fn new(client: VicClient, prefs_path: Option<PathBuf>) -> Self {
        let prefs = match &prefs_path {
            Some(path) => Preferences::load(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "ignoring unreadable preferences");
                Preferences::default()
            }),
            None => Preferences::default(),
        };
        Self::with_preferences(client, prefs, prefs_path)
    }

    pub fn with_preferences(
        client: VicClient,
        prefs: Preferences,
        prefs_path: Option<PathBuf>,
    ) -> Self {
        Self {
            client,
            prefs: Mutex::new(prefs),
            prefs_path,
            refresh: RefreshHub::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.prefs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` and persists the result. The in-memory preferences only
    /// change once the save succeeded.
    fn update(&self, f: impl FnOnce(&mut Preferences)) -> Result<Preferences> {
        let mut prefs = self.lock();
        let mut next = prefs.clone();
        f(&mut next);
        if let Some(path) = &self.prefs_path {
            next.save(path)?;
        }
        *prefs = next.clone();
        Ok(next)
    }

    /// Client carrying the session header when a client id is known.
    fn live_client(&self) -> VicClient {
        match self.lock().client_id.clone() {
            Some(id) => self.client.clone().with_session(id),
            None => self.client.clone(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for StandalonePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Standalone
    }

    fn client_kind(&self) -> ClientKind {
        ClientKind {
            client_type: "html".into(),
            version: "6.5".into(),
        }
    }

    fn root_path(&self) -> String {
        STANDALONE_ROOT_PATH.to_string()
    }

    fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String {
        vic_api::data_url(&self.web_context_path(), object_id, properties)
    }

    fn user_session(&self) -> Option<SessionInfo> {
        None
    }

    fn send_navigation_request(&self, target_view_id: &str, object_id: &str) {
        tracing::debug!(target_view_id, object_id, "no host to navigate in standalone mode");
    }

    fn on_refresh_requested(&self, callback: RefreshCallback) {
        self.refresh.register(callback);
    }

    fn request_refresh(&self) {
        self.refresh.notify();
    }

    fn use_live_data(&self) -> bool {
        self.lock().live_data
    }

    fn preferences(&self) -> Preferences {
        self.lock().clone()
    }

    fn toggle_preference(&self, preference: Preference) -> Result<Preferences> {
        let prefs = self.update(|p| p.toggle(preference))?;
        tracing::info!(%preference, ?prefs, "preference toggled");
        Ok(prefs)
    }

    fn set_client_id(&self, client_id: &str) -> Result<Preferences> {
        self.update(|p| p.client_id = Some(client_id.to_string()))
    }

    async fn fetch_list(&self, path_and_query: &str) -> Result<ListResponse> {
        Ok(self.live_client().list(path_and_query).await?)
    }

    async fn fetch_properties(&self, data_url: &str) -> Result<PropertyBag> {
        Ok(self.live_client().properties(data_url).await?)
    }

    async fn fetch_root_info(&self, data_url: &str) -> Result<RootInfo> {
        Ok(self.live_client().root_info(data_url).await?)
    }
}
