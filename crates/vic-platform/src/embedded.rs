use std::sync::Arc;

use async_trait::async_trait;
use vic_api::{ListResponse, PropertyBag, RootInfo, VicClient};

use crate::{
    ClientKind, HostBridge, PlatformAdapter, PlatformKind, Preference, Preferences,
    RefreshCallback, RefreshHub, Result, SessionInfo,
};

/// Runs inside the host client; every capability is delegated to the host.
pub struct EmbeddedPlatform {
    host: Arc<dyn HostBridge>,
    client: VicClient,
    refresh: Arc<RefreshHub>,
}

impl EmbeddedPlatform {
    /// Installs a single host refresh handler that fans out to every
    /// callback registered through [`PlatformAdapter::on_refresh_requested`].
    pub fn new(host: Arc<dyn HostBridge>, client: VicClient) -> Self {
        let refresh = Arc::new(RefreshHub::default());
        let hub = refresh.clone();
        host.set_global_refresh_handler(Arc::new(move || hub.notify()));
        Self {
            host,
            client,
            refresh,
        }
    }
}

#[async_trait]
impl PlatformAdapter for EmbeddedPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Embedded
    }

    fn client_kind(&self) -> ClientKind {
        self.host.client_kind()
    }

    fn root_path(&self) -> String {
        self.host.root_path()
    }

    fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String {
        self.host.build_data_url(object_id, properties)
    }

    fn user_session(&self) -> Option<SessionInfo> {
        self.host.user_session()
    }

    fn send_navigation_request(&self, target_view_id: &str, object_id: &str) {
        self.host.send_navigation_request(target_view_id, object_id);
    }

    fn on_refresh_requested(&self, callback: RefreshCallback) {
        self.refresh.register(callback);
    }

    fn request_refresh(&self) {
        self.refresh.notify();
    }

    fn use_live_data(&self) -> bool {
        true
    }

    fn preferences(&self) -> Preferences {
        Preferences::embedded()
    }

    fn toggle_preference(&self, preference: Preference) -> Result<Preferences> {
        tracing::debug!(%preference, "preferences are fixed when embedded");
        Ok(Preferences::embedded())
    }

    fn set_client_id(&self, _client_id: &str) -> Result<Preferences> {
        Ok(Preferences::embedded())
    }

    async fn fetch_list(&self, path_and_query: &str) -> Result<ListResponse> {
        Ok(self.client.list(path_and_query).await?)
    }

    async fn fetch_properties(&self, data_url: &str) -> Result<PropertyBag> {
        Ok(self.client.properties(data_url).await?)
    }

    async fn fetch_root_info(&self, data_url: &str) -> Result<RootInfo> {
        Ok(self.client.root_info(data_url).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::RemoteHost;

    fn platform() -> (Arc<RemoteHost>, EmbeddedPlatform) {
        let host = Arc::new(
            RemoteHost::new("/ui")
                .with_client("html", "6.7")
                .with_session(SessionInfo {
                    user_name: "administrator@vsphere.local".into(),
                    client_id: "c-1".into(),
                    locale: "en_US".into(),
                }),
        );
        let platform = EmbeddedPlatform::new(host.clone(), VicClient::new("http://127.0.0.1:9"));
        (host, platform)
    }

    #[test]
    fn delegates_to_host() {
        let (_, platform) = platform();
        assert_eq!(platform.root_path(), "/ui");
        assert_eq!(platform.web_context_path(), "/ui/vic");
        assert_eq!(platform.client_kind().version, "6.7");
        assert_eq!(platform.user_session().unwrap().client_id, "c-1");
        assert!(platform.use_live_data());
    }

    #[test]
    fn toggles_are_ignored() {
        let (_, platform) = platform();
        let prefs = platform.toggle_preference(Preference::Sidenav).unwrap();
        assert!(!prefs.sidenav);
        assert!(!prefs.dev_ui);
        assert!(prefs.live_data);
        assert_eq!(platform.preferences(), Preferences::embedded());
    }

    #[test]
    fn host_refresh_reaches_every_callback() {
        let (host, platform) = platform();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            platform.on_refresh_requested(Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert!(host.fire_refresh());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        platform.request_refresh();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
