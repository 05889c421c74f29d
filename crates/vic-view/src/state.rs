use std::sync::Arc;

use vic_api::ListTarget;
use vic_platform::PlatformAdapter;
use vic_sync::ListSyncService;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<dyn PlatformAdapter>,
    pub hosts: Arc<ListSyncService>,
    pub containers: Arc<ListSyncService>,
    pub config: AppConfig,
}

impl AppState {
    /// Builds one sync service per list and subscribes both to the
    /// platform's refresh signal.
    pub fn new(platform: Arc<dyn PlatformAdapter>, config: AppConfig) -> Self {
        let hosts = Arc::new(ListSyncService::new(ListTarget::Hosts, platform.clone()));
        let containers = Arc::new(ListSyncService::new(ListTarget::Containers, platform.clone()));
        hosts.attach();
        containers.attach();
        Self {
            platform,
            hosts,
            containers,
            config,
        }
    }

    pub fn list(&self, target: ListTarget) -> &Arc<ListSyncService> {
        match target {
            ListTarget::Hosts => &self.hosts,
            ListTarget::Containers => &self.containers,
        }
    }
}
