use std::sync::Arc;
use std::time::Duration;

use vic_platform::PlatformAdapter;

/// Raises the platform refresh signal every `interval_secs`. Zero disables it.
pub fn spawn_ticker(platform: Arc<dyn PlatformAdapter>, interval_secs: u64) {
    if interval_secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::debug!("periodic refresh");
            platform.request_refresh();
        }
    });
}
