use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::{ClientKind, PLUGIN_NAME, RefreshCallback, SessionInfo};

/// Capability object the enclosing host client publishes to its plugins.
pub trait HostBridge: Send + Sync + 'static {
    fn root_path(&self) -> String;

    fn client_kind(&self) -> ClientKind;

    fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String;

    fn user_session(&self) -> Option<SessionInfo>;

    fn send_navigation_request(&self, target_view_id: &str, object_id: &str);

    /// Installs the single handler the host calls when it wants every view
    /// refreshed. A later call replaces the earlier handler.
    fn set_global_refresh_handler(&self, handler: RefreshCallback);

    fn localized_string(&self, _key: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub target_view_id: String,
    pub object_id: String,
}

/// Host capabilities described by configuration, for a host client that
/// talks to this process over HTTP.
pub struct RemoteHost {
    root_path: String,
    client: ClientKind,
    session: Option<SessionInfo>,
    navigation: Option<mpsc::UnboundedSender<NavigationRequest>>,
    refresh_handler: Mutex<Option<RefreshCallback>>,
}

impl RemoteHost {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into().trim_end_matches('/').to_string(),
            client: ClientKind {
                client_type: "html".into(),
                version: "6.5".into(),
            },
            session: None,
            navigation: None,
            refresh_handler: Mutex::new(None),
        }
    }

    pub fn with_client(mut self, client_type: impl Into<String>, version: impl Into<String>) -> Self {
        self.client = ClientKind {
            client_type: client_type.into(),
            version: version.into(),
        };
        self
    }

    pub fn with_session(mut self, session: SessionInfo) -> Self {
        self.session = Some(session);
        self
    }

    /// Forwards navigation requests to `tx` as well as logging them.
    pub fn with_navigation(mut self, tx: mpsc::UnboundedSender<NavigationRequest>) -> Self {
        self.navigation = Some(tx);
        self
    }

    /// Fires the installed global refresh handler, as the host does after
    /// its own refresh button is pressed. Returns false if none is set.
    pub fn fire_refresh(&self) -> bool {
        let handler = self
            .refresh_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl HostBridge for RemoteHost {
    fn root_path(&self) -> String {
        self.root_path.clone()
    }

    fn client_kind(&self) -> ClientKind {
        self.client.clone()
    }

    fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String {
        vic_api::data_url(
            &format!("{}/{PLUGIN_NAME}", self.root_path),
            object_id,
            properties,
        )
    }

    fn user_session(&self) -> Option<SessionInfo> {
        self.session.clone()
    }

    fn send_navigation_request(&self, target_view_id: &str, object_id: &str) {
        tracing::info!(target_view_id, object_id, "navigation requested");
        if let Some(tx) = &self.navigation {
            let req = NavigationRequest {
                target_view_id: target_view_id.to_string(),
                object_id: object_id.to_string(),
            };
            if tx.send(req).is_err() {
                tracing::warn!("navigation receiver dropped");
            }
        }
    }

    fn set_global_refresh_handler(&self, handler: RefreshCallback) {
        *self
            .refresh_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[test]
    fn data_url_is_under_plugin_context() {
        let host = RemoteHost::new("/ui/");
        assert_eq!(
            host.build_data_url("g/vm-1", &["name"]),
            "/ui/vic/rest/data/properties/g%2Fvm-1?properties=name"
        );
    }

    #[test]
    fn navigation_is_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = RemoteHost::new("/ui").with_navigation(tx);
        host.send_navigation_request("vsphere.core.vm.summary", "urn:vm:1");
        let req = rx.try_recv().unwrap();
        assert_eq!(req.target_view_id, "vsphere.core.vm.summary");
        assert_eq!(req.object_id, "urn:vm:1");
    }

    #[test]
    fn refresh_handler_is_replaced() {
        let host = RemoteHost::new("/ui");
        assert!(!host.fire_refresh());

        let first = Arc::new(AtomicBool::new(false));
        let second = Arc::new(AtomicBool::new(false));
        let f = first.clone();
        host.set_global_refresh_handler(Arc::new(move || f.store(true, Ordering::SeqCst)));
        let s = second.clone();
        host.set_global_refresh_handler(Arc::new(move || s.store(true, Ordering::SeqCst)));

        assert!(host.fire_refresh());
        assert!(!first.load(Ordering::SeqCst));
        assert!(second.load(Ordering::SeqCst));
    }
}
