use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use vic_api::{ListResponse, ListTarget, QueryState, build_query_string};
use vic_model::{VirtualMachineSummary, decode_value};
use vic_platform::PlatformAdapter;

use crate::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Last published view of one list.
///
/// `records` always holds the last fully decoded collection; a failed
/// refresh sets `error` but leaves the records in place.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub state: SyncState,
    pub records: Arc<Vec<VirtualMachineSummary>>,
    pub total_count: u64,
    pub error: Option<SyncError>,
    /// Request generation the records and error belong to; 0 before any
    /// request completed.
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ListSnapshot {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            records: Arc::new(Vec::new()),
            total_count: 0,
            error: None,
            generation: 0,
            updated_at: None,
        }
    }
}

impl ListSnapshot {
    pub fn is_loading(&self) -> bool {
        self.state == SyncState::Loading
    }
}

/// Keeps one host or container list in sync with the platform and pushes
/// every change to all subscribers.
///
/// Requests are never cancelled. Each one takes a generation number when it
/// is issued and its outcome is published only if no later request has
/// published already, so an overtaken response can never replace a newer
/// collection.
pub struct ListSyncService {
    target: ListTarget,
    platform: Arc<dyn PlatformAdapter>,
    tx: watch::Sender<ListSnapshot>,
    issued: AtomicU64,
    last_query: Mutex<QueryState>,
}

impl ListSyncService {
    pub fn new(target: ListTarget, platform: Arc<dyn PlatformAdapter>) -> Self {
        let (tx, _) = watch::channel(ListSnapshot::default());
        Self {
            target,
            platform,
            tx,
            issued: AtomicU64::new(0),
            last_query: Mutex::new(QueryState::default()),
        }
    }

    pub fn target(&self) -> ListTarget {
        self.target
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.tx.borrow().clone()
    }

    pub fn last_query(&self) -> QueryState {
        self.last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Retrieves and decodes one page, then publishes the outcome.
    ///
    /// Returns the error that was published, or `Ok` when the page was
    /// published or discarded as stale.
    pub async fn refresh(&self, query: QueryState) -> Result<(), SyncError> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = query.clone();

        self.tx.send_if_modified(|snap| {
            let changed = snap.state != SyncState::Loading;
            snap.state = SyncState::Loading;
            changed
        });

        let outcome = self.retrieve(&query).await;
        let latest = self.issued.load(Ordering::SeqCst);

        let published = self.tx.send_if_modified(|snap| {
            if generation <= snap.generation {
                return false;
            }
            snap.generation = generation;
            snap.updated_at = Some(Utc::now());
            match &outcome {
                Ok((records, total)) => {
                    snap.state = if generation == latest {
                        SyncState::Ready
                    } else {
                        SyncState::Loading
                    };
                    snap.records = Arc::new(records.clone());
                    snap.total_count = *total;
                    snap.error = None;
                }
                Err(e) => {
                    // A newer request is still in flight and may yet succeed.
                    snap.state = if generation == latest {
                        SyncState::Failed
                    } else {
                        SyncState::Loading
                    };
                    snap.error = Some(e.clone());
                }
            }
            true
        });

        if !published {
            tracing::debug!(
                list = %self.target,
                generation,
                "discarding response overtaken by a newer request"
            );
            return Ok(());
        }

        match outcome {
            Ok((records, total)) => {
                tracing::debug!(
                    list = %self.target,
                    generation,
                    count = records.len(),
                    total,
                    "list published"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(list = %self.target, generation, error = %e, "list refresh failed");
                Err(e)
            }
        }
    }

    async fn retrieve(
        &self,
        query: &QueryState,
    ) -> Result<(Vec<VirtualMachineSummary>, u64), SyncError> {
        let page = if self.platform.use_live_data() {
            let url = build_query_string(self.target.path(), query);
            tracing::debug!(list = %self.target, %url, "fetching list page");
            self.platform.fetch_list(&url).await?
        } else {
            self.platform.canned_list(self.target, query)
        };
        decode_page(&page)
    }

    /// Runs [`refresh`](Self::refresh) on the current runtime.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        query: QueryState,
    ) -> JoinHandle<Result<(), SyncError>> {
        let svc = self.clone();
        tokio::spawn(async move { svc.refresh(query).await })
    }

    /// Re-runs the last query whenever the platform asks for a refresh.
    ///
    /// Has no effect outside a Tokio runtime.
    pub fn attach(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(list = %self.target, "no runtime, refresh signals will be ignored");
            return;
        };
        let weak = Arc::downgrade(self);
        self.platform.on_refresh_requested(Arc::new(move || {
            if let Some(svc) = weak.upgrade() {
                let query = svc.last_query();
                handle.spawn(async move {
                    let _ = svc.refresh(query).await;
                });
            }
        }));
    }
}

/// Decodes every entry of a page, in page order, failing on the first bad one.
pub fn decode_page(page: &ListResponse) -> Result<(Vec<VirtualMachineSummary>, u64), SyncError> {
    let records = page
        .entries()
        .map(|(object_id, value)| {
            decode_value(value).inspect_err(|e| {
                tracing::warn!(%object_id, error = %e, "list entry failed to decode");
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total = match page.total_result_count {
        0 => records.len() as u64,
        n => n,
    };
    Ok((records, total))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroU32;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use tokio::sync::oneshot;
    use vic_api::{PropertyBag, RootInfo, Sort};
    use vic_platform::{
        ClientKind, PlatformKind, Preference, Preferences, RefreshCallback, RefreshHub,
        SessionInfo,
    };

    use super::*;

    const GUID: &str = "85421094-c58e-40f9-a42c-b624160d05f5";

    enum Outcome {
        Page(ListResponse),
        Unauthorized,
        Broken,
    }

    #[derive(Default)]
    struct FakePlatform {
        live: bool,
        pages: Mutex<HashMap<u32, Outcome>>,
        gates: Mutex<HashMap<u32, oneshot::Receiver<()>>>,
        urls: Mutex<Vec<String>>,
        refresh: RefreshHub,
    }

    impl FakePlatform {
        fn live() -> Self {
            Self {
                live: true,
                ..Self::default()
            }
        }

        fn respond(&self, offset: u32, outcome: Outcome) {
            self.pages.lock().unwrap().insert(offset, outcome);
        }

        fn gate(&self, offset: u32) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(offset, rx);
            tx
        }
    }

    fn offset_of(url: &str) -> u32 {
        url.split("&offset=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl PlatformAdapter for FakePlatform {
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
            "/ui".into()
        }
        fn build_data_url(&self, object_id: &str, properties: &[&str]) -> String {
            vic_api::data_url("/ui/vic", object_id, properties)
        }
        fn user_session(&self) -> Option<SessionInfo> {
            None
        }
        fn send_navigation_request(&self, _: &str, _: &str) {}
        fn on_refresh_requested(&self, callback: RefreshCallback) {
            self.refresh.register(callback);
        }
        fn request_refresh(&self) {
            self.refresh.notify();
        }
        fn use_live_data(&self) -> bool {
            self.live
        }
        fn preferences(&self) -> Preferences {
            Preferences::default()
        }
        fn toggle_preference(&self, _: Preference) -> vic_platform::Result<Preferences> {
            Ok(Preferences::default())
        }
        fn set_client_id(&self, _: &str) -> vic_platform::Result<Preferences> {
            Ok(Preferences::default())
        }

        async fn fetch_list(&self, url: &str) -> vic_platform::Result<ListResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            let offset = offset_of(url);
            let gate = self.gates.lock().unwrap().remove(&offset);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            let outcome = self.pages.lock().unwrap().remove(&offset);
            match outcome {
                Some(Outcome::Page(page)) => Ok(page),
                Some(Outcome::Unauthorized) | None => {
                    Err(vic_api::Error::Empty { endpoint: "list" }.into())
                }
                Some(Outcome::Broken) => Err(vic_api::Error::Decode {
                    endpoint: "list",
                    source: serde_json::from_str::<Value>("{").unwrap_err(),
                }
                .into()),
            }
        }

        async fn fetch_properties(&self, _: &str) -> vic_platform::Result<PropertyBag> {
            Err(vic_api::Error::Empty { endpoint: "properties" }.into())
        }

        async fn fetch_root_info(&self, _: &str) -> vic_platform::Result<RootInfo> {
            Err(vic_api::Error::Empty { endpoint: "root info" }.into())
        }
    }

    fn host(vm: u32, name: &str) -> (String, Value) {
        let id = format!("{GUID}/vm-{vm}");
        let value = json!({
            "id": id,
            "name": name,
            "isVCH": true,
            "isContainer": false,
            "summary.runtime.powerState": "poweredOff",
            "resourcePool": { "type": "VirtualApp", "value": "resgroup-v26" },
        });
        (id, value)
    }

    fn page(entries: Vec<(String, Value)>, total: u64) -> ListResponse {
        ListResponse {
            data: Some(entries.into_iter().collect::<Map<_, _>>()),
            total_result_count: total,
        }
    }

    fn query(offset: u32) -> QueryState {
        QueryState::new(offset, NonZeroU32::new(10).unwrap(), Sort::asc("name"))
    }

    fn names(snap: &ListSnapshot) -> Vec<String> {
        snap.records.iter().map(|r| r.name().to_string()).collect()
    }

    #[tokio::test]
    async fn publishes_records_in_server_order() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Page(page(vec![host(9, "zeta"), host(1, "alpha")], 42)));
        let svc = ListSyncService::new(ListTarget::Hosts, platform.clone());

        svc.refresh(query(0)).await.unwrap();

        let snap = svc.snapshot();
        assert_eq!(snap.state, SyncState::Ready);
        assert_eq!(names(&snap), ["zeta", "alpha"]);
        assert_eq!(snap.total_count, 42);
        assert_eq!(snap.generation, 1);
        assert!(snap.updated_at.is_some());

        let urls = platform.urls.lock().unwrap();
        assert!(urls[0].starts_with(ListTarget::Hosts.path()));
        assert!(urls[0].ends_with("&offset=0&maxResultCount=10&sorting=name,asc"));
    }

    #[tokio::test]
    async fn one_bad_entry_fails_the_batch_and_keeps_records() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Page(page(vec![host(1, "alpha")], 1)));
        let mut broken = host(3, "gamma");
        broken.1["id"] = json!("no-slash");
        platform.respond(10, Outcome::Page(page(vec![host(2, "beta"), broken], 2)));
        let svc = ListSyncService::new(ListTarget::Hosts, platform);

        svc.refresh(query(0)).await.unwrap();
        let err = svc.refresh(query(10)).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Decode(vic_model::DecodeError::MalformedIdentity(_))
        ));

        let snap = svc.snapshot();
        assert_eq!(snap.state, SyncState::Failed);
        assert_eq!(snap.error, Some(err));
        assert_eq!(names(&snap), ["alpha"]);
        assert_eq!(snap.total_count, 1);
    }

    #[tokio::test]
    async fn maps_transport_errors() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Unauthorized);
        platform.respond(10, Outcome::Broken);
        let svc = ListSyncService::new(ListTarget::Containers, platform);

        assert!(matches!(
            svc.refresh(query(0)).await,
            Err(SyncError::EmptyOrUnauthorized(_))
        ));
        assert!(matches!(
            svc.refresh(query(10)).await,
            Err(SyncError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn overtaken_response_is_discarded() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Page(page(vec![host(1, "old")], 1)));
        platform.respond(10, Outcome::Page(page(vec![host(2, "new")], 1)));
        let release_old = platform.gate(0);
        let release_new = platform.gate(10);
        let svc = Arc::new(ListSyncService::new(ListTarget::Hosts, platform));

        let old = svc.spawn_refresh(query(0));
        tokio::task::yield_now().await;
        let new = svc.spawn_refresh(query(10));
        tokio::task::yield_now().await;
        assert!(svc.snapshot().is_loading());

        release_new.send(()).unwrap();
        new.await.unwrap().unwrap();
        assert_eq!(names(&svc.snapshot()), ["new"]);
        assert_eq!(svc.snapshot().state, SyncState::Ready);

        release_old.send(()).unwrap();
        old.await.unwrap().unwrap();
        let snap = svc.snapshot();
        assert_eq!(names(&snap), ["new"]);
        assert_eq!(snap.generation, 2);
        assert_eq!(svc.last_query().offset, 10);
    }

    #[tokio::test]
    async fn earlier_response_landing_first_is_shown_while_loading() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Page(page(vec![host(1, "first")], 1)));
        platform.respond(10, Outcome::Page(page(vec![host(2, "second")], 1)));
        let release_first = platform.gate(0);
        let release_second = platform.gate(10);
        let svc = Arc::new(ListSyncService::new(ListTarget::Hosts, platform));

        let first = svc.spawn_refresh(query(0));
        tokio::task::yield_now().await;
        let second = svc.spawn_refresh(query(10));
        tokio::task::yield_now().await;

        release_first.send(()).unwrap();
        first.await.unwrap().unwrap();
        let snap = svc.snapshot();
        assert_eq!(names(&snap), ["first"]);
        assert!(snap.is_loading());

        release_second.send(()).unwrap();
        second.await.unwrap().unwrap();
        let snap = svc.snapshot();
        assert_eq!(names(&snap), ["second"]);
        assert_eq!(snap.state, SyncState::Ready);
    }

    #[tokio::test]
    async fn earlier_failure_keeps_loading_while_newer_request_runs() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Broken);
        platform.respond(10, Outcome::Page(page(vec![host(2, "second")], 1)));
        let release_first = platform.gate(0);
        let release_second = platform.gate(10);
        let svc = Arc::new(ListSyncService::new(ListTarget::Hosts, platform));

        let first = svc.spawn_refresh(query(0));
        tokio::task::yield_now().await;
        let second = svc.spawn_refresh(query(10));
        tokio::task::yield_now().await;

        release_first.send(()).unwrap();
        assert!(matches!(first.await.unwrap(), Err(SyncError::Transport(_))));
        let snap = svc.snapshot();
        assert!(snap.is_loading());
        assert!(snap.error.is_some());

        release_second.send(()).unwrap();
        second.await.unwrap().unwrap();
        let snap = svc.snapshot();
        assert_eq!(snap.state, SyncState::Ready);
        assert_eq!(names(&snap), ["second"]);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_publish() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(0, Outcome::Page(page(vec![host(1, "alpha")], 1)));
        let svc = ListSyncService::new(ListTarget::Hosts, platform);
        let mut grid = svc.subscribe();
        let mut counter = svc.subscribe();

        svc.refresh(query(0)).await.unwrap();

        for rx in [&mut grid, &mut counter] {
            assert!(rx.has_changed().unwrap());
            let snap = rx.borrow_and_update();
            assert_eq!(snap.records.len(), 1);
            assert_eq!(snap.state, SyncState::Ready);
        }
    }

    #[tokio::test]
    async fn canned_pages_when_live_data_is_off() {
        let platform = Arc::new(FakePlatform::default());
        let svc = ListSyncService::new(ListTarget::Containers, platform.clone());

        svc.refresh(query(0)).await.unwrap();

        let snap = svc.snapshot();
        assert_eq!(snap.records.len(), 10);
        assert_eq!(snap.total_count, 30);
        assert!(platform.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_signal_reruns_last_query() {
        let platform = Arc::new(FakePlatform::live());
        platform.respond(10, Outcome::Page(page(vec![host(1, "first")], 1)));
        let svc = Arc::new(ListSyncService::new(ListTarget::Hosts, platform.clone()));
        svc.attach();
        svc.refresh(query(10)).await.unwrap();

        platform.respond(10, Outcome::Page(page(vec![host(2, "second")], 1)));
        let mut rx = svc.subscribe();
        platform.request_refresh();

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                rx.changed().await.unwrap();
                if rx.borrow().state == SyncState::Ready {
                    break;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(names(&svc.snapshot()), ["second"]);
        assert_eq!(platform.urls.lock().unwrap().len(), 2);
    }
}
