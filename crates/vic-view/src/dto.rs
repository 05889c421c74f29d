use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vic_api::{ListTarget, QueryError, QueryState, Sort, parse_filter};
use vic_model::VirtualMachineSummary;
use vic_platform::{ClientKind, PlatformKind, Preferences, SessionInfo};
use vic_sync::{ListSnapshot, SyncError, SyncState};

// ── Requests ───────────────────────────────────────────────────────

/// List parameters in their wire form, e.g.
/// `?offset=10&maxResultCount=10&sorting=name,desc&filter=name=vch`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    pub offset: Option<u32>,
    pub max_result_count: Option<u32>,
    pub sorting: Option<String>,
    pub filter: Option<String>,
}

impl ListQueryParams {
    /// A missing or zero `maxResultCount` falls back to `default_page_size`.
    pub fn into_query(self, default_page_size: NonZeroU32) -> Result<QueryState, QueryError> {
        let page_size = self
            .max_result_count
            .and_then(NonZeroU32::new)
            .unwrap_or(default_page_size);
        let sort = match self.sorting.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => Sort::default(),
        };
        let mut query = QueryState::new(self.offset.unwrap_or(0), page_size, sort);
        if let Some(expr) = &self.filter {
            query.filter = parse_filter(expr)?;
        }
        Ok(query)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmQueryParams {
    /// Canned VM kind returned when live data is off.
    #[serde(default = "default_vm_kind")]
    pub kind: ListTarget,
}

fn default_vm_kind() -> ListTarget {
    ListTarget::Hosts
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    pub target_view_id: String,
    pub object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdRequest {
    pub client_id: String,
}

// ── Responses ──────────────────────────────────────────────────────

/// Everything a list view renders: the records plus the
/// `{isDgLoading, error}` status flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListViewResponse {
    pub records: Vec<VirtualMachineSummary>,
    pub total_result_count: u64,
    pub is_dg_loading: bool,
    pub error: Option<SyncError>,
    pub state: SyncState,
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ListSnapshot> for ListViewResponse {
    /// A failed refresh renders as an empty grid with the error attached.
    fn from(snap: ListSnapshot) -> Self {
        let failed = snap.state == SyncState::Failed;
        Self {
            records: if failed {
                Vec::new()
            } else {
                snap.records.as_ref().clone()
            },
            total_result_count: if failed { 0 } else { snap.total_count },
            is_dg_loading: snap.is_loading(),
            error: snap.error,
            state: snap.state,
            generation: snap.generation,
            updated_at: snap.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub platform: PlatformKind,
    pub client: ClientKind,
    pub session: Option<SessionInfo>,
    pub root_path: String,
    pub web_context_path: String,
    pub live_data: bool,
    pub show_sidenav: bool,
    pub preferences: Preferences,
}
