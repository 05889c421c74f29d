//! Typed Rust client for the vic-service data endpoints.
//!
//! Covers the paginated list endpoint, the single-object property endpoint
//! and the plugin root summary, plus the query-string builder used to page
//! through the list endpoint.

pub mod query;
mod types;

pub use query::{
    FilterTerm, ListTarget, QueryError, QueryState, Sort, SortDirection, build_query_string,
    parse_filter,
};
pub use types::*;

use serde::de::DeserializeOwned;

/// Header carrying the host client session when live data is used outside the host.
pub const SESSION_HEADER: &str = "webClientSessionId";

/// Object id of the plugin root.
pub const ROOT_OBJECT_ID: &str = "urn:vic:vic:Root:vic%252Fvic-root";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vic api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vic api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("vic api {endpoint} refused the request ({status})")]
    Unauthorized {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("vic api {endpoint} returned an empty body")]
    Empty { endpoint: &'static str },

    #[error("vic api {endpoint} returned malformed json: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// True when the platform refused the request or had nothing to say.
    pub fn is_unauthorized_or_empty(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Empty { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the vic-service REST API.
///
/// Paths handed to the client are origin-relative (`/ui/vic/rest/...`), the
/// way they are produced by the list paths and the host's data-URL builder.
#[derive(Clone)]
pub struct VicClient {
    base_url: String,
    session_id: Option<String>,
    http: reqwest::Client,
}

impl VicClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_id: None,
            http: reqwest::Client::new(),
        }
    }

    /// Attaches a host client session id to every request.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{path}", self.base_url)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized { endpoint, status });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, endpoint: &'static str) -> Result<T> {
        let mut req = self.http.get(self.url(path));
        if let Some(id) = &self.session_id {
            req = req.header(SESSION_HEADER, id);
        }
        let resp = req.send().await?;
        let bytes = Self::check(resp, endpoint).await?.bytes().await?;

        let parsed: Option<T> = serde_json::from_slice(&bytes)
            .map_err(|source| Error::Decode { endpoint, source })?;
        parsed.ok_or(Error::Empty { endpoint })
    }

    // ── Lists ───────────────────────────────────────────────────────

    /// Fetch one page from the list endpoint. `path_and_query` is usually
    /// the output of [`build_query_string`].
    pub async fn list(&self, path_and_query: &str) -> Result<ListResponse> {
        self.get_json(path_and_query, "list").await
    }

    // ── Properties ──────────────────────────────────────────────────

    /// Fetch the property bag for one object from a prebuilt data URL.
    pub async fn properties(&self, data_url: &str) -> Result<PropertyBag> {
        self.get_json(data_url, "properties").await
    }

    pub async fn root_info(&self, data_url: &str) -> Result<RootInfo> {
        self.get_json(data_url, "root info").await
    }
}

/// Data URL for `object_id` in the form the host's data service expects.
///
/// Only a raw `/` is escaped. Ids that arrive already encoded, like
/// [`ROOT_OBJECT_ID`], pass through unchanged.
pub fn data_url(context_path: &str, object_id: &str, properties: &[&str]) -> String {
    let encoded = object_id.replace('/', "%2F");
    format!(
        "{}/rest/data/properties/{encoded}?properties={}",
        context_path.trim_end_matches('/'),
        properties.join(",")
    )
}
