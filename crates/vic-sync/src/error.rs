use serde::Serialize;
use vic_model::DecodeError;

/// Why a list or object retrieval did not produce records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum SyncError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("empty or unauthorized response: {0}")]
    EmptyOrUnauthorized(String),
}

impl From<vic_api::Error> for SyncError {
    fn from(e: vic_api::Error) -> Self {
        if e.is_unauthorized_or_empty() {
            Self::EmptyOrUnauthorized(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<vic_platform::Error> for SyncError {
    fn from(e: vic_platform::Error) -> Self {
        match e {
            vic_platform::Error::Api(e) => e.into(),
            other => Self::Transport(other.to_string()),
        }
    }
}
