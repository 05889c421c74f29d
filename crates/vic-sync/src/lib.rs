//! Keeps host and container lists in sync with the platform.
//!
//! Each [`ListSyncService`] owns one list, retrieves pages through the
//! selected [`vic_platform::PlatformAdapter`] and publishes decoded
//! snapshots over a watch channel.

mod error;
pub mod list;
pub mod object;

pub use error::SyncError;
pub use list::{ListSnapshot, ListSyncService, SyncState, decode_page};
pub use object::{fetch_root_info, fetch_vm};
