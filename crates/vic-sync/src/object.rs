use serde_json::Value;
use vic_api::{ListTarget, ROOT_OBJECT_ID, RootInfo};
use vic_model::decode::{ID_PROPERTY, VM_PROPERTIES};
use vic_model::{VirtualMachineSummary, decode, parse_canonical_vm_id};
use vic_platform::PlatformAdapter;

use crate::SyncError;

const ROOT_PROPERTIES: &[&str] = &["uiVersion", "vchVmsLen", "containerVmsLen"];

/// Fetches and decodes one VM.
///
/// `object_id` is either the raw `<owner>/<vm>` id or the canonical VM id.
/// Without live data the first canned VM of `stub_kind` is returned.
pub async fn fetch_vm(
    platform: &dyn PlatformAdapter,
    object_id: &str,
    stub_kind: ListTarget,
) -> Result<VirtualMachineSummary, SyncError> {
    if !platform.use_live_data() {
        return Ok(decode(&platform.canned_vm(stub_kind))?);
    }

    let url = platform.build_data_url(object_id, VM_PROPERTIES);
    tracing::debug!(object_id, %url, "fetching vm properties");
    let mut bag = platform.fetch_properties(&url).await?;

    // The property endpoint answers with the canonical id, or leaves it out.
    let id = bag.get_str(ID_PROPERTY).unwrap_or(object_id);
    let raw = raw_vm_id(id);
    bag.insert(ID_PROPERTY, Value::String(raw));

    decode(&bag).map_err(|e| {
        tracing::warn!(object_id, error = %e, "vm failed to decode");
        e.into()
    })
}

/// `<owner>/<vm>` form of a canonical VM id; other ids are kept as they are.
fn raw_vm_id(id: &str) -> String {
    match parse_canonical_vm_id(id) {
        Some((vm, owner)) => format!("{owner}/{vm}"),
        None => id.to_string(),
    }
}

pub async fn fetch_root_info(platform: &dyn PlatformAdapter) -> Result<RootInfo, SyncError> {
    if !platform.use_live_data() {
        return Ok(platform.canned_root_info());
    }
    let url = platform.build_data_url(ROOT_OBJECT_ID, ROOT_PROPERTIES);
    Ok(platform.fetch_root_info(&url).await?)
}
