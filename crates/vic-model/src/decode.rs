//! Property bag → typed record decoding.

use serde::Serialize;
use serde_json::Value;
use vic_api::PropertyBag;

use crate::address::decode_client_address;
use crate::records::{
    ContainerRecord, HostRecord, NOT_AVAILABLE, OverallStatus, PowerState, ResourceScope, Usage,
    VirtualMachineSummary, canonical_vm_id,
};

// ── Property names ──────────────────────────────────────────────────

pub const ID_PROPERTY: &str = "id";
pub const NAME_PROPERTY: &str = "name";
pub const IS_HOST_PROPERTY: &str = "isVCH";
pub const IS_CONTAINER_PROPERTY: &str = "isContainer";
pub const OVERALL_STATUS_PROPERTY: &str = "overallStatus";
pub const RESOURCE_POOL_PROPERTY: &str = "resourcePool";
pub const PARENT_NAME_PROPERTY: &str = "parentObjectName";
pub const EXTRA_CONFIG_PROPERTY: &str = "config.extraConfig";

const POWER_STATE_PROPERTIES: &[&str] =
    &["summary.runtime.powerState", "runtime.powerState", "powerState"];
const CPU_USAGE_PROPERTIES: &[&str] = &["overallCpuUsage", "summary.quickStats.overallCpuUsage"];
const MEMORY_USAGE_PROPERTIES: &[&str] =
    &["guestMemoryUsage", "summary.quickStats.guestMemoryUsage"];
const COMMITTED_STORAGE_PROPERTIES: &[&str] = &["committedStorage", "summary.storage.committed"];

/// Properties to request when fetching a single VM.
pub const VM_PROPERTIES: &[&str] = &[
    ID_PROPERTY,
    NAME_PROPERTY,
    IS_HOST_PROPERTY,
    IS_CONTAINER_PROPERTY,
    OVERALL_STATUS_PROPERTY,
    RESOURCE_POOL_PROPERTY,
    "summary.runtime.powerState",
    EXTRA_CONFIG_PROPERTY,
];

// ── Extended configuration keys ─────────────────────────────────────

pub const CLIENT_IP_KEY: &str = "guestinfo.vice..init.networks|client.assigned.IP";
pub const DOCKER_PERSONALITY_ARGS_KEY: &str =
    "guestinfo.vice./init/sessions|docker-personality/cmd/Args~";
pub const IMAGE_NAME_KEY: &str = "guestinfo.vice./repo";
pub const CONTAINER_NAME_KEY: &str = "guestinfo.vice./common/name";
pub const PORT_MAPPING_KEY: &str = "guestinfo.vice./networks|bridge/ports~";

pub const DOCKER_TLS_PORT: u16 = 2376;
pub const DOCKER_PLAIN_PORT: u16 = 2375;
pub const ADMIN_PORTAL_PORT: u16 = 2378;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DecodeError {
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("malformed binary field {key}: {reason}")]
    MalformedBinaryField { key: String, reason: String },

    #[error("unknown vm kind: {0}")]
    UnknownKind(String),

    #[error("entry is not an object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Host,
    Container,
}

/// Recognised extended-configuration values, collected before any derivation.
#[derive(Debug, Default)]
struct GuestInfo {
    client_ip: Option<String>,
    docker_args: Option<String>,
    image_name: Option<String>,
    container_name: Option<String>,
    port_mapping: Option<String>,
}

impl GuestInfo {
    fn collect(bag: &PropertyBag) -> Self {
        let mut info = Self::default();
        for entry in bag.extra_config(EXTRA_CONFIG_PROPERTY) {
            let slot = match entry.key.as_str() {
                CLIENT_IP_KEY => &mut info.client_ip,
                DOCKER_PERSONALITY_ARGS_KEY => &mut info.docker_args,
                IMAGE_NAME_KEY => &mut info.image_name,
                CONTAINER_NAME_KEY => &mut info.container_name,
                PORT_MAPPING_KEY => &mut info.port_mapping,
                _ => continue,
            };
            *slot = Some(entry.value);
        }
        info
    }

    /// Legacy hosts never wrote the argument vector and always used TLS.
    fn uses_tls(&self) -> bool {
        self.docker_args
            .as_deref()
            .is_none_or(|args| args.contains("2376"))
    }
}

/// Decodes one raw list entry.
pub fn decode_value(value: &Value) -> Result<VirtualMachineSummary> {
    let bag = PropertyBag::from_value(value.clone()).ok_or(DecodeError::NotAnObject)?;
    decode(&bag)
}

/// Decodes a property bag into a host or container record.
///
/// Fails as a whole when the identity cannot be established or an address
/// payload is corrupt; no partially populated record is ever returned.
pub fn decode(bag: &PropertyBag) -> Result<VirtualMachineSummary> {
    let kind = kind(bag)?;
    let (id, resource_scope) = identity(bag)?;

    let name = bag.get_str(NAME_PROPERTY).unwrap_or_default().to_string();
    let overall_status = bag
        .get_str(OVERALL_STATUS_PROPERTY)
        .map(OverallStatus::parse)
        .unwrap_or_default();
    let power_state = bag
        .first_str(POWER_STATE_PROPERTIES)
        .map_or(PowerState::Unknown, PowerState::parse);
    let usage = Usage {
        cpu_usage_percent: bag.first_u64(CPU_USAGE_PROPERTIES).unwrap_or(0),
        memory_usage_bytes: bag.first_u64(MEMORY_USAGE_PROPERTIES).unwrap_or(0),
        committed_storage_bytes: bag.first_u64(COMMITTED_STORAGE_PROPERTIES).unwrap_or(0),
    };

    match kind {
        Kind::Host => {
            let mut host = HostRecord {
                id,
                name,
                overall_status,
                power_state,
                client_address: String::new(),
                uses_encrypted_transport: true,
                docker_endpoint: NOT_AVAILABLE.to_string(),
                admin_portal_url: NOT_AVAILABLE.to_string(),
                usage,
                resource_scope,
            };
            if power_state == PowerState::PoweredOff {
                tracing::trace!(id = %host.id, "powered-off host, guest info not parsed");
                return Ok(VirtualMachineSummary::Host(host));
            }

            let guest = GuestInfo::collect(bag);
            host.uses_encrypted_transport = guest.uses_tls();
            if let Some(encoded) = &guest.client_ip {
                let address = decode_client_address(encoded).map_err(|reason| {
                    DecodeError::MalformedBinaryField {
                        key: CLIENT_IP_KEY.to_string(),
                        reason,
                    }
                })?;
                let port = if host.uses_encrypted_transport {
                    DOCKER_TLS_PORT
                } else {
                    DOCKER_PLAIN_PORT
                };
                host.client_address = address.to_string();
                host.docker_endpoint = format!("DOCKER_HOST=tcp://{address}:{port}");
                host.admin_portal_url = format!("https://{address}:{ADMIN_PORTAL_PORT}");
            }
            Ok(VirtualMachineSummary::Host(host))
        }
        Kind::Container => {
            let guest = GuestInfo::collect(bag);
            Ok(VirtualMachineSummary::Container(ContainerRecord {
                id,
                name,
                container_name: guest.container_name.unwrap_or_default(),
                image_name: guest.image_name.unwrap_or_default(),
                port_mapping: guest.port_mapping,
                overall_status,
                power_state,
                usage,
                resource_scope,
            }))
        }
    }
}

fn kind(bag: &PropertyBag) -> Result<Kind> {
    let is_host = bag.get_bool_like(IS_HOST_PROPERTY).unwrap_or(false);
    let is_container = bag.get_bool_like(IS_CONTAINER_PROPERTY).unwrap_or(false);
    match (is_host, is_container) {
        (true, false) => Ok(Kind::Host),
        (false, true) => Ok(Kind::Container),
        (true, true) => Err(DecodeError::UnknownKind(
            "both isVCH and isContainer are set".into(),
        )),
        (false, false) => Err(DecodeError::UnknownKind(
            "neither isVCH nor isContainer is set".into(),
        )),
    }
}

/// Splits the raw `<ownerId>/<vmMoId>` id and resolves the resource scope.
fn identity(bag: &PropertyBag) -> Result<(String, ResourceScope)> {
    let raw = bag
        .get_str(ID_PROPERTY)
        .ok_or_else(|| DecodeError::MalformedIdentity("missing id".into()))?;

    let (owner, vm) = match raw.split_once('/') {
        Some((owner, vm)) if !owner.is_empty() && !vm.is_empty() && !vm.contains('/') => {
            (owner, vm)
        }
        _ => {
            return Err(DecodeError::MalformedIdentity(format!(
                "id {raw:?} is not of the form <owner>/<vm>"
            )));
        }
    };

    let pool = bag
        .get_moref(RESOURCE_POOL_PROPERTY)
        .filter(|p| !p.value.is_empty() && !p.kind.is_empty())
        .ok_or_else(|| {
            DecodeError::MalformedIdentity(format!("{raw}: missing resource scope"))
        })?;

    let scope = ResourceScope {
        id: pool.value,
        kind: pool.kind,
        name: bag.get_str(PARENT_NAME_PROPERTY).map(str::to_string),
    };
    Ok((canonical_vm_id(vm, owner), scope))
}
