use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder shown when an endpoint cannot be derived.
pub const NOT_AVAILABLE: &str = "-";

// ── Shared parts ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    Unknown,
}

impl PowerState {
    pub fn parse(s: &str) -> Self {
        match s {
            "poweredOn" => Self::PoweredOn,
            "poweredOff" => Self::PoweredOff,
            "suspended" => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoweredOn => "poweredOn",
            Self::PoweredOff => "poweredOff",
            Self::Suspended => "suspended",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform health summary of a managed entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Green,
    Yellow,
    Red,
    #[default]
    Gray,
}

impl OverallStatus {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "red" => Self::Red,
            _ => Self::Gray,
        }
    }
}

/// Parent resource pool or vApp that owns a VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceScope {
    /// Managed object id of the parent, e.g. `resgroup-v26`.
    pub id: String,
    /// Managed object type of the parent (`VirtualApp`, `ResourcePool`).
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub cpu_usage_percent: u64,
    pub memory_usage_bytes: u64,
    pub committed_storage_bytes: u64,
}

// ── Records ─────────────────────────────────────────────────────────

/// A container-runtime host VM (VCH).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    pub id: String,
    pub name: String,
    pub overall_status: OverallStatus,
    pub power_state: PowerState,
    /// Dotted quad of the client network address, or empty when unknown.
    pub client_address: String,
    pub uses_encrypted_transport: bool,
    pub docker_endpoint: String,
    pub admin_portal_url: String,
    #[serde(flatten)]
    pub usage: Usage,
    pub resource_scope: ResourceScope,
}

/// An application container VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub container_name: String,
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_mapping: Option<String>,
    pub overall_status: OverallStatus,
    pub power_state: PowerState,
    #[serde(flatten)]
    pub usage: Usage,
    pub resource_scope: ResourceScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VirtualMachineSummary {
    #[serde(rename = "vch")]
    Host(HostRecord),
    Container(ContainerRecord),
}

impl VirtualMachineSummary {
    pub fn id(&self) -> &str {
        match self {
            Self::Host(h) => &h.id,
            Self::Container(c) => &c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Host(h) => &h.name,
            Self::Container(c) => &c.name,
        }
    }

    pub fn power_state(&self) -> PowerState {
        match self {
            Self::Host(h) => h.power_state,
            Self::Container(c) => c.power_state,
        }
    }

    pub fn resource_scope(&self) -> &ResourceScope {
        match self {
            Self::Host(h) => &h.resource_scope,
            Self::Container(c) => &c.resource_scope,
        }
    }

    pub fn as_host(&self) -> Option<&HostRecord> {
        match self {
            Self::Host(h) => Some(h),
            Self::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerRecord> {
        match self {
            Self::Container(c) => Some(c),
            Self::Host(_) => None,
        }
    }
}

/// Canonical VM id: `urn:vmomi:VirtualMachine:<vmMoId>:<scopeMoId>`.
pub fn canonical_vm_id(vm_mo_id: &str, scope_mo_id: &str) -> String {
    format!("urn:vmomi:VirtualMachine:{vm_mo_id}:{scope_mo_id}")
}

/// Inverse of [`canonical_vm_id`], returning `(vm_mo_id, scope_mo_id)`.
pub fn parse_canonical_vm_id(id: &str) -> Option<(&str, &str)> {
    let rest = id.strip_prefix("urn:vmomi:VirtualMachine:")?;
    let (vm, scope) = rest.split_once(':')?;
    (!vm.is_empty() && !scope.is_empty()).then_some((vm, scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_parses_back() {
        let id = canonical_vm_id("vm-27", "85421094-c58e-40f9-a42c-b624160d05f5");
        assert_eq!(
            parse_canonical_vm_id(&id),
            Some(("vm-27", "85421094-c58e-40f9-a42c-b624160d05f5"))
        );
        assert_eq!(parse_canonical_vm_id("urn:vmomi:VirtualMachine:vm-27"), None);
        assert_eq!(parse_canonical_vm_id("guid/vm-27"), None);
    }
}
