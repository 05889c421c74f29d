//! Deterministic stand-in data for standalone mode without live data.
//!
//! Pages are shaped exactly like live list responses so they go through the
//! same decoder.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use vic_api::{ListResponse, ListTarget, PropertyBag, QueryState, RootInfo, SortDirection};
use vic_model::decode::{
    CLIENT_IP_KEY, CONTAINER_NAME_KEY, DOCKER_PERSONALITY_ARGS_KEY, EXTRA_CONFIG_PROPERTY,
    IMAGE_NAME_KEY, PORT_MAPPING_KEY,
};

pub const HOST_COUNT: usize = 31;
pub const CONTAINER_COUNT: usize = 30;

const SERVER_GUID: &str = "85421094-c58e-40f9-a42c-b624160d05f5";

fn extra(key: &str, value: impl Into<String>) -> Value {
    json!({ "key": key, "value": value.into() })
}

fn host(i: usize) -> (String, Value) {
    let id = format!("{SERVER_GUID}/vm-{}", 27 + i);
    let name = if i == 0 {
        "vice-9703".to_string()
    } else {
        format!("vch-{i:02}")
    };
    let powered_off = i % 7 == 6;
    let tls = i % 3 != 2;
    let octet = (100 + i) as u8;
    // Alternate between the plain and the IPv6-mapped address encodings.
    let address = if i % 2 == 0 {
        STANDARD.encode([10, 17, 109, octet])
    } else {
        let mut mapped = [0u8; 16];
        mapped[10] = 0xff;
        mapped[11] = 0xff;
        mapped[12..].copy_from_slice(&[192, 168, 100, octet]);
        STANDARD.encode(mapped)
    };
    let (status, power) = if powered_off {
        ("GRAY", "poweredOff")
    } else {
        ("GREEN", "poweredOn")
    };
    let args = if tls {
        "/sbin/docker-engine-server|-port=2376|-port-layer-port=2377"
    } else {
        "/sbin/docker-engine-server|-port=2375|-port-layer-port=2377"
    };

    let value = json!({
        "id": id,
        "name": name,
        "isVCH": true,
        "isContainer": false,
        "overallStatus": status,
        "summary.runtime.powerState": power,
        "overallCpuUsage": (i * 37) % 1000,
        "guestMemoryUsage": 512 + i * 16,
        "committedStorage": (4_294_967_296 + i * 1_048_576) as u64,
        "resourcePool": {
            "type": "VirtualApp",
            "value": format!("resgroup-v{}", 26 + i),
            "serverGuid": SERVER_GUID,
        },
        "parentObjectName": name,
        EXTRA_CONFIG_PROPERTY: [
            extra(CLIENT_IP_KEY, address),
            extra(DOCKER_PERSONALITY_ARGS_KEY, args),
        ],
    });
    (id, value)
}

fn container(i: usize) -> (String, Value) {
    let id = format!("{SERVER_GUID}/vm-{}", 200 + i);
    let name = format!("Container-VM-{i}-blablablabla");
    let running = i % 4 != 3;
    let image = ["busybox", "nginx", "redis", "ubuntu"][i % 4];
    let power = if running { "poweredOn" } else { "poweredOff" };

    let mut config = vec![
        extra(CONTAINER_NAME_KEY, format!("container-{i}")),
        extra(IMAGE_NAME_KEY, image),
    ];
    if image == "nginx" {
        config.push(extra(PORT_MAPPING_KEY, format!("{}:80/tcp", 8000 + i)));
    }

    let value = json!({
        "id": id,
        "name": name,
        "isVCH": false,
        "isContainer": true,
        "overallStatus": "GREEN",
        "summary.runtime.powerState": power,
        "overallCpuUsage": (i * 13) % 500,
        "guestMemoryUsage": 64 + i * 8,
        "committedStorage": (268_435_456 + i * 4096) as u64,
        "resourcePool": {
            "type": "VirtualApp",
            "value": format!("resgroup-v{}", 26 + i % 3),
            "serverGuid": SERVER_GUID,
        },
        "parentObjectName": format!("vch-{:02}", i % 3),
        EXTRA_CONFIG_PROPERTY: config,
    });
    (id, value)
}

pub fn all(target: ListTarget) -> Vec<(String, Value)> {
    match target {
        ListTarget::Hosts => (0..HOST_COUNT).map(host).collect(),
        ListTarget::Containers => (0..CONTAINER_COUNT).map(container).collect(),
    }
}

fn text(value: &Value, property: &str) -> String {
    match value.get(property) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// One page of canned entries.
///
/// Filter terms match case-insensitively by substring, sorting is by the
/// textual value of the sort field, and `totalResultCount` counts every
/// entry that passed the filter.
pub fn list_page(target: ListTarget, query: &QueryState) -> ListResponse {
    let mut entries: Vec<_> = all(target)
        .into_iter()
        .filter(|(_, value)| {
            query.filter.iter().all(|term| {
                text(value, &term.property)
                    .to_lowercase()
                    .contains(&term.value.to_lowercase())
            })
        })
        .collect();

    entries.sort_by_cached_key(|(_, value)| text(value, &query.sort.field));
    if query.sort.direction == SortDirection::Desc {
        entries.reverse();
    }

    let total = entries.len() as u64;
    let data: Map<String, Value> = entries
        .into_iter()
        .skip(query.offset as usize)
        .take(query.page_size.get() as usize)
        .collect();

    ListResponse {
        data: Some(data),
        total_result_count: total,
    }
}

/// First canned VM of the given kind.
pub fn vm(target: ListTarget) -> PropertyBag {
    let (_, value) = match target {
        ListTarget::Hosts => host(0),
        ListTarget::Containers => container(0),
    };
    PropertyBag::from_value(value).unwrap_or_default()
}

pub fn root_info() -> RootInfo {
    RootInfo {
        ui_version: "3.14159265".into(),
        vch_vms_len: 1000,
        container_vms_len: 50000,
    }
}
