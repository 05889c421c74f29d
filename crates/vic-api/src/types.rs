use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Property bags ───────────────────────────────────────────────────

/// Loosely-typed per-object record returned by the object-property service.
///
/// Keys are dotted property names (`summary.runtime.powerState`,
/// `config.extraConfig`, ...). Ordering of keys is preserved as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(pub Map<String, Value>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// First present string among `keys`.
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_str(k))
    }

    /// Reads `true`/`false`, `"true"`/`"false"` and `1`/`0` as booleans.
    pub fn get_bool_like(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    /// First non-negative integer among `keys`. Numeric strings are accepted.
    pub fn first_u64(&self, keys: &[&str]) -> Option<u64> {
        keys.iter().find_map(|k| match self.get(k)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn get_moref(&self, key: &str) -> Option<MoRef> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Extended configuration entries under `key`.
    ///
    /// Entries without a string key or a string value are skipped; they can
    /// never match a recognised key.
    pub fn extra_config(&self, key: &str) -> Vec<ExtraConfigEntry> {
        let Some(Value::Array(items)) = self.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let key = item.get("key")?.as_str()?;
                let value = item.get("value")?.as_str()?;
                Some(ExtraConfigEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            })
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }
}

/// One `{key, value}` pair of vendor-specific guest metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraConfigEntry {
    pub key: String,
    pub value: String,
}

/// Managed object reference as serialised by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub server_guid: Option<String>,
}

// ── Responses ───────────────────────────────────────────────────────

/// Body of the paginated list endpoint.
///
/// vic-service returns `data` / `totalResultCount`; the canned stubs use
/// `results` / `match`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(default, alias = "results")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, alias = "match", alias = "totalMatchedObjectCount")]
    pub total_result_count: u64,
}

impl ListResponse {
    /// Raw entries keyed by object id, in server order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter().flat_map(|m| m.iter())
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary of the plugin root object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootInfo {
    pub ui_version: String,
    #[serde(default)]
    pub vch_vms_len: u64,
    #[serde(default)]
    pub container_vms_len: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bool_like_accepts_strings_and_numbers() {
        let bag = PropertyBag::from_value(json!({
            "isVCH": "true",
            "isContainer": 0,
            "flag": false,
            "junk": "maybe",
        }))
        .unwrap();
        assert_eq!(bag.get_bool_like("isVCH"), Some(true));
        assert_eq!(bag.get_bool_like("isContainer"), Some(false));
        assert_eq!(bag.get_bool_like("flag"), Some(false));
        assert_eq!(bag.get_bool_like("junk"), None);
        assert_eq!(bag.get_bool_like("missing"), None);
    }

    #[test]
    fn extra_config_skips_unusable_entries() {
        let bag = PropertyBag::from_value(json!({
            "config.extraConfig": [
                { "dynamicType": null, "key": "a", "value": "1" },
                { "key": "b", "value": null },
                { "value": "orphan" },
                { "key": "c", "value": "3" },
            ]
        }))
        .unwrap();
        let keys: Vec<_> = bag
            .extra_config("config.extraConfig")
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn list_response_accepts_both_shapes_and_keeps_order() {
        let live: ListResponse = serde_json::from_value(json!({
            "data": { "z/vm-2": {}, "a/vm-1": {} },
            "totalResultCount": 7,
        }))
        .unwrap();
        let ids: Vec<_> = live.entries().map(|(k, _)| k.as_str()).collect();
        assert_eq!(ids, vec!["z/vm-2", "a/vm-1"]);
        assert_eq!(live.total_result_count, 7);

        let stub: ListResponse = serde_json::from_value(json!({
            "results": { "x/vm-9": {} },
            "match": 1,
        }))
        .unwrap();
        assert_eq!(stub.len(), 1);
        assert_eq!(stub.total_result_count, 1);

        let empty: ListResponse =
            serde_json::from_value(json!({ "data": null, "totalResultCount": 0 })).unwrap();
        assert!(empty.is_empty());
    }
}
