// Host/service status records, column mapping, transport stats

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const LAST_STATE_CHANGE: &str = "last_state_change";
pub const TAG: &str = "tag";
pub const SERVICES: &str = "services";

/// Entity name (host name) -> record. Merges across backends are last-write-wins.
pub type StateMapping = BTreeMap<String, StatusRecord>;

/// "hostname:port" -> diagnostics for the request(s) made to that backend.
pub type TransportStats = BTreeMap<String, TransportStat>;

/// Backend-native fields of one host (or service), plus `tag` once aggregated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRecord(Map<String, Value>);

impl StatusRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Seconds since epoch of the last state change; 0 when missing or not numeric.
    pub fn last_state_change(&self) -> i64 {
        self.get_i64(LAST_STATE_CHANGE).unwrap_or(0)
    }

    pub fn tag(&self) -> Option<&str> {
        self.get(TAG).and_then(Value::as_str)
    }

    /// Sets the originating instance tag, replacing any tag the backend reported.
    pub fn set_tag(&mut self, tag: &str) {
        self.0
            .insert(TAG.to_string(), Value::String(tag.to_string()));
    }

    /// Reads a field as an integer, accepting JSON numbers and numeric strings.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(value_as_i64)
    }

    /// Reads a field as display text (strings verbatim, other scalars via to_string).
    pub fn get_text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Nested service records keyed by service description.
    pub fn services(&self) -> impl Iterator<Item = (&str, StatusRecord)> {
        self.get(SERVICES)
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|m| m.iter())
            .filter_map(|(name, v)| {
                v.as_object()
                    .map(|fields| (name.as_str(), StatusRecord(fields.clone())))
            })
    }

    /// Adds (or replaces) a nested service record, creating the `services` object if needed.
    pub fn insert_service(&mut self, description: impl Into<String>, service: StatusRecord) {
        let services = self
            .0
            .entry(SERVICES)
            .or_insert_with(|| Value::Object(Map::new()));
        if !services.is_object() {
            *services = Value::Object(Map::new());
        }
        if let Value::Object(services) = services {
            services.insert(description.into(), Value::Object(service.0));
        }
    }

    /// Rewrites `last_state_change` (here and in nested services) as an integer.
    pub fn normalize_last_state_change(&mut self) {
        normalize_timestamp(&mut self.0);
        if let Some(Value::Object(services)) = self.0.get_mut(SERVICES) {
            for svc in services.values_mut() {
                if let Value::Object(fields) = svc {
                    normalize_timestamp(fields);
                }
            }
        }
    }
}

fn normalize_timestamp(fields: &mut Map<String, Value>) {
    let ts = fields
        .get(LAST_STATE_CHANGE)
        .and_then(value_as_i64)
        .unwrap_or(0);
    fields.insert(LAST_STATE_CHANGE.to_string(), Value::from(ts));
}

/// Integer view of a JSON scalar; backends report numbers as strings more often than not.
pub fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Logical display columns looked up through a [`ColumnMapping`].
pub mod columns {
    pub const STATE: &str = "state";
    pub const OUTPUT: &str = "output";
    pub const ACKNOWLEDGED: &str = "acknowledged";
    pub const DOWNTIME: &str = "downtime";
    pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
    pub const FLAPPING: &str = "flapping";
    pub const CURRENT_ATTEMPT: &str = "current_attempt";
    pub const MAX_ATTEMPTS: &str = "max_attempts";
    pub const LAST_STATE_CHANGE: &str = super::LAST_STATE_CHANGE;
}

/// Logical column -> backend-native field name. Each backend kind has its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Native field for a logical column; falls back to the logical name itself.
    pub fn field<'a>(&'a self, column: &'a str) -> &'a str {
        self.get(column).unwrap_or(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Diagnostics for one backend exchange.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportStat {
    pub url: String,
    /// HTTP status, or the Livestatus response-header status.
    pub status_code: u16,
    pub total_time_ms: f64,
    pub size_download: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}
