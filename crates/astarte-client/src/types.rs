use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Every AppEngine / Realm Management response wraps its payload in a
/// `data` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiData<T> {
    pub data: T,
}

/// One interface entry in a device introspection.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceIntrospection {
    pub major: i32,
    pub minor: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceDetails {
    pub id: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub last_connection: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_disconnection: Option<DateTime<Utc>>,
    #[serde(default)]
    pub introspection: HashMap<String, InterfaceIntrospection>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub total_received_msgs: u64,
    #[serde(default)]
    pub total_received_bytes: u64,
    #[serde(default)]
    pub last_seen_ip: Option<String>,
    #[serde(default)]
    pub last_credentials_request_ip: Option<String>,
    #[serde(default)]
    pub first_registration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub first_credentials_request: Option<DateTime<Utc>>,
}

/// A single datastream sample. Ordering key is `timestamp`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatastreamValue {
    pub value: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub reception_timestamp: DateTime<Utc>,
}

impl fmt::Display for DatastreamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Timestamp: {}, Reception Timestamp: {})",
            display_value(&self.value),
            self.timestamp,
            self.reception_timestamp
        )
    }
}

/// Print scalars the way a human expects them: strings unquoted, everything
/// else as JSON.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Snapshot of an object-aggregated datastream interface: one shared
/// timestamp for all paths.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateDatastreamSnapshot {
    pub values: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub reception_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceType {
    Datastream,
    Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Individual,
    Object,
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::Individual
    }
}

/// Typed interface description from Realm Management. Replaces the untyped
/// map the platform used to hand back to callers.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceDescription {
    pub interface_name: String,
    pub version_major: i32,
    pub version_minor: i32,
    #[serde(rename = "type")]
    pub interface_type: InterfaceType,
    #[serde(default)]
    pub aggregation: Aggregation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_description_decodes_typed_fields() {
        let json = r#"{
            "interface_name": "org.astarte-platform.genericsensors.Values",
            "version_major": 1,
            "version_minor": 0,
            "type": "datastream",
            "aggregation": "object"
        }"#;
        let desc: InterfaceDescription = serde_json::from_str(json).unwrap();
        assert_eq!(desc.interface_type, InterfaceType::Datastream);
        assert_eq!(desc.aggregation, Aggregation::Object);
    }

    #[test]
    fn aggregation_defaults_to_individual() {
        let json = r#"{
            "interface_name": "org.astarte-platform.genericsensors.Values",
            "version_major": 0,
            "version_minor": 3,
            "type": "properties"
        }"#;
        let desc: InterfaceDescription = serde_json::from_str(json).unwrap();
        assert_eq!(desc.interface_type, InterfaceType::Properties);
        assert_eq!(desc.aggregation, Aggregation::Individual);
    }

    #[test]
    fn datastream_value_displays_raw_strings() {
        let value = DatastreamValue {
            value: serde_json::json!("on"),
            timestamp: "2024-03-01T10:00:00Z".parse().unwrap(),
            reception_timestamp: "2024-03-01T10:00:01Z".parse().unwrap(),
        };
        let printed = value.to_string();
        assert!(printed.starts_with("on (Timestamp: "));
        assert!(!printed.contains('"'));
    }
}
