//! Defensive parsing of the free-form notification payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Routing hints attached to a notification (`contractId`, `companyId`,
/// other domain ids).
///
/// The wire value may be a JSON object, a JSON-encoded string, null, or
/// garbage. Parsing never fails outward: anything unusable becomes the
/// empty map, with the failure logged, so routing falls through to its
/// default behavior instead of erroring.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NotificationPayload(Map<String, Value>);

impl NotificationPayload {
    /// Parse a raw payload value into a key-value map.
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::Object(map) => NotificationPayload(map.clone()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => NotificationPayload(map),
                Ok(other) => {
                    tracing::warn!("notification payload string is not an object: {other}");
                    NotificationPayload::default()
                }
                Err(e) => {
                    tracing::warn!("failed to parse notification payload string: {e}");
                    NotificationPayload::default()
                }
            },
            Value::Null => NotificationPayload::default(),
            other => {
                tracing::warn!("unexpected notification payload shape: {other}");
                NotificationPayload::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read an id-valued entry, tolerating both JSON strings and numbers.
    pub fn id_value(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn contract_id(&self) -> Option<String> {
        self.id_value("contractId")
    }

    pub fn company_id(&self) -> Option<String> {
        self.id_value("companyId")
    }
}

impl<'de> Deserialize<'de> for NotificationPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(NotificationPayload::parse(&value))
    }
}

impl From<Map<String, Value>> for NotificationPayload {
    fn from(map: Map<String, Value>) -> Self {
        NotificationPayload(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_payload_parses_directly() {
        let payload = NotificationPayload::parse(&json!({ "contractId": "abc" }));
        assert_eq!(payload.contract_id().as_deref(), Some("abc"));
    }

    #[test]
    fn string_encoded_payload_is_decoded() {
        let payload = NotificationPayload::parse(&json!("{\"companyId\":\"co-7\"}"));
        assert_eq!(payload.company_id().as_deref(), Some("co-7"));
    }

    #[test]
    fn malformed_string_payload_becomes_empty() {
        let payload = NotificationPayload::parse(&json!("{not json"));
        assert!(payload.is_empty());
        assert_eq!(payload.contract_id(), None);
    }

    #[test]
    fn non_object_payloads_become_empty() {
        assert!(NotificationPayload::parse(&json!(null)).is_empty());
        assert!(NotificationPayload::parse(&json!(42)).is_empty());
        assert!(NotificationPayload::parse(&json!(["a"])).is_empty());
        assert!(NotificationPayload::parse(&json!("\"just a string\"")).is_empty());
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let payload = NotificationPayload::parse(&json!({ "contractId": 118 }));
        assert_eq!(payload.contract_id().as_deref(), Some("118"));
    }
}
