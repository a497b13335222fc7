//! Events
//!
//! An event is the record that flows from the host store into the
//! scheduler: a `kind` discriminator plus arbitrary payload fields. On the
//! wire it is flat, `{"type": "FRUIT", "payload": "apple"}`, so `"type"` is
//! reserved for the kind and never stored as a payload field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SagaError;

const KIND_KEY: &str = "type";

/// A discriminated record dispatched through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The discriminator watch patterns match against.
    #[serde(rename = "type")]
    kind: String,

    /// Every other field of the record.
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Event {
    /// Create an event with no payload fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Create an event carrying a single `payload` field.
    ///
    /// ```rust,ignore
    /// let event = Event::with_payload("FRUIT", "apple");
    /// ```
    pub fn with_payload(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self::new(kind).field("payload", payload)
    }

    /// Add a field, replacing any previous value under the same key.
    ///
    /// A `"type"` key is ignored; the kind is fixed at construction.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == KIND_KEY {
            tracing::debug!(kind = %self.kind, "ignored reserved event field");
            return self;
        }
        self.payload.insert(key, value.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Rebuild an event from its flat JSON form.
    pub fn from_value(value: Value) -> Result<Self, SagaError> {
        Ok(serde_json::from_value(value)?)
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        let mut record = event.payload;
        record.insert(KIND_KEY.to_string(), Value::String(event.kind));
        Value::Object(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat_with_type_key() {
        let event = Event::with_payload("FRUIT", "apple");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "FRUIT", "payload": "apple" })
        );
        assert_eq!(Value::from(event), json!({ "type": "FRUIT", "payload": "apple" }));
    }

    #[test]
    fn from_value_restores_fields() {
        let event = Event::from_value(json!({ "type": "TRIGGER", "count": 2 })).unwrap();
        assert_eq!(event.kind(), "TRIGGER");
        assert_eq!(event.get("count"), Some(&json!(2)));
    }

    #[test]
    fn type_field_cannot_shadow_the_kind() {
        let event = Event::new("A").field("type", "B").field("count", 1);

        assert_eq!(event.kind(), "A");
        assert_eq!(event.get("type"), None);
        assert_eq!(serde_json::to_value(&event).unwrap(), Value::from(event.clone()));
        assert_eq!(Event::from_value(Value::from(event.clone())).unwrap(), event);
    }

    #[test]
    fn from_value_without_type_fails() {
        let err = Event::from_value(json!({ "payload": 1 })).unwrap_err();
        assert!(matches!(err, SagaError::Decode(_)));
    }
}
