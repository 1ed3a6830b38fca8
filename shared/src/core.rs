use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt::Debug;

#[cfg(any(test, feature = "mocks"))]
use mockall::{automock, predicate::*};

/// Downstream collaborator invoked once for every order that passes the filter.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait OrderHandler: Debug {
    async fn handle_order(&self, order: &RawOrder) -> Result<bool, String>;
}

/// An order as found in the event, with every field it arrived with.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawOrder(Map<String, Value>);

impl RawOrder {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn order_id(&self) -> Option<&Value> {
        self.0.get("orderId")
    }

    pub fn status(&self) -> Option<&Value> {
        self.0.get("status")
    }

    pub fn customer_email(&self) -> Option<&Value> {
        self.0.get("customerEmail")
    }
}

/// A record in one of the two shapes the extractor understands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Custom(CustomRecord),
    Change(ChangeRecord),
}

impl NormalizedRecord {
    pub fn custom(order: Value) -> Self {
        NormalizedRecord::Custom(CustomRecord { order: Some(order) })
    }
}

impl From<Value> for NormalizedRecord {
    fn from(value: Value) -> Self {
        if value.get("custom").is_some_and(is_truthy) {
            NormalizedRecord::Custom(CustomRecord {
                order: value.get("order").cloned(),
            })
        } else {
            NormalizedRecord::Change(ChangeRecord(value))
        }
    }
}

/// Whether a JSON value counts as set: not null, `false`, zero, or empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// An order supplied directly by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRecord {
    pub order: Option<Value>,
}

impl Serialize for CustomRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("custom", &true)?;
        if let Some(order) = &self.order {
            map.serialize_entry("order", order)?;
        }
        map.end()
    }
}

/// A change-stream record, kept verbatim so failures can echo it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeRecord(Value);

impl ChangeRecord {
    pub fn from_stream(dynamodb: Value, event_name: Option<Value>) -> Self {
        Self(json!({
            "dynamodb": dynamodb,
            "eventName": event_name.unwrap_or(Value::Null),
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn event_name(&self) -> Option<&str> {
        self.0.get("eventName").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedRecord {
    pub error: String,
    pub record: NormalizedRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub status: OutcomeStatus,
    pub processed: usize,
    pub valid_orders: Vec<RawOrder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedRecord>,
}

impl ProcessingOutcome {
    pub fn ok(valid_orders: Vec<RawOrder>) -> Self {
        Self {
            status: OutcomeStatus::Ok,
            processed: valid_orders.len(),
            valid_orders,
            failed: vec![],
        }
    }
}

/// Raised once per batch when at least one record failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub valid_orders: Vec<RawOrder>,
    pub failed: Vec<FailedRecord>,
}

impl BatchFailure {
    pub fn failed_json(&self) -> String {
        serde_json::to_string(&self.failed).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn into_partial_outcome(self) -> ProcessingOutcome {
        ProcessingOutcome {
            status: OutcomeStatus::Partial,
            processed: self.valid_orders.len(),
            valid_orders: self.valid_orders,
            failed: self.failed,
        }
    }
}

impl std::fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Some records failed: {}", self.failed_json())
    }
}
