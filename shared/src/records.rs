use crate::core::{ChangeRecord, NormalizedRecord};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("`{field}` must be a sequence of records, found `{found}`")]
    RecordsNotASequence { field: &'static str, found: String },
}

/// The envelope shapes an invocation payload can arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum EventShape<'a> {
    /// A list of wrapper objects, each with its own `orders` list.
    OrderBatches(&'a [Value]),
    /// A change stream delivery: `{"Records": [...]}`.
    StreamRecords(&'a Value),
    /// An event bus delivery forwarding a batch: `{"detail": {"records": [...]}}`.
    DetailRecords(&'a Value),
    /// An event bus delivery forwarding a single change.
    DetailChange {
        dynamodb: &'a Value,
        event_name: Option<&'a Value>,
    },
    /// Orders supplied directly: `{"orders": [...]}`.
    Orders(&'a [Value]),
    Unrecognized,
}

impl<'a> EventShape<'a> {
    pub fn classify(event: &'a Value) -> Self {
        let fields = match event {
            Value::Array(batches) => return EventShape::OrderBatches(batches),
            Value::Object(fields) => fields,
            _ => return EventShape::Unrecognized,
        };

        if let Some(records) = fields.get("Records") {
            return EventShape::StreamRecords(records);
        }
        if let Some(Value::Object(detail)) = fields.get("detail") {
            if let Some(records) = detail.get("records") {
                return EventShape::DetailRecords(records);
            }
            if let Some(dynamodb) = detail.get("dynamodb") {
                return EventShape::DetailChange {
                    dynamodb,
                    event_name: detail.get("eventName"),
                };
            }
        }
        if let Some(Value::Array(orders)) = fields.get("orders") {
            return EventShape::Orders(orders);
        }

        EventShape::Unrecognized
    }

    pub fn into_records(self) -> Result<Vec<NormalizedRecord>, EnvelopeError> {
        match self {
            EventShape::OrderBatches(batches) => Ok(batches
                .iter()
                .filter_map(|batch| batch.get("orders").and_then(Value::as_array))
                .flat_map(|orders| custom_records(orders))
                .collect()),
            EventShape::StreamRecords(records) => passthrough("Records", records),
            EventShape::DetailRecords(records) => passthrough("detail.records", records),
            EventShape::DetailChange {
                dynamodb,
                event_name,
            } => Ok(vec![NormalizedRecord::Change(ChangeRecord::from_stream(
                dynamodb.clone(),
                event_name.cloned(),
            ))]),
            EventShape::Orders(orders) => Ok(custom_records(orders).collect()),
            EventShape::Unrecognized => Ok(vec![]),
        }
    }
}

/// Reshapes an invocation payload into the records it carries, in discovery order.
pub fn normalize(event: &Value) -> Result<Vec<NormalizedRecord>, EnvelopeError> {
    EventShape::classify(event).into_records()
}

fn custom_records(orders: &[Value]) -> impl Iterator<Item = NormalizedRecord> + '_ {
    orders.iter().cloned().map(NormalizedRecord::custom)
}

fn passthrough(field: &'static str, records: &Value) -> Result<Vec<NormalizedRecord>, EnvelopeError> {
    records
        .as_array()
        .map(|records| records.iter().cloned().map(NormalizedRecord::from).collect())
        .ok_or_else(|| EnvelopeError::RecordsNotASequence {
            field,
            found: records.to_string(),
        })
}
