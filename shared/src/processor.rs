use crate::core::{
    BatchFailure, FailedRecord, NormalizedRecord, OrderHandler, ProcessingOutcome, RawOrder,
};
use crate::extraction::{extract, ExtractionError};
use crate::records::{normalize, EnvelopeError};
use serde_json::Value;

pub const DEFAULT_AMOUNT_THRESHOLD: f64 = 100.0;

/// Everything that can go wrong with a single record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("order handler failed: {0}")]
    Handler(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("invalid event envelope: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("{0}")]
    Batch(BatchFailure),
}

/// What happened to a record that did not fail.
enum RecordOutcome {
    Accepted(RawOrder),
    Filtered,
    Skipped,
}

#[derive(Debug, Default)]
struct Tally {
    filtered: usize,
    skipped: usize,
}

#[derive(Debug)]
pub struct BatchProcessor<H: OrderHandler> {
    handler: H,
    amount_threshold: f64,
}

impl<H: OrderHandler> BatchProcessor<H> {
    pub fn new(handler: H) -> Self {
        Self::with_threshold(handler, DEFAULT_AMOUNT_THRESHOLD)
    }

    pub fn with_threshold(handler: H, amount_threshold: f64) -> Self {
        Self {
            handler,
            amount_threshold,
        }
    }

    /// Runs every record of the event through extraction and the amount filter.
    ///
    /// A failing record never stops the batch, but any failure turns the whole result into
    /// [`ProcessError::Batch`]. A malformed envelope aborts before any record is touched.
    #[tracing::instrument(skip(self, event))]
    pub async fn process(&self, event: &Value) -> Result<ProcessingOutcome, ProcessError> {
        let records = normalize(event)?;
        tracing::info!("Found {} records to process", records.len());

        let mut valid_orders = vec![];
        let mut failed = vec![];
        let mut tally = Tally::default();

        for record in records {
            match self.process_record(&record).await {
                Ok(RecordOutcome::Accepted(order)) => valid_orders.push(order),
                Ok(RecordOutcome::Filtered) => tally.filtered += 1,
                Ok(RecordOutcome::Skipped) => tally.skipped += 1,
                Err(e) => {
                    tracing::error!("Error processing record: {}", e);
                    failed.push(FailedRecord {
                        error: e.to_string(),
                        record,
                    });
                }
            }
        }

        tracing::info!(
            valid = valid_orders.len(),
            filtered = tally.filtered,
            skipped = tally.skipped,
            failed = failed.len(),
            "Processing summary"
        );

        if !failed.is_empty() {
            return Err(ProcessError::Batch(BatchFailure {
                valid_orders,
                failed,
            }));
        }
        Ok(ProcessingOutcome::ok(valid_orders))
    }

    async fn process_record(&self, record: &NormalizedRecord) -> Result<RecordOutcome, RecordError> {
        let extracted = match extract(record)? {
            Some(extracted) => extracted,
            None => {
                tracing::warn!(
                    "Empty order data found in record: {}",
                    serde_json::to_string(record).unwrap_or_default()
                );
                return Ok(RecordOutcome::Skipped);
            }
        };

        let order = extracted.order;
        let amount = extracted.amount;
        let order_id = display_field(order.order_id());
        tracing::info!(
            "Processing order: ID={}, Status={}, Amount={}, Email={}",
            order_id,
            display_field(order.status()),
            amount,
            display_field(order.customer_email())
        );

        if amount <= self.amount_threshold || amount.is_nan() {
            tracing::warn!(
                "Order {} skipped (Amount={} <= {})",
                order_id,
                amount,
                self.amount_threshold
            );
            return Ok(RecordOutcome::Filtered);
        }

        tracing::info!("Order {} passed filter (Amount={})", order_id, amount);
        let handled = self
            .handler
            .handle_order(&order)
            .await
            .map_err(RecordError::Handler)?;
        if !handled {
            tracing::warn!("Order {} was not handled downstream", order_id);
        }
        Ok(RecordOutcome::Accepted(order))
    }
}

fn display_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
