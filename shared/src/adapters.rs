use crate::core::{OrderHandler, RawOrder};
use async_trait::async_trait;

/// Handles accepted orders by logging them.
#[derive(Debug, Default)]
pub struct LoggingOrderHandler;

impl LoggingOrderHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderHandler for LoggingOrderHandler {
    async fn handle_order(&self, order: &RawOrder) -> Result<bool, String> {
        tracing::info!(
            "Handling order: {} | Amount: {} | Status: {}",
            field_or_none(order.order_id()),
            field_or_none(order.get("amount")),
            field_or_none(order.status())
        );
        Ok(true)
    }
}

fn field_or_none(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::LoggingOrderHandler;
    use crate::core::{OrderHandler, RawOrder};
    use serde_json::json;

    #[tokio::test]
    async fn when_order_handled_should_report_success() {
        let order: RawOrder =
            serde_json::from_value(json!({"orderId": "o1", "amount": 150, "status": "new"}))
                .unwrap();

        let result = LoggingOrderHandler::new().handle_order(&order).await;

        assert_eq!(result, Ok(true));
    }
}
