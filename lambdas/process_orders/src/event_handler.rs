use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use shared::core::{OrderHandler, ProcessingOutcome};
use shared::processor::{BatchProcessor, ProcessError};

pub(crate) struct HandlerDeps<H: OrderHandler> {
    pub processor: BatchProcessor<H>,
    pub partial_success: bool,
}

#[tracing::instrument(skip(deps, event), fields(request_id = %event.context.request_id))]
pub(crate) async fn function_handler<H: OrderHandler>(
    deps: &HandlerDeps<H>,
    event: LambdaEvent<Value>,
) -> Result<ProcessingOutcome, Error> {
    tracing::info!("Lambda execution started");
    tracing::info!(
        "Incoming event: {}",
        serde_json::to_string_pretty(&event.payload)?
    );

    let result = deps.processor.process(&event.payload).await;
    tracing::info!("Lambda execution completed");

    match result {
        Ok(outcome) => Ok(outcome),
        Err(ProcessError::Batch(failure)) if deps.partial_success => {
            tracing::warn!(
                "Returning partial result with {} failed records",
                failure.failed.len()
            );
            Ok(failure.into_partial_outcome())
        }
        Err(e) => Err(Error::from(e)),
    }
}
