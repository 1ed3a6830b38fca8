use lambda_runtime::{run, service_fn, Error};
use shared::adapters::LoggingOrderHandler;
use shared::configuration::Configuration;
use shared::processor::BatchProcessor;

use crate::event_handler::{function_handler, HandlerDeps};

mod event_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    let config = Configuration::load()?;
    tracing::info!("Configuration loaded: {}", config);

    let processor =
        BatchProcessor::with_threshold(LoggingOrderHandler::new(), config.amount_threshold);
    let deps = HandlerDeps {
        processor,
        partial_success: config.partial_success,
    };

    run(service_fn(|event| function_handler(&deps, event))).await
}
