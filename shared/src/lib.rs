pub mod adapters;
pub mod attribute_value;
pub mod configuration;
pub mod core;
pub mod extraction;
pub mod processor;
pub mod records;
