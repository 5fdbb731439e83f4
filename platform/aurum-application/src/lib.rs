pub mod config;
pub mod context;
pub mod ingestion;
pub mod pricing;
