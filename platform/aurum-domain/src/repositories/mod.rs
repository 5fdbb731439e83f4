pub mod quote_source;
pub mod quote_store;
