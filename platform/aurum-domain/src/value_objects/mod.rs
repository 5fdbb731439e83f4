pub mod price_quote;
pub mod quote;
