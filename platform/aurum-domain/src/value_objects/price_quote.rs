use crate::value_objects::quote::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Ephemeral result of a price query; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub product_id: ProductId,
    pub gram: Decimal,
    pub factor: Decimal,
    pub sell_price: Decimal,
    pub observed_at: DateTime<Utc>,
    pub amount: Decimal,
}

impl PriceQuote {
    /// Amount rendered with exactly two fractional digits, e.g. `"9205.80"`.
    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.amount)
    }
}
