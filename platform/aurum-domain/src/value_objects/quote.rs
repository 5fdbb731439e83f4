use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub type ProductId = i32;

/// Fractional digits kept for persisted buy/sell prices (`NUMERIC(18,5)`).
pub const PRICE_SCALE: u32 = 5;

/// One upstream price observation for a product.
///
/// `observed_at` is the upstream validity timestamp, not the ingestion time.
/// Prices are normalized to [`PRICE_SCALE`] fractional digits on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub product_id: ProductId,
    pub observed_at: DateTime<Utc>,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl Quote {
    pub fn new(
        product_id: ProductId,
        observed_at: DateTime<Utc>,
        buy_price: Decimal,
        sell_price: Decimal,
    ) -> Result<Self, String> {
        if buy_price.is_sign_negative() && !buy_price.is_zero() {
            return Err(format!("buy price must be >= 0 (got {buy_price})"));
        }
        if sell_price.is_sign_negative() && !sell_price.is_zero() {
            return Err(format!("sell price must be >= 0 (got {sell_price})"));
        }
        Ok(Self {
            product_id,
            observed_at,
            buy_price: normalize_price(buy_price),
            sell_price: normalize_price(sell_price),
        })
    }

    pub fn from_f64(
        product_id: ProductId,
        observed_at: DateTime<Utc>,
        buy_price: f64,
        sell_price: f64,
    ) -> Result<Self, String> {
        let buy = price_from_f64(buy_price).ok_or_else(|| format!("invalid buy price: {buy_price}"))?;
        let sell =
            price_from_f64(sell_price).ok_or_else(|| format!("invalid sell price: {sell_price}"))?;
        Self::new(product_id, observed_at, buy, sell)
    }
}

pub fn normalize_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an upstream floating-point rate into a decimal with [`PRICE_SCALE`] digits.
/// Returns `None` for NaN, infinities and values outside the decimal range.
pub fn price_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(normalize_price)
}
