use crate::value_objects::quote::ProductId;

/// A quote record as decoded from the upstream payload, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub product_id: ProductId,
    pub updated_at: String,
    pub buy_price: f64,
    pub sell_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport: {msg}"),
            FetchError::Status(code) => write!(f, "unexpected status: {code}"),
            FetchError::Decode(msg) => write!(f, "decode: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Upstream quote feed. One call returns one finite batch; callers treat every
/// error as transient and retry on their next cycle.
pub trait QuoteSource: Send + Sync {
    fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError>;
}
