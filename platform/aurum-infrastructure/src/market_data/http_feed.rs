use aurum_domain::repositories::quote_source::{FetchError, QuoteSource, RawQuote};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct FeedResponse {
    data: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    market_product_id: i32,
    #[serde(default)]
    updated_at: Option<serde_json::Value>,
    customer_buys_at: f64,
    customer_sells_at: f64,
}

/// Polls `GET <url>` and decodes `{ "data": [...] }` into raw quotes.
/// Each request is bounded by `timeout`.
pub struct HttpQuoteSource {
    url: String,
    timeout: Duration,
    client: Client,
}

impl HttpQuoteSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, String> {
        if url.trim().is_empty() {
            return Err("quote feed url is empty".to_string());
        }
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            url,
            timeout,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl QuoteSource for HttpQuoteSource {
    fn fetch_batch(&self) -> Result<Vec<RawQuote>, FetchError> {
        let span = tracing::info_span!(
            "infra.http_feed.fetch",
            url = %self.url,
            timeout_ms = self.timeout.as_millis() as u64
        );
        let _enter = span.enter();
        let start = Instant::now();

        let result = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| {
                let kind = if err.is_timeout() { "timeout" } else { "transport" };
                metrics::counter!("aurum.infra.http_feed.errors_total", "kind" => kind)
                    .increment(1);
                FetchError::Transport(err.to_string())
            })
            .and_then(|response| {
                let status = response.status();
                if !status.is_success() {
                    metrics::counter!("aurum.infra.http_feed.errors_total", "kind" => "status")
                        .increment(1);
                    return Err(FetchError::Status(status.as_u16()));
                }
                response.text().map_err(|err| {
                    metrics::counter!("aurum.infra.http_feed.errors_total", "kind" => "body")
                        .increment(1);
                    FetchError::Transport(format!("failed to read body: {err}"))
                })
            })
            .and_then(|body| decode_batch(&body));

        metrics::histogram!("aurum.infra.http_feed.fetch_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Ok(batch) => tracing::debug!(records = batch.len(), "fetched quote batch"),
            Err(err) => tracing::warn!(error = %err, "quote fetch failed"),
        }
        result
    }
}

pub fn decode_batch(body: &str) -> Result<Vec<RawQuote>, FetchError> {
    let payload: FeedResponse = serde_json::from_str(body).map_err(|err| {
        metrics::counter!("aurum.infra.http_feed.errors_total", "kind" => "decode").increment(1);
        FetchError::Decode(err.to_string())
    })?;
    Ok(payload
        .data
        .into_iter()
        .map(|item| RawQuote {
            product_id: item.market_product_id,
            updated_at: timestamp_text(item.updated_at),
            buy_price: item.customer_buys_at,
            sell_price: item.customer_sells_at,
        })
        .collect())
}

/// Non-string `updatedAt` values become empty text, which normalizes to the
/// sentinel timestamp for that row only.
fn timestamp_text(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text,
        _ => String::new(),
    }
}
