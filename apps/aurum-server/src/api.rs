use aurum_application::pricing::{PriceQueryError, PriceQueryService};
use aurum_domain::value_objects::quote::ProductId;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<PriceQueryService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceParams {
    product_id: String,
    gram: String,
    factor: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBody {
    pub price: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(prices: Arc<PriceQueryService>) -> Router {
    Router::new()
        .route("/price", get(get_price))
        .with_state(AppState { prices })
        .layer(TraceLayer::new_for_http())
}

/// GET /price?productId=<int>&gram=<decimal>&factor=<decimal>
async fn get_price(
    State(state): State<AppState>,
    params: Result<Query<PriceParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text());
        }
    };
    let (product_id, gram, factor) = match parse_params(&params) {
        Ok(parsed) => parsed,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, "bad_request", msg),
    };

    let prices = state.prices.clone();
    let result = tokio::task::spawn_blocking(move || prices.quote(product_id, gram, factor)).await;
    match result {
        Ok(Ok(quote)) => {
            metrics::counter!("aurum.api.price_requests_total", "result" => "ok").increment(1);
            (StatusCode::OK, Json(PriceBody { price: quote.amount_text() })).into_response()
        }
        Ok(Err(PriceQueryError::InvalidInput(msg))) => {
            error_response(StatusCode::BAD_REQUEST, "bad_request", msg)
        }
        Ok(Err(PriceQueryError::PriceUnavailable(_))) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unavailable",
            "price not found".to_string(),
        ),
        Ok(Err(PriceQueryError::Store(_))) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_err",
            "price lookup failed".to_string(),
        ),
        Err(err) => {
            tracing::error!(error = %err, "price query task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "panic",
                "price lookup failed".to_string(),
            )
        }
    }
}

fn parse_params(params: &PriceParams) -> Result<(ProductId, Decimal, Decimal), String> {
    let product_id = params
        .product_id
        .trim()
        .parse::<ProductId>()
        .map_err(|_| format!("invalid productId: {}", params.product_id))?;
    let gram = parse_decimal("gram", &params.gram)?;
    let factor = parse_decimal("factor", &params.factor)?;
    Ok((product_id, gram, factor))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    let value = raw.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| format!("invalid {field}: {raw}"))
}

fn error_response(status: StatusCode, result: &'static str, error: String) -> Response {
    metrics::counter!("aurum.api.price_requests_total", "result" => result).increment(1);
    (status, Json(ErrorBody { error })).into_response()
}
