use aurum_application::pricing::PriceQueryService;
use aurum_domain::entities::product::Product;
use aurum_domain::repositories::quote_store::QuoteStore;
use aurum_domain::value_objects::quote::Quote;
use aurum_infrastructure::persistence::memory::InMemoryQuoteStore;
use aurum_server::api::{router, ErrorBody, PriceBody};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

fn store_with_quote() -> Arc<InMemoryQuoteStore> {
    let store = Arc::new(InMemoryQuoteStore::new());
    store
        .ensure_schema(&[
            Product {
                id: 1,
                name: "Gram".to_string(),
            },
            Product {
                id: 2,
                name: "Quarter".to_string(),
            },
        ])
        .unwrap();
    let ts = chrono::DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    store
        .insert(&Quote::from_f64(1, ts, 2000.0, 2010.0).unwrap())
        .unwrap();
    store
}

async fn get(store: Arc<InMemoryQuoteStore>, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(Arc::new(PriceQueryService::new(store)));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn price_returns_two_decimal_string() {
    let (status, json) = get(store_with_quote(), "/price?productId=1&gram=5&factor=0.916").await;
    assert_eq!(status, StatusCode::OK);
    let body: PriceBody = serde_json::from_value(json).unwrap();
    assert_eq!(body.price, "9205.80");
}

#[tokio::test]
async fn price_pads_whole_amounts() {
    let (status, json) = get(store_with_quote(), "/price?productId=1&gram=1&factor=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], "2010.00");
}

#[tokio::test]
async fn missing_quote_is_price_not_found() {
    let (status, json) = get(store_with_quote(), "/price?productId=2&gram=1&factor=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = serde_json::from_value(json).unwrap();
    assert_eq!(body.error, "price not found");
}

#[tokio::test]
async fn non_positive_multiplier_is_bad_request() {
    let (status, json) = get(store_with_quote(), "/price?productId=1&gram=0&factor=0.916").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("gram"));
}

#[tokio::test]
async fn malformed_parameters_are_bad_request() {
    let (status, json) = get(store_with_quote(), "/price?productId=one&gram=1&factor=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("productId"));

    let (status, _json) = get(store_with_quote(), "/price?productId=1&gram=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
