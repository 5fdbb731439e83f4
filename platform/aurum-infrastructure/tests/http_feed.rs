use aurum_domain::repositories::quote_source::{FetchError, QuoteSource};
use aurum_infrastructure::market_data::http_feed::HttpQuoteSource;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// Serves exactly one HTTP response on an ephemeral port and returns its URL.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/api/quotes")
}

fn source(url: String) -> HttpQuoteSource {
    HttpQuoteSource::new(url, Duration::from_secs(5)).expect("client")
}

#[test]
fn fetch_batch_decodes_successful_response() {
    let url = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"data":[{"marketProductId":1,"updatedAt":"2024-01-01T10:00:00Z","customerBuysAt":2000.0,"customerSellsAt":2010.0}]}"#,
    );
    let batch = source(url).fetch_batch().expect("batch");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].product_id, 1);
}

#[test]
fn fetch_batch_keeps_siblings_of_a_null_timestamp_row() {
    let url = serve_once(
        "HTTP/1.1 200 OK",
        r#"{"data":[{"marketProductId":1,"updatedAt":"2024-01-01T10:00:00Z","customerBuysAt":2000.0,"customerSellsAt":2010.0},{"marketProductId":2,"updatedAt":null,"customerBuysAt":24.5,"customerSellsAt":25.0}]}"#,
    );
    let batch = source(url).fetch_batch().expect("batch");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].updated_at, "2024-01-01T10:00:00Z");
    assert!(batch[1].updated_at.is_empty());
}

#[test]
fn fetch_batch_reports_non_success_status() {
    let url = serve_once("HTTP/1.1 503 Service Unavailable", r#"{"error":"down"}"#);
    assert_eq!(source(url).fetch_batch(), Err(FetchError::Status(503)));
}

#[test]
fn fetch_batch_reports_malformed_body() {
    let url = serve_once("HTTP/1.1 200 OK", r#"{"data":"#);
    assert!(matches!(source(url).fetch_batch(), Err(FetchError::Decode(_))));
}

#[test]
fn fetch_batch_is_bounded_by_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        }
    });

    let source = HttpQuoteSource::new(
        format!("http://{addr}/api/quotes"),
        Duration::from_millis(200),
    )
    .expect("client");
    let started = std::time::Instant::now();
    assert!(matches!(source.fetch_batch(), Err(FetchError::Transport(_))));
    assert!(started.elapsed() < Duration::from_secs(2));
}
