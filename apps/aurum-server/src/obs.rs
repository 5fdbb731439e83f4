use std::net::SocketAddr;

pub const LOG_ENV: &str = "AURUM_LOG";
pub const METRICS_ADDR_ENV: &str = "AURUM_METRICS_ADDR";

/// `AURUM_LOG` overrides the configured level; `log_format` is `text` or `json`.
pub fn init_tracing(log_level: &str, log_format: &str) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    let result = match log_format.trim().to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init(),
        "text" | "" => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .try_init(),
        other => return Err(format!("unsupported log format: {other} (expected text|json)")),
    };
    result.map_err(|err| format!("failed to install tracing subscriber: {err}"))
}

#[cfg(feature = "prometheus")]
pub fn init_metrics() -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = std::env::var(METRICS_ADDR_ENV).ok() else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid {METRICS_ADDR_ENV} (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics() -> Result<Option<SocketAddr>, String> {
    if std::env::var(METRICS_ADDR_ENV).is_ok_and(|raw| !raw.trim().is_empty()) {
        return Err("metrics exporter requires aurum-server feature `prometheus`".to_string());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn init_tracing_rejects_unknown_format() {
        let err = init_tracing("info", "xml").expect_err("unknown format");
        assert!(err.contains("unsupported log format"));
    }
}
