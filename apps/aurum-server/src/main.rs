use aurum_application::config;
use aurum_application::context::AppContext;
use aurum_server::{api, bootstrap, obs, scheduler};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "aurum-server")]
#[command(about = "Bullion quote ingestion and price query API.", version)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env AURUM_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Run the ingestion scheduler and the price API (default).
    Serve,
    /// Create tables, seed the product catalog and exit.
    Migrate,
    /// Run a single ingestion cycle and print its report as JSON.
    IngestOnce,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let config_path = bootstrap::resolve_config_path(cli.config)?;
    let config = config::load_config(&config_path)?;
    obs::init_tracing(config.log_level(), config.log_format())?;
    tracing::info!(config = %config_path.display(), "starting aurum-server");

    let context = bootstrap::build_context(config)?;
    context.ensure_schema()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            println!("migrate complete: {}", config_path.display());
            Ok(())
        }
        Command::IngestOnce => {
            let report = context
                .ingestion_service()?
                .run_cycle()
                .map_err(|err| format!("ingestion cycle failed: {err}"))?;
            let json = serde_json::to_string(&report)
                .map_err(|err| format!("failed to encode cycle report: {err}"))?;
            println!("{json}");
            Ok(())
        }
        Command::Serve => serve(context),
    }
}

fn serve(context: AppContext) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to init tokio runtime: {err}"))?;
    // `context` outlives the runtime so blocking adapters are dropped on this thread.
    runtime.block_on(serve_async(context.clone()))
}

async fn serve_async(context: AppContext) -> Result<(), String> {
    obs::init_metrics()?;

    let addr: SocketAddr = context
        .config
        .bind_addr()
        .parse()
        .map_err(|err| format!("invalid server.bind_addr (expected host:port): {err}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind {addr}: {err}"))?;

    let ingestion = Arc::new(context.ingestion_service()?);
    let prices = Arc::new(context.price_service());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = tokio::spawn(scheduler::run_scheduler(
        ingestion,
        context.config.ingest_interval(),
        shutdown_rx.clone(),
    ));

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown signal received");
        let _ = signal_tx.send(true);
    });

    let mut server_shutdown = shutdown_rx;
    tracing::info!(%addr, "price api listening");
    let served = axum::serve(listener, api::router(prices))
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|err| format!("http server failed: {err}"));

    let _ = shutdown_tx.send(true);
    if let Err(err) = scheduler.await {
        tracing::error!(error = %err, "ingestion scheduler task failed");
    }
    served
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
