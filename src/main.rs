use apilog::analytics::AnalyticsState;
use apilog::config::AppConfig;
use apilog::health::HealthState;
use apilog::hello::HelloState;
use apilog::recorder::LogRecorder;
use apilog::{app, pipeline, seed, storage};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "apilog", about = "Logged demo API with analytics endpoints")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fill the database with synthetic log history
    Seed(seed::SeedOptions),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apilog=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    // Setup SQLite pool
    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;
    tracing::info!(db = %config.database.path.display(), "database initialized");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Seed(opts) => {
            seed::run(&pool, &opts)
                .await
                .map_err(|e| e as Box<dyn std::error::Error>)?;
            Ok(())
        }
        Command::Serve => serve(config, pool).await,
    }
}

async fn serve(
    config: AppConfig,
    pool: deadpool_sqlite::Pool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        failure_rate = config.demo.failure_rate,
        "starting apilog"
    );

    // Log write path
    let (tx, rx) = mpsc::channel(config.pipeline.channel_capacity);
    let worker_pool = pool.clone();
    let pipeline_config = config.pipeline.clone();
    let worker_handle = tokio::spawn(async move {
        pipeline::worker::run_worker(rx, worker_pool, pipeline_config).await;
    });
    let recorder = LogRecorder::new(tx);

    let analytics_state =
        Arc::new(AnalyticsState::new(pool.clone(), &config.cache, config.query.clone()).await?);
    let hello_state = Arc::new(HelloState {
        recorder: recorder.clone(),
        failure_rate: config.demo.failure_rate,
    });
    let health_state = Arc::new(HealthState {
        pool,
        recorder: recorder.clone(),
    });
    drop(recorder);

    let router = app::build_router(analytics_state, hello_state, health_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    // The router owns the last senders; once serve returns they are dropped
    // and the worker drains.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if tokio::time::timeout(Duration::from_secs(10), worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("log writer did not drain within 10s");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}
