use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aideck::api::{create_router, AppState};
use aideck::config::Config;
use aideck::db::{Database, DatabaseBackend, LibSqlBackend};
use aideck::services::MaintenanceManager;

#[derive(Parser)]
#[command(name = "aideck")]
#[command(about = "Multi-tenant backend for an AI assistant platform")]
struct Args {
    /// Run the maintenance sweeps once, print the report and exit
    #[arg(long)]
    sweep_once: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aideck=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    tracing::info!("Initializing database...");
    let raw_db = Database::new(&config.database).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(raw_db));

    if args.sweep_once {
        let manager = MaintenanceManager::new(
            db,
            config.maintenance.interval_secs,
            config.maintenance.design_stuck_threshold_hours,
        );
        let report = manager.run_once().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "AIDECK_API_KEYS is not set. Every protected route will answer 401 until keys are configured."
        );
    }

    let state = AppState::new(config.clone(), db);
    let cancel_token = CancellationToken::new();

    let manager = state.maintenance.clone();
    if manager.interval_secs() > 0 {
        tracing::info!(
            "Starting maintenance manager... (interval={}s, stuck_threshold={}h)",
            manager.interval_secs(),
            config.maintenance.design_stuck_threshold_hours
        );
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Maintenance manager shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(manager.interval_secs())) => {
                        if let Err(e) = manager.run_once().await {
                            tracing::error!("Maintenance error: {}", e);
                        }
                    }
                }
            }
        });
    } else {
        tracing::info!("Maintenance loop disabled (MAINTENANCE_INTERVAL_SECS=0)");
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Aideck starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
