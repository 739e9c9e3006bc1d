//! Waddle API server
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use waddle::{
    config::Settings,
    database::{
        connection::{create_pool, run_migrations},
        DatabaseService,
    },
    handlers::router,
    jobs::JobScheduler,
    services::ServiceFactory,
    state::AppState,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", waddle::info());

    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;
    let db = DatabaseService::new(pool);

    info!("Initializing services...");
    let services = ServiceFactory::new(db, settings.clone())?;

    if let Some(admin) = services.admin_service.bootstrap(&settings.admin).await? {
        info!(admin_id = %admin.id, email = %admin.email, "Bootstrap admin ready");
    }

    let state = AppState::new(services.clone(), settings.clone());

    let mut scheduler = JobScheduler::start(services, &settings.jobs);
    scheduler.prune_rate_limiter(state.auth_limiter.clone());

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %address, "Waddle API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Stopping background jobs...");
    scheduler.shutdown().await;

    info!("Waddle API has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
