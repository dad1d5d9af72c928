use batepapo::{build_router, participant, AppState, Config, Repositories};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batepapo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting batepapo chat server");

    let config = Config::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    // Storage is connected before the listener binds, so no request sees a half-initialized store
    let repositories = Repositories::connect(config.database_url.as_deref())
        .await
        .inspect_err(|e| error!(error = %e, "Failed to initialize storage"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = tokio::spawn(participant::start_reaper(
        repositories.participants.clone(),
        repositories.messages.clone(),
        config.reaper.clone(),
        shutdown_rx,
    ));

    let app_state = AppState::new(
        repositories.participants,
        repositories.messages,
        config.chat,
    );
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let an in-flight sweep finish before exiting
    info!("HTTP server stopped, waiting for reaper");
    shutdown_tx.send(true).ok();
    if let Err(e) = reaper.await {
        error!(error = %e, "Reaper task ended abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
