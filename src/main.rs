use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamtape_keeper::{
    app_config, build_router, initialize_app_state, services::initialize_background_tasks,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing; RUST_LOG is read through the loaded config
    let config = app_config::config();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.server.rust_log)
                .unwrap_or_else(|_| app_config::DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = initialize_app_state()
        .await
        .context("Failed to initialize application state")?;
    let bind_address = state.config.server.bind_address.clone();
    info!(
        "Starting Streamtape keeper on {} ({})",
        bind_address, state.config.server.environment
    );

    let scheduler = initialize_background_tasks(state.clone());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(task) = scheduler {
        task.abort();
    }
    info!("Streamtape keeper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
