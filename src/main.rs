use std::sync::Arc;
use ticket_categorizer::{
    api::{build_router, AppState},
    config::Config,
    ml::{BatchAnalyzer, ModelLifecycleManager, TicketAnalyzer},
    state::InMemoryTicketStore,
    sync::TicketSyncWorker,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_categorizer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    tracing::info!("Starting Ticket Categorizer v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Model directory: {}", config.model.dir.display());

    // Initialize the model lifecycle manager and load persisted artifacts
    let lifecycle = Arc::new(ModelLifecycleManager::new(config.model.dir.clone()));
    if let Err(e) = lifecycle.load().await {
        tracing::warn!("⚠️  Artifact load failed: {}", e);
        tracing::warn!("   Continuing; classifiers can be trained via the API");
    }
    if lifecycle.is_ready() {
        tracing::info!("✅ Classifiers loaded, model is ready");
    } else {
        tracing::warn!("⚠️  Model not ready; analysis will be unavailable until training completes");
    }

    // Initialize analyzers
    let analyzer = Arc::new(TicketAnalyzer::new(lifecycle.clone()));
    let batch = Arc::new(BatchAnalyzer::new(
        analyzer.clone(),
        config.batch.effective_concurrency(),
    ));
    tracing::info!(
        "✅ Analyzers initialized (batch concurrency: {})",
        config.batch.effective_concurrency()
    );

    // Initialize the ticket store and background sync worker
    let store = Arc::new(InMemoryTicketStore::new());
    if config.sync.enabled {
        let worker = Arc::new(TicketSyncWorker::new(
            store.clone(),
            analyzer.clone(),
            lifecycle.clone(),
            config.sync.interval_secs,
        ));
        tokio::spawn(async move {
            worker.run().await;
        });
        tracing::info!(
            "✅ Ticket sync worker started (interval: {}s)",
            config.sync.interval_secs
        );
    } else {
        tracing::info!("⚠️  Ticket sync worker disabled in configuration");
    }

    // Create application state and router
    let app_state = AppState::new(analyzer, batch, lifecycle);
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Analysis API: http://{}/v1/analyze", http_addr);

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
