//! OCR Gateway
//!
//! A synchronous HTTP endpoint over a scarce, stateful OCR model. The
//! model handle is initialized once here and lives for the process
//! lifetime; all concurrency around it is owned by the admission gate.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocr_gateway::config::Config;
use ocr_gateway::recognizer::SidecarRecognizer;
use ocr_gateway::routes;
use ocr_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocr_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting OCR Gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Admission policy: {:?}, capacity {}",
        config.admission.policy,
        config.admission.effective_capacity()
    );

    // Initialize the process-wide recognizer handle. It is never
    // reloaded or torn down until process exit.
    let recognizer = SidecarRecognizer::new(&config.recognizer)?;
    if recognizer.is_available().await {
        tracing::info!("Recognizer sidecar reachable at {}", config.recognizer.endpoint);
    } else {
        tracing::warn!(
            "Recognizer sidecar at {} is not responding; requests will fail until it comes up",
            config.recognizer.endpoint
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app_state = AppState::new(config, Arc::new(recognizer));
    let app = routes::router(app_state);

    // Start server with graceful shutdown
    tracing::info!("OCR Gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
