// framewatch - Rate-limited, caching vision classifier gateway for video frames
// Author: kelexine (https://github.com/kelexine)

use anyhow::{Context, Result};
use clap::Parser;
use framewatch::analyze::RequestOrchestrator;
use framewatch::cli::Args;
use framewatch::config::AppConfig;
use framewatch::gemini::{Classifier, GeminiClient};
use framewatch::server::create_router;
use framewatch::utils::{clock, logging};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting framewatch v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Start the runtime sized from configuration
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<()> {
    // Phase 4: Build the classifier and the stores around it
    let gemini_client = GeminiClient::new(&config.gemini)?;
    if gemini_client.is_configured() {
        info!("Gemini classifier ready (model: {})", gemini_client.model());
    } else {
        warn!("GEMINI_API_KEY not set; analyze requests will fail until it is configured");
    }

    let orchestrator = Arc::new(RequestOrchestrator::from_config(
        &config,
        Arc::new(gemini_client),
        clock::system(),
    ));

    info!(
        "Rate limits: {}/minute, {}/hour per client",
        config.limits.per_minute, config.limits.per_hour
    );

    // Phase 5: Background sweep of expired state
    if config.maintenance.sweep_interval_seconds > 0 {
        tokio::spawn(sweep_loop(
            Arc::clone(&orchestrator),
            Duration::from_secs(config.maintenance.sweep_interval_seconds),
        ));
    }

    // Phase 6: Build and start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, orchestrator);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 7: Run server with graceful shutdown
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn sweep_loop(orchestrator: Arc<RequestOrchestrator>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick fires immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let report = orchestrator.sweep();
        info!(
            "Sweep removed {} cache entries, {} sessions, {} idle clients",
            report.cache_entries, report.sessions, report.identities
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
