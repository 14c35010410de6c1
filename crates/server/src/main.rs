//! Lead Qualifier Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use lead_qualifier_config::{load_settings, Settings};
use lead_qualifier_core::CrmAdapter;
use lead_qualifier_crm::{CrmBackend, DeliveryQueue};
use lead_qualifier_scoring::LeadPredictor;
use lead_qualifier_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.* > config/default.* > defaults
    let env = std::env::var("LEAD_QUALIFIER_ENV").ok();
    let config = load_settings(env.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config);

    tracing::info!("Starting Lead Qualifier Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        crm = config.crm.kind.as_str(),
        "Configuration loaded"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = init_metrics();
        tracing::info!("Initialized Prometheus metrics at /metrics");
        handle
    } else {
        None
    };

    let predictor = Arc::new(
        LeadPredictor::load(&config.model.directory)
            .with_retrain_after_days(config.model.retrain_after_days),
    );
    if predictor.needs_retraining() {
        tracing::warn!(
            directory = %config.model.directory,
            "Lead model is missing or stale; POST /train-model to retrain"
        );
    }

    let backend = CrmBackend::from_config(&config.crm).context("Failed to initialize CRM backend")?;
    let crm_kind = backend.kind();
    let backend: Arc<dyn CrmAdapter> = Arc::new(backend);
    let (delivery, worker) = DeliveryQueue::spawn(backend, config.crm.queue_capacity);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server bind address")?;

    let state = AppState::new(config, predictor, delivery, crm_kind).with_metrics(metrics_handle);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and its queue handle) is gone; let the worker drain
    match worker.await {
        Ok(stats) => tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "CRM delivery drained"
        ),
        Err(e) => tracing::error!(error = %e, "CRM delivery worker panicked"),
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("lead_qualifier={level},lead_qualifier_server={level},lead_qualifier_scoring={level},lead_qualifier_crm={level},tower_http=info").into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
