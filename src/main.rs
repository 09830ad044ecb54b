//! PodReloader Kubernetes Operator
//!
//! Main entry point for the operator. Sets up the Kubernetes client,
//! registers the PodReloader controller, and runs the reconciliation loop.

use kube::Client;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pod_reloader_operator::{
    config::OperatorConfig,
    controllers::{pod_reloader_controller, Context},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting PodReloader Operator");

    let config = OperatorConfig::from_env()?;
    info!(
        "Configuration: namespace={}, reconcile_interval={:?}, error_requeue={:?}, field_manager={}",
        config.watch_namespace.as_deref().unwrap_or("all namespaces"),
        config.reconcile_interval,
        config.error_requeue,
        config.field_manager
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let context = Context::new(client, config);

    let controller_handle = tokio::spawn(pod_reloader_controller::run(context));

    tokio::select! {
        _ = controller_handle => {
            error!("PodReloader controller exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping operator");
        }
    }

    info!("PodReloader Operator stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pod_reloader_operator=debug,kube=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
