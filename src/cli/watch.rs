//! Watch command implementation

use crate::cli::slice::{build_reconciler, load_config_with_overrides};
use crate::cli::WatchArgs;
use crate::engine::{PeriodicChecker, Reconciler};
use crate::intent::ServiceIntent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Resolves on SIGINT or SIGTERM and cancels the token.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
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
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Install the Prometheus recorder with an HTTP listener.
fn setup_metrics(addr: std::net::SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full("netslice_pass_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install()?;

    tracing::info!(addr = %addr, "Metrics listener started");
    Ok(())
}

async fn initial_apply(reconciler: &Reconciler, intents: &[ServiceIntent]) {
    for intent in intents {
        let status = reconciler.on_create_or_update(intent).await;
        if status.is_ready() {
            tracing::info!(service = %intent.service_name(), "Slice applied");
        } else {
            tracing::error!(
                service = %intent.service_name(),
                message = %status.message,
                "Slice apply failed; periodic checks will keep retrying"
            );
        }
    }
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config_with_overrides(&args.common)?;
    if let Some(interval) = args.interval {
        config.reconcile.interval_seconds = interval;
        config.validate()?;
    }

    crate::logging::init_tracing(&config.logging)?;

    if let Some(addr) = args.metrics_addr {
        setup_metrics(addr)?;
    }

    let intents = args
        .files
        .iter()
        .map(|path| ServiceIntent::load(path))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(slices = intents.len(), "Starting netslice watch");

    let reconciler = Arc::new(build_reconciler(&config)?);
    if !args.no_apply {
        initial_apply(&reconciler, &intents).await;
    }

    let cancel_token = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let checker = PeriodicChecker::new(
        reconciler,
        intents,
        Duration::from_secs(config.reconcile.interval_seconds),
    );
    let handle = checker.start(cancel_token.clone(), tx);

    tokio::spawn(shutdown_signal(cancel_token.clone()));

    // Ends once the checker stops and drops its sender
    while let Some(report) = rx.recv().await {
        tracing::info!(
            service = %report.service_name,
            status = %report.patch.status.status,
            "Periodic check completed"
        );
        println!("{}", serde_json::to_string(&report)?);
    }

    handle.await?;
    tracing::info!("netslice watch stopped");
    Ok(())
}
