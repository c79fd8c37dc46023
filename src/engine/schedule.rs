//! Background periodic checks.

use super::{Reconciler, StatusPatch};
use crate::intent::ServiceIntent;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Patch produced for one slice by one periodic cycle.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodicReport {
    pub service_name: String,
    pub patch: StatusPatch,
}

/// Runs the periodic pass over a fixed set of slices on an interval.
pub struct PeriodicChecker {
    reconciler: Arc<Reconciler>,
    intents: Vec<ServiceIntent>,
    interval: Duration,
}

impl PeriodicChecker {
    pub fn new(reconciler: Arc<Reconciler>, intents: Vec<ServiceIntent>, interval: Duration) -> Self {
        Self {
            reconciler,
            intents,
            interval,
        }
    }

    /// Run one periodic pass per slice, in order.
    pub async fn run_cycle(&self) -> Vec<PeriodicReport> {
        let mut reports = Vec::with_capacity(self.intents.len());
        for intent in &self.intents {
            reports.push(PeriodicReport {
                service_name: intent.service_name(),
                patch: self.reconciler.on_periodic(intent).await,
            });
        }
        reports
    }

    /// Start the checker background task. The first cycle runs immediately.
    /// Returns a JoinHandle that resolves when the checker stops.
    pub fn start(
        self,
        cancel_token: CancellationToken,
        reports: mpsc::UnboundedSender<PeriodicReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = self.interval.as_secs(),
                slices = self.intents.len(),
                "Periodic checker started"
            );

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Periodic checker shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        for report in self.run_cycle().await {
                            if reports.send(report).is_err() {
                                tracing::debug!("Report receiver dropped, stopping checker");
                                return;
                            }
                        }
                    }
                }
            }
        })
    }
}
