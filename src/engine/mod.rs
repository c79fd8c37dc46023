//! Reconciliation engine.
//!
//! A [`Reconciler`] turns one [`ServiceIntent`] into per-router work and
//! aggregates the results. Three passes exist:
//!
//! - create/update ([`Reconciler::on_create_or_update`]): sequential, stops
//!   at the first failing router
//! - periodic ([`Reconciler::on_periodic`]): drift check and repair on every
//!   router, bounded concurrency, always produces a patch
//! - delete ([`Reconciler::on_delete`]): best-effort removal on every router
//!
//! Every pass validates the intent before touching a device and converts
//! panics into an error status at the pass boundary.

mod apply;
mod check;
mod delete;
mod error;
pub mod outcome;
pub mod schedule;


pub use error::EngineError;
pub use outcome::{
    DeleteOutcome, OperationalStatus, Phase, ReconciliationOutcome, SliceStatus, StatusBody,
    StatusPatch,
};
pub use schedule::{PeriodicChecker, PeriodicReport};

use crate::config::ReconcileConfig;
use crate::device::SessionFactory;
use crate::intent::ServiceIntent;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Drives reconciliation passes for slices.
pub struct Reconciler {
    sessions: SessionFactory,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(sessions: SessionFactory, config: ReconcileConfig) -> Self {
        Self { sessions, config }
    }

    /// Create/update pass: push the full desired configuration to every
    /// router, stopping at the first failure.
    pub async fn on_create_or_update(&self, intent: &ServiceIntent) -> SliceStatus {
        let started = Instant::now();
        let span = pass_span("apply", intent);

        let status = match guarded(self.apply_pass(intent)).instrument(span).await {
            Ok(status) => status,
            Err(e) => SliceStatus::error(intent.service_type_label(), e.to_string()),
        };

        record_pass("apply", status.phase, started);
        status
    }

    /// Periodic pass, returned as the full slice status.
    pub async fn check(&self, intent: &ServiceIntent) -> SliceStatus {
        let started = Instant::now();
        let span = pass_span("check", intent);

        let status = match guarded(self.check_pass(intent)).instrument(span).await {
            Ok(status) => status,
            Err(e) => {
                let mut status = SliceStatus::error(intent.service_type_label(), e.to_string());
                status.operational_status = Some(OperationalStatus::Error);
                status
            }
        };

        record_pass("check", status.phase, started);
        status
    }

    /// Periodic pass: detect and repair drift, then fold operational state.
    pub async fn on_periodic(&self, intent: &ServiceIntent) -> StatusPatch {
        self.check(intent).await.to_patch()
    }

    /// Delete pass: remove the service from every router that names one.
    pub async fn on_delete(&self, intent: &ServiceIntent) -> DeleteOutcome {
        let started = Instant::now();
        let span = pass_span("delete", intent);

        let outcome = match guarded(self.delete_pass(intent)).instrument(span).await {
            Ok(outcome) => outcome,
            Err(e) => DeleteOutcome {
                success: false,
                message: e.to_string(),
                failures: Default::default(),
            },
        };

        let phase = if outcome.success {
            Phase::Ready
        } else {
            Phase::Error
        };
        record_pass("delete", phase, started);
        outcome
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrency.max(1)
    }
}

fn pass_span(pass: &'static str, intent: &ServiceIntent) -> tracing::Span {
    tracing::info_span!(
        "reconcile",
        pass,
        pass_id = %Uuid::new_v4(),
        service_id = intent.service_id(),
        service_type = %intent.service_type_label(),
    )
}

/// Run `fut`, turning a panic into [`EngineError::Panicked`].
pub(crate) async fn guarded<F>(fut: F) -> Result<F::Output, EngineError>
where
    F: Future,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|payload| EngineError::Panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

fn record_pass(pass: &'static str, phase: Phase, started: Instant) {
    let result = match phase {
        Phase::Ready => "ready",
        Phase::Error => "error",
    };
    metrics::counter!("netslice_pass_total", "pass" => pass, "result" => result).increment(1);
    metrics::histogram!("netslice_pass_duration_seconds", "pass" => pass)
        .record(started.elapsed().as_secs_f64());
}

fn record_item_error(error: &EngineError) {
    if let Some(kind) = error.device_kind() {
        metrics::counter!("netslice_device_errors_total", "kind" => kind).increment(1);
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
