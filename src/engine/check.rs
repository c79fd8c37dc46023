//! Periodic drift check pass.

use super::{
    guarded, record_item_error, timestamp, EngineError, OperationalStatus, Phase,
    ReconciliationOutcome, Reconciler, SliceStatus,
};
use crate::drift;
use crate::intent::{expand, ServiceIntent, ServiceType};
use crate::payload::{render, ConfigurationDocument};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::BTreeMap;

type ItemResult = Result<(ReconciliationOutcome, OperationalStatus), EngineError>;

/// One rendered work item, owned so it can run on any task.
struct CheckJob {
    router: String,
    service_type: ServiceType,
    service_id: String,
    document: ConfigurationDocument,
}

impl Reconciler {
    pub(super) async fn check_pass(&self, intent: &ServiceIntent) -> SliceStatus {
        let service_type = match intent.validate() {
            Ok(service_type) => service_type,
            Err(e) => {
                tracing::error!(error = %e, "Intent rejected");
                let mut status = SliceStatus::error(intent.service_type_label(), e.to_string());
                status.operational_status = Some(OperationalStatus::Error);
                return status;
            }
        };
        let label = service_type.to_string();

        // Rendering is pure, so a bad document fails its item without a session
        let mut results: Vec<(String, ItemResult)> = Vec::new();
        let mut jobs = Vec::new();
        for item in expand(intent, service_type) {
            match render(&item) {
                Ok(document) => jobs.push(CheckJob {
                    router: item.router_name.to_string(),
                    service_type,
                    service_id: intent.service_id().to_string(),
                    document,
                }),
                Err(e) => results.push((item.router_name.to_string(), Err(e.into()))),
            }
        }

        let checked: Vec<(String, ItemResult)> = stream::iter(jobs)
            .map(|job| self.check_job(job))
            .buffer_unordered(self.concurrency())
            .collect::<Vec<_>>()
            .boxed()
            .await;
        results.extend(checked);

        let mut outcomes: BTreeMap<String, ReconciliationOutcome> = BTreeMap::new();
        let mut operational = OperationalStatus::Up;
        for (router, result) in results {
            let (outcome, state) = match result {
                Ok(checked) => checked,
                Err(e) => {
                    record_item_error(&e);
                    tracing::error!(router = %router, error = %e, "Drift check failed");
                    (
                        ReconciliationOutcome::Error(format!("Error during drift check: {}", e)),
                        OperationalStatus::Error,
                    )
                }
            };
            // Several endpoints may share a router; never let a later item hide a failure
            let merged = match outcomes.remove(&router) {
                Some(existing) => existing.merge(outcome),
                None => outcome,
            };
            outcomes.insert(router, merged);
            operational = operational.combine(state);
        }

        let phase = if operational == OperationalStatus::Error {
            Phase::Error
        } else {
            Phase::Ready
        };
        tracing::info!(operational_status = %operational, "Periodic check finished");

        SliceStatus {
            phase,
            service_type: label,
            operational_status: Some(operational),
            message: format!(
                "Periodic drift check completed. Status: {} at {}",
                operational,
                timestamp()
            ),
            outcomes,
        }
    }

    async fn check_job(&self, job: CheckJob) -> (String, ItemResult) {
        let result = guarded(self.check_one(&job)).await.and_then(|r| r);
        (job.router, result)
    }

    async fn check_one(&self, job: &CheckJob) -> ItemResult {
        let document = &job.document;
        let mut session = self.sessions.open(&job.router).await?;

        let observed = session.get(&document.path).await?;
        let report = drift::detect(document, observed.as_ref());

        let outcome = if report.drift_detected() {
            metrics::counter!(
                "netslice_drift_detected_total",
                "service_type" => job.service_type.to_string(),
            )
            .increment(1);
            tracing::warn!(
                router = %job.router,
                reasons = ?report.reasons(),
                "Drift detected, enforcing configuration"
            );
            session.set(vec![document.to_update()?], Vec::new()).await?;
            ReconciliationOutcome::Reconciled
        } else {
            tracing::debug!(router = %job.router, "Configuration in sync");
            ReconciliationOutcome::InSync
        };

        let state = session.get_oper_state(&job.service_id).await?;
        Ok((outcome, OperationalStatus::from_reported(&state)))
    }
}
