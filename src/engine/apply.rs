//! Create/update pass.

use super::{record_item_error, timestamp, EngineError, Phase, ReconciliationOutcome, Reconciler, SliceStatus};
use crate::intent::{expand, ServiceIntent, WorkItem};
use crate::payload::render;
use std::collections::BTreeMap;

impl Reconciler {
    pub(super) async fn apply_pass(&self, intent: &ServiceIntent) -> SliceStatus {
        let service_type = match intent.validate() {
            Ok(service_type) => service_type,
            Err(e) => {
                tracing::error!(error = %e, "Intent rejected");
                return SliceStatus::error(intent.service_type_label(), e.to_string());
            }
        };
        let label = service_type.to_string();
        let mut outcomes = BTreeMap::new();

        // Sequential so nothing is issued after the first failure
        for item in expand(intent, service_type) {
            match self.apply_item(&item).await {
                Ok(()) => {
                    outcomes.insert(item.router_name.to_string(), ReconciliationOutcome::Provisioned);
                }
                Err(e) => {
                    record_item_error(&e);
                    let message = format!(
                        "Error during provisioning for {} on {}: {}",
                        label, item.router_name, e
                    );
                    tracing::error!(router = item.router_name, error = %e, "Provisioning failed");
                    outcomes.insert(
                        item.router_name.to_string(),
                        ReconciliationOutcome::Error(e.to_string()),
                    );
                    return SliceStatus {
                        phase: Phase::Error,
                        service_type: label,
                        operational_status: None,
                        message,
                        outcomes,
                    };
                }
            }
        }

        tracing::info!(routers = outcomes.len(), "Provisioning finished");
        SliceStatus {
            phase: Phase::Ready,
            service_type: label,
            operational_status: None,
            message: format!("Provisioning complete at {}", timestamp()),
            outcomes,
        }
    }

    /// Render, then push unconditionally. Rendering runs before the session
    /// is opened so a bad document never costs a connection.
    async fn apply_item(&self, item: &WorkItem<'_>) -> Result<(), EngineError> {
        let document = render(item)?;
        let update = document.to_update()?;

        let mut session = self.sessions.open(item.router_name).await?;
        session.set(vec![update], Vec::new()).await?;

        tracing::info!(router = item.router_name, path = %document.path, "Configuration pushed");
        Ok(())
    }
}
