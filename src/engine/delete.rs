//! Delete pass.

use super::{guarded, record_item_error, DeleteOutcome, EngineError, Reconciler};
use crate::intent::{Endpoint, ServiceIntent};
use crate::payload::service_path;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::BTreeMap;

impl Reconciler {
    pub(super) async fn delete_pass(&self, intent: &ServiceIntent) -> DeleteOutcome {
        let label = intent.service_type_label();
        let service_type = match intent.service_type() {
            Ok(service_type) => service_type,
            Err(e) => {
                // Such an intent never passed validation, so nothing was pushed
                tracing::warn!(error = %e, "Skipping delete for intent without a valid service type");
                return DeleteOutcome {
                    success: true,
                    message: format!("No {} service was provisioned; nothing to delete.", label),
                    failures: BTreeMap::new(),
                };
            }
        };
        let path = service_path(service_type, &intent.service_name());

        let mut routers: Vec<String> = Vec::new();
        for router in intent.endpoints.iter().filter_map(Endpoint::router) {
            if !routers.iter().any(|r| r == router) {
                routers.push(router.to_string());
            }
        }

        let results: Vec<(String, Result<(), EngineError>)> = stream::iter(routers)
            .map(|router| self.delete_router(router, &path))
            .buffer_unordered(self.concurrency())
            .collect::<Vec<_>>()
            .boxed()
            .await;

        let mut failures = BTreeMap::new();
        for (router, result) in results {
            if let Err(e) = result {
                record_item_error(&e);
                tracing::error!(router = %router, error = %e, "Failed to clean up configuration");
                failures.insert(router, e.to_string());
            }
        }

        if failures.is_empty() {
            DeleteOutcome {
                success: true,
                message: format!("{} service successfully de-provisioned.", label),
                failures,
            }
        } else {
            DeleteOutcome {
                success: false,
                message: format!("Cleanup of {} completed with errors on some devices.", label),
                failures,
            }
        }
    }

    async fn delete_router(&self, router: String, path: &str) -> (String, Result<(), EngineError>) {
        let result = guarded(self.delete_one(&router, path)).await.and_then(|r| r);
        (router, result)
    }

    async fn delete_one(&self, router: &str, path: &str) -> Result<(), EngineError> {
        tracing::info!(router, "Attempting de-provisioning");
        let mut session = self.sessions.open(router).await?;
        session.set(Vec::new(), vec![path.to_string()]).await?;
        tracing::info!(router, "Configuration removed");
        Ok(())
    }
}
