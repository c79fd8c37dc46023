//! Shared test utilities for netslice integration tests.
//!
//! Provides an in-memory router fleet behind the `DeviceConnector` seam, with
//! per-router scripted failures and a call log.

#![allow(dead_code)]

use async_trait::async_trait;
use netslice::config::{ReconcileConfig, RouterConfig};
use netslice::device::credentials::StaticCredentials;
use netslice::device::protocol::{GetRequest, GetResponse, Notification, RpcError, SetRequest, SetResponse, Update};
use netslice::device::{
    CredentialSource, Credentials, DeviceChannel, DeviceConnector, DeviceError, SessionFactory,
    DEFAULT_GNMI_PORT,
};
use netslice::engine::Reconciler;
use netslice::intent::ServiceIntent;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// =============================================================================
// Call Log
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect(String),
    Set { router: String, request: SetRequest },
    Get { router: String, path: String },
    Close(String),
}

// =============================================================================
// Scripted Fleet
// =============================================================================

/// Per-router behavior.
#[derive(Debug, Clone, Default)]
pub struct RouterScript {
    pub refuse_connect: bool,
    pub set_error: Option<String>,
    pub get_error: Option<String>,
    /// Operational state reported for any service
    pub oper_state: Option<String>,
    /// Stored configuration by path; Set writes here, delete removes
    pub config: HashMap<String, Value>,
}

#[derive(Default)]
pub struct MockFleet {
    scripts: Mutex<HashMap<String, RouterScript>>,
    calls: Mutex<Vec<Call>>,
}

impl MockFleet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, router: &str, script: RouterScript) {
        self.scripts
            .lock()
            .unwrap()
            .insert(router.to_string(), script);
    }

    pub fn set_oper_state(&self, router: &str, state: &str) {
        self.scripts
            .lock()
            .unwrap()
            .entry(router.to_string())
            .or_default()
            .oper_state = Some(state.to_string());
    }

    pub fn store_config(&self, router: &str, path: &str, value: Value) {
        self.scripts
            .lock()
            .unwrap()
            .entry(router.to_string())
            .or_default()
            .config
            .insert(path.to_string(), value);
    }

    pub fn stored_config(&self, router: &str, path: &str) -> Option<Value> {
        self.scripts
            .lock()
            .unwrap()
            .get(router)
            .and_then(|s| s.config.get(path).cloned())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Routers connected to, in order.
    pub fn connected(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Connect(router) => Some(router),
                _ => None,
            })
            .collect()
    }

    pub fn sets_for(&self, router: &str) -> Vec<SetRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Set { router: r, request } if r == router => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Close(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn script_for(&self, router: &str) -> RouterScript {
        self.scripts
            .lock()
            .unwrap()
            .get(router)
            .cloned()
            .unwrap_or_default()
    }
}

pub struct FleetConnector(pub Arc<MockFleet>);

#[async_trait]
impl DeviceConnector for FleetConnector {
    async fn connect(
        &self,
        router: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn DeviceChannel>, DeviceError> {
        self.0.record(Call::Connect(router.to_string()));

        if self.0.script_for(router).refuse_connect {
            return Err(DeviceError::ConnectionFailed {
                router: router.to_string(),
                target: credentials.target(),
                message: "connection refused".to_string(),
            });
        }

        Ok(Box::new(FleetChannel {
            router: router.to_string(),
            fleet: self.0.clone(),
        }))
    }
}

struct FleetChannel {
    router: String,
    fleet: Arc<MockFleet>,
}

#[async_trait]
impl DeviceChannel for FleetChannel {
    async fn set(&mut self, request: SetRequest) -> Result<SetResponse, DeviceError> {
        self.fleet.record(Call::Set {
            router: self.router.clone(),
            request: request.clone(),
        });

        let mut scripts = self.fleet.scripts.lock().unwrap();
        let script = scripts.entry(self.router.clone()).or_default();
        if let Some(message) = &script.set_error {
            return Ok(SetResponse {
                error: Some(RpcError {
                    code: 3,
                    message: message.clone(),
                }),
            });
        }
        for path in &request.delete {
            script.config.remove(path);
        }
        for update in request.update {
            script.config.insert(update.path, update.val);
        }
        Ok(SetResponse::default())
    }

    async fn get(&mut self, request: GetRequest) -> Result<GetResponse, DeviceError> {
        let path = request.path.first().cloned().unwrap_or_default();
        self.fleet.record(Call::Get {
            router: self.router.clone(),
            path: path.clone(),
        });

        let script = self.fleet.script_for(&self.router);
        if let Some(message) = script.get_error {
            return Ok(GetResponse {
                notification: Vec::new(),
                error: Some(RpcError { code: 14, message }),
            });
        }

        let val = if path.starts_with("/state/") {
            script.oper_state.map(|s| json!(s))
        } else {
            script.config.get(&path).cloned()
        };

        Ok(GetResponse {
            notification: val
                .map(|val| {
                    vec![Notification {
                        update: vec![Update { path, val }],
                    }]
                })
                .unwrap_or_default(),
            error: None,
        })
    }

    fn close(&mut self) {
        self.fleet.record(Call::Close(self.router.clone()));
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Static credentials for the named routers only.
pub fn credentials_for(routers: &[&str]) -> Arc<dyn CredentialSource> {
    let table: Vec<RouterConfig> = routers
        .iter()
        .map(|name| RouterConfig {
            name: name.to_string(),
            host: format!("{}.lab", name.to_lowercase()),
            port: None,
            username: Some("admin".to_string()),
            password: Some("admin".to_string()),
            password_env: None,
        })
        .collect();
    Arc::new(StaticCredentials::new(&table, DEFAULT_GNMI_PORT))
}

/// Reconciler over the mock fleet with credentials for `routers`.
pub fn reconciler(fleet: &Arc<MockFleet>, routers: &[&str]) -> Reconciler {
    let sessions = SessionFactory::new(credentials_for(routers), Arc::new(FleetConnector(fleet.clone())));
    Reconciler::new(sessions, ReconcileConfig::default())
}

/// Parse an intent from JSON.
pub fn intent(value: Value) -> ServiceIntent {
    serde_json::from_value(value).unwrap()
}

pub fn vpls_intent(routers: &[&str]) -> ServiceIntent {
    let endpoints: Vec<Value> = routers
        .iter()
        .enumerate()
        .map(|(i, r)| json!({"routerName": r, "interfaceName": "1/1/1", "vlanId": 10 + i}))
        .collect();
    intent(json!({
        "serviceType": "VPLS",
        "serviceId": "100",
        "endpoints": endpoints
    }))
}

pub fn epipe_intent() -> ServiceIntent {
    intent(json!({
        "serviceType": "ePipe",
        "serviceId": "300",
        "endpoints": [
            {"routerName": "SR1", "interfaceName": "1/1/3", "vlanId": 30, "sdpId": 1001},
            {"routerName": "SR2", "interfaceName": "1/1/4", "vlanId": 30, "sdpId": 1002}
        ]
    }))
}
