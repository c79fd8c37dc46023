//! Device sessions.
//!
//! A [`Session`] is a scoped, authenticated channel to one router. It is
//! obtained from a [`SessionFactory`], which resolves credentials first (so a
//! missing credential never triggers a network attempt) and then asks the
//! [`DeviceConnector`] for a channel. The channel is closed when the session
//! is dropped, which covers early returns, errors and unwinding alike.
//!
//! Higher layers see exactly three operations: [`Session::set`],
//! [`Session::get`] and [`Session::get_oper_state`].

pub mod credentials;
mod error;
pub mod gateway;
pub mod protocol;

pub use credentials::{Credentials, CredentialSource, DEFAULT_GNMI_PORT};
pub use error::DeviceError;
pub use protocol::{Encoding, GetRequest, GetResponse, SetRequest, SetResponse, Update};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Operational state reported when the device returns none.
pub const UNKNOWN_OPER_STATE: &str = "UNKNOWN";

/// An open protocol channel to one device.
///
/// Implementations must be usable for a single work item only; they are
/// never shared across concurrent work.
#[async_trait]
pub trait DeviceChannel: Send {
    async fn set(&mut self, request: SetRequest) -> Result<SetResponse, DeviceError>;

    async fn get(&mut self, request: GetRequest) -> Result<GetResponse, DeviceError>;

    /// Release the underlying transport. Called exactly once, on drop.
    fn close(&mut self) {}
}

/// Establishes channels to devices.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(
        &self,
        router: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn DeviceChannel>, DeviceError>;
}

/// A scoped session with one router.
pub struct Session {
    router: String,
    encoding: Encoding,
    channel: Box<dyn DeviceChannel>,
}

impl Session {
    /// Open a session with already-resolved credentials.
    pub async fn open(
        connector: &dyn DeviceConnector,
        router: &str,
        credentials: &Credentials,
        encoding: Encoding,
    ) -> Result<Self, DeviceError> {
        let channel = connector.connect(router, credentials).await?;
        tracing::debug!(router, address = %credentials.target(), "Device session opened");

        Ok(Self {
            router: router.to_string(),
            encoding,
            channel,
        })
    }

    pub fn router(&self) -> &str {
        &self.router
    }

    /// Push updates and deletes in one Set RPC.
    pub async fn set(
        &mut self,
        updates: Vec<(String, Value)>,
        deletes: Vec<String>,
    ) -> Result<(), DeviceError> {
        let request = SetRequest {
            update: updates
                .into_iter()
                .map(|(path, val)| Update { path, val })
                .collect(),
            delete: deletes,
        };

        let response = self.channel.set(request).await?;
        match response.error {
            None => Ok(()),
            Some(error) => Err(DeviceError::Protocol {
                router: self.router.clone(),
                rpc: "Set",
                message: format!("code {}: {}", error.code, error.message),
            }),
        }
    }

    /// Fetch the document at `path`. `None` means no configuration found.
    pub async fn get(&mut self, path: &str) -> Result<Option<Value>, DeviceError> {
        let request = GetRequest {
            path: vec![path.to_string()],
            encoding: self.encoding,
        };

        let response = self.channel.get(request).await?;
        if let Some(error) = response.error {
            return Err(DeviceError::Protocol {
                router: self.router.clone(),
                rpc: "Get",
                message: format!("code {}: {}", error.code, error.message),
            });
        }

        Ok(response.value_for(path).cloned())
    }

    /// Operational state of a service, upper-cased (`UP`, `DOWN`, ...).
    pub async fn get_oper_state(&mut self, service_id: &str) -> Result<String, DeviceError> {
        let path = crate::payload::oper_state_path(service_id);
        let state = match self.get(&path).await? {
            Some(Value::String(s)) => s,
            Some(Value::Object(map)) => map
                .iter()
                .find(|(k, _)| k.as_str() == "oper-state" || k.ends_with(":oper-state"))
                .and_then(|(_, v)| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| UNKNOWN_OPER_STATE.to_string()),
            Some(other) => other.to_string(),
            None => {
                tracing::warn!(
                    router = %self.router,
                    service_id,
                    "Could not determine operational status"
                );
                UNKNOWN_OPER_STATE.to_string()
            }
        };

        Ok(state.to_uppercase())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.channel.close();
        tracing::debug!(router = %self.router, "Device session closed");
    }
}

/// Opens sessions: resolve credentials, then connect.
#[derive(Clone)]
pub struct SessionFactory {
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn DeviceConnector>,
    encoding: Encoding,
}

impl SessionFactory {
    pub fn new(credentials: Arc<dyn CredentialSource>, connector: Arc<dyn DeviceConnector>) -> Self {
        Self {
            credentials,
            connector,
            encoding: Encoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Open a fresh session for `router`. Credentials are re-resolved on
    /// every call.
    pub async fn open(&self, router: &str) -> Result<Session, DeviceError> {
        let credentials = self.credentials.resolve(router).await?;
        Session::open(self.connector.as_ref(), router, &credentials, self.encoding).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::protocol::{Notification, RpcError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        closes: AtomicUsize,
    }

    struct ScriptedChannel {
        counters: Arc<Counters>,
        get_value: Option<Value>,
        set_error: Option<RpcError>,
        sets: Arc<Mutex<Vec<SetRequest>>>,
    }

    #[async_trait]
    impl DeviceChannel for ScriptedChannel {
        async fn set(&mut self, request: SetRequest) -> Result<SetResponse, DeviceError> {
            self.sets.lock().unwrap().push(request);
            Ok(SetResponse {
                error: self.set_error.clone(),
            })
        }

        async fn get(&mut self, request: GetRequest) -> Result<GetResponse, DeviceError> {
            Ok(GetResponse {
                notification: self
                    .get_value
                    .clone()
                    .map(|val| {
                        vec![Notification {
                            update: vec![Update {
                                path: request.path[0].clone(),
                                val,
                            }],
                        }]
                    })
                    .unwrap_or_default(),
                error: None,
            })
        }

        fn close(&mut self) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedConnector {
        counters: Arc<Counters>,
        get_value: Option<Value>,
        set_error: Option<RpcError>,
        sets: Arc<Mutex<Vec<SetRequest>>>,
    }

    impl ScriptedConnector {
        fn new(get_value: Option<Value>, set_error: Option<RpcError>) -> Self {
            Self {
                counters: Arc::new(Counters::default()),
                get_value,
                set_error,
                sets: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl DeviceConnector for ScriptedConnector {
        async fn connect(
            &self,
            _router: &str,
            _credentials: &Credentials,
        ) -> Result<Box<dyn DeviceChannel>, DeviceError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedChannel {
                counters: self.counters.clone(),
                get_value: self.get_value.clone(),
                set_error: self.set_error.clone(),
                sets: self.sets.clone(),
            }))
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialSource for NoCredentials {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn resolve(&self, router: &str) -> Result<Credentials, DeviceError> {
            Err(DeviceError::CredentialsMissing {
                router: router.to_string(),
                missing: "host".to_string(),
            })
        }
    }

    struct FixedCredentials;

    #[async_trait]
    impl CredentialSource for FixedCredentials {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn resolve(&self, _router: &str) -> Result<Credentials, DeviceError> {
            Ok(Credentials {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_GNMI_PORT,
                username: "admin".to_string(),
                password: "admin".to_string(),
            })
        }
    }

    fn factory(connector: Arc<ScriptedConnector>) -> SessionFactory {
        SessionFactory::new(Arc::new(FixedCredentials), connector)
    }

    #[tokio::test]
    async fn test_missing_credentials_never_connect() {
        let connector = Arc::new(ScriptedConnector::new(None, None));
        let factory = SessionFactory::new(Arc::new(NoCredentials), connector.clone());

        let result = factory.open("SR1").await;
        assert!(matches!(result, Err(DeviceError::CredentialsMissing { .. })));
        assert_eq!(connector.counters.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_closes_on_drop() {
        let connector = Arc::new(ScriptedConnector::new(None, None));
        {
            let mut session = factory(connector.clone()).open("SR1").await.unwrap();
            session
                .set(vec![("/a".to_string(), json!({"x": 1}))], vec![])
                .await
                .unwrap();
        }
        assert_eq!(connector.counters.connects.load(Ordering::SeqCst), 1);
        assert_eq!(connector.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closes_on_protocol_error() {
        let connector = Arc::new(ScriptedConnector::new(
            None,
            Some(RpcError {
                code: 3,
                message: "invalid path".to_string(),
            }),
        ));
        let factory = factory(connector.clone());

        let result = async {
            let mut session = factory.open("SR1").await?;
            session.set(vec![], vec!["/a".to_string()]).await
        }
        .await;

        assert!(matches!(
            result,
            Err(DeviceError::Protocol { rpc: "Set", ref message, .. }) if message.contains("invalid path")
        ));
        assert_eq!(connector.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closes_on_panic() {
        let connector = Arc::new(ScriptedConnector::new(None, None));
        let factory = factory(connector.clone());

        let handle = tokio::spawn(async move {
            let _session = factory.open("SR1").await.unwrap();
            panic!("work item blew up");
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert_eq!(connector.counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_returns_none_without_values() {
        let connector = Arc::new(ScriptedConnector::new(None, None));
        let mut session = factory(connector).open("SR1").await.unwrap();

        assert_eq!(session.get("/configure/service/vpls").await.unwrap(), None);
        assert_eq!(session.get_oper_state("100").await.unwrap(), "UNKNOWN");
    }

    #[tokio::test]
    async fn test_get_oper_state_is_uppercased() {
        let connector = Arc::new(ScriptedConnector::new(Some(json!("up")), None));
        let mut session = factory(connector).open("SR1").await.unwrap();
        assert_eq!(session.get_oper_state("100").await.unwrap(), "UP");

        let connector = Arc::new(ScriptedConnector::new(
            Some(json!({"nokia-state:oper-state": "down"})),
            None,
        ));
        let mut session = factory(connector).open("SR1").await.unwrap();
        assert_eq!(session.get_oper_state("100").await.unwrap(), "DOWN");
    }

    #[tokio::test]
    async fn test_set_sends_updates_and_deletes() {
        let connector = Arc::new(ScriptedConnector::new(None, None));
        let mut session = factory(connector.clone()).open("SR1").await.unwrap();
        session
            .set(
                vec![("/u".to_string(), json!({"k": "v"}))],
                vec!["/d".to_string()],
            )
            .await
            .unwrap();

        let sets = connector.sets.lock().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].update[0].path, "/u");
        assert_eq!(sets[0].delete, vec!["/d".to_string()]);
    }
}
