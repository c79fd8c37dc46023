//! gNMI over an HTTP/JSON gateway.
//!
//! Handles the gateway endpoints:
//! - Session establishment via POST /gnmi/v1/capabilities
//! - Configuration push via POST /gnmi/v1/set
//! - State and configuration reads via POST /gnmi/v1/get

use super::{Credentials, DeviceChannel, DeviceConnector, DeviceError};
use super::protocol::{GetRequest, GetResponse, SetRequest, SetResponse};
use crate::config::DeviceConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Opens [`GatewayChannel`]s against `http(s)://{host}:{port}`.
pub struct GatewayConnector {
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
    timeout: Duration,
    scheme: &'static str,
}

impl GatewayConnector {
    pub fn new(config: &DeviceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    pub fn with_client(client: Arc<Client>, config: &DeviceConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.timeout_seconds),
            scheme: if config.insecure { "http" } else { "https" },
        }
    }
}

#[async_trait]
impl DeviceConnector for GatewayConnector {
    async fn connect(
        &self,
        router: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn DeviceChannel>, DeviceError> {
        let channel = GatewayChannel {
            router: router.to_string(),
            target: credentials.target(),
            base_url: format!("{}://{}", self.scheme, credentials.target()),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            client: self.client.clone(),
            timeout: self.timeout,
        };

        channel.probe().await?;
        Ok(Box::new(channel))
    }
}

/// One authenticated gateway session.
pub struct GatewayChannel {
    router: String,
    target: String,
    base_url: String,
    username: String,
    password: String,
    client: Arc<Client>,
    timeout: Duration,
}

impl GatewayChannel {
    fn post(&self, rpc: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/gnmi/v1/{}", self.base_url, rpc))
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout)
    }

    fn connection_failed(&self, message: String) -> DeviceError {
        DeviceError::ConnectionFailed {
            router: self.router.clone(),
            target: self.target.clone(),
            message,
        }
    }

    fn protocol(&self, rpc: &'static str, message: String) -> DeviceError {
        DeviceError::Protocol {
            router: self.router.clone(),
            rpc,
            message,
        }
    }

    /// Capabilities round-trip; any failure here is a failed session.
    async fn probe(&self) -> Result<(), DeviceError> {
        let response = self
            .post("capabilities")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.connection_failed(transport_message(&e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.connection_failed(format!("capabilities returned {}", status)));
        }

        tracing::trace!(router = %self.router, address = %self.target, "Gateway capabilities ok");
        Ok(())
    }

    async fn call<Req, Resp>(&self, rpc: &'static str, body: &Req) -> Result<Resp, DeviceError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .post(&rpc.to_lowercase())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    self.connection_failed(transport_message(&e, self.timeout))
                } else {
                    self.protocol(rpc, e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.protocol(rpc, format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(self.protocol(rpc, format!("HTTP {}: {}", status, text.trim())));
        }

        serde_json::from_str(&text)
            .map_err(|e| self.protocol(rpc, format!("Malformed response: {}", e)))
    }
}

fn transport_message(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else {
        error.to_string()
    }
}

#[async_trait]
impl DeviceChannel for GatewayChannel {
    async fn set(&mut self, request: SetRequest) -> Result<SetResponse, DeviceError> {
        self.call("Set", &request).await
    }

    async fn get(&mut self, request: GetRequest) -> Result<GetResponse, DeviceError> {
        self.call("Get", &request).await
    }

    fn close(&mut self) {
        tracing::trace!(router = %self.router, "Gateway channel released");
    }
}
