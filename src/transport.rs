use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::subjects;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connect(String),
    #[error("No responders on {0}")]
    NoResponders(String),
    #[error("Request timed out")]
    TimedOut,
    #[error("Request error: {0}")]
    Request(String),
    #[error("Subscription error: {0}")]
    Subscribe(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Broker location and credentials.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4222,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ConnectionParams {
    pub fn url(&self) -> String {
        format!("nats://{}:{}", self.host, self.port)
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

/// Request/response primitive of the message bus.
/// Implementations own request correlation; callers see one reply per request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `address` and wait for the matching reply.
    async fn request(
        &self,
        address: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Transport name for logs (e.g., "nats")
    fn name(&self) -> &str;
}

/// NATS core request/reply.
#[derive(Clone)]
pub struct NatsTransport {
    client: async_nats::Client,
}

impl NatsTransport {
    pub async fn connect(params: &ConnectionParams) -> Result<Self, TransportError> {
        let url = params.url();
        info!("Connecting to NATS at {}", url);

        let options = if params.has_credentials() {
            async_nats::ConnectOptions::with_user_and_password(
                params.username.clone(),
                params.password.clone(),
            )
        } else {
            async_nats::ConnectOptions::new()
        };

        let client = options.connect(url.as_str()).await.map_err(|e| {
            error!("❌ Failed to connect to NATS: {}", e);
            TransportError::Connect(e.to_string())
        })?;
        info!("✅ Connected to NATS");

        Ok(Self { client })
    }

    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Underlying client, shared with broadcast channel subscribers.
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for NatsTransport {
    async fn request(
        &self,
        address: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let request = async_nats::Request::new()
            .payload(payload.into())
            .timeout(Some(timeout));

        match self.client.send_request(subjects::nats_subject(address), request).await {
            Ok(msg) => Ok(msg.payload.to_vec()),
            Err(e) => match e.kind() {
                async_nats::RequestErrorKind::TimedOut => Err(TransportError::TimedOut),
                async_nats::RequestErrorKind::NoResponders => {
                    Err(TransportError::NoResponders(address.to_string()))
                }
                _ => Err(TransportError::Request(e.to_string())),
            },
        }
    }

    fn name(&self) -> &str {
        "nats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = ConnectionParams::default();
        assert_eq!(params.url(), "nats://localhost:4222");
        assert!(!params.has_credentials());
    }

    #[test]
    fn test_credentials_detected() {
        let params = ConnectionParams {
            host: "broker.internal".into(),
            port: 4333,
            username: "admin".into(),
            password: "secret".into(),
        };
        assert_eq!(params.url(), "nats://broker.internal:4333");
        assert!(params.has_credentials());
    }
}
