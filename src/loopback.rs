use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::handler::{dispatch, CommandHandler};
use crate::subjects::{self, Command};
use crate::transport::{Transport, TransportError};

/// In-process transport bound to a single simulated bot.
///
/// Requests go through the same encode/decode path as the wire: the payload is
/// decoded by `dispatch`, handled, and the encoded reply handed back.
pub struct LoopbackTransport {
    prefix: String,
    handler: Arc<dyn CommandHandler>,
    delivered: Mutex<Vec<Command>>,
}

impl LoopbackTransport {
    pub fn new(namespace: &str, instance_id: &str, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            prefix: subjects::topic_prefix(namespace, instance_id),
            handler,
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// Commands that reached the handler, in arrival order.
    pub fn delivered(&self) -> Vec<Command> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn request(
        &self,
        address: &str,
        payload: Vec<u8>,
        _timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let Some(command) = Command::from_address(&self.prefix, address) else {
            return Err(TransportError::NoResponders(address.to_string()));
        };
        debug!(command = %command, "Loopback delivery");
        self.delivered.lock().push(command);

        Ok(dispatch(self.handler.as_ref(), command, &payload).await?)
    }

    fn name(&self) -> &str {
        "loopback"
    }
}
