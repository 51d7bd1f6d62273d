use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::contracts::*;
use crate::subjects::{self, Command};
use crate::transport::{Transport, TransportError};

/// Delivery failures of a single call. Business failures arrive as
/// `status = ERROR` inside a normal response and never show up here.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("{command}: no response within {timeout:?}")]
    Timeout { command: Command, timeout: Duration },
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl CommandError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }
}

/// Default timeouts applied when a call does not pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTimeouts {
    pub standard: Duration,
    pub trade: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self {
            standard: subjects::DEFAULT_TIMEOUT,
            trade: subjects::TRADE_TIMEOUT,
        }
    }
}

impl CallTimeouts {
    pub fn for_command(&self, command: Command) -> Duration {
        match command {
            Command::UserDirectedTrade => self.trade,
            _ => self.standard,
        }
    }
}

/// A command's resolved address paired with the shared transport.
#[derive(Clone)]
pub struct BoundCaller {
    command: Command,
    address: String,
    transport: Arc<dyn Transport>,
}

impl BoundCaller {
    pub fn command(&self) -> Command {
        self.command
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Encode, send, and wait at most `timeout` for the typed reply.
    /// The in-flight request is dropped when the deadline passes.
    pub async fn call<R>(&self, request: &R, timeout: Duration) -> Result<R::Response, CommandError>
    where
        R: CommandRequest,
    {
        let payload = serde_json::to_vec(request).map_err(TransportError::from)?;
        debug!(command = %self.command, address = %self.address, "Sending command");

        let pending = self.transport.request(&self.address, payload, timeout);
        let reply = match tokio::time::timeout(timeout, pending).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(TransportError::TimedOut)) | Err(_) => {
                warn!(command = %self.command, address = %self.address, ?timeout, "Command timed out");
                return Err(CommandError::Timeout {
                    command: self.command,
                    timeout,
                });
            }
            Ok(Err(e)) => {
                error!(command = %self.command, address = %self.address, "Command failed: {}", e);
                return Err(e.into());
            }
        };

        let response: R::Response = serde_json::from_slice(&reply).map_err(|e| {
            warn!(command = %self.command, "Undecodable response: {}", e);
            TransportError::from(e)
        })?;
        debug!(command = %self.command, status = %response.status(), "Command answered");
        Ok(response)
    }
}

struct Inner {
    namespace: String,
    instance_id: String,
    timeouts: CallTimeouts,
    // Indexed by `Command::index()`
    callers: Vec<BoundCaller>,
}

/// Controller-side handle to one bot instance.
///
/// Addresses are resolved once here and never change; the client is cheap to
/// clone and safe to share between tasks.
#[derive(Clone)]
pub struct CommandClient {
    inner: Arc<Inner>,
}

impl CommandClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        namespace: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self::with_timeouts(transport, namespace, instance_id, CallTimeouts::default())
    }

    pub fn with_timeouts(
        transport: Arc<dyn Transport>,
        namespace: impl Into<String>,
        instance_id: impl Into<String>,
        timeouts: CallTimeouts,
    ) -> Self {
        let namespace = namespace.into();
        let instance_id = instance_id.into();

        let callers = Command::ALL
            .into_iter()
            .map(|command| BoundCaller {
                command,
                address: subjects::topic_address(&namespace, &instance_id, command),
                transport: transport.clone(),
            })
            .collect();

        debug!(namespace = %namespace, instance_id = %instance_id, transport = transport.name(), "Command client ready");

        Self {
            inner: Arc::new(Inner {
                namespace,
                instance_id,
                timeouts,
                callers,
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn instance_id(&self) -> &str {
        &self.inner.instance_id
    }

    pub fn timeouts(&self) -> CallTimeouts {
        self.inner.timeouts
    }

    pub fn caller(&self, command: Command) -> &BoundCaller {
        &self.inner.callers[command.index()]
    }

    pub fn address(&self, command: Command) -> &str {
        self.caller(command).address()
    }

    /// Typed call; `timeout = None` uses the command's default.
    pub async fn invoke<R>(&self, request: R, timeout: Option<Duration>) -> Result<R::Response, CommandError>
    where
        R: CommandRequest,
    {
        let timeout = timeout.unwrap_or_else(|| self.inner.timeouts.for_command(R::COMMAND));
        self.caller(R::COMMAND).call(&request, timeout).await
    }

    pub async fn start(&self, request: StartRequest, timeout: Option<Duration>) -> Result<StartResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn stop(&self, request: StopRequest, timeout: Option<Duration>) -> Result<StopResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn import_strategy(
        &self,
        request: ImportRequest,
        timeout: Option<Duration>,
    ) -> Result<ImportResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn config(&self, request: ConfigRequest, timeout: Option<Duration>) -> Result<ConfigResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn status(&self, request: StatusRequest, timeout: Option<Duration>) -> Result<StatusResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn history(
        &self,
        request: HistoryRequest,
        timeout: Option<Duration>,
    ) -> Result<HistoryResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn balance_limit(
        &self,
        request: BalanceLimitRequest,
        timeout: Option<Duration>,
    ) -> Result<BalanceLimitResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn balance_paper(
        &self,
        request: BalancePaperRequest,
        timeout: Option<Duration>,
    ) -> Result<BalancePaperResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn shortcut(
        &self,
        request: CommandShortcutRequest,
        timeout: Option<Duration>,
    ) -> Result<CommandShortcutResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn exchange_info(
        &self,
        request: ExchangeInfoRequest,
        timeout: Option<Duration>,
    ) -> Result<ExchangeInfoResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn user_directed_trade(
        &self,
        request: UserDirectedTradeRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedTradeResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn user_directed_cancel(
        &self,
        request: UserDirectedCancelRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedCancelResponse, CommandError> {
        self.invoke(request, timeout).await
    }

    pub async fn user_directed_list_active_orders(
        &self,
        request: UserDirectedListActiveOrdersRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedListActiveOrdersResponse, CommandError> {
        self.invoke(request, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records addresses and replies with a fixed payload.
    struct RecordingTransport {
        seen: Mutex<Vec<(String, Duration)>>,
        reply: Result<Vec<u8>, fn() -> TransportError>,
    }

    impl RecordingTransport {
        fn replying(body: &str) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply: Ok(body.as_bytes().to_vec()),
            }
        }

        fn failing(err: fn() -> TransportError) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                reply: Err(err),
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn request(&self, address: &str, _payload: Vec<u8>, timeout: Duration) -> Result<Vec<u8>, TransportError> {
            self.seen.lock().push((address.to_string(), timeout));
            match &self.reply {
                Ok(body) => Ok(body.clone()),
                Err(make) => Err(make()),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_addresses_resolved_at_construction() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = CommandClient::new(transport, "hbot", "bot-1");

        for command in Command::ALL {
            assert_eq!(client.caller(command).command(), command);
            assert_eq!(
                client.address(command),
                subjects::topic_address("hbot", "bot-1", command)
            );
        }
        assert_eq!(client.namespace(), "hbot");
        assert_eq!(client.instance_id(), "bot-1");
    }

    #[tokio::test]
    async fn test_default_timeouts_per_command() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let client = CommandClient::new(transport.clone(), "hbot", "bot-1");

        client.stop(StopRequest::default(), None).await.unwrap();
        let trade = UserDirectedTradeRequest::builder()
            .exchange("binance")
            .trading_pair("BTC-USDT")
            .is_buy(true)
            .is_limit_order(false)
            .amount("0.01")
            .build()
            .unwrap();
        client.user_directed_trade(trade, None).await.unwrap();
        client
            .status(StatusRequest::default(), Some(Duration::from_millis(750)))
            .await
            .unwrap();

        let seen = transport.seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                ("hbot/bot-1/stop".to_string(), Duration::from_secs(5)),
                ("hbot/bot-1/user_directed/trade".to_string(), Duration::from_secs(20)),
                ("hbot/bot-1/status".to_string(), Duration::from_millis(750)),
            ]
        );
    }

    #[tokio::test]
    async fn test_business_error_is_returned_as_data() {
        let transport = Arc::new(RecordingTransport::replying(r#"{"status": 400, "msg": "strategy not found"}"#));
        let client = CommandClient::new(transport, "hbot", "bot-1");

        let resp = client
            .import_strategy(ImportRequest::new("missing.yml"), None)
            .await
            .unwrap();
        assert!(resp.status.is_error());
        assert_eq!(resp.msg, "strategy not found");
    }

    #[tokio::test]
    async fn test_transport_timeout_maps_to_timeout() {
        let transport = Arc::new(RecordingTransport::failing(|| TransportError::TimedOut));
        let client = CommandClient::new(transport, "hbot", "bot-1");

        let err = client.start(StartRequest::default(), None).await.unwrap_err();
        assert!(err.is_timeout());
        match err {
            CommandError::Timeout { command, timeout } => {
                assert_eq!(command, Command::Start);
                assert_eq!(timeout, Duration::from_secs(5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let transport = Arc::new(RecordingTransport::failing(|| {
            TransportError::Request("connection closed".into())
        }));
        let client = CommandClient::new(transport, "hbot", "bot-1");

        let err = client.history(HistoryRequest::default(), None).await.unwrap_err();
        assert!(matches!(err, CommandError::Transport(TransportError::Request(_))));
    }

    #[tokio::test]
    async fn test_undecodable_reply_is_transport_error() {
        let transport = Arc::new(RecordingTransport::replying("not json"));
        let client = CommandClient::new(transport, "hbot", "bot-1");

        let err = client.config(ConfigRequest::default(), None).await.unwrap_err();
        assert!(matches!(err, CommandError::Transport(TransportError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_custom_call_timeouts() {
        let transport = Arc::new(RecordingTransport::replying("{}"));
        let timeouts = CallTimeouts {
            standard: Duration::from_secs(2),
            trade: Duration::from_secs(30),
        };
        let client = CommandClient::with_timeouts(transport.clone(), "hbot", "bot-1", timeouts);

        client.exchange_info(ExchangeInfoRequest::default(), None).await.unwrap();
        assert_eq!(transport.seen.lock()[0].1, Duration::from_secs(2));
        assert_eq!(client.timeouts().for_command(Command::UserDirectedTrade), Duration::from_secs(30));
    }
}
