use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

use crate::client::{CallTimeouts, CommandClient, CommandError};
use crate::contracts::*;
use crate::transport::{ConnectionParams, NatsTransport, Transport, TransportError};

/// Blocking remote control for one bot instance.
///
/// Owns a small multi-threaded runtime; every method parks the calling thread
/// until the reply arrives or the timeout elapses. Methods take `&self` and
/// may be called from several threads at once.
///
/// Must not be created or dropped from inside another tokio runtime.
pub struct BotCommands {
    runtime: Runtime,
    client: CommandClient,
}

impl BotCommands {
    /// Connect to the broker and bind all command addresses of `instance_id`.
    pub fn connect(
        params: &ConnectionParams,
        namespace: &str,
        instance_id: &str,
        timeouts: CallTimeouts,
    ) -> Result<Self, TransportError> {
        let runtime = build_runtime()?;
        let transport = runtime.block_on(NatsTransport::connect(params))?;
        let client = CommandClient::with_timeouts(Arc::new(transport), namespace, instance_id, timeouts);
        Ok(Self { runtime, client })
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        namespace: &str,
        instance_id: &str,
        timeouts: CallTimeouts,
    ) -> Result<Self, TransportError> {
        let runtime = build_runtime()?;
        let client = CommandClient::with_timeouts(transport, namespace, instance_id, timeouts);
        Ok(Self { runtime, client })
    }

    /// Async client sharing this handle's transport.
    pub fn client(&self) -> &CommandClient {
        &self.client
    }

    pub fn start(&self, request: StartRequest, timeout: Option<Duration>) -> Result<StartResponse, CommandError> {
        self.runtime.block_on(self.client.start(request, timeout))
    }

    pub fn stop(&self, request: StopRequest, timeout: Option<Duration>) -> Result<StopResponse, CommandError> {
        self.runtime.block_on(self.client.stop(request, timeout))
    }

    pub fn import_strategy(
        &self,
        request: ImportRequest,
        timeout: Option<Duration>,
    ) -> Result<ImportResponse, CommandError> {
        self.runtime.block_on(self.client.import_strategy(request, timeout))
    }

    pub fn config(&self, request: ConfigRequest, timeout: Option<Duration>) -> Result<ConfigResponse, CommandError> {
        self.runtime.block_on(self.client.config(request, timeout))
    }

    pub fn status(&self, request: StatusRequest, timeout: Option<Duration>) -> Result<StatusResponse, CommandError> {
        self.runtime.block_on(self.client.status(request, timeout))
    }

    pub fn history(&self, request: HistoryRequest, timeout: Option<Duration>) -> Result<HistoryResponse, CommandError> {
        self.runtime.block_on(self.client.history(request, timeout))
    }

    pub fn balance_limit(
        &self,
        request: BalanceLimitRequest,
        timeout: Option<Duration>,
    ) -> Result<BalanceLimitResponse, CommandError> {
        self.runtime.block_on(self.client.balance_limit(request, timeout))
    }

    pub fn balance_paper(
        &self,
        request: BalancePaperRequest,
        timeout: Option<Duration>,
    ) -> Result<BalancePaperResponse, CommandError> {
        self.runtime.block_on(self.client.balance_paper(request, timeout))
    }

    pub fn shortcut(
        &self,
        request: CommandShortcutRequest,
        timeout: Option<Duration>,
    ) -> Result<CommandShortcutResponse, CommandError> {
        self.runtime.block_on(self.client.shortcut(request, timeout))
    }

    pub fn exchange_info(
        &self,
        request: ExchangeInfoRequest,
        timeout: Option<Duration>,
    ) -> Result<ExchangeInfoResponse, CommandError> {
        self.runtime.block_on(self.client.exchange_info(request, timeout))
    }

    pub fn user_directed_trade(
        &self,
        request: UserDirectedTradeRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedTradeResponse, CommandError> {
        self.runtime.block_on(self.client.user_directed_trade(request, timeout))
    }

    pub fn user_directed_cancel(
        &self,
        request: UserDirectedCancelRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedCancelResponse, CommandError> {
        self.runtime.block_on(self.client.user_directed_cancel(request, timeout))
    }

    pub fn user_directed_list_active_orders(
        &self,
        request: UserDirectedListActiveOrdersRequest,
        timeout: Option<Duration>,
    ) -> Result<UserDirectedListActiveOrdersResponse, CommandError> {
        self.runtime
            .block_on(self.client.user_directed_list_active_orders(request, timeout))
    }
}

fn build_runtime() -> Result<Runtime, TransportError> {
    Ok(Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("hbotrc-io")
        .enable_all()
        .build()?)
}
