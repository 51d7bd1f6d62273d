use async_trait::async_trait;
use std::future::Future;
use tracing::warn;

use crate::contracts::*;
use crate::subjects::Command;

/// Bot-side implementation of the command set.
///
/// Every method defaults to an `ERROR` response, so a bot only overrides the
/// commands it supports.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn start(&self, _request: StartRequest) -> StartResponse {
        not_supported(Command::Start)
    }

    async fn stop(&self, _request: StopRequest) -> StopResponse {
        not_supported(Command::Stop)
    }

    async fn import_strategy(&self, _request: ImportRequest) -> ImportResponse {
        not_supported(Command::Import)
    }

    async fn config(&self, _request: ConfigRequest) -> ConfigResponse {
        not_supported(Command::Config)
    }

    async fn status(&self, _request: StatusRequest) -> StatusResponse {
        not_supported(Command::Status)
    }

    async fn history(&self, _request: HistoryRequest) -> HistoryResponse {
        not_supported(Command::History)
    }

    async fn balance_limit(&self, _request: BalanceLimitRequest) -> BalanceLimitResponse {
        not_supported(Command::BalanceLimit)
    }

    async fn balance_paper(&self, _request: BalancePaperRequest) -> BalancePaperResponse {
        not_supported(Command::BalancePaper)
    }

    async fn shortcut(&self, _request: CommandShortcutRequest) -> CommandShortcutResponse {
        not_supported(Command::CommandShortcut)
    }

    async fn exchange_info(&self, _request: ExchangeInfoRequest) -> ExchangeInfoResponse {
        not_supported(Command::ExchangeInfo)
    }

    async fn user_directed_trade(&self, _request: UserDirectedTradeRequest) -> UserDirectedTradeResponse {
        not_supported(Command::UserDirectedTrade)
    }

    async fn user_directed_cancel(&self, _request: UserDirectedCancelRequest) -> UserDirectedCancelResponse {
        not_supported(Command::UserDirectedCancel)
    }

    async fn user_directed_list_active_orders(
        &self,
        _request: UserDirectedListActiveOrdersRequest,
    ) -> UserDirectedListActiveOrdersResponse {
        not_supported(Command::UserDirectedListActiveOrders)
    }
}

fn not_supported<T: CommandResponse>(command: Command) -> T {
    T::failure(format!("command '{}' is not supported by this bot", command))
}

async fn handle<R, F, Fut>(payload: &[u8], run: F) -> Result<Vec<u8>, serde_json::Error>
where
    R: CommandRequest,
    F: FnOnce(R) -> Fut,
    Fut: Future<Output = R::Response>,
{
    let response = match serde_json::from_slice::<R>(payload) {
        Ok(request) => run(request).await,
        Err(e) => {
            warn!(command = %R::COMMAND, "Rejecting malformed request: {}", e);
            R::Response::failure(format!("invalid request: {}", e))
        }
    };
    serde_json::to_vec(&response)
}

/// Decode a raw request for `command`, run the handler and encode its reply.
/// A request that does not decode is answered with an `ERROR` response.
pub async fn dispatch(
    handler: &dyn CommandHandler,
    command: Command,
    payload: &[u8],
) -> Result<Vec<u8>, serde_json::Error> {
    match command {
        Command::Start => handle(payload, |r: StartRequest| handler.start(r)).await,
        Command::Stop => handle(payload, |r: StopRequest| handler.stop(r)).await,
        Command::Import => handle(payload, |r: ImportRequest| handler.import_strategy(r)).await,
        Command::Config => handle(payload, |r: ConfigRequest| handler.config(r)).await,
        Command::Status => handle(payload, |r: StatusRequest| handler.status(r)).await,
        Command::History => handle(payload, |r: HistoryRequest| handler.history(r)).await,
        Command::BalanceLimit => handle(payload, |r: BalanceLimitRequest| handler.balance_limit(r)).await,
        Command::BalancePaper => handle(payload, |r: BalancePaperRequest| handler.balance_paper(r)).await,
        Command::CommandShortcut => handle(payload, |r: CommandShortcutRequest| handler.shortcut(r)).await,
        Command::ExchangeInfo => handle(payload, |r: ExchangeInfoRequest| handler.exchange_info(r)).await,
        Command::UserDirectedTrade => {
            handle(payload, |r: UserDirectedTradeRequest| handler.user_directed_trade(r)).await
        }
        Command::UserDirectedCancel => {
            handle(payload, |r: UserDirectedCancelRequest| handler.user_directed_cancel(r)).await
        }
        Command::UserDirectedListActiveOrders => {
            handle(payload, |r: UserDirectedListActiveOrdersRequest| {
                handler.user_directed_list_active_orders(r)
            })
            .await
        }
    }
}
