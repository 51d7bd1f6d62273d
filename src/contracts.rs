// Request/response contracts for every remote command.
//
// Requests: optional fields fall back to their defaults when omitted, required
// fields have no serde default so a bot rejects a request that lacks them.
// Builders enforce the same required set on the controller side.
//
// Responses: every field is defaulted (`status` = 200, `msg` = ""), so a
// partial reply from a non-conforming bot still decodes.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{ConfigParam, ExchangeInfo, OpenOrderInfo, StatusCode};
use crate::subjects::Command;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{command}: missing required field '{field}'")]
    MissingField {
        command: Command,
        field: &'static str,
    },
}

fn required<T>(value: Option<T>, command: Command, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField { command, field })
}

// `Optional[...]` on the bot side may arrive as an explicit null.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

fn empty_string_value() -> Value {
    Value::String(String::new())
}

fn null_as_empty_string<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => empty_string_value(),
        value => value,
    })
}

/// Binds a request type to its command and response type.
pub trait CommandRequest: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Response: CommandResponse;
    const COMMAND: Command;
}

/// Shared status/msg convention of every response.
pub trait CommandResponse: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    fn status(&self) -> StatusCode;
    fn msg(&self) -> &str;
    /// Response carrying `ERROR` and `msg`, every payload field at its default.
    fn failure(msg: impl Into<String>) -> Self;

    fn is_success(&self) -> bool {
        self.status().is_success()
    }
}

macro_rules! command_contract {
    ($request:ty => $response:ty, $command:expr) => {
        impl CommandRequest for $request {
            type Response = $response;
            const COMMAND: Command = $command;
        }

        impl CommandResponse for $response {
            fn status(&self) -> StatusCode {
                self.status
            }

            fn msg(&self) -> &str {
                &self.msg
            }

            fn failure(msg: impl Into<String>) -> Self {
                Self {
                    status: StatusCode::ERROR,
                    msg: msg.into(),
                    ..Default::default()
                }
            }
        }
    };
}

// -----------------------------------------------------------------------------
// start
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub log_level: Option<String>,
    pub script: Option<String>,
    pub conf: Option<String>,
    pub is_quickstart: bool,
    pub async_backend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(StartRequest => StartResponse, Command::Start);

// -----------------------------------------------------------------------------
// stop
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopRequest {
    pub skip_order_cancellation: bool,
    pub async_backend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(StopRequest => StopResponse, Command::Stop);

// -----------------------------------------------------------------------------
// import
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub strategy: String,
}

impl ImportRequest {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
        }
    }

    pub fn builder() -> ImportRequestBuilder {
        ImportRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportRequestBuilder {
    strategy: Option<String>,
}

impl ImportRequestBuilder {
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn build(self) -> Result<ImportRequest, ValidationError> {
        Ok(ImportRequest {
            strategy: required(self.strategy, Command::Import, "strategy")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(ImportRequest => ImportResponse, Command::Import);

// -----------------------------------------------------------------------------
// config
// -----------------------------------------------------------------------------

/// Ordered `(key, value)` updates; an empty list asks for the current config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRequest {
    pub params: Vec<ConfigParam>,
}

impl ConfigRequest {
    pub fn new(params: Vec<ConfigParam>) -> Self {
        Self { params }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub changes: Vec<ConfigParam>,
    #[serde(deserialize_with = "null_as_default")]
    pub config: BTreeMap<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(ConfigRequest => ConfigResponse, Command::Config);

// -----------------------------------------------------------------------------
// status
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRequest {
    #[serde(default = "default_true")]
    pub async_backend: bool,
}

impl Default for StatusRequest {
    fn default() -> Self {
        Self {
            async_backend: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    /// Free-form status report; its shape is owned by the bot.
    #[serde(deserialize_with = "null_as_empty_string")]
    pub data: Value,
}

impl Default for StatusResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::SUCCESS,
            msg: String::new(),
            data: empty_string_value(),
        }
    }
}

command_contract!(StatusRequest => StatusResponse, Command::Status);

// -----------------------------------------------------------------------------
// history
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRequest {
    /// Look-back window in days, 0 means everything.
    pub days: f64,
    pub verbose: bool,
    pub precision: Option<u32>,
    pub async_backend: bool,
}

impl Default for HistoryRequest {
    fn default() -> Self {
        Self {
            days: 0.0,
            verbose: false,
            precision: None,
            async_backend: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trades: Vec<Value>,
}

command_contract!(HistoryRequest => HistoryResponse, Command::History);

// -----------------------------------------------------------------------------
// balance limit / paper
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLimitRequest {
    pub exchange: String,
    pub asset: String,
    pub amount: Decimal,
}

impl BalanceLimitRequest {
    pub fn new(exchange: impl Into<String>, asset: impl Into<String>, amount: Decimal) -> Self {
        Self {
            exchange: exchange.into(),
            asset: asset.into(),
            amount,
        }
    }

    pub fn builder() -> BalanceLimitRequestBuilder {
        BalanceLimitRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BalanceLimitRequestBuilder {
    exchange: Option<String>,
    asset: Option<String>,
    amount: Option<Decimal>,
}

impl BalanceLimitRequestBuilder {
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn build(self) -> Result<BalanceLimitRequest, ValidationError> {
        let command = Command::BalanceLimit;
        Ok(BalanceLimitRequest {
            exchange: required(self.exchange, command, "exchange")?,
            asset: required(self.asset, command, "asset")?,
            amount: required(self.amount, command, "amount")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceLimitResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: String,
}

command_contract!(BalanceLimitRequest => BalanceLimitResponse, Command::BalanceLimit);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePaperRequest {
    pub asset: String,
    pub amount: Decimal,
}

impl BalancePaperRequest {
    pub fn new(asset: impl Into<String>, amount: Decimal) -> Self {
        Self {
            asset: asset.into(),
            amount,
        }
    }

    pub fn builder() -> BalancePaperRequestBuilder {
        BalancePaperRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BalancePaperRequestBuilder {
    asset: Option<String>,
    amount: Option<Decimal>,
}

impl BalancePaperRequestBuilder {
    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn build(self) -> Result<BalancePaperRequest, ValidationError> {
        let command = Command::BalancePaper;
        Ok(BalancePaperRequest {
            asset: required(self.asset, command, "asset")?,
            amount: required(self.amount, command, "amount")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancePaperResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: String,
}

command_contract!(BalancePaperRequest => BalancePaperResponse, Command::BalancePaper);

// -----------------------------------------------------------------------------
// command shortcuts
// -----------------------------------------------------------------------------

/// Each inner list is one shortcut invocation: name followed by its arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandShortcutRequest {
    pub params: Vec<Vec<Value>>,
}

impl CommandShortcutRequest {
    pub fn new(params: Vec<Vec<Value>>) -> Self {
        Self { params }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandShortcutResponse {
    /// One flag per invocation, same order as the request.
    #[serde(deserialize_with = "null_as_default")]
    pub success: Vec<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(CommandShortcutRequest => CommandShortcutResponse, Command::CommandShortcut);

// -----------------------------------------------------------------------------
// exchange info
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeInfoRequest {
    /// `None` lists every connected exchange.
    pub exchange: Option<String>,
}

impl ExchangeInfoRequest {
    pub fn for_exchange(exchange: impl Into<String>) -> Self {
        Self {
            exchange: Some(exchange.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeInfoResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub exchanges: Vec<ExchangeInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(ExchangeInfoRequest => ExchangeInfoResponse, Command::ExchangeInfo);

// -----------------------------------------------------------------------------
// user directed orders
// -----------------------------------------------------------------------------

/// `limit_price` is only meaningful for limit orders; the bot decides what to
/// do when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectedTradeRequest {
    pub exchange: String,
    pub trading_pair: String,
    pub is_buy: bool,
    pub is_limit_order: bool,
    #[serde(default)]
    pub limit_price: Option<String>,
    pub amount: String,
}

impl UserDirectedTradeRequest {
    pub fn builder() -> UserDirectedTradeRequestBuilder {
        UserDirectedTradeRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectedTradeRequestBuilder {
    exchange: Option<String>,
    trading_pair: Option<String>,
    is_buy: Option<bool>,
    is_limit_order: Option<bool>,
    limit_price: Option<String>,
    amount: Option<String>,
}

impl UserDirectedTradeRequestBuilder {
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn trading_pair(mut self, trading_pair: impl Into<String>) -> Self {
        self.trading_pair = Some(trading_pair.into());
        self
    }

    pub fn is_buy(mut self, is_buy: bool) -> Self {
        self.is_buy = Some(is_buy);
        self
    }

    pub fn is_limit_order(mut self, is_limit_order: bool) -> Self {
        self.is_limit_order = Some(is_limit_order);
        self
    }

    pub fn limit_price(mut self, limit_price: Option<String>) -> Self {
        self.limit_price = limit_price;
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn build(self) -> Result<UserDirectedTradeRequest, ValidationError> {
        let command = Command::UserDirectedTrade;
        Ok(UserDirectedTradeRequest {
            exchange: required(self.exchange, command, "exchange")?,
            trading_pair: required(self.trading_pair, command, "trading_pair")?,
            is_buy: required(self.is_buy, command, "is_buy")?,
            is_limit_order: required(self.is_limit_order, command, "is_limit_order")?,
            limit_price: self.limit_price,
            amount: required(self.amount, command, "amount")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDirectedTradeResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(UserDirectedTradeRequest => UserDirectedTradeResponse, Command::UserDirectedTrade);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectedCancelRequest {
    pub order_id: String,
}

impl UserDirectedCancelRequest {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }

    pub fn builder() -> UserDirectedCancelRequestBuilder {
        UserDirectedCancelRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectedCancelRequestBuilder {
    order_id: Option<String>,
}

impl UserDirectedCancelRequestBuilder {
    pub fn order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn build(self) -> Result<UserDirectedCancelRequest, ValidationError> {
        Ok(UserDirectedCancelRequest {
            order_id: required(self.order_id, Command::UserDirectedCancel, "order_id")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDirectedCancelResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub exchange: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trading_pair: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(UserDirectedCancelRequest => UserDirectedCancelResponse, Command::UserDirectedCancel);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDirectedListActiveOrdersRequest {
    pub exchange: Option<String>,
    pub trading_pair: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDirectedListActiveOrdersResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status: StatusCode,
    #[serde(deserialize_with = "null_as_default")]
    pub active_orders: Vec<OpenOrderInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
}

command_contract!(
    UserDirectedListActiveOrdersRequest => UserDirectedListActiveOrdersResponse,
    Command::UserDirectedListActiveOrders
);
