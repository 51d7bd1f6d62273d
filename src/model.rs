use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Business status carried on every response.
/// Kept as the raw integer so a non-conforming bot never breaks decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i64);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(200);
    pub const ERROR: StatusCode = StatusCode(400);

    pub fn is_success(&self) -> bool {
        *self == StatusCode::SUCCESS
    }

    pub fn is_error(&self) -> bool {
        *self == StatusCode::ERROR
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::SUCCESS
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(key, value)` entry of a config change; encoded as a two element array.
pub type ConfigParam = (String, Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub name: String,
    #[serde(default)]
    pub trading_pairs: Vec<String>,
    /// Raw float amounts; token units may exceed the `Decimal` range.
    #[serde(default)]
    pub balances: BTreeMap<String, f64>,
}

/// Open order as reported by the bot's user-directed order tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrderInfo {
    pub exchange: String,
    pub trading_pair: String,
    pub order_id: String,
    pub is_buy: bool,
    pub is_limit_order: bool,
    #[serde(default)]
    pub limit_price: Option<String>,
    pub amount_total: String,
    pub amount_remaining: String,
    pub order_state: String,
    #[serde(default)]
    pub msg: Option<String>,
}
