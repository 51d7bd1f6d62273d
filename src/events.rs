// Broadcast payloads a bot publishes next to its command endpoints.
// These are fire-and-forget; nothing here expects a reply.

use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::subjects::{self, CH_EVENTS, CH_EXTERNAL_EVENT_PREFIX, CH_HEARTBEAT, CH_LOG, CH_NOTIFY};
use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Log,
    Events,
    Notify,
    Heartbeat,
    /// Named external event. Subscribing to `"*"` receives every external
    /// event of the bot; the name must not contain `/` or `.`.
    ExternalEvent(String),
}

impl Channel {
    pub fn suffix(&self) -> String {
        match self {
            Channel::Log => CH_LOG.to_string(),
            Channel::Events => CH_EVENTS.to_string(),
            Channel::Notify => CH_NOTIFY.to_string(),
            Channel::Heartbeat => CH_HEARTBEAT.to_string(),
            Channel::ExternalEvent(name) => format!("{}/{}", CH_EXTERNAL_EVENT_PREFIX, name),
        }
    }

    pub fn address(&self, namespace: &str, instance_id: &str) -> String {
        format!("{}{}", subjects::topic_prefix(namespace, instance_id), self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyMessage {
    pub seq: i64,
    pub timestamp: i64,
    pub msg: String,
}

impl Default for NotifyMessage {
    fn default() -> Self {
        Self {
            seq: 0,
            timestamp: -1,
            msg: String::new(),
        }
    }
}

/// Market/bot event on the `/events` channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMessage {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Map<String, Value>,
}

impl Default for EventMessage {
    fn default() -> Self {
        Self {
            timestamp: -1,
            event_type: "Unknown".to_string(),
            data: Map::new(),
        }
    }
}

/// Forwarded log record of the bot process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMessage {
    pub timestamp: f64,
    pub msg: String,
    pub level_no: i64,
    pub level_name: String,
    pub logger_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatMessage {
    pub ts: i64,
}

/// Event injected into the bot from outside, published under `/external/event/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub name: String,
    #[serde(default = "unset_timestamp")]
    pub timestamp: i64,
    #[serde(default)]
    pub sequence: i64,
    #[serde(rename = "type", default = "external_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn unset_timestamp() -> i64 {
    -1
}

fn external_event_type() -> String {
    "eevent".to_string()
}

impl ExternalEvent {
    /// New event stamped with the current time (ms).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: Utc::now().timestamp_millis(),
            sequence: 0,
            event_type: external_event_type(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Replace an unset (non-positive) timestamp with the current time.
    pub fn stamped(mut self) -> Self {
        if self.timestamp <= 0 {
            self.timestamp = Utc::now().timestamp_millis();
        }
        self
    }

    pub fn channel(&self) -> Channel {
        Channel::ExternalEvent(self.name.clone())
    }
}

/// Order lifecycle update for user-directed orders, published on `/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectedOrderUpdateMessage {
    #[serde(default = "unset_timestamp")]
    pub timestamp: i64,
    pub exchange: String,
    pub trading_pair: String,
    pub is_buy: bool,
    pub is_limit_order: bool,
    #[serde(default)]
    pub limit_price: Option<String>,
    pub amount_total: String,
    pub amount_remaining: String,
    pub order_state: String,
    #[serde(default)]
    pub msg: String,
}

/// Subscribe to a broadcast channel of one bot and decode each message as `M`.
/// Undecodable messages are logged and skipped.
pub async fn subscribe<M>(
    client: &async_nats::Client,
    namespace: &str,
    instance_id: &str,
    channel: &Channel,
) -> Result<impl Stream<Item = M> + Send + use<M>, TransportError>
where
    M: DeserializeOwned + Send + 'static,
{
    let subject = subjects::nats_subject(&channel.address(namespace, instance_id));
    let sub = client.subscribe(subject.clone()).await.map_err(|e| {
        error!("❌ Failed to subscribe to {}: {}", subject, e);
        TransportError::Subscribe(e.to_string())
    })?;

    Ok(sub.filter_map(move |msg| {
        let decoded = match serde_json::from_slice::<M>(&msg.payload) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Dropping undecodable message on {}: {}", msg.subject, e);
                None
            }
        };
        futures::future::ready(decoded)
    }))
}

/// Publish a broadcast message on one bot's channel.
pub async fn publish<M: Serialize>(
    client: &async_nats::Client,
    namespace: &str,
    instance_id: &str,
    channel: &Channel,
    message: &M,
) -> Result<(), TransportError> {
    let payload = serde_json::to_vec(message)?;
    client
        .publish(subjects::nats_subject(&channel.address(namespace, instance_id)), payload.into())
        .await
        .map_err(|e| TransportError::Request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::Command;
    use serde_json::json;

    #[test]
    fn test_channel_addresses() {
        assert_eq!(Channel::Log.address("hbot", "bot1"), "hbot/bot1/log");
        assert_eq!(Channel::Heartbeat.address("hbot", "bot1"), "hbot/bot1/hb");
        assert_eq!(
            Channel::ExternalEvent("signal".into()).address("hbot", "bot1"),
            "hbot/bot1/external/event/signal"
        );
        assert_eq!(
            Channel::ExternalEvent("*".into()).suffix(),
            subjects::CH_EXTERNAL_EVENT_WILDCARD
        );
    }

    #[test]
    fn test_external_wildcard_is_a_nats_token() {
        let all = subjects::nats_subject(&Channel::ExternalEvent("*".into()).address("hbot", "bot1"));
        assert_eq!(all, "hbot.bot1.external.event.*");

        let one = subjects::nats_subject(&ExternalEvent::new("signal").channel().address("hbot", "bot1"));
        assert_eq!(one, "hbot.bot1.external.event.signal");
        assert_eq!(all.trim_end_matches('*'), one.trim_end_matches("signal"));
    }

    #[test]
    fn test_channels_never_resolve_to_commands() {
        let prefix = subjects::topic_prefix("hbot", "bot1");
        for channel in [Channel::Log, Channel::Events, Channel::Notify, Channel::Heartbeat] {
            let address = channel.address("hbot", "bot1");
            assert_eq!(Command::from_address(&prefix, &address), None);
        }
    }

    #[test]
    fn test_message_defaults() {
        let notify: NotifyMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(notify, NotifyMessage { seq: 0, timestamp: -1, msg: String::new() });

        let event: EventMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(event.event_type, "Unknown");
        assert!(event.data.is_empty());

        let log: LogMessage = serde_json::from_str(r#"{"msg": "started", "level_no": 20}"#).unwrap();
        assert_eq!(log.level_no, 20);
        assert_eq!(log.level_name, "");
    }

    #[test]
    fn test_external_event_requires_name() {
        assert!(serde_json::from_str::<ExternalEvent>("{}").is_err());

        let event: ExternalEvent = serde_json::from_str(r#"{"name": "signal"}"#).unwrap();
        assert_eq!(event.timestamp, -1);
        assert_eq!(event.event_type, "eevent");
        assert!(event.stamped().timestamp > 0);
    }

    #[test]
    fn test_external_event_encoding() {
        let mut data = Map::new();
        data.insert("side".into(), json!("buy"));
        let event = ExternalEvent::new("signal").with_data(data);
        assert!(event.timestamp > 0);

        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["type"], json!("eevent"));
        assert_eq!(encoded["data"]["side"], json!("buy"));
        assert_eq!(event.channel(), Channel::ExternalEvent("signal".into()));
    }

    #[test]
    fn test_order_update_decoding() {
        let raw = json!({
            "exchange": "binance",
            "trading_pair": "BTC-USDT",
            "is_buy": true,
            "is_limit_order": true,
            "limit_price": "60000",
            "amount_total": "0.01",
            "amount_remaining": "0.0",
            "order_state": "FILLED"
        });
        let update: UserDirectedOrderUpdateMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(update.timestamp, -1);
        assert_eq!(update.limit_price.as_deref(), Some("60000"));
        assert_eq!(update.msg, "");
    }
}
