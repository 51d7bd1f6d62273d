// Requires a running NATS server (NATS_URL, default nats://localhost:4222).
// Run with: cargo test --test integration_nats -- --ignored

use async_trait::async_trait;
use futures::StreamExt;
use hbotrc_rs::contracts::*;
use hbotrc_rs::events::{self, Channel, ExternalEvent, NotifyMessage};
use hbotrc_rs::handler::CommandHandler;
use hbotrc_rs::server;
use hbotrc_rs::transport::NatsTransport;
use hbotrc_rs::{CommandClient, CommandError, StatusCode};
use std::sync::Arc;
use std::time::Duration;

struct LiveBot;

#[async_trait]
impl CommandHandler for LiveBot {
    async fn user_directed_trade(&self, request: UserDirectedTradeRequest) -> UserDirectedTradeResponse {
        UserDirectedTradeResponse {
            status: StatusCode::SUCCESS,
            order_id: format!("{}-{}", request.exchange, request.trading_pair),
            msg: String::new(),
        }
    }
}

async fn connect() -> async_nats::Client {
    let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
    async_nats::connect(&nats_url).await.expect("Failed to connect to NATS")
}

fn unique_bot_id() -> String {
    format!("it-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore]
async fn test_round_trip_over_nats() {
    let client = connect().await;
    let bot_id = unique_bot_id();

    let _listener = server::serve(client.clone(), "hbot", &bot_id, Arc::new(LiveBot))
        .await
        .expect("Failed to bind listener");

    let commands = CommandClient::new(Arc::new(NatsTransport::from_client(client)), "hbot", bot_id);

    let request = UserDirectedTradeRequest::builder()
        .exchange("binance")
        .trading_pair("BTC-USDT")
        .is_buy(true)
        .is_limit_order(false)
        .amount("0.01")
        .build()
        .unwrap();
    let resp = commands.user_directed_trade(request, None).await.unwrap();
    assert_eq!(resp.order_id, "binance-BTC-USDT");

    let resp = commands.start(StartRequest::default(), None).await.unwrap();
    assert_eq!(resp.status, StatusCode::ERROR);
}

#[tokio::test]
#[ignore]
async fn test_no_listener_is_not_a_business_response() {
    let client = connect().await;
    let commands = CommandClient::new(Arc::new(NatsTransport::from_client(client)), "hbot", unique_bot_id());

    let err = commands
        .status(StatusRequest::default(), Some(Duration::from_millis(500)))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Transport(_) | CommandError::Timeout { .. }));
}

#[tokio::test]
#[ignore]
async fn test_notify_channel() {
    let client = connect().await;
    let bot_id = unique_bot_id();

    let stream = events::subscribe::<NotifyMessage>(&client, "hbot", &bot_id, &Channel::Notify)
        .await
        .unwrap();
    let mut stream = Box::pin(stream);

    let message = NotifyMessage {
        seq: 1,
        timestamp: 1_700_000_000,
        msg: "filled".into(),
    };
    events::publish(&client, "hbot", &bot_id, &Channel::Notify, &message)
        .await
        .unwrap();

    let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Timed out waiting for notify");
    assert_eq!(received, Some(message));
}

#[tokio::test]
#[ignore]
async fn test_external_event_wildcard_receives_every_name() {
    let client = connect().await;
    let bot_id = unique_bot_id();

    let stream = events::subscribe::<ExternalEvent>(&client, "hbot", &bot_id, &Channel::ExternalEvent("*".into()))
        .await
        .unwrap();
    let mut stream = Box::pin(stream);

    for name in ["signal", "rebalance"] {
        let event = ExternalEvent::new(name);
        events::publish(&client, "hbot", &bot_id, &event.channel(), &event)
            .await
            .unwrap();
    }

    let mut names = Vec::new();
    for _ in 0..2 {
        let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Timed out waiting for external event")
            .expect("Subscription closed");
        names.push(received.name);
    }
    assert_eq!(names, ["signal", "rebalance"]);
}
