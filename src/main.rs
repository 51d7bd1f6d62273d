use std::env;
use std::sync::Arc;
use futures::StreamExt;
use serde_json::Value;
use tracing::{info, error, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use hbotrc_rs::config::Settings;
use hbotrc_rs::contracts::*;
use hbotrc_rs::events::{self, Channel};
use hbotrc_rs::subjects::Command;
use hbotrc_rs::transport::NatsTransport;
use hbotrc_rs::CommandClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const USAGE: &str = "usage: hbotrc <command> [request-json]\n       hbotrc listen <log|events|notify|hb|external:NAME|external:*>";

async fn run<R: CommandRequest>(client: &CommandClient, body: &str) -> Result<String, BoxError> {
    let request: R = serde_json::from_str(body)?;
    let response = client.invoke(request, None).await?;
    if !response.is_success() {
        error!(command = %R::COMMAND, status = %response.status(), "Bot reported failure: {}", response.msg());
    }
    Ok(serde_json::to_string_pretty(&response)?)
}

fn parse_channel(name: &str) -> Option<Channel> {
    match name {
        "log" => Some(Channel::Log),
        "events" => Some(Channel::Events),
        "notify" => Some(Channel::Notify),
        "hb" => Some(Channel::Heartbeat),
        other => other
            .strip_prefix("external:")
            .map(|n| Channel::ExternalEvent(n.to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let Some(command_arg) = args.get(1) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let settings = Settings::new()?;
    let instance_id = settings.instance_id()?.to_string();
    let namespace = settings.bot.namespace.clone();

    let transport = NatsTransport::connect(&settings.connection_params()).await?;

    if command_arg == "listen" {
        let Some(channel) = args.get(2).and_then(|c| parse_channel(c)) else {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        };
        info!("👂 Listening on {}", channel.address(&namespace, &instance_id));
        let stream = events::subscribe::<Value>(transport.client(), &namespace, &instance_id, &channel).await?;
        let mut stream = Box::pin(stream);
        while let Some(message) = stream.next().await {
            println!("{}", message);
        }
        return Ok(());
    }

    let command: Command = command_arg.parse()?;
    let body = args.get(2).map(String::as_str).unwrap_or("{}");

    let client = CommandClient::with_timeouts(
        Arc::new(transport),
        namespace,
        instance_id,
        settings.call_timeouts(),
    );
    info!("🚀 Sending '{}' to {}", command, client.address(command));

    let output = match command {
        Command::Start => run::<StartRequest>(&client, body).await?,
        Command::Stop => run::<StopRequest>(&client, body).await?,
        Command::Import => run::<ImportRequest>(&client, body).await?,
        Command::Config => run::<ConfigRequest>(&client, body).await?,
        Command::Status => run::<StatusRequest>(&client, body).await?,
        Command::History => run::<HistoryRequest>(&client, body).await?,
        Command::BalanceLimit => run::<BalanceLimitRequest>(&client, body).await?,
        Command::BalancePaper => run::<BalancePaperRequest>(&client, body).await?,
        Command::CommandShortcut => run::<CommandShortcutRequest>(&client, body).await?,
        Command::ExchangeInfo => run::<ExchangeInfoRequest>(&client, body).await?,
        Command::UserDirectedTrade => run::<UserDirectedTradeRequest>(&client, body).await?,
        Command::UserDirectedCancel => run::<UserDirectedCancelRequest>(&client, body).await?,
        Command::UserDirectedListActiveOrders => {
            run::<UserDirectedListActiveOrdersRequest>(&client, body).await?
        }
    };
    println!("{}", output);

    Ok(())
}
