use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::handler::{dispatch, CommandHandler};
use crate::subjects::{self, Command};
use crate::transport::TransportError;

/// Bind every command address of one bot instance and answer requests.
/// Returns a handle to the listener task; each request is handled on its own task.
pub async fn serve(
    client: async_nats::Client,
    namespace: &str,
    instance_id: &str,
    handler: Arc<dyn CommandHandler>,
) -> Result<tokio::task::JoinHandle<()>, TransportError> {
    let prefix = subjects::topic_prefix(namespace, instance_id);

    let mut subscriptions = Vec::with_capacity(Command::ALL.len());
    let mut routes = HashMap::with_capacity(Command::ALL.len());
    for command in Command::ALL {
        let subject = subjects::nats_subject(&subjects::topic_address(namespace, instance_id, command));
        let sub = client.subscribe(subject.clone()).await.map_err(|e| {
            error!("❌ Failed to subscribe to {}: {}", subject, e);
            TransportError::Subscribe(e.to_string())
        })?;
        subscriptions.push(sub);
        routes.insert(subject, command);
    }
    info!("🚀 Bot command listener bound on '{}' ({} commands)", prefix, subscriptions.len());

    let mut requests = futures::stream::select_all(subscriptions);

    let handle = tokio::spawn(async move {
        while let Some(msg) = requests.next().await {
            let Some(&command) = routes.get(msg.subject.as_str()) else {
                warn!("Ignoring message on unexpected subject {}", msg.subject);
                continue;
            };
            let Some(reply) = msg.reply.clone() else {
                warn!(command = %command, "Request without reply subject, dropping");
                continue;
            };

            let client = client.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                match dispatch(handler.as_ref(), command, &msg.payload).await {
                    Ok(body) => {
                        if let Err(e) = client.publish(reply, body.into()).await {
                            error!(command = %command, "Failed to publish reply: {}", e);
                        }
                    }
                    Err(e) => error!(command = %command, "Failed to encode reply: {}", e),
                }
            });
        }
        info!("Bot command listener stopped");
    });

    Ok(handle)
}
