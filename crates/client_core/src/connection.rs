//! The push connection shared by every view of one dashboard.
//!
//! One websocket reader turns server events into [`PushMessage`]s and fans
//! them out to per-view queues. Views subscribe when they open and
//! unsubscribe when they close; nothing here is a process-wide singleton.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::StreamExt;
use order_core::PushMessage;
use shared::protocol::ServerEvent;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A view's end of the fan-out.
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: mpsc::UnboundedReceiver<PushMessage>,
}

pub struct ConnectionManager {
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<PushMessage>>>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// A manager with no socket. Messages reach subscribers only through
    /// [`ConnectionManager::dispatch`].
    pub fn detached() -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
        })
    }

    /// Opens the push stream at `{server_url}/ws` and starts the reader.
    pub async fn connect(server_url: &str) -> Result<Arc<Self>, ClientError> {
        let manager = Self::detached();
        manager.attach(server_url).await?;
        Ok(manager)
    }

    /// Starts a reader on an existing manager, so views subscribed before the
    /// socket opened see every event.
    pub async fn attach(self: &Arc<Self>, server_url: &str) -> Result<(), ClientError> {
        let ws_url = ws_url(server_url)?;
        let (ws_stream, _) = connect_async(ws_url.as_str()).await?;
        let (_, mut ws_reader) = ws_stream.split();
        info!(url = %ws_url, "connection: push stream open");

        let reader = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    _ = reader.shutdown.cancelled() => break,
                    msg = ws_reader.next() => msg,
                };
                match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerEvent>(&text)
                    {
                        Ok(ServerEvent::Error(err)) => {
                            warn!(code = ?err.code, message = %err.message, "connection: server error event");
                        }
                        Ok(event) => {
                            if let Some(message) = PushMessage::from_event(event) {
                                reader.dispatch(message).await;
                            }
                        }
                        Err(err) => warn!(%err, "connection: invalid server event"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(%err, "connection: websocket receive failed");
                        break;
                    }
                }
            }
            reader.shutdown.cancel();
            reader.subscribers.lock().await.clear();
            info!("connection: push stream closed");
        });

        Ok(())
    }

    pub async fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().await.insert(id, tx);
        debug!(subscription = id.0, "connection: subscribed");
        Subscription { id, receiver }
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            debug!(subscription = id.0, "connection: unsubscribed");
        }
    }

    /// Enqueues `message` for every live subscriber and prunes closed ones.
    /// Never waits on a view. Returns the number of queues reached.
    pub async fn dispatch(&self, message: PushMessage) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|_, tx| tx.send(message.clone()).is_ok());
        subscribers.len()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Stops the reader. Subscribers see their queue end.
    pub fn disconnect(&self) {
        self.shutdown.cancel();
    }

    pub fn is_disconnected(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// `http(s)://host[/base]` to `ws(s)://host[/base]/ws`.
pub fn ws_url(server_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(server_url)
        .map_err(|err| ClientError::Transport(format!("invalid server url {server_url}: {err}")))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(ClientError::Transport(format!(
                "server url must be http:// or https://, got {other}://"
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::Transport(format!("cannot use scheme {scheme}")))?;
    let path = format!("{}/ws", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
