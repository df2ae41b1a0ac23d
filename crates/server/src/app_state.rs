use crate::api::ApiContext;
use shared::protocol::ServerEvent;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) events: broadcast::Sender<ServerEvent>,
}

impl AppState {
    /// Pushes `event` to every connected view. No listeners is not an error.
    pub(crate) fn publish(&self, event: ServerEvent) {
        let name = event.name();
        let receivers = self.events.send(event).unwrap_or(0);
        debug!(event = name, receivers, "event published");
    }
}
