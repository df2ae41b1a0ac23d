use order_core::ValidationError;
use shared::domain::OrderId;
use thiserror::Error;

/// Failure of a view operation, classified by who has to act on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A local precondition failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The backend's state already diverged. The next push update is
    /// authoritative; the local attempt is dropped.
    #[error("backend rejected the request ({status}): {message}")]
    Conflict { status: u16, message: String },
    /// Network failure or an unexpected response. The cache is untouched.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("order {0} is not in this view")]
    NotInView(OrderId),
    #[error("view is closed")]
    ViewClosed,
}

impl ClientError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(format!("websocket: {err}"))
    }
}
