//! Per-view runtime around `order_core`: the backend client, the shared
//! push connection, views with their own caches, and the read surfaces.

pub mod adapters;
pub mod backend;
pub mod connection;
pub mod error;
pub mod ticker;
pub mod view;

pub use backend::{HttpOrderBackend, OrderBackend};
pub use connection::{ConnectionManager, Subscription, SubscriptionId};
pub use error::ClientError;
pub use view::{OrderView, ViewCloser, ViewKind};

#[cfg(test)]
pub(crate) mod test_support;
