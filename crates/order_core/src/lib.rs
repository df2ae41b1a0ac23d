//! Order lifecycle core: status transitions, payment settlement, per-kitchen
//! fulfillment and the reconciliation of push updates into a view's cache.
//!
//! Every operation here is synchronous and takes the order by reference,
//! returning a new snapshot. A rejected operation therefore never leaves a
//! cache partially applied.

pub mod error;
pub mod fulfillment;
pub mod ledger;
pub mod reconcile;
pub mod state_machine;
pub mod timer;

pub use error::ValidationError;
pub use reconcile::{merge, MergeOutcome, OrderCache, PushMessage};

#[cfg(test)]
pub(crate) mod test_support;
