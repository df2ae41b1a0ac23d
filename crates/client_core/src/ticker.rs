//! Once-per-second elapsed-time ticks for visible orders.
//!
//! The ticker reads a copy of its targets through a `watch` channel and
//! never touches an order.

use std::time::Duration;

use chrono::{DateTime, Utc};
use order_core::timer::{self, ElapsedLabel, UrgencyThresholds};
use shared::domain::{Order, OrderId};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct TimerTarget {
    pub order_id: OrderId,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerTick {
    pub order_id: OrderId,
    pub label: ElapsedLabel,
}

pub fn timer_targets<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<TimerTarget> {
    orders
        .into_iter()
        .map(|order| TimerTarget {
            order_id: order.id,
            since: timer::status_since(order),
        })
        .collect()
}

/// Emits one [`TimerTick`] per target every second until `shutdown` fires
/// or the sink is dropped.
pub fn spawn_ticker(
    targets: watch::Receiver<Vec<TimerTarget>>,
    sink: mpsc::Sender<TimerTick>,
    thresholds: UrgencyThresholds,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval(TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticks.tick() => {}
            }
            let now = Utc::now();
            let current = targets.borrow().clone();
            for target in current {
                let tick = TimerTick {
                    order_id: target.order_id,
                    label: timer::elapsed_label(target.since, now, &thresholds),
                };
                if sink.send(tick).await.is_err() {
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/ticker_tests.rs"]
mod tests;
