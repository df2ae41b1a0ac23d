use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    adapters::{KitchenBoard, OrderBoard, SearchPanel},
    ticker::{spawn_ticker, timer_targets},
    ConnectionManager, HttpOrderBackend, OrderView, ViewKind,
};
use order_core::{
    ledger::{self, TipMode},
    timer::UrgencyThresholds,
};
use shared::{
    domain::{
        CustomerId, CustomerRef, DeliveryMethod, ItemId, KitchenId, OrderId, OrderStatus,
        PaymentMethod, ProductId, StoreId,
    },
    protocol::{PaymentRequest, PlaceOrderLine, PlaceOrderRequest},
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, default_value_t = 1)]
    store_id: i64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live order board grouped by status.
    Board,
    /// Live ticket board for one kitchen.
    Kitchen {
        #[arg(long)]
        kitchen_id: i64,
    },
    Search {
        query: String,
    },
    Advance {
        order_id: i64,
        status: OrderStatus,
    },
    Cancel {
        order_id: i64,
        reason: String,
    },
    Pay {
        order_id: i64,
        amount: f64,
        #[arg(long, value_parser = parse_method, default_value = "cash")]
        method: PaymentMethod,
        #[arg(long, default_value_t = 0.0)]
        tip: f64,
        /// Tip as a percentage of the remaining balance; overrides `--tip`.
        #[arg(long, conflicts_with = "tip")]
        tip_percent: Option<f64>,
        #[arg(long)]
        cash_received: Option<f64>,
    },
    Finalize {
        order_id: i64,
    },
    PrepareItem {
        order_id: i64,
        item_id: i64,
    },
    PrepareAll {
        kitchen_id: i64,
    },
    /// Places a two-line pickup order, for trying the boards out.
    PlaceDemo,
}

fn parse_method(value: &str) -> Result<PaymentMethod, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "cash" => Ok(PaymentMethod::Cash),
        "card" => Ok(PaymentMethod::Card),
        "transfer" => Ok(PaymentMethod::Transfer),
        other => Err(format!("unknown payment method: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let cli = Cli::parse();
    let backend = Arc::new(HttpOrderBackend::new(cli.server_url.clone()));
    let store_id = StoreId(cli.store_id);

    if let Command::PlaceDemo = cli.command {
        let order = backend.place_order(&demo_order(store_id)).await?;
        println!("placed order #{} id={}", order.order_number, order.id);
        return Ok(());
    }

    let connection = ConnectionManager::connect(&cli.server_url).await?;
    let kind = match &cli.command {
        Command::Kitchen { kitchen_id } => ViewKind::Kitchen(KitchenId(*kitchen_id)),
        Command::Search { .. } => ViewKind::Search,
        _ => ViewKind::OrderBoard,
    };
    let mut view = OrderView::open(kind, backend, Arc::clone(&connection)).await;
    let loaded = view.load().await?;
    info!(loaded, "dashboard: active orders loaded");

    let result = run(&mut view, &connection, cli.command, store_id).await;
    view.close().await;
    connection.disconnect();
    result
}

async fn run(
    view: &mut OrderView,
    connection: &ConnectionManager,
    command: Command,
    store_id: StoreId,
) -> Result<()> {
    match command {
        Command::Board => {
            let board = OrderBoard::default();
            follow(view, connection, board.thresholds, |view| {
                render::board(&board.columns(view.cache(), view.pinned(), Utc::now()))
            })
            .await
        }
        Command::Kitchen { kitchen_id } => {
            let kitchen_id = KitchenId(kitchen_id);
            let name = view
                .kitchens(store_id)
                .await?
                .into_iter()
                .find(|kitchen| kitchen.id == kitchen_id)
                .map(|kitchen| kitchen.name);
            let Some(name) = name else {
                bail!("kitchen {kitchen_id} does not belong to store {store_id}");
            };
            let board = KitchenBoard::new(kitchen_id);
            follow(view, connection, board.thresholds, |view| {
                render::tickets(&name, &board.tickets(view.cache(), Utc::now()))
            })
            .await
        }
        Command::Search { query } => {
            print!("{}", render::hits(&query, &SearchPanel.search(view.cache(), &query)));
            Ok(())
        }
        Command::Advance { order_id, status } => {
            let order = view.transition(OrderId(order_id), status).await?;
            println!("order #{} is {}", order.order_number, order.status);
            Ok(())
        }
        Command::Cancel { order_id, reason } => {
            let order = view.cancel(OrderId(order_id), &reason).await?;
            println!("order #{} cancelled", order.order_number);
            Ok(())
        }
        Command::Pay {
            order_id,
            amount,
            method,
            tip,
            tip_percent,
            cash_received,
        } => {
            let order_id = OrderId(order_id);
            let remaining = view.cache().get(order_id).map_or(0.0, ledger::remaining);
            let request = PaymentRequest {
                amount,
                tip: tip_for(remaining, tip, tip_percent),
                method,
                cash_received,
            };
            let order = view.register_payment(order_id, request).await?;
            let change = order.payments.last().map_or(0.0, |p| p.change_given);
            println!(
                "order #{} payment {:?}, change {change:.2}",
                order.order_number, order.payment_status
            );
            Ok(())
        }
        Command::Finalize { order_id } => {
            let order = view.finalize(OrderId(order_id)).await?;
            println!("order #{} delivered", order.order_number);
            Ok(())
        }
        Command::PrepareItem { order_id, item_id } => {
            view.mark_item_prepared(OrderId(order_id), ItemId(item_id))
                .await?;
            println!("item {item_id} sent to kitchen as prepared");
            Ok(())
        }
        Command::PrepareAll { kitchen_id } => {
            view.mark_all_prepared(KitchenId(kitchen_id)).await?;
            println!("kitchen {kitchen_id} marked all prepared");
            Ok(())
        }
        Command::PlaceDemo => Ok(()),
    }
}

fn tip_for(remaining: f64, tip: f64, tip_percent: Option<f64>) -> f64 {
    match tip_percent {
        Some(percent) => ledger::compute_tip(TipMode::Percent, percent, remaining),
        None => ledger::compute_tip(TipMode::Amount, tip, remaining),
    }
}

/// Redraws on every cache change and on each once-per-second timer tick
/// until ctrl-c or the push stream ends.
async fn follow<F>(
    view: &mut OrderView,
    connection: &ConnectionManager,
    thresholds: UrgencyThresholds,
    draw: F,
) -> Result<()>
where
    F: Fn(&OrderView) -> String,
{
    let (targets_tx, targets_rx) = watch::channel(timer_targets(view.visible()));
    let (tick_tx, mut ticks) = mpsc::channel(64);
    let shutdown = CancellationToken::new();
    let ticker = spawn_ticker(targets_rx, tick_tx, thresholds, shutdown.clone());

    print!("{}", draw(view));
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            tick = ticks.recv() => {
                if tick.is_none() {
                    break Ok(());
                }
                while ticks.try_recv().is_ok() {}
            }
            outcome = view.recv() => match outcome {
                Some(outcome) if outcome.changed_cache() => {
                    targets_tx.send_replace(timer_targets(view.visible()));
                }
                Some(_) => continue,
                None => {
                    if connection.is_disconnected() {
                        warn!("dashboard: push stream ended");
                    }
                    break Ok(());
                }
            },
        }
        print!("{}", draw(view));
    };

    shutdown.cancel();
    let _ = ticker.await;
    result
}

fn demo_order(store_id: StoreId) -> PlaceOrderRequest {
    PlaceOrderRequest {
        store_id,
        delivery_method: DeliveryMethod::Pickup,
        customer: CustomerRef {
            customer_id: CustomerId(1),
            name: "Walk-in".to_string(),
            phone: None,
        },
        lines: vec![
            PlaceOrderLine {
                product_id: ProductId(1),
                kitchen_id: KitchenId(1),
                name: "Burger".to_string(),
                quantity: 2,
                unit_price: 8.5,
            },
            PlaceOrderLine {
                product_id: ProductId(2),
                kitchen_id: KitchenId(3),
                name: "Lemonade".to_string(),
                quantity: 1,
                unit_price: 3.0,
            },
        ],
        delivery_fee: 0.0,
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
