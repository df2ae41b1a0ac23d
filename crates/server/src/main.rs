use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    domain::{ItemId, Kitchen, KitchenId, Order, OrderId, StoreId},
    error::{ApiError, ErrorCode},
    protocol::{
        CancelOrderRequest, ItemStatusRequest, PaymentRequest, PlaceOrderRequest, ServerEvent,
        TransitionStatusRequest,
    },
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::{load_settings, Settings};

type ApiFailure = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    let addr: SocketAddr = settings.server_bind.parse()?;
    let app = build_router(app_state(&settings), settings.max_body_bytes);

    info!(%addr, store_id = settings.store_id.0, kitchens = settings.kitchens.len(), "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn app_state(settings: &Settings) -> Arc<AppState> {
    let kitchens = settings
        .kitchens
        .iter()
        .map(|kitchen| Kitchen {
            id: kitchen.id,
            name: kitchen.name.clone(),
            store_id: settings.store_id,
        })
        .collect();
    let (events, _) = broadcast::channel(settings.event_buffer);
    Arc::new(AppState {
        api: ApiContext::new(settings.store_id, kitchens),
        events,
    })
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/orders", post(http_place_order))
        .route("/orders/active", get(http_active_orders))
        .route("/orders/:order_id", get(http_get_order))
        .route("/orders/:order_id/status", post(http_transition))
        .route("/orders/:order_id/cancel", post(http_cancel))
        .route("/orders/:order_id/payments", post(http_register_payment))
        .route(
            "/orders/:order_id/items/:item_id/status",
            post(http_item_status),
        )
        .route("/stores/:store_id/kitchens", get(http_kitchens))
        .route(
            "/kitchens/:kitchen_id/mark-all-prepared",
            post(http_mark_all_prepared),
        )
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

fn failure(err: ApiError) -> ApiFailure {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_active_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(api::list_active_orders(&state.api).await)
}

async fn http_get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
) -> Result<Json<Order>, ApiFailure> {
    api::get_order(&state.api, OrderId(order_id))
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_place_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiFailure> {
    let order = api::place_order(&state.api, req, Utc::now())
        .await
        .map_err(failure)?;
    info!(order_id = order.id.0, subtotal = order.subtotal, "order placed");
    state.publish(ServerEvent::OrderCreated {
        order: order.clone(),
    });
    Ok((StatusCode::CREATED, Json(order)))
}

async fn http_transition(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
    Json(req): Json<TransitionStatusRequest>,
) -> Result<Json<Order>, ApiFailure> {
    let order = api::transition_order(&state.api, OrderId(order_id), req.status, Utc::now())
        .await
        .map_err(failure)?;
    info!(order_id, status = %order.status, "order status changed");
    Ok(Json(published(&state, order)))
}

async fn http_cancel(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<Order>, ApiFailure> {
    let order = api::cancel_order(&state.api, OrderId(order_id), &req.reason, Utc::now())
        .await
        .map_err(failure)?;
    info!(order_id, reason = %req.reason, "order cancelled");
    Ok(Json(published(&state, order)))
}

async fn http_register_payment(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<i64>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Order>, ApiFailure> {
    let order = api::register_payment(&state.api, OrderId(order_id), &req, Utc::now())
        .await
        .map_err(failure)?;
    info!(
        order_id,
        amount = req.amount,
        payment_status = ?order.payment_status,
        "payment registered"
    );
    Ok(Json(published(&state, order)))
}

async fn http_item_status(
    State(state): State<Arc<AppState>>,
    Path((order_id, item_id)): Path<(i64, i64)>,
    Json(req): Json<ItemStatusRequest>,
) -> Result<StatusCode, ApiFailure> {
    let order = api::set_item_status(
        &state.api,
        OrderId(order_id),
        ItemId(item_id),
        req.status,
        Utc::now(),
    )
    .await
    .map_err(failure)?;
    published(&state, order);
    Ok(StatusCode::NO_CONTENT)
}

async fn http_kitchens(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<Kitchen>>, ApiFailure> {
    api::list_kitchens(&state.api, StoreId(store_id))
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_mark_all_prepared(
    State(state): State<Arc<AppState>>,
    Path(kitchen_id): Path<i64>,
) -> Result<StatusCode, ApiFailure> {
    let kitchen_id = KitchenId(kitchen_id);
    let changed = api::mark_all_prepared(&state.api, kitchen_id, Utc::now())
        .await
        .map_err(failure)?;
    info!(kitchen_id = kitchen_id.0, orders = changed.len(), "kitchen marked all prepared");
    state.publish(ServerEvent::KitchenMarkAllPrepared { kitchen_id });
    for order in changed {
        state.publish(ServerEvent::OrderUpdated { order });
    }
    Ok(StatusCode::NO_CONTENT)
}

fn published(state: &AppState, order: Order) -> Order {
    state.publish(ServerEvent::OrderUpdated {
        order: order.clone(),
    });
    order
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events.subscribe());

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(%err, "ws: subscriber lagged, events dropped");
                    continue;
                }
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
