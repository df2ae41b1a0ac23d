use crate::{
    domain::{KitchenId, OrderStatus},
    error::{ApiError, ErrorCode},
    protocol::ServerEvent,
};

#[test]
fn status_parses_legacy_aliases_to_preparing() {
    for raw in ["accepted", "confirmed", "Confirmed", "preparing"] {
        assert_eq!(raw.parse::<OrderStatus>(), Ok(OrderStatus::Preparing));
    }
    let from_wire: OrderStatus = serde_json::from_str("\"accepted\"").expect("alias");
    assert_eq!(from_wire, OrderStatus::Preparing);
}

#[test]
fn status_serializes_canonical_name_only() {
    let json = serde_json::to_string(&OrderStatus::Preparing).expect("json");
    assert_eq!(json, "\"preparing\"");
    let on_the_way: OrderStatus = serde_json::from_str("\"onTheWay\"").expect("camel alias");
    assert_eq!(on_the_way, OrderStatus::OnTheWay);
    assert_eq!(
        serde_json::to_string(&on_the_way).expect("json"),
        "\"on_the_way\""
    );
}

#[test]
fn terminal_statuses_are_delivered_and_cancelled() {
    let terminal: Vec<_> = OrderStatus::ALL
        .into_iter()
        .filter(OrderStatus::is_terminal)
        .collect();
    assert_eq!(terminal, vec![OrderStatus::Delivered, OrderStatus::Cancelled]);
}

#[test]
fn server_event_uses_dotted_type_tags() {
    let event = ServerEvent::KitchenMarkAllPrepared {
        kitchen_id: KitchenId(4),
    };
    let json = serde_json::to_value(&event).expect("json");
    assert_eq!(json["type"], "kitchen.mark_all_prepared");
    assert_eq!(json["payload"]["kitchen_id"], 4);
    assert_eq!(event.name(), "kitchen.mark_all_prepared");

    let error = ServerEvent::Error(ApiError::new(ErrorCode::Conflict, "already delivered"));
    let json = serde_json::to_string(&error).expect("json");
    let parsed: ServerEvent = serde_json::from_str(&json).expect("parse");
    assert!(matches!(
        parsed,
        ServerEvent::Error(ApiError {
            code: ErrorCode::Conflict,
            ..
        })
    ));
}
