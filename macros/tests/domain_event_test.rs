//! Tests for #[derive(DomainEvent)]

use ironhorizon_core::event::Event;
use ironhorizon_macros::DomainEvent;
use serde::Serialize;

#[derive(Debug, Serialize, DomainEvent)]
#[ironhorizon(aggregate = "Order", event_type = "OrderPlaced")]
struct OrderPlaced {
    #[ironhorizon(aggregate_id)]
    order_id: String,
    total_cents: u64,
}

#[test]
fn aggregate_id_reads_the_marked_field() {
    let event = OrderPlaced {
        order_id: "order-1".to_string(),
        total_cents: 1999,
    };
    assert_eq!(event.aggregate_id(), "order-1");
}

#[test]
fn aggregate_type_and_event_type_match_the_attribute() {
    let event = OrderPlaced {
        order_id: "order-1".to_string(),
        total_cents: 1999,
    };
    assert_eq!(event.aggregate_type(), "Order");
    assert_eq!(event.event_type(), "OrderPlaced");
}

#[test]
fn to_json_encodes_every_field() {
    let event = OrderPlaced {
        order_id: "order-1".to_string(),
        total_cents: 1999,
    };
    let json = event.to_json().expect("serialization should succeed");
    assert_eq!(
        json,
        serde_json::json!({
            "order_id": "order-1",
            "total_cents": 1999,
        })
    );
}
