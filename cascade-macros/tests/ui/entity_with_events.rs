use cascade_domain::aggregate::HasPendingEvents;
use cascade_macros::{entity, event};
use serde::{Deserialize, Serialize};

#[event]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ShipmentEvent {
    Dispatched { carrier: String },
}

#[entity(events = ShipmentEvent)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Shipment {
    carrier: Option<String>,
}

// 未派生 serde 时注入字段不携带 #[serde(skip)]
#[entity(id = u64, events = ShipmentEvent)]
#[derive(Debug, Default)]
struct Parcel {
    weight: u32,
}

fn main() {
    let s = Shipment::default();
    assert!(s.pending_events().is_empty());

    let p = Parcel::default();
    assert!(p.pending_events().is_empty());
    assert_eq!(p.weight, 0);
    assert!(s.carrier.is_none());
}
