use cascade_domain::domain_event::DomainEvent;
use cascade_macros::event;
use serde::{Deserialize, Serialize};

#[event(version = 2)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum LedgerEvent {
    #[event(event_type = "ledger.opened")]
    Opened { owner: String },
    #[event(event_version = 3)]
    Posted(i64),
    Closed,
}

fn main() {
    let opened = LedgerEvent::Opened { owner: "o".into() };
    assert_eq!(opened.event_type(), "ledger.opened");
    assert_eq!(opened.event_version(), 2);

    let posted = LedgerEvent::Posted(10);
    assert_eq!(posted.event_type(), "LedgerEvent.Posted");
    assert_eq!(posted.event_version(), 3);

    assert_eq!(LedgerEvent::Closed.event_type(), "LedgerEvent.Closed");
}
