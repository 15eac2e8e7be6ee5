use cascade_macros::entity;
use serde::{Deserialize, Serialize};

#[entity(id = String)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Customer {
    name: String,
}

fn main() {
    use cascade_domain::entity::Entity;

    let c = Customer::new("c-1".to_string());
    assert_eq!(c.id(), "c-1");
    assert_eq!(c.version(), 0);
    assert!(c.name.is_empty());
}
