use cascade_macros::entity_id;
use uuid::Uuid;

#[entity_id]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InvoiceId(Uuid);

fn main() {
    let raw = Uuid::new_v4();
    let id = InvoiceId::from(raw);
    assert_eq!(id.to_string(), raw.to_string());

    let parsed: InvoiceId = raw.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert!("not-a-uuid".parse::<InvoiceId>().is_err());
}
