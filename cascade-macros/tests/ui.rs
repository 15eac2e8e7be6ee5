#[test]
fn ui_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/entity_basic.rs");
    t.pass("tests/ui/entity_with_events.rs");
    t.pass("tests/ui/entity_id_basic.rs");
    t.pass("tests/ui/event_variants.rs");
}
