#[test]
fn ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/model_basic.rs");
    t.pass("tests/ui/model_existing_id.rs");
}
