use compute_context::{Context, Ownership, Value};
use serde_json::json;
use std::sync::Arc;

#[test]
fn copied_context_is_isolated_from_source_mutation() {
    let mut source = Context::new();
    source.set("shot", "sh010");
    let copy = source.copy(Ownership::Copied);

    source.set("shot", "sh020");
    assert_eq!(copy.get::<String>("shot").unwrap(), "sh010");
    assert_eq!(copy.ownership("shot"), Some(Ownership::Copied));
}

#[test]
fn copied_values_are_distinct_allocations() {
    let mut source = Context::new();
    source.set("list", json!([1, 2, 3]));
    let copy = source.copy(Ownership::Copied);
    let a = source.get_data("list").unwrap();
    let b = copy.get_data("list").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a, b);
}

#[test]
fn shared_copy_survives_source_destruction() {
    let value = Arc::new(json!("plate"));
    let mut source = Context::empty();
    source.set_data("layer", value.clone());
    let copy = source.copy(Ownership::Shared);
    assert_eq!(Arc::strong_count(&value), 3);

    drop(source);
    assert_eq!(Arc::strong_count(&value), 2);
    assert_eq!(copy.get::<String>("layer").unwrap(), "plate");

    drop(copy);
    assert_eq!(Arc::strong_count(&value), 1);
}

#[test]
fn dropping_a_borrowed_copy_leaves_source_intact() {
    let value = Arc::new(json!(3.5));
    let mut source = Context::empty();
    source.set_data("scale", value.clone());
    let view = source.copy(Ownership::Borrowed);
    assert_eq!(Arc::strong_count(&value), 2);
    assert_eq!(view.get::<f64>("scale").unwrap(), 3.5);

    drop(view);
    assert_eq!(Arc::strong_count(&value), 2);
    assert_eq!(source.get::<f64>("scale").unwrap(), 3.5);
}

#[test]
fn copy_mode_applies_to_every_entry() {
    let owned: Arc<Value> = Arc::new(json!("external"));
    let mut source = Context::new();
    source.set_borrowed("ext", &owned);
    source.set("local", 1);

    for mode in [Ownership::Borrowed, Ownership::Shared, Ownership::Copied] {
        let copy = source.copy(mode);
        for name in copy.names() {
            assert_eq!(copy.ownership(name.as_str()), Some(mode));
        }
        assert_eq!(copy, source);
    }
}

#[test]
fn borrowed_entries_read_through_to_owner() {
    let owned = Arc::new(json!("v1"));
    let mut c = Context::new();
    c.set_borrowed("version", &owned);
    assert_eq!(c.get::<String>("version").unwrap(), "v1");
    assert_eq!(Arc::strong_count(&owned), 1);
}

#[test]
#[should_panic(expected = "outlived")]
fn reading_a_borrowed_copy_after_its_owner_is_gone_panics() {
    let mut source = Context::new();
    source.set("shot", "sh010");
    let view = source.copy(Ownership::Borrowed);
    drop(source);
    let _ = view.get::<String>("shot");
}
