use dentata_path::{diff_keys, get, parse_path, remove, set, KeyDiff, Path, PathError};
use dentata_util::{Key, Symbol, Value};
use serde_json::json;

#[test]
fn test_empty_key_component() {
    let doc = Value::from(json!({"": "value", "foo": {"": 1}}));
    assert_eq!(get(&doc, &parse_path("/")).unwrap(), Some(&Value::from("value")));
    assert_eq!(get(&doc, &parse_path("/foo/")).unwrap(), Some(&Value::from(1)));
}

#[test]
fn test_escaped_components_address_real_keys() {
    let doc = Value::from(json!({"a/b": {"m~n": true}}));
    let path = parse_path("/a~1b/m~0n");
    assert_eq!(get(&doc, &path).unwrap(), Some(&Value::from(true)));
    assert_eq!(path.to_string(), "/a~1b/m~0n");
}

#[test]
fn test_numeric_names_address_arrays_and_objects() {
    let doc = Value::from(json!({"list": [{"0": "obj-zero"}]}));
    let path = parse_path("/list/0/0");
    assert_eq!(get(&doc, &path).unwrap(), Some(&Value::from("obj-zero")));
    let mixed: Path = [Key::from("list"), Key::Index(0), Key::Index(0)].into_iter().collect();
    assert_eq!(get(&doc, &mixed).unwrap(), Some(&Value::from("obj-zero")));
}

#[test]
fn test_leading_zero_is_not_an_index() {
    let doc = Value::from(json!([1, 2]));
    assert_eq!(get(&doc, &parse_path("/01")).unwrap(), None);
    let mut doc = doc;
    let err = set(&mut doc, &parse_path("/01"), Value::Null).unwrap_err();
    assert!(matches!(err, PathError::InvalidKey { .. }));
}

#[test]
fn test_set_then_remove_restores_structure() {
    let original = Value::from(json!({"a": {"b": 1}}));
    let mut doc = original.clone();
    set(&mut doc, &parse_path("/a/c"), Value::from(2)).unwrap();
    assert_eq!(doc, Value::from(json!({"a": {"b": 1, "c": 2}})));
    remove(&mut doc, &parse_path("/a/c")).unwrap();
    assert_eq!(doc, original);
    assert_eq!(diff_keys(&original, &doc), KeyDiff::Keys(Default::default()));
}

#[test]
fn test_symbol_keyed_diff() {
    let s = Symbol::new("hidden");
    let old = Value::object([(Key::from("a"), Value::from(1))]);
    let new = Value::object([(Key::from("a"), Value::from(1)), (Key::from(&s), Value::from(2))]);
    let changes = diff_keys(&old, &new);
    assert_eq!(changes.keys().map(|c| c.added.clone()), Some(vec![Key::from(&s)]));
}

#[test]
fn test_root_set_replaces_whole_tree() {
    let mut doc = Value::from(json!({"a": 1}));
    set(&mut doc, &[], Value::from("new")).unwrap();
    assert_eq!(doc, Value::from("new"));
}
