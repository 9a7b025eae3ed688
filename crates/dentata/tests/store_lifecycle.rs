use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dentata::{create_store, Cursor, Error, Subscription, Value};
use serde_json::json;

fn store(json: serde_json::Value) -> Cursor {
    create_store(Value::from(json)).expect("create_store must succeed")
}

fn counter(cursor: &Cursor) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    cursor
        .on_change(move |_, _| c.set(c.get() + 1))
        .expect("subscribe must succeed");
    count
}

fn on_delete_log(cursor: &Cursor, name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) {
    let log = Rc::clone(log);
    cursor
        .on_delete(move || log.borrow_mut().push(name))
        .expect("subscribe must succeed");
}

#[test]
fn deleting_a_value_detaches_cursors_below_it() {
    let root = store(json!({"a": {"b": {"c": 1}}, "keep": 1}));
    let a = root.select("a").unwrap();
    let b = a.select("b").unwrap();
    let c = b.select("c").unwrap();
    let keep = root.select("keep").unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    on_delete_log(&c, "c", &log);
    on_delete_log(&a, "a", &log);
    on_delete_log(&b, "b", &log);
    let root_count = counter(&root);

    a.delete().unwrap();

    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    assert_eq!(root_count.get(), 1);
    assert!(a.is_detached() && b.is_detached() && c.is_detached());
    assert!(!keep.is_detached());
    assert_eq!(root.get(), Some(Value::from(json!({"keep": 1}))));
    assert_eq!(root.store().registry_len(), 2);
}

#[test]
fn detached_cursor_rejects_writes_and_subscriptions() {
    let root = store(json!({"a": 1}));
    let a = root.select("a").unwrap();
    a.delete().unwrap();

    assert!(matches!(a.set(2), Err(Error::Detached { .. })));
    assert!(matches!(a.delete(), Err(Error::Detached { .. })));
    assert!(matches!(a.on_delete(|| {}), Err(Error::Detached { .. })));
    assert_eq!(a.get(), None);
}

#[test]
fn reselecting_after_delete_gives_fresh_cursor() {
    let root = store(json!({"a": {"n": 1}}));
    let old = root.select("a").unwrap();
    let old_count = counter(&old);
    old.delete().unwrap();

    root.set_in("a", json!({"n": 2})).unwrap();
    let fresh = root.select("a").unwrap();
    let fresh_count = counter(&fresh);
    fresh.set_in("n", 3).unwrap();

    assert_ne!(old.id(), fresh.id());
    assert_eq!(old_count.get(), 0);
    assert_eq!(fresh_count.get(), 1);
}

#[test]
fn replacing_parent_with_primitive_deletes_children() {
    let root = store(json!({"a": {"b": 1}}));
    let a = root.select("a").unwrap();
    let b = a.select("b").unwrap();
    let deleted = Rc::new(Cell::new(false));
    let d = Rc::clone(&deleted);
    b.on_delete(move || d.set(true)).unwrap();
    let a_count = counter(&a);

    a.set("flat").unwrap();

    assert!(deleted.get());
    assert!(b.is_detached());
    assert_eq!(a_count.get(), 1);
}

#[test]
fn replacing_parent_keeps_children_that_still_exist() {
    let root = store(json!({"a": {"b": 1, "c": 2}}));
    let a = root.select("a").unwrap();
    let b = a.select("b").unwrap();
    let c = a.select("c").unwrap();
    let b_count = counter(&b);
    let c_deleted = Rc::new(Cell::new(false));
    let d = Rc::clone(&c_deleted);
    c.on_delete(move || d.set(true)).unwrap();

    a.set(json!({"b": 1})).unwrap();

    assert_eq!(b_count.get(), 0);
    assert!(!b.is_detached());
    assert!(c_deleted.get());
}

#[test]
fn array_delete_detaches_removed_element_and_shifts_the_rest() {
    let root = store(json!({"list": [10, 20, 30]}));
    let list = root.select("list").unwrap();
    let first = list.select(0usize).unwrap();
    let second = list.select(1usize).unwrap();
    let third = list.select(2usize).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    on_delete_log(&first, "first", &log);
    on_delete_log(&third, "third", &log);
    let first_count = counter(&first);
    let second_count = counter(&second);
    let list_count = counter(&list);

    first.delete().unwrap();

    assert_eq!(list.get(), Some(Value::from(json!([20, 30]))));
    assert_eq!(*log.borrow(), vec!["first", "third"]);
    assert!(first.is_detached());
    assert!(third.is_detached());
    assert_eq!(first_count.get(), 0);
    assert_eq!(second.get(), Some(Value::from(30)));
    assert_eq!(second_count.get(), 1);
    assert_eq!(list_count.get(), 1);

    let fresh = list.select(0usize).unwrap();
    assert_ne!(fresh.id(), first.id());
    assert_eq!(fresh.get(), Some(Value::from(20)));
}

#[test]
fn array_delete_fires_delete_listeners_below_the_element() {
    let root = store(json!({"list": [{"x": 1}, {"x": 2}]}));
    let first = root.select("list").unwrap().select(0usize).unwrap();
    let first_x = first.select("x").unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    on_delete_log(&first, "first", &log);
    on_delete_log(&first_x, "first_x", &log);

    first.delete().unwrap();

    assert_eq!(*log.borrow(), vec!["first", "first_x"]);
    assert!(first.is_detached() && first_x.is_detached());
    assert_eq!(root.get(), Some(Value::from(json!({"list": [{"x": 2}]}))));
}

#[test]
fn delete_root_is_rejected() {
    let root = store(json!({"a": 1}));
    assert_eq!(root.delete(), Err(Error::AbsentRoot));
    assert!(matches!(create_store(None::<Value>), Err(Error::AbsentRoot)));
}

#[test]
fn registry_holds_no_dead_nodes() {
    let root = store(json!({"a": {"b": {"c": {"d": 1}}}, "e": [1, 2]}));
    let store = root.store().clone();
    let d = root.select("a").unwrap().select("b").unwrap().select("c").unwrap().select("d").unwrap();
    let e1 = root.select("e").unwrap().select(1usize).unwrap();
    assert_eq!(store.cursor_count(), 7);

    for cursor in [&d, &e1] {
        cursor.release();
    }
    // Intermediate cursors from the select chains are still registered.
    assert_eq!(store.registry_len(), 5);

    let fresh = store.root();
    fresh.set(json!({})).unwrap();
    assert_eq!(store.registry_len(), 1);
    assert_eq!(store.cursor_count(), 2);
}

#[test]
fn release_does_not_fire_delete_listeners() {
    let root = store(json!({"a": 1}));
    let a = root.select("a").unwrap();
    let fired = Rc::new(Cell::new(false));
    let f = Rc::clone(&fired);
    a.on_delete(move || f.set(true)).unwrap();

    assert!(a.release());
    root.set(json!({})).unwrap();

    assert!(!fired.get());
    assert_eq!(root.store().registry_len(), 1);
}

#[test]
fn unsubscribe_from_inside_listener_fires_once() {
    let root = store(json!({"n": 0}));
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    root.on_change(move |_, sub| {
        c.set(c.get() + 1);
        sub.unsubscribe();
    })
    .unwrap();

    root.set_in("n", 1).unwrap();
    root.set_in("n", 2).unwrap();

    assert_eq!(count.get(), 1);
}

#[test]
fn listener_removed_mid_dispatch_is_skipped() {
    let root = store(json!({"n": 0}));
    let second: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let s = Rc::clone(&second);
    root.on_change(move |_, _| {
        if let Some(sub) = s.borrow().as_ref() {
            sub.unsubscribe();
        }
    })
    .unwrap();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let sub = root.on_change(move |_, _| c.set(c.get() + 1)).unwrap();
    *second.borrow_mut() = Some(sub);

    root.set_in("n", 1).unwrap();

    assert_eq!(count.get(), 0);
}

#[test]
fn delete_listener_can_be_unsubscribed() {
    let root = store(json!({"a": 1}));
    let a = root.select("a").unwrap();
    let fired = Rc::new(Cell::new(false));
    let f = Rc::clone(&fired);
    let sub = a.on_delete(move || f.set(true)).unwrap();

    assert!(sub.unsubscribe());
    a.delete().unwrap();

    assert!(!fired.get());
}

#[test]
fn clear_listeners_recursive_silences_subtree() {
    let root = store(json!({"a": {"b": 1}}));
    let a = root.select("a").unwrap();
    let b = a.select("b").unwrap();
    let root_count = counter(&root);
    let a_count = counter(&a);
    let b_count = counter(&b);

    a.clear_listeners_recursive();
    b.set(2).unwrap();

    assert_eq!(root_count.get(), 1);
    assert_eq!(a_count.get(), 0);
    assert_eq!(b_count.get(), 0);

    root.clear_listeners();
    b.set(3).unwrap();
    assert_eq!(root_count.get(), 1);
}

#[test]
fn listener_may_write_to_another_cursor() {
    let root = store(json!({"a": 0, "b": 0}));
    let a = root.select("a").unwrap();
    let b = root.select("b").unwrap();
    let root_count = counter(&root);
    let b_count = counter(&b);
    let mirror = b.clone();
    a.on_change(move |event, _| {
        mirror.set(event.new.clone()).unwrap();
    })
    .unwrap();

    a.set(7).unwrap();

    assert_eq!(root.get(), Some(Value::from(json!({"a": 7, "b": 7}))));
    assert_eq!(root_count.get(), 2);
    assert_eq!(b_count.get(), 1);
}

#[test]
fn listener_writing_its_own_cursor_is_not_reentered() {
    let root = store(json!({"n": 0}));
    let n = root.select("n").unwrap();
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    let writer = n.clone();
    n.on_change(move |event, _| {
        c.set(c.get() + 1);
        let next = event.new.as_f64().unwrap_or(0.0) + 1.0;
        writer.set(next).unwrap();
    })
    .unwrap();

    n.set(1).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(n.get(), Some(Value::from(2)));
}

#[test]
fn listener_may_read_the_store() {
    let root = store(json!({"a": 1}));
    let seen = Rc::new(RefCell::new(None));
    let s = Rc::clone(&seen);
    let reader = root.clone();
    root.on_change(move |_, _| *s.borrow_mut() = reader.get()).unwrap();

    root.set_in("a", 2).unwrap();

    assert_eq!(*seen.borrow(), Some(Value::from(json!({"a": 2}))));
}

#[test]
fn listener_deleting_an_ancestor_of_a_queued_change() {
    let root = store(json!({"a": {"b": 1}}));
    let a = root.select("a").unwrap();
    let b = a.select("b").unwrap();
    let b_changes = counter(&b);
    let b_deletes = Rc::new(Cell::new(0));
    let d = Rc::clone(&b_deletes);
    b.on_delete(move || d.set(d.get() + 1)).unwrap();
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    root.on_change(move |_, _| {
        if !flag.replace(true) {
            a.delete().unwrap();
        }
    })
    .unwrap();

    b.set(2).unwrap();

    assert_eq!(b_changes.get(), 0);
    assert_eq!(b_deletes.get(), 1);
    assert!(b.is_detached());
    assert_eq!(root.get(), Some(Value::from(json!({}))));
    assert_eq!(root.store().registry_len(), 1);
}
