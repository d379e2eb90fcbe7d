use super::*;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn memo_evaluates_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let cell: Memo<u32, String> = Memo::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(42)
    });

    assert_eq!(*cell.get().unwrap(), 42);
    assert_eq!(*cell.get().unwrap(), 42);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn memo_evaluates_once_under_contention() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let cell: Memo<String, String> = Memo::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok("shared".to_string())
    });

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cell = cell.clone();
            std::thread::spawn(move || cell.get().unwrap())
        })
        .collect();

    let values: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    // All observers share one identity, not sixteen equal copies.
    for value in &values {
        assert!(Arc::ptr_eq(value, &values[0]));
    }
}

#[test]
fn memo_caches_failure() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let cell: Memo<u32, String> = Memo::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Err("corrupt record".to_string())
    });

    assert_eq!(cell.get().unwrap_err(), "corrupt record");
    assert_eq!(cell.get().unwrap_err(), "corrupt record");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn memo_resolved_needs_no_producer() {
    let cell: Memo<&str, String> = Memo::resolved("constant");
    assert!(cell.is_resolved());
    assert_eq!(*cell.get().unwrap(), "constant");
}

#[test]
fn memo_map_is_lazy() {
    let forced = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&forced);
    let source: Memo<u32, String> = Memo::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(10)
    });

    let derived = source.map(|v| *v * 2);
    assert_eq!(forced.load(Ordering::SeqCst), 0);

    assert_eq!(*derived.get().unwrap(), 20);
    assert_eq!(forced.load(Ordering::SeqCst), 1);
    assert!(source.is_resolved());
}

#[test]
fn package_of_splits_on_last_slash() {
    assert_eq!(package_of("java/util/Map$Entry"), "java.util");
    assert_eq!(package_of("java/lang/Object"), "java.lang");
    assert_eq!(package_of("TopLevel"), "");
}

#[test]
fn simple_name_strips_package_and_enclosing() {
    assert_eq!(simple_name_of("java/util/Map$Entry"), "Entry");
    assert_eq!(simple_name_of("java/lang/Object"), "Object");
    assert_eq!(simple_name_of("TopLevel"), "TopLevel");
}

#[test]
fn name_conversions_round_trip() {
    assert_eq!(to_source_name("java/util/Map"), "java.util.Map");
    assert_eq!(to_internal_name("java.util.Map"), "java/util/Map");
}
