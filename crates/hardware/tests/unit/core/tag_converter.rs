//! Tag Converter Tests.
//!
//! Verifies tag allocation order, offset lookups and flush semantics of the
//! live tag window.

use mcsim_core::common::error::EngineError;
use mcsim_core::common::tag::Tag;
use mcsim_core::core::arena::Arena;
use mcsim_core::core::pipeline::TagConverter;
use pretty_assertions::assert_eq;

#[test]
fn tags_start_at_one_and_increase() {
    let mut arena = Arena::new();
    let mut tc = TagConverter::new();
    let tags: Vec<Tag> = (0..4).map(|_| tc.allocate(arena.insert(()))).collect();
    assert_eq!(tags, vec![Tag(1), Tag(2), Tag(3), Tag(4)]);
    assert_eq!(tc.next_tag(), Tag(5));
    assert_eq!(tc.len(), 4);
}

#[test]
fn lookup_at_checks_the_expected_tag() {
    let mut arena = Arena::new();
    let mut tc = TagConverter::new();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let h = arena.insert(());
            let _ = tc.allocate(h);
            h
        })
        .collect();
    assert_eq!(tc.lookup_at(Tag(1), 2), Some(handles[2]));
    assert_eq!(tc.lookup(Tag(2)), Some(handles[1]));
    assert_eq!(tc.lookup_at(Tag(2), 5), None);

    let _ = tc.pop_head();
    assert_eq!(tc.lookup(Tag(1)), None);
    assert_eq!(tc.lookup_at(Tag(2), 1), Some(handles[2]));
}

#[test]
fn flush_removes_younger_and_rewinds_next_tag() {
    let mut arena = Arena::new();
    let mut tc = TagConverter::new();
    for _ in 0..5 {
        let _ = tc.allocate(arena.insert(()));
    }
    let removed = tc.flush(Tag(2));
    assert_eq!(
        removed.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
        vec![Tag(5), Tag(4), Tag(3)]
    );
    assert_eq!(tc.next_tag(), Tag(3));
    assert_eq!(tc.tail().map(|(t, _)| t), Some(Tag(2)));

    // A second flush at the same cutoff changes nothing.
    assert!(tc.flush(Tag(2)).is_empty());
    assert_eq!(tc.next_tag(), Tag(3));
}

#[test]
fn register_rejects_out_of_order_tag() {
    let mut arena = Arena::new();
    let mut tc = TagConverter::new();
    tc.register(Tag(1), arena.insert(())).unwrap();
    let err = tc.register(Tag(3), arena.insert(()));
    assert!(matches!(err, Err(EngineError::Invariant(_))));
    assert!(matches!(tc.require(Tag(9)), Err(EngineError::TagNotFound(Tag(9)))));
}
