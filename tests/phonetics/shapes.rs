//! Integration tests for phonetic shapes
//!
//! Tests the node arena, its capacity, and in-place edits.

use morphon_foundation::{CapacityLimit, ErrorKind};
use morphon_phonetics::{Direction, NodeKind, PhoneticShape, ShapeNode};

use crate::inventory;

#[test]
fn new_shape_holds_only_margins() {
    let shape = PhoneticShape::new();
    assert_eq!(shape.len(), 2);
    assert_eq!(shape.next(shape.first()), Some(shape.last()));
    assert_eq!(shape.begin(Direction::RightToLeft), shape.last());
    assert_eq!(shape.segments().count(), 0);
}

#[test]
fn capacity_counts_margins() {
    let (system, _) = inventory();
    let t = system.bundle(&["+cons", "-voice", "-round"]).unwrap();
    let mut shape = PhoneticShape::new();
    for _ in 0..PhoneticShape::CAPACITY - 2 {
        shape.push_back(ShapeNode::segment(t)).unwrap();
    }
    assert_eq!(shape.len(), PhoneticShape::CAPACITY);
    let err = shape.push_front(ShapeNode::segment(t)).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::CapacityExceeded(CapacityLimit::ShapeNodes { limit: 256 })
    ));
}

#[test]
fn removal_frees_capacity() {
    let (_, table) = inventory();
    let word = "ta".repeat(127);
    let mut shape = table.to_shape(&word).unwrap();
    assert!(table.to_shape(&format!("{word}t")).is_err());

    let first = shape.segments().next().unwrap();
    assert!(shape.remove(first));
    assert!(!shape.remove(shape.first()));
    let removed = shape[first].clone();
    let last = shape.prev(shape.last()).unwrap();
    shape.insert_after(last, removed).unwrap();
    assert_eq!(shape.len(), PhoneticShape::CAPACITY);
}

#[test]
fn move_after_swaps_adjacent_segments() {
    let (_, table) = inventory();
    let mut shape = table.to_shape("tad").unwrap();
    let ids: Vec<_> = shape.segments().collect();
    assert!(shape.move_after(ids[0], ids[1]));
    assert_eq!(table.render(&shape), "atd");
    assert!(!shape.move_after(ids[0], shape.last()));
}

#[test]
fn deleted_nodes_are_invisible() {
    let (_, table) = inventory();
    let mut shape = table.to_shape("tad").unwrap();
    let middle = shape.segments().nth(1).unwrap();
    shape[middle].deleted = true;
    assert_eq!(table.render(&shape), "td");
    assert_eq!(shape.segments().count(), 2);
    assert!(!shape.same_segments(&table.to_shape("tad").unwrap()));
    assert!(shape.same_segments(&table.to_shape("td").unwrap()));
}

#[test]
fn copy_span_skips_margins() {
    let (_, table) = inventory();
    let shape = table.to_shape("ta+d").unwrap();
    let copied = shape.copy_span(shape.first(), shape.last());
    assert_eq!(copied.len(), 4);
    assert!(matches!(copied[2].kind, NodeKind::Boundary(ref b) if b == "+"));
    let rebuilt = PhoneticShape::from_nodes(copied).unwrap();
    assert!(rebuilt.same_segments(&shape));
}
