//! # Fixture Tests
//!
//! These tests build exact tree shapes from JSON descriptions instead of
//! insertion sequences, then drive removals through them. Shapes are chosen
//! so a single removal lands in a known case: leaf splice, one-child
//! splice, two-child predecessor swap, and the rotation cascades that
//! follow.

use aldertree::util::sample_tree;

/// The classic 7-node complete tree:
///
/// ```text
///         4
///      2     6
///     1 3   5 7
/// ```
const SEVEN_NODE_BALANCED: &str = r#"{
	"root": {
		"key": 4,
		"left":  { "key": 2, "left": { "key": 1 }, "right": { "key": 3 } },
		"right": { "key": 6, "left": { "key": 5 }, "right": { "key": 7 } }
	}
}"#;

/// Left-heavy shape where removing the deepest right key forces a double
/// (left-right) rotation at the old root:
///
/// ```text
///          8
///      4       10
///    2   6        11
///       5 7
/// ```
const DOUBLE_ROTATION_ON_DELETE: &str = r#"{
	"root": {
		"key": 8,
		"left": {
			"key": 4,
			"left":  { "key": 2 },
			"right": { "key": 6, "left": { "key": 5 }, "right": { "key": 7 } }
		},
		"right": { "key": 10, "right": { "key": 11 } }
	}
}"#;

/// Shape where stripping the right spine forces a single rotation at the
/// root:
///
/// ```text
///         8
///      4     10
///    2   6      12
///   1 3 5 7
/// ```
const SINGLE_ROTATION_ON_DELETE: &str = r#"{
	"root": {
		"key": 8,
		"left": {
			"key": 4,
			"left":  { "key": 2, "left": { "key": 1 }, "right": { "key": 3 } },
			"right": { "key": 6, "left": { "key": 5 }, "right": { "key": 7 } }
		},
		"right": { "key": 10, "right": { "key": 12 } }
	}
}"#;

/// Duplicate counts on a three-node tree.
const COUNTED_NODES: &str = r#"{
	"root": {
		"key": 5, "count": 3,
		"left":  { "key": 2, "count": 2 },
		"right": { "key": 8 }
	}
}"#;

#[test]
fn fixtures_build_valid_trees() {
	for json in [
		SEVEN_NODE_BALANCED,
		DOUBLE_ROTATION_ON_DELETE,
		SINGLE_ROTATION_ON_DELETE,
		COUNTED_NODES,
	] {
		let tree = sample_tree(json);
		tree.assert_invariants();
	}
}

#[test]
fn empty_fixture() {
	let tree = sample_tree(r#"{ "root": null }"#);
	tree.assert_invariants();
	assert!(tree.is_empty());
}

#[test]
fn values_default_to_keys() {
	let tree = sample_tree(SEVEN_NODE_BALANCED);
	assert_eq!(tree.get(&4), Some(&4));
	assert_eq!(tree.get(&7), Some(&7));
}

#[test]
fn erase_root_with_two_children() {
	let mut tree = sample_tree(SEVEN_NODE_BALANCED);
	assert_eq!(tree.height(), 3);

	// the predecessor (3) must take the root's place
	assert_eq!(tree.remove(&4), Some(4));

	tree.assert_invariants();
	assert_eq!(tree.len(), 6);
	let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
	assert_eq!(keys, [1, 2, 3, 5, 6, 7]);
}

#[test]
fn erase_every_key_in_every_order_of_the_balanced_seven() {
	// brute force: remove the 7 keys in a rolling set of orders; every
	// intermediate tree must stay valid
	let keys = [1i64, 2, 3, 4, 5, 6, 7];
	for rotation in 0..keys.len() {
		let mut tree = sample_tree(SEVEN_NODE_BALANCED);
		for offset in 0..keys.len() {
			let key = keys[(rotation + offset) % keys.len()];
			assert_eq!(tree.remove(&key), Some(key));
			tree.assert_invariants();
		}
		assert!(tree.is_empty());
	}
}

#[test]
fn delete_triggers_double_rotation() {
	let mut tree = sample_tree(DOUBLE_ROTATION_ON_DELETE);
	assert_eq!(tree.height(), 4);

	// removing 11 leaves the root with balance factor 2 and a
	// right-heavy left child: the left-right case
	assert_eq!(tree.remove(&11), Some(11));

	tree.assert_invariants();
	assert_eq!(tree.height(), 3);
	let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
	assert_eq!(keys, [2, 4, 5, 6, 7, 8, 10]);
}

#[test]
fn delete_triggers_single_rotation() {
	let mut tree = sample_tree(SINGLE_ROTATION_ON_DELETE);

	// stripping the right spine rotates the root twice; 4 ends up on top
	assert_eq!(tree.remove(&12), Some(12));
	assert_eq!(tree.remove(&10), Some(10));

	tree.assert_invariants();
	assert_eq!(tree.height(), 4);
	let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
	assert_eq!(keys, [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn counted_fixture_reports_logical_length() {
	let tree = sample_tree(COUNTED_NODES);

	tree.assert_invariants();
	assert_eq!(tree.len(), 6);

	// node-level iteration yields each distinct key once
	let keys: Vec<i64> = tree.iter().map(|(k, _)| *k).collect();
	assert_eq!(keys, [2, 5, 8]);
}

#[test]
fn counted_fixture_removal_drops_whole_count() {
	let mut tree = sample_tree(COUNTED_NODES);

	assert_eq!(tree.remove(&5), Some(5));
	tree.assert_invariants();
	// all three duplicates of 5 left with the node
	assert_eq!(tree.len(), 3);
}
