//! Test utilities for building sample trees from JSON fixtures.
//!
//! Fixtures describe an exact tree *shape*, which lets tests target
//! specific rotation and splice cases that are awkward to reach through
//! insertion sequences. Heights and parent links are derived during the
//! build; the shape itself must already satisfy the BST and balance
//! invariants (checked by `assert_invariants` in the tests that use it).

use crate::{Node, NodeId, Tree};
use serde::Deserialize;

/// One node of a fixture tree. `value` defaults to the key and `count`
/// to 1, so unique-key fixtures stay terse.
#[derive(Deserialize, Debug)]
pub struct TreeNode {
	key: i64,
	#[serde(default)]
	value: Option<i64>,
	#[serde(default = "one")]
	count: usize,
	#[serde(default)]
	left: Option<Box<TreeNode>>,
	#[serde(default)]
	right: Option<Box<TreeNode>>,
}

fn one() -> usize {
	1
}

#[derive(Deserialize, Debug)]
struct SampleTree {
	root: Option<TreeNode>,
}

/// Builds a [`Tree`] directly from a JSON shape description, bypassing the
/// insertion path entirely.
pub fn sample_tree(json: &str) -> Tree<i64, i64> {
	let sample: SampleTree = serde_json::from_str(json).expect("malformed fixture JSON");
	let mut tree = Tree::new();
	if let Some(root) = sample.root {
		let (id, _) = build(&mut tree, root, None);
		tree.root = Some(id);
	}
	tree
}

/// Allocates `shape` and its subtrees into the arena, wiring parent links
/// and computing stored heights bottom-up. Returns `(node, height)`.
fn build(tree: &mut Tree<i64, i64>, shape: TreeNode, parent: Option<NodeId>) -> (NodeId, i32) {
	let TreeNode {
		key,
		value,
		count,
		left,
		right,
	} = shape;

	let id = tree.arena.alloc(Node {
		key,
		value: value.unwrap_or(key),
		height: 1,
		count,
		parent,
		left: None,
		right: None,
	});
	tree.len += count;

	let mut left_height = 0;
	let mut right_height = 0;
	if let Some(child) = left {
		let (child_id, height) = build(tree, *child, Some(id));
		tree.arena[id].left = Some(child_id);
		left_height = height;
	}
	if let Some(child) = right {
		let (child_id, height) = build(tree, *child, Some(id));
		tree.arena[id].right = Some(child_id);
		right_height = height;
	}

	tree.arena[id].height = 1 + left_height.max(right_height);
	(id, tree.arena[id].height)
}
