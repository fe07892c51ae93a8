//! # Aldertree: Ordered Containers on a Height-Balanced Tree
//!
//! This crate provides ordered associative containers ([`AvlMap`], [`AvlSet`]
//! and [`AvlMultiset`]) backed by a single AVL tree core, together with
//! bidirectional in-order cursors that navigate using parent links only.
//!
//! ## Design Overview
//!
//! **Index arena**: Nodes live in a slab-style arena and are addressed by
//! stable indices. The `parent`, `left` and `right` fields are plain indices,
//! so the link graph is acyclic in ownership terms (the arena owns every
//! node) while staying fully navigable in both directions. Cloning a tree
//! clones the arena; because links are positions rather than pointers, the
//! copy needs no link fixup.
//!
//! **Height balance**: Every node stores its subtree height. After each
//! insertion or removal the ancestors of the mutation point are rebalanced
//! with single or double rotations, keeping the height difference between
//! sibling subtrees within one. Rotations touch a constant number of nodes
//! and recompute exactly the two affected heights.
//!
//! **Duplicate counts**: The tree stores one node per distinct key with a
//! per-node multiplicity. The unique-key containers keep the multiplicity at
//! one; [`AvlMultiset`] increments it instead of allocating sibling nodes.
//!
//! **Stackless iteration**: Cursors step to the in-order successor or
//! predecessor through child and parent links alone, with no auxiliary stack and
//! no comparisons. A full traversal is O(n); a single step is O(log n) worst
//! case and amortized O(1).
//!
//! ## Basic Usage
//!
//! ```
//! use aldertree::AvlMap;
//!
//! let mut map = AvlMap::new();
//! map.insert("b", 2);
//! map.insert("a", 1);
//!
//! assert_eq!(map.get(&"a"), Some(&1));
//! let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, ["a", "b"]);
//! ```
//!
//! ## Thread Safety
//!
//! The containers are single-threaded: mutation requires `&mut self`, and
//! the borrow checker enforces the external serialization a caller sharing
//! an instance would otherwise need. There is no internal locking.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

pub mod error;
pub mod iter;
pub mod map;
pub mod multiset;
pub mod set;

#[cfg(any(test, feature = "test-utils"))]
pub mod util;

pub use error::{Error, Result};
pub use map::AvlMap;
pub use multiset::AvlMultiset;
pub use set::AvlSet;

use iter::{Iter, RawIter, RawIterMut};

// ---------------------------------------------------------------------------
// Node Store
// ---------------------------------------------------------------------------

/// Stable index of a node inside the arena.
///
/// A `NodeId` stays valid until the node it names is removed from the tree.
/// Indices are 32 bits; an arena cannot hold more than `u32::MAX` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(u32);

impl NodeId {
	fn new(index: usize) -> NodeId {
		NodeId(u32::try_from(index).expect("arena exceeds u32::MAX slots"))
	}

	fn index(self) -> usize {
		self.0 as usize
	}
}

/// A single tree node: entry payload plus structural links.
///
/// The `count` field is the duplicate multiplicity. Unique-key operations
/// keep it at 1; counted operations increment it in place.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
	pub(crate) height: i32,
	pub(crate) count: usize,
	pub(crate) parent: Option<NodeId>,
	pub(crate) left: Option<NodeId>,
	pub(crate) right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
	fn leaf(key: K, value: V) -> Node<K, V> {
		Node {
			key,
			value,
			height: 1,
			count: 1,
			parent: None,
			left: None,
			right: None,
		}
	}
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
	Occupied(Node<K, V>),
	Vacant { next_free: Option<NodeId> },
}

/// Slab-style node arena with an intrusive free list.
///
/// Freed slots are chained through `Vacant.next_free` and reused before the
/// backing vector grows, so a long insert/remove workload does not leak
/// capacity.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<K, V> {
	slots: Vec<Slot<K, V>>,
	free_head: Option<NodeId>,
	occupied: usize,
}

impl<K, V> NodeArena<K, V> {
	fn new() -> NodeArena<K, V> {
		NodeArena {
			slots: Vec::new(),
			free_head: None,
			occupied: 0,
		}
	}

	pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
		self.occupied += 1;
		match self.free_head {
			Some(id) => {
				let next_free = match self.slots[id.index()] {
					Slot::Vacant { next_free } => next_free,
					Slot::Occupied(_) => panic!("free list points at an occupied slot"),
				};
				self.free_head = next_free;
				self.slots[id.index()] = Slot::Occupied(node);
				id
			}
			None => {
				let id = NodeId::new(self.slots.len());
				self.slots.push(Slot::Occupied(node));
				id
			}
		}
	}

	fn free(&mut self, id: NodeId) -> Node<K, V> {
		let slot = mem::replace(
			&mut self.slots[id.index()],
			Slot::Vacant {
				next_free: self.free_head,
			},
		);
		match slot {
			Slot::Occupied(node) => {
				self.free_head = Some(id);
				self.occupied -= 1;
				node
			}
			Slot::Vacant { .. } => panic!("double free of node id {:?}", id),
		}
	}

	fn clear(&mut self) {
		self.slots.clear();
		self.free_head = None;
		self.occupied = 0;
	}

	pub(crate) fn occupied(&self) -> usize {
		self.occupied
	}

	pub(crate) fn slot_capacity(&self) -> usize {
		self.slots.len()
	}

	/// Disjoint mutable access to two distinct nodes.
	fn get_pair_mut(&mut self, a: NodeId, b: NodeId) -> (&mut Node<K, V>, &mut Node<K, V>) {
		assert_ne!(a, b, "get_pair_mut requires distinct ids");
		let (lo, hi) = (a.index().min(b.index()), a.index().max(b.index()));
		let (head, tail) = self.slots.split_at_mut(hi);
		let lo_node = match &mut head[lo] {
			Slot::Occupied(node) => node,
			Slot::Vacant { .. } => panic!("dangling node id"),
		};
		let hi_node = match &mut tail[0] {
			Slot::Occupied(node) => node,
			Slot::Vacant { .. } => panic!("dangling node id"),
		};
		if a.index() < b.index() {
			(lo_node, hi_node)
		} else {
			(hi_node, lo_node)
		}
	}
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
	type Output = Node<K, V>;

	fn index(&self, id: NodeId) -> &Node<K, V> {
		match &self.slots[id.index()] {
			Slot::Occupied(node) => node,
			Slot::Vacant { .. } => panic!("dangling node id {:?}", id),
		}
	}
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
	fn index_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
		match &mut self.slots[id.index()] {
			Slot::Occupied(node) => node,
			Slot::Vacant { .. } => panic!("dangling node id {:?}", id),
		}
	}
}

// ---------------------------------------------------------------------------
// Core Tree Structure
// ---------------------------------------------------------------------------

/// Outcome of an insertion at the core level.
struct InsertOutcome<V> {
	node: NodeId,
	inserted: bool,
	previous: Option<V>,
}

/// How an insertion resolves an equal key already in the tree.
#[derive(Clone, Copy, PartialEq)]
enum InsertMode {
	/// Leave the existing entry untouched.
	Unique,
	/// Replace the existing value, reporting the previous one.
	Assign,
	/// Increment the duplicate count.
	Counted,
}

/// A height-balanced binary search tree over an index arena.
///
/// `Tree` is the engine underneath the container facades. Its public surface
/// behaves like an ordered map with replace-on-duplicate semantics; the
/// facades reach the unique-key and counted insertion paths through
/// crate-internal methods.
///
/// The length is a cached logical count (the sum of duplicate multiplicities),
/// so [`Tree::len`] is O(1).
///
/// # Example
///
/// ```
/// use aldertree::Tree;
///
/// let mut tree: Tree<i32, &str> = Tree::new();
/// assert_eq!(tree.insert(1, "one"), None);
/// assert_eq!(tree.insert(1, "uno"), Some("one"));
/// assert_eq!(tree.get(&1), Some(&"uno"));
/// ```
#[derive(Clone)]
pub struct Tree<K, V> {
	pub(crate) arena: NodeArena<K, V>,
	pub(crate) root: Option<NodeId>,
	pub(crate) len: usize,
}

impl<K, V> Tree<K, V> {
	// -----------------------------------------------------------------------
	// Construction and Metadata
	// -----------------------------------------------------------------------

	/// Creates a new, empty tree. Does not allocate until the first insert.
	pub fn new() -> Tree<K, V> {
		Tree {
			arena: NodeArena::new(),
			root: None,
			len: 0,
		}
	}

	/// Logical number of entries, duplicate counts included. O(1).
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Height of the tree: 0 when empty, 1 for a lone root.
	pub fn height(&self) -> i32 {
		self.height_of(self.root)
	}

	/// Removes every entry. The arena is reset wholesale; no per-node
	/// traversal happens.
	pub fn clear(&mut self) {
		self.arena.clear();
		self.root = None;
		self.len = 0;
	}

	/// Number of distinct keys (arena nodes), ignoring duplicate counts.
	pub(crate) fn node_count(&self) -> usize {
		self.arena.occupied()
	}

	pub(crate) fn key(&self, id: NodeId) -> &K {
		&self.arena[id].key
	}

	pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut V {
		&mut self.arena[id].value
	}

	pub(crate) fn entry(&self, id: NodeId) -> (&K, &V) {
		let node = &self.arena[id];
		(&node.key, &node.value)
	}

	pub(crate) fn entry_mut(&mut self, id: NodeId) -> (&K, &mut V) {
		let node = &mut self.arena[id];
		(&node.key, &mut node.value)
	}

	pub(crate) fn count(&self, id: NodeId) -> usize {
		self.arena[id].count
	}

	// -----------------------------------------------------------------------
	// Navigation (link following only, no key comparisons)
	// -----------------------------------------------------------------------

	fn height_of(&self, link: Option<NodeId>) -> i32 {
		link.map_or(0, |id| self.arena[id].height)
	}

	pub(crate) fn min_node(&self) -> Option<NodeId> {
		self.root.map(|root| self.subtree_min(root))
	}

	pub(crate) fn max_node(&self) -> Option<NodeId> {
		self.root.map(|root| self.subtree_max(root))
	}

	fn subtree_min(&self, mut id: NodeId) -> NodeId {
		while let Some(left) = self.arena[id].left {
			id = left;
		}
		id
	}

	fn subtree_max(&self, mut id: NodeId) -> NodeId {
		while let Some(right) = self.arena[id].right {
			id = right;
		}
		id
	}

	/// In-order successor via parent links.
	///
	/// With a right child, the successor is the minimum of that subtree.
	/// Otherwise walk upward while the node is a right child; the first
	/// ancestor reached from the left is the successor, and walking past
	/// the root means the node was the maximum.
	pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
		if let Some(right) = self.arena[id].right {
			return Some(self.subtree_min(right));
		}
		let mut current = id;
		let mut parent = self.arena[current].parent;
		while let Some(up) = parent {
			if self.arena[up].right == Some(current) {
				current = up;
				parent = self.arena[up].parent;
			} else {
				return Some(up);
			}
		}
		None
	}

	/// In-order predecessor; mirror of [`Tree::successor`].
	pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId> {
		if let Some(left) = self.arena[id].left {
			return Some(self.subtree_max(left));
		}
		let mut current = id;
		let mut parent = self.arena[current].parent;
		while let Some(up) = parent {
			if self.arena[up].left == Some(current) {
				current = up;
				parent = self.arena[up].parent;
			} else {
				return Some(up);
			}
		}
		None
	}

	// -----------------------------------------------------------------------
	// Iteration
	// -----------------------------------------------------------------------

	/// A raw shared cursor, positioned at the end. Seek before stepping.
	pub fn raw_iter(&self) -> RawIter<'_, K, V> {
		RawIter::new(self)
	}

	/// A raw exclusive cursor supporting in-place mutation.
	pub fn raw_iter_mut(&mut self) -> RawIterMut<'_, K, V> {
		RawIterMut::new(self)
	}

	/// Double-ended iterator over `(&K, &V)` in key order. Duplicate counts
	/// are not expanded; each distinct key appears once.
	pub fn iter(&self) -> Iter<'_, K, V> {
		Iter::new(self)
	}
}

impl<K: Ord, V> Tree<K, V> {
	// -----------------------------------------------------------------------
	// Queries
	// -----------------------------------------------------------------------

	/// Standard BST descent. O(log n) thanks to the balance invariant.
	pub(crate) fn find_node<Q>(&self, key: &Q) -> Option<NodeId>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let mut current = self.root;
		while let Some(id) = current {
			let node = &self.arena[id];
			match key.cmp(node.key.borrow()) {
				Ordering::Less => current = node.left,
				Ordering::Greater => current = node.right,
				Ordering::Equal => return Some(id),
			}
		}
		None
	}

	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.find_node(key).map(|id| &self.arena[id].value)
	}

	pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let id = self.find_node(key)?;
		Some(&mut self.arena[id].value)
	}

	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.find_node(key).is_some()
	}

	/// Duplicate count of `key`, or 0 when absent.
	pub(crate) fn count_of<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.find_node(key).map_or(0, |id| self.arena[id].count)
	}

	/// First node with key `>= key`, if any.
	pub(crate) fn lower_bound_node<Q>(&self, key: &Q) -> Option<NodeId>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let mut current = self.root;
		let mut best = None;
		while let Some(id) = current {
			let node = &self.arena[id];
			if node.key.borrow() >= key {
				best = Some(id);
				current = node.left;
			} else {
				current = node.right;
			}
		}
		best
	}

	/// First node with key `> key`, if any.
	pub(crate) fn upper_bound_node<Q>(&self, key: &Q) -> Option<NodeId>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let mut current = self.root;
		let mut best = None;
		while let Some(id) = current {
			let node = &self.arena[id];
			if node.key.borrow() > key {
				best = Some(id);
				current = node.left;
			} else {
				current = node.right;
			}
		}
		best
	}

	pub fn first(&self) -> Option<(&K, &V)> {
		self.min_node().map(|id| self.entry(id))
	}

	pub fn last(&self) -> Option<(&K, &V)> {
		self.max_node().map(|id| self.entry(id))
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Inserts `key -> value`, replacing and returning the previous value if
	/// the key was present.
	pub fn insert(&mut self, key: K, value: V) -> Option<V> {
		self.insert_assign(key, value).1
	}

	/// Unique-key insertion: an equal key leaves the tree untouched.
	/// Returns the node holding the key and whether a new node was created.
	pub(crate) fn insert_unique(&mut self, key: K, value: V) -> (NodeId, bool) {
		let outcome = self.insert_inner(key, value, InsertMode::Unique);
		(outcome.node, outcome.inserted)
	}

	/// Replace-on-duplicate insertion. Returns the node and the previous
	/// value when one was displaced.
	pub(crate) fn insert_assign(&mut self, key: K, value: V) -> (NodeId, Option<V>) {
		let outcome = self.insert_inner(key, value, InsertMode::Assign);
		(outcome.node, outcome.previous)
	}

	/// Counted insertion: an equal key bumps the duplicate count. The
	/// logical length grows either way.
	pub(crate) fn insert_counted(&mut self, key: K, value: V) -> NodeId {
		self.insert_inner(key, value, InsertMode::Counted).node
	}

	/// Adds `extra` duplicates to an existing node.
	pub(crate) fn bump_count(&mut self, id: NodeId, extra: usize) {
		self.arena[id].count += extra;
		self.len += extra;
	}

	/// Removes one duplicate from a node that holds several.
	pub(crate) fn decrement_count(&mut self, id: NodeId) {
		debug_assert!(self.arena[id].count > 1);
		self.arena[id].count -= 1;
		self.len -= 1;
	}

	fn insert_inner(&mut self, key: K, value: V, mode: InsertMode) -> InsertOutcome<V> {
		let (new_root, outcome) = self.insert_rec(self.root, key, value, mode);
		self.root = Some(new_root);
		debug_assert!(self.arena[new_root].parent.is_none());
		if outcome.inserted || mode == InsertMode::Counted {
			self.len += 1;
		}
		outcome
	}

	/// Recursive descent to the insertion point. Each frame of the return
	/// path refreshes the node height and rebalances, threading a possibly
	/// new subtree root back to its parent.
	fn insert_rec(
		&mut self,
		link: Option<NodeId>,
		key: K,
		value: V,
		mode: InsertMode,
	) -> (NodeId, InsertOutcome<V>) {
		let Some(id) = link else {
			let id = self.arena.alloc(Node::leaf(key, value));
			let outcome = InsertOutcome {
				node: id,
				inserted: true,
				previous: None,
			};
			return (id, outcome);
		};

		let outcome = match key.cmp(&self.arena[id].key) {
			Ordering::Less => {
				let (child, outcome) = self.insert_rec(self.arena[id].left, key, value, mode);
				self.arena[id].left = Some(child);
				self.arena[child].parent = Some(id);
				outcome
			}
			Ordering::Greater => {
				let (child, outcome) = self.insert_rec(self.arena[id].right, key, value, mode);
				self.arena[id].right = Some(child);
				self.arena[child].parent = Some(id);
				outcome
			}
			Ordering::Equal => {
				let node = &mut self.arena[id];
				match mode {
					InsertMode::Unique => InsertOutcome {
						node: id,
						inserted: false,
						previous: None,
					},
					InsertMode::Assign => InsertOutcome {
						node: id,
						inserted: false,
						previous: Some(mem::replace(&mut node.value, value)),
					},
					InsertMode::Counted => {
						node.count += 1;
						InsertOutcome {
							node: id,
							inserted: false,
							previous: None,
						}
					}
				}
			}
		};

		self.update_height(id);
		(self.rebalance(id), outcome)
	}

	// -----------------------------------------------------------------------
	// Removal
	// -----------------------------------------------------------------------

	/// Removes `key` entirely, duplicate count included.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.remove_full(key).map(|(_, value, _)| value)
	}

	pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.remove_full(key).map(|(key, value, _)| (key, value))
	}

	/// Removes the node holding `key` with its whole duplicate count.
	pub(crate) fn remove_full<Q>(&mut self, key: &Q) -> Option<(K, V, usize)>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let id = self.find_node(key)?;
		let node = self.detach_node(id);
		self.len -= node.count;
		Some((node.key, node.value, node.count))
	}

	/// Removes a single duplicate of `key`; the node goes away only when
	/// its count reaches zero. Returns whether anything was removed.
	pub(crate) fn remove_single<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let Some(id) = self.find_node(key) else {
			return false;
		};
		if self.arena[id].count > 1 {
			self.decrement_count(id);
		} else {
			self.detach_node(id);
			self.len -= 1;
		}
		true
	}

	/// Position-based removal: splices the known node directly, with no
	/// key re-descent. The whole duplicate count is removed.
	pub(crate) fn remove_node(&mut self, id: NodeId) -> (K, V) {
		let node = self.detach_node(id);
		self.len -= node.count;
		(node.key, node.value)
	}

	pub fn pop_first(&mut self) -> Option<(K, V)> {
		let id = self.min_node()?;
		Some(self.remove_node(id))
	}

	pub fn pop_last(&mut self) -> Option<(K, V)> {
		let id = self.max_node()?;
		Some(self.remove_node(id))
	}

	/// Unlinks a node from the tree and returns it.
	///
	/// A node with two children first swaps its entry with the in-order
	/// predecessor (maximum of the left subtree); the predecessor node then
	/// has at most one child and is the one spliced out. Ancestors of the
	/// splice point are rebalanced on the way back to the root.
	fn detach_node(&mut self, id: NodeId) -> Node<K, V> {
		let node = &self.arena[id];
		let target = if node.left.is_some() && node.right.is_some() {
			let left = node.left.expect("checked above");
			let pred = self.subtree_max(left);
			let (kept, out) = self.arena.get_pair_mut(id, pred);
			mem::swap(&mut kept.key, &mut out.key);
			mem::swap(&mut kept.value, &mut out.value);
			mem::swap(&mut kept.count, &mut out.count);
			pred
		} else {
			id
		};
		self.splice(target)
	}

	/// Splices a node with at most one child out of the tree: the child (or
	/// nothing) takes the node's slot in the parent.
	fn splice(&mut self, id: NodeId) -> Node<K, V> {
		let parent = self.arena[id].parent;
		let child = self.arena[id].left.or(self.arena[id].right);
		if let Some(child) = child {
			self.arena[child].parent = parent;
		}
		match parent {
			Some(up) => {
				if self.arena[up].left == Some(id) {
					self.arena[up].left = child;
				} else {
					debug_assert_eq!(self.arena[up].right, Some(id));
					self.arena[up].right = child;
				}
			}
			None => self.root = child,
		}
		let removed = self.arena.free(id);
		self.rebalance_upward(parent);
		removed
	}

	/// Walks from a structural change back to the root, refreshing heights
	/// and rebalancing. Rotated subtrees are re-linked into their parents.
	fn rebalance_upward(&mut self, mut current: Option<NodeId>) {
		while let Some(id) = current {
			self.update_height(id);
			let parent = self.arena[id].parent;
			let was_left = parent.map(|up| self.arena[up].left == Some(id));
			let new_root = self.rebalance(id);
			if new_root != id {
				match parent {
					Some(up) => {
						if was_left == Some(true) {
							self.arena[up].left = Some(new_root);
						} else {
							self.arena[up].right = Some(new_root);
						}
					}
					None => self.root = Some(new_root),
				}
			}
			current = parent;
		}
	}

	// -----------------------------------------------------------------------
	// Balance Engine
	// -----------------------------------------------------------------------

	fn balance_factor(&self, id: NodeId) -> i32 {
		let node = &self.arena[id];
		self.height_of(node.left) - self.height_of(node.right)
	}

	/// Recomputes one node's height from its children. O(1); rotations call
	/// this for exactly the two nodes they move.
	fn update_height(&mut self, id: NodeId) {
		let (left, right) = {
			let node = &self.arena[id];
			(node.left, node.right)
		};
		let height = 1 + self.height_of(left).max(self.height_of(right));
		self.arena[id].height = height;
	}

	/// Single right rotation. The left child pivots upward; the middle
	/// subtree relinks under the demoted node. Parent indices of all three
	/// touched nodes are fixed here; the caller re-links the returned
	/// subtree root into the grandparent slot.
	fn rotate_right(&mut self, id: NodeId) -> NodeId {
		let pivot = self.arena[id].left.expect("rotate_right needs a left child");
		let middle = self.arena[pivot].right;

		self.arena[id].left = middle;
		if let Some(middle) = middle {
			self.arena[middle].parent = Some(id);
		}

		let parent = self.arena[id].parent;
		self.arena[pivot].right = Some(id);
		self.arena[pivot].parent = parent;
		self.arena[id].parent = Some(pivot);

		self.update_height(id);
		self.update_height(pivot);
		pivot
	}

	/// Single left rotation; mirror of [`Tree::rotate_right`].
	fn rotate_left(&mut self, id: NodeId) -> NodeId {
		let pivot = self.arena[id].right.expect("rotate_left needs a right child");
		let middle = self.arena[pivot].left;

		self.arena[id].right = middle;
		if let Some(middle) = middle {
			self.arena[middle].parent = Some(id);
		}

		let parent = self.arena[id].parent;
		self.arena[pivot].left = Some(id);
		self.arena[pivot].parent = parent;
		self.arena[id].parent = Some(pivot);

		self.update_height(id);
		self.update_height(pivot);
		pivot
	}

	/// Restores the AVL invariant at one node, returning the subtree root
	/// after at most one single or double rotation.
	///
	/// Left-heavy with a right-heavy left child is the left-right case: the
	/// left child rotates left first, reducing it to a plain left-left
	/// rotation. Mirrored for the right side.
	fn rebalance(&mut self, id: NodeId) -> NodeId {
		let balance = self.balance_factor(id);
		if balance > 1 {
			let left = self.arena[id].left.expect("left-heavy node has a left child");
			if self.balance_factor(left) < 0 {
				let new_left = self.rotate_left(left);
				self.arena[id].left = Some(new_left);
			}
			self.rotate_right(id)
		} else if balance < -1 {
			let right = self.arena[id].right.expect("right-heavy node has a right child");
			if self.balance_factor(right) > 0 {
				let new_right = self.rotate_right(right);
				self.arena[id].right = Some(new_right);
			}
			self.rotate_left(id)
		} else {
			id
		}
	}
}

impl<K, V> Default for Tree<K, V> {
	fn default() -> Tree<K, V> {
		Tree::new()
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Tree<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K: Ord, V> FromIterator<(K, V)> for Tree<K, V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(items: I) -> Tree<K, V> {
		let mut tree = Tree::new();
		tree.extend(items);
		tree
	}
}

impl<K: Ord, V> Extend<(K, V)> for Tree<K, V> {
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, items: I) {
		for (key, value) in items {
			self.insert(key, value);
		}
	}
}

// ===========================================================================
// Test-Only Validation
// ===========================================================================

/// Invariant validation for testing. Any violation here is a programming
/// error in the tree itself, never a recoverable runtime condition.
#[cfg(any(test, feature = "test-utils"))]
impl<K: Ord + fmt::Debug, V> Tree<K, V> {
	/// Validates every structural invariant, panicking with diagnostics on
	/// the first violation.
	///
	/// # Invariants Checked
	///
	/// 1. BST order: keys strictly increase in an in-order walk
	/// 2. Height: each stored height is `1 + max(children)`
	/// 3. AVL balance: `|height(left) - height(right)| <= 1`
	/// 4. Parent links: each child points back at its parent; the root
	///    points at nothing
	/// 5. Counts: every node carries `count >= 1`; the cached length equals
	///    the sum of counts
	/// 6. Arena: occupied slots equal reachable nodes (no strays)
	pub fn assert_invariants(&self) {
		let Some(root) = self.root else {
			assert_eq!(self.len, 0, "empty tree with nonzero cached length");
			assert_eq!(self.arena.occupied(), 0, "empty tree with live arena slots");
			return;
		};
		assert!(
			self.arena[root].parent.is_none(),
			"root {:?} has a parent link",
			self.arena[root].key
		);
		let (nodes, logical, _) = self.validate_subtree(root, None, None);
		assert_eq!(logical, self.len, "cached length diverges from node counts");
		assert_eq!(
			nodes,
			self.arena.occupied(),
			"arena holds slots unreachable from the root"
		);
	}

	/// Returns `(reachable nodes, summed counts, computed height)`.
	fn validate_subtree(
		&self,
		id: NodeId,
		lower: Option<&K>,
		upper: Option<&K>,
	) -> (usize, usize, i32) {
		let node = &self.arena[id];

		if let Some(lower) = lower {
			assert!(
				node.key > *lower,
				"BST violation: {:?} is not above its lower bound {:?}",
				node.key,
				lower
			);
		}
		if let Some(upper) = upper {
			assert!(
				node.key < *upper,
				"BST violation: {:?} is not below its upper bound {:?}",
				node.key,
				upper
			);
		}
		assert!(node.count >= 1, "node {:?} has a zero count", node.key);

		let mut nodes = 1;
		let mut logical = node.count;
		let mut left_height = 0;
		let mut right_height = 0;

		if let Some(left) = node.left {
			assert_eq!(
				self.arena[left].parent,
				Some(id),
				"left child of {:?} has a stale parent link",
				node.key
			);
			let (n, l, h) = self.validate_subtree(left, lower, Some(&node.key));
			nodes += n;
			logical += l;
			left_height = h;
		}
		if let Some(right) = node.right {
			assert_eq!(
				self.arena[right].parent,
				Some(id),
				"right child of {:?} has a stale parent link",
				node.key
			);
			let (n, l, h) = self.validate_subtree(right, Some(&node.key), upper);
			nodes += n;
			logical += l;
			right_height = h;
		}

		let height = 1 + left_height.max(right_height);
		assert_eq!(
			node.height, height,
			"stored height of {:?} diverges from its subtrees",
			node.key
		);
		assert!(
			(left_height - right_height).abs() <= 1,
			"AVL violation at {:?}: balance factor {}",
			node.key,
			left_height - right_height
		);

		(nodes, logical, height)
	}
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
	use super::*;

	// -----------------------------------------------------------------------
	// Basic Tree Operation Tests
	// -----------------------------------------------------------------------

	#[test]
	fn basic_insert_and_get() {
		let mut tree: Tree<i32, &str> = Tree::new();

		assert_eq!(tree.insert(1, "one"), None);
		assert_eq!(tree.insert(2, "two"), None);
		assert_eq!(tree.insert(3, "three"), None);

		tree.assert_invariants();

		assert_eq!(tree.get(&1), Some(&"one"));
		assert_eq!(tree.get(&2), Some(&"two"));
		assert_eq!(tree.get(&3), Some(&"three"));
		assert_eq!(tree.get(&4), None);
	}

	#[test]
	fn insert_replaces() {
		let mut tree: Tree<i32, &str> = Tree::new();

		assert_eq!(tree.insert(1, "one"), None);
		assert_eq!(tree.insert(1, "uno"), Some("one"));
		assert_eq!(tree.get(&1), Some(&"uno"));
		assert_eq!(tree.len(), 1);

		tree.assert_invariants();
	}

	#[test]
	fn insert_unique_leaves_existing() {
		let mut tree: Tree<i32, &str> = Tree::new();

		let (first, inserted) = tree.insert_unique(7, "first");
		assert!(inserted);
		let (again, inserted) = tree.insert_unique(7, "second");
		assert!(!inserted);
		assert_eq!(first, again);
		assert_eq!(tree.get(&7), Some(&"first"));
		assert_eq!(tree.len(), 1);
	}

	#[test]
	fn remove_leaf_inner_and_root() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in [5, 3, 8, 1, 4, 7, 9] {
			tree.insert(key, key * 10);
		}

		// leaf
		assert_eq!(tree.remove(&1), Some(10));
		tree.assert_invariants();

		// node with two children
		assert_eq!(tree.remove(&3), Some(30));
		tree.assert_invariants();

		// root
		assert_eq!(tree.remove(&5), Some(50));
		tree.assert_invariants();

		assert_eq!(tree.remove(&5), None);
		assert_eq!(tree.len(), 4);
		for key in [4, 7, 8, 9] {
			assert!(tree.contains_key(&key), "key {} lost", key);
		}
	}

	#[test]
	fn sequential_inserts_stay_balanced() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in 0..1000 {
			tree.insert(key, key);
		}
		tree.assert_invariants();
		// 1.44 * log2(1001) is a little under 15
		assert!(tree.height() <= 15, "height {} too large", tree.height());
	}

	#[test]
	fn reverse_inserts_stay_balanced() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in (0..1000).rev() {
			tree.insert(key, key);
		}
		tree.assert_invariants();
		assert!(tree.height() <= 15, "height {} too large", tree.height());
	}

	#[test]
	fn counted_inserts_share_a_node() {
		let mut tree: Tree<i32, ()> = Tree::new();
		let a = tree.insert_counted(2, ());
		let b = tree.insert_counted(2, ());
		let c = tree.insert_counted(2, ());
		assert_eq!(a, b);
		assert_eq!(b, c);
		tree.insert_counted(5, ());
		tree.insert_counted(5, ());

		tree.assert_invariants();
		assert_eq!(tree.len(), 5);
		assert_eq!(tree.node_count(), 2);
		assert_eq!(tree.count_of(&2), 3);
		assert_eq!(tree.count_of(&5), 2);
		assert_eq!(tree.count_of(&9), 0);
	}

	#[test]
	fn remove_single_decrements_before_detaching() {
		let mut tree: Tree<i32, ()> = Tree::new();
		for _ in 0..3 {
			tree.insert_counted(4, ());
		}

		assert!(tree.remove_single(&4));
		assert_eq!(tree.count_of(&4), 2);
		assert!(tree.remove_single(&4));
		assert!(tree.remove_single(&4));
		assert!(!tree.remove_single(&4));
		assert!(tree.is_empty());

		tree.assert_invariants();
	}

	#[test]
	fn pop_first_and_last() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in [5, 3, 8, 1, 4] {
			tree.insert(key, key);
		}

		assert_eq!(tree.pop_first(), Some((1, 1)));
		assert_eq!(tree.pop_last(), Some((8, 8)));
		tree.assert_invariants();
		assert_eq!(tree.len(), 3);
	}

	#[test]
	fn clear_resets_everything() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in 0..100 {
			tree.insert(key, key);
		}
		tree.clear();

		assert!(tree.is_empty());
		assert_eq!(tree.height(), 0);
		tree.assert_invariants();

		// reusable after clear
		tree.insert(1, 1);
		assert_eq!(tree.len(), 1);
	}

	#[test]
	fn clone_is_independent() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in 0..50 {
			tree.insert(key, key);
		}

		let copy = tree.clone();
		tree.remove(&25);
		tree.insert(999, 999);

		copy.assert_invariants();
		assert_eq!(copy.len(), 50);
		assert!(copy.contains_key(&25));
		assert!(!copy.contains_key(&999));
	}

	#[test]
	fn move_empties_source() {
		let mut tree: Tree<i32, i32> = Tree::new();
		tree.insert(1, 1);

		let moved = mem::take(&mut tree);
		assert!(tree.is_empty());
		assert_eq!(moved.len(), 1);
	}

	#[test]
	fn successor_walk_covers_all_keys() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in [5, 3, 8, 1, 4, 7, 9] {
			tree.insert(key, key);
		}

		let mut keys = Vec::new();
		let mut current = tree.min_node();
		while let Some(id) = current {
			keys.push(*tree.key(id));
			current = tree.successor(id);
		}
		assert_eq!(keys, [1, 3, 4, 5, 7, 8, 9]);
	}

	#[test]
	fn predecessor_walk_is_reversed() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in [5, 3, 8, 1, 4, 7, 9] {
			tree.insert(key, key);
		}

		let mut keys = Vec::new();
		let mut current = tree.max_node();
		while let Some(id) = current {
			keys.push(*tree.key(id));
			current = tree.predecessor(id);
		}
		assert_eq!(keys, [9, 8, 7, 5, 4, 3, 1]);
	}

	#[test]
	fn bound_nodes() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in [10, 20, 30] {
			tree.insert(key, key);
		}

		let at = |id: Option<NodeId>| id.map(|id| *tree.key(id));
		assert_eq!(at(tree.lower_bound_node(&5)), Some(10));
		assert_eq!(at(tree.lower_bound_node(&10)), Some(10));
		assert_eq!(at(tree.lower_bound_node(&11)), Some(20));
		assert_eq!(at(tree.lower_bound_node(&31)), None);
		assert_eq!(at(tree.upper_bound_node(&10)), Some(20));
		assert_eq!(at(tree.upper_bound_node(&30)), None);
	}

	#[test]
	fn arena_reuses_freed_slots() {
		let mut tree: Tree<i32, i32> = Tree::new();
		for key in 0..100 {
			tree.insert(key, key);
		}
		for key in 0..100 {
			tree.remove(&key);
		}
		for key in 0..100 {
			tree.insert(key, key);
		}

		tree.assert_invariants();
		assert_eq!(tree.arena.slot_capacity(), 100, "freed slots were not reused");
	}

	#[test]
	fn borrowed_key_lookups() {
		let mut tree: Tree<String, i32> = Tree::new();
		tree.insert("alpha".to_string(), 1);
		tree.insert("beta".to_string(), 2);

		// &str lookups against String keys
		assert_eq!(tree.get("alpha"), Some(&1));
		assert!(tree.contains_key("beta"));
		assert_eq!(tree.remove("alpha"), Some(1));
	}
}
