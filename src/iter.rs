//! Cursors and iterators for the tree core.
//!
//! All movement here follows parent and child links; no auxiliary stack is
//! kept and no key comparison happens during a step. A cursor models a *gap*
//! between entries: `next()` yields the entry after the gap and moves past
//! it, `prev()` the entry before the gap. The gap after the maximum entry is
//! the end position.

use crate::{NodeId, Tree};
use std::borrow::Borrow;
use std::iter::FusedIterator;

/// Raw shared cursor over the entries of a [`Tree`].
///
/// Freshly created cursors sit at the end position; call one of the seek
/// methods before stepping. Because the cursor borrows the tree shared, the
/// tree cannot change underneath it, and the maximum node remembered at
/// creation stays valid for the cursor's whole life. This is what lets
/// `prev()` step backwards from the end without a sentinel node in the tree.
pub struct RawIter<'t, K, V> {
	tree: &'t Tree<K, V>,
	/// Node after the gap; `None` is the end position.
	next: Option<NodeId>,
	/// Maximum node at creation time, for stepping back from the end.
	last: Option<NodeId>,
}

impl<'t, K, V> RawIter<'t, K, V> {
	pub(crate) fn new(tree: &'t Tree<K, V>) -> RawIter<'t, K, V> {
		RawIter {
			tree,
			next: None,
			last: tree.max_node(),
		}
	}

	/// A cursor positioned before `node` (or at the end for `None`).
	pub(crate) fn at(tree: &'t Tree<K, V>, node: Option<NodeId>) -> RawIter<'t, K, V> {
		RawIter {
			tree,
			next: node,
			last: tree.max_node(),
		}
	}

	pub(crate) fn current(&self) -> Option<NodeId> {
		self.next
	}

	pub(crate) fn tree(&self) -> &'t Tree<K, V> {
		self.tree
	}

	/// The entry after the gap, without moving.
	pub fn peek(&self) -> Option<(&'t K, &'t V)> {
		self.next.map(|id| self.tree.entry(id))
	}

	/// Whether the cursor is at the one-past-the-end position.
	pub fn is_end(&self) -> bool {
		self.next.is_none()
	}

	/// Positions before the first entry.
	pub fn seek_to_first(&mut self) {
		self.next = self.tree.min_node();
	}

	/// Positions at the end, after the last entry.
	pub fn seek_to_last(&mut self) {
		self.next = None;
	}

	/// Yields the entry after the gap and advances past it.
	pub fn next(&mut self) -> Option<(&'t K, &'t V)> {
		let id = self.next?;
		self.next = self.tree.successor(id);
		Some(self.tree.entry(id))
	}

	/// Yields the entry before the gap and retreats before it. From the end
	/// position this lands on the tree maximum.
	pub fn prev(&mut self) -> Option<(&'t K, &'t V)> {
		let id = match self.next {
			Some(id) => self.tree.predecessor(id)?,
			None => self.last?,
		};
		self.next = Some(id);
		Some(self.tree.entry(id))
	}
}

impl<'t, K: Ord, V> RawIter<'t, K, V> {
	/// Positions before the first entry with key `>= key`, so that `next()`
	/// yields it. With no such entry the cursor lands at the end.
	pub fn seek<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.next = self.tree.lower_bound_node(key);
	}

	/// Positions after the last entry with key `<= key`, so that `prev()`
	/// yields it.
	pub fn seek_for_prev<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.next = self.tree.upper_bound_node(key);
	}

	/// Positions before `key` if present and returns `true`; otherwise
	/// behaves like [`RawIter::seek`] and returns `false`.
	pub fn seek_exact<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		match self.tree.find_node(key) {
			Some(id) => {
				self.next = Some(id);
				true
			}
			None => {
				self.seek(key);
				false
			}
		}
	}
}

impl<'t, K, V> Clone for RawIter<'t, K, V> {
	fn clone(&self) -> RawIter<'t, K, V> {
		RawIter {
			tree: self.tree,
			next: self.next,
			last: self.last,
		}
	}
}

/// Two cursors are equal when they sit before the same node, or both at
/// the end, of the same tree.
impl<'t, K, V> PartialEq for RawIter<'t, K, V> {
	fn eq(&self, other: &RawIter<'t, K, V>) -> bool {
		std::ptr::eq(self.tree, other.tree) && self.next == other.next
	}
}

impl<'t, K, V> Eq for RawIter<'t, K, V> {}

impl<'t, K: std::fmt::Debug, V> std::fmt::Debug for RawIter<'t, K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RawIter")
			.field("key", &self.peek().map(|(key, _)| key))
			.finish()
	}
}

/// Raw exclusive cursor: the same gap model as [`RawIter`], plus in-place
/// mutation of values and insertion/removal through the cursor.
///
/// The tree can change while this cursor exists (through the cursor itself),
/// so the end-to-maximum step consults the live tree instead of a remembered
/// node.
pub struct RawIterMut<'t, K, V> {
	tree: &'t mut Tree<K, V>,
	next: Option<NodeId>,
}

impl<'t, K, V> RawIterMut<'t, K, V> {
	pub(crate) fn new(tree: &'t mut Tree<K, V>) -> RawIterMut<'t, K, V> {
		RawIterMut { tree, next: None }
	}

	pub fn is_end(&self) -> bool {
		self.next.is_none()
	}

	pub fn seek_to_first(&mut self) {
		self.next = self.tree.min_node();
	}

	pub fn seek_to_last(&mut self) {
		self.next = None;
	}

	/// Yields the entry after the gap, value mutably, and advances past it.
	pub fn next(&mut self) -> Option<(&K, &mut V)> {
		let id = self.next?;
		self.next = self.tree.successor(id);
		Some(self.tree.entry_mut(id))
	}

	/// Yields the entry before the gap, value mutably, and retreats.
	pub fn prev(&mut self) -> Option<(&K, &mut V)> {
		let id = match self.next {
			Some(id) => self.tree.predecessor(id)?,
			None => self.tree.max_node()?,
		};
		self.next = Some(id);
		Some(self.tree.entry_mut(id))
	}
}

impl<'t, K: Ord, V> RawIterMut<'t, K, V> {
	pub fn seek<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.next = self.tree.lower_bound_node(key);
	}

	pub fn seek_for_prev<Q>(&mut self, key: &Q)
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.next = self.tree.upper_bound_node(key);
	}

	pub fn seek_exact<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		match self.tree.find_node(key) {
			Some(id) => {
				self.next = Some(id);
				true
			}
			None => {
				self.seek(key);
				false
			}
		}
	}

	/// Inserts `key -> value` with replace-on-duplicate semantics and
	/// positions the cursor before the entry.
	pub fn insert(&mut self, key: K, value: V) -> Option<V> {
		let (id, previous) = self.tree.insert_assign(key, value);
		self.next = Some(id);
		previous
	}

	/// Removes `key` by direct node splice: one descent to locate the
	/// node, then pointer surgery, no second descent. The cursor ends up
	/// before the removed entry's successor.
	pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let id = self.tree.find_node(key)?;
		let successor = self.tree.successor(id);
		let entry = self.tree.remove_node(id);
		self.next = successor;
		Some(entry)
	}

	/// Removes the entry at the cursor position (the one `next()` would
	/// yield), purely by link surgery; no key is compared or re-looked-up.
	/// The cursor ends up before the removed entry's successor. Returns
	/// `None` at the end position.
	pub fn remove_next(&mut self) -> Option<(K, V)> {
		let id = self.next?;
		let successor = self.tree.successor(id);
		let entry = self.tree.remove_node(id);
		self.next = successor;
		Some(entry)
	}
}

/// Double-ended in-order iterator over `(&K, &V)`.
///
/// Both ends advance through successor/predecessor stepping; the ends meet
/// exactly once, after which the iterator is fused.
pub struct Iter<'t, K, V> {
	tree: &'t Tree<K, V>,
	front: Option<NodeId>,
	back: Option<NodeId>,
	remaining: usize,
}

impl<'t, K, V> Iter<'t, K, V> {
	pub(crate) fn new(tree: &'t Tree<K, V>) -> Iter<'t, K, V> {
		Iter {
			tree,
			front: tree.min_node(),
			back: tree.max_node(),
			remaining: tree.node_count(),
		}
	}
}

impl<'t, K, V> Iterator for Iter<'t, K, V> {
	type Item = (&'t K, &'t V);

	fn next(&mut self) -> Option<(&'t K, &'t V)> {
		let id = self.front?;
		self.remaining -= 1;
		if self.front == self.back {
			self.front = None;
			self.back = None;
		} else {
			self.front = self.tree.successor(id);
		}
		Some(self.tree.entry(id))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<'t, K, V> DoubleEndedIterator for Iter<'t, K, V> {
	fn next_back(&mut self) -> Option<(&'t K, &'t V)> {
		let id = self.back?;
		self.remaining -= 1;
		if self.front == self.back {
			self.front = None;
			self.back = None;
		} else {
			self.back = self.tree.predecessor(id);
		}
		Some(self.tree.entry(id))
	}
}

impl<'t, K, V> ExactSizeIterator for Iter<'t, K, V> {
	fn len(&self) -> usize {
		self.remaining
	}
}

impl<'t, K, V> FusedIterator for Iter<'t, K, V> {}

impl<'t, K, V> Clone for Iter<'t, K, V> {
	fn clone(&self) -> Iter<'t, K, V> {
		Iter {
			tree: self.tree,
			front: self.front,
			back: self.back,
			remaining: self.remaining,
		}
	}
}

impl<'t, K, V> IntoIterator for &'t Tree<K, V> {
	type Item = (&'t K, &'t V);
	type IntoIter = Iter<'t, K, V>;

	fn into_iter(self) -> Iter<'t, K, V> {
		self.iter()
	}
}
