//! Multi-key ordered set facade with duplicate counts and bound queries.

use crate::iter::RawIter;
use crate::{Error, NodeId, Result, Tree};
use smallvec::SmallVec;
use std::borrow::Borrow;
use std::fmt;
use std::iter::FusedIterator;
use std::mem;

/// An ordered multiset.
///
/// Duplicates are not materialized as separate nodes: the tree stores one
/// node per distinct key and counts how many logical copies are present.
/// [`AvlMultiset::len`] reports the logical size, duplicates included.
///
/// # Example
///
/// ```
/// use aldertree::AvlMultiset;
///
/// let mut bag = AvlMultiset::new();
/// for key in [2, 2, 2, 5, 5] {
///     bag.insert(key);
/// }
///
/// assert_eq!(bag.count(&2), 3);
/// assert_eq!(bag.count(&5), 2);
/// assert_eq!(bag.len(), 5);
/// ```
#[derive(Clone)]
pub struct AvlMultiset<K> {
	tree: Tree<K, ()>,
}

/// A position in an [`AvlMultiset`]: before a distinct key or at the end.
///
/// A cursor addresses the *node* of a key, not an individual duplicate;
/// [`Cursor::count`] exposes the multiplicity at the position.
pub struct Cursor<'a, K> {
	raw: RawIter<'a, K, ()>,
}

impl<'a, K> Cursor<'a, K> {
	fn at(tree: &'a Tree<K, ()>, node: Option<NodeId>) -> Cursor<'a, K> {
		Cursor {
			raw: RawIter::at(tree, node),
		}
	}

	pub fn key(&self) -> Option<&'a K> {
		self.raw.peek().map(|(key, _)| key)
	}

	/// Multiplicity of the key at the cursor; 0 at the end position.
	pub fn count(&self) -> usize {
		self.raw
			.current()
			.map_or(0, |id| self.raw.tree().count(id))
	}

	pub fn is_end(&self) -> bool {
		self.raw.is_end()
	}

	/// Steps to the next *distinct* key.
	pub fn move_next(&mut self) {
		self.raw.next();
	}

	/// Steps to the previous distinct key; from the end position this lands
	/// on the maximum.
	pub fn move_prev(&mut self) {
		self.raw.prev();
	}
}

impl<'a, K> Clone for Cursor<'a, K> {
	fn clone(&self) -> Cursor<'a, K> {
		Cursor {
			raw: self.raw.clone(),
		}
	}
}

impl<'a, K> PartialEq for Cursor<'a, K> {
	fn eq(&self, other: &Cursor<'a, K>) -> bool {
		self.raw == other.raw
	}
}

impl<'a, K> Eq for Cursor<'a, K> {}

impl<'a, K: fmt::Debug> fmt::Debug for Cursor<'a, K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cursor")
			.field("key", &self.key())
			.field("count", &self.count())
			.finish()
	}
}

impl<K> AvlMultiset<K> {
	pub fn new() -> AvlMultiset<K> {
		AvlMultiset { tree: Tree::new() }
	}

	/// Logical size: the sum of all duplicate counts. O(1).
	pub fn len(&self) -> usize {
		self.tree.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	pub fn height(&self) -> i32 {
		self.tree.height()
	}

	pub fn clear(&mut self) {
		self.tree.clear();
	}

	/// O(1) exchange of the two multisets' entire contents.
	pub fn swap(&mut self, other: &mut AvlMultiset<K>) {
		mem::swap(self, other);
	}

	/// Iterates elements in ascending order, yielding each key once per
	/// duplicate.
	pub fn iter(&self) -> Iter<'_, K> {
		Iter::new(&self.tree)
	}

	#[cfg(any(test, feature = "test-utils"))]
	pub fn assert_invariants(&self)
	where
		K: Ord + fmt::Debug,
	{
		self.tree.assert_invariants();
	}
}

impl<K: Ord> AvlMultiset<K> {
	/// Inserts one copy of `key` and returns a cursor at it. Always
	/// succeeds; an existing key gains a duplicate instead of a node.
	pub fn insert(&mut self, key: K) -> Cursor<'_, K> {
		let id = self.tree.insert_counted(key, ());
		Cursor::at(&self.tree, Some(id))
	}

	/// Bulk insertion, one cursor per input element in input order.
	pub fn insert_many<I>(&mut self, keys: I) -> SmallVec<[Cursor<'_, K>; 8]>
	where
		I: IntoIterator<Item = K>,
	{
		let mut staged: SmallVec<[NodeId; 8]> = SmallVec::new();
		for key in keys {
			staged.push(self.tree.insert_counted(key, ()));
		}
		staged
			.into_iter()
			.map(|id| Cursor::at(&self.tree, Some(id)))
			.collect()
	}

	/// Number of copies of `key` present.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.tree.count_of(key)
	}

	pub fn contains<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.tree.contains_key(key)
	}

	/// A cursor at `key` when present, otherwise at the end.
	pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		Cursor::at(&self.tree, self.tree.find_node(key))
	}

	/// Removes one copy of `key`. The node disappears only when its last
	/// duplicate goes. Returns whether anything was removed.
	pub fn remove_one<Q>(&mut self, key: &Q) -> bool
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.tree.remove_single(key)
	}

	/// Removes every copy of `key`, returning how many were present.
	pub fn remove_all<Q>(&mut self, key: &Q) -> usize
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.tree.remove_full(key).map_or(0, |(_, (), count)| count)
	}

	pub fn first(&self) -> Option<&K> {
		self.tree.first().map(|(key, _)| key)
	}

	pub fn last(&self) -> Option<&K> {
		self.tree.last().map(|(key, _)| key)
	}

	/// Removes and returns one copy of the minimum key.
	pub fn pop_first(&mut self) -> Option<K>
	where
		K: Clone,
	{
		let id = self.tree.min_node()?;
		if self.tree.count(id) > 1 {
			self.tree.decrement_count(id);
			Some(self.tree.key(id).clone())
		} else {
			Some(self.tree.remove_node(id).0)
		}
	}

	/// Removes and returns one copy of the maximum key.
	pub fn pop_last(&mut self) -> Option<K>
	where
		K: Clone,
	{
		let id = self.tree.max_node()?;
		if self.tree.count(id) > 1 {
			self.tree.decrement_count(id);
			Some(self.tree.key(id).clone())
		} else {
			Some(self.tree.remove_node(id).0)
		}
	}

	/// Moves every element of `other` into `self`, adding duplicate counts
	/// together, and leaves `other` empty.
	pub fn merge(&mut self, other: &mut AvlMultiset<K>) {
		while let Some(id) = other.tree.min_node() {
			let count = other.tree.count(id);
			let (key, ()) = other.tree.remove_node(id);
			let new_id = self.tree.insert_counted(key, ());
			if count > 1 {
				self.tree.bump_count(new_id, count - 1);
			}
		}
	}

	// -----------------------------------------------------------------------
	// Bound Queries
	// -----------------------------------------------------------------------
	//
	// The tree has no one-past-the-end sentinel node, so a query for a key
	// strictly greater than the maximum has no position to report and fails
	// with `OutOfBounds`; so does any bound query on an empty multiset. All
	// three queries share the half-open contract: `lower_bound` is the first
	// key `>= q`, `upper_bound` the first key `> q`.

	/// Cursor at the first key `>= key`. A key below the minimum yields the
	/// minimum; a key above the maximum fails with [`Error::OutOfBounds`].
	pub fn lower_bound<Q>(&self, key: &Q) -> Result<Cursor<'_, K>>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.check_in_range(key)?;
		let node = self.tree.lower_bound_node(key);
		debug_assert!(node.is_some(), "in-range lower bound must exist");
		Ok(Cursor::at(&self.tree, node))
	}

	/// Cursor at the first key `> key`; the end position when `key` equals
	/// the maximum. A key above the maximum fails with
	/// [`Error::OutOfBounds`].
	pub fn upper_bound<Q>(&self, key: &Q) -> Result<Cursor<'_, K>>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.check_in_range(key)?;
		Ok(Cursor::at(&self.tree, self.tree.upper_bound_node(key)))
	}

	/// The half-open range of `key`: for a present key, a cursor at its
	/// node paired with a cursor at the next distinct key (or the end).
	/// For an absent key, both cursors sit at the position the key would
	/// occupy.
	pub fn equal_range<Q>(&self, key: &Q) -> Result<(Cursor<'_, K>, Cursor<'_, K>)>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		self.check_in_range(key)?;
		match self.tree.find_node(key) {
			Some(id) => Ok((
				Cursor::at(&self.tree, Some(id)),
				Cursor::at(&self.tree, self.tree.successor(id)),
			)),
			None => {
				let node = self.tree.lower_bound_node(key);
				debug_assert!(node.is_some(), "in-range lower bound must exist");
				Ok((Cursor::at(&self.tree, node), Cursor::at(&self.tree, node)))
			}
		}
	}

	fn check_in_range<Q>(&self, key: &Q) -> Result<()>
	where
		K: Borrow<Q>,
		Q: Ord + ?Sized,
	{
		let max = self.tree.max_node().ok_or(Error::OutOfBounds)?;
		if key > self.tree.key(max).borrow() {
			return Err(Error::OutOfBounds);
		}
		Ok(())
	}
}

impl<K> Default for AvlMultiset<K> {
	fn default() -> AvlMultiset<K> {
		AvlMultiset::new()
	}
}

impl<K: fmt::Debug> fmt::Debug for AvlMultiset<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl<K: PartialEq> PartialEq for AvlMultiset<K> {
	fn eq(&self, other: &AvlMultiset<K>) -> bool {
		self.len() == other.len() && self.iter().eq(other.iter())
	}
}

impl<K: Eq> Eq for AvlMultiset<K> {}

impl<K: Ord> FromIterator<K> for AvlMultiset<K> {
	fn from_iter<I: IntoIterator<Item = K>>(keys: I) -> AvlMultiset<K> {
		let mut multiset = AvlMultiset::new();
		multiset.extend(keys);
		multiset
	}
}

impl<K: Ord> Extend<K> for AvlMultiset<K> {
	fn extend<I: IntoIterator<Item = K>>(&mut self, keys: I) {
		for key in keys {
			self.tree.insert_counted(key, ());
		}
	}
}

impl<'a, K> IntoIterator for &'a AvlMultiset<K> {
	type Item = &'a K;
	type IntoIter = Iter<'a, K>;

	fn into_iter(self) -> Iter<'a, K> {
		self.iter()
	}
}

impl<K: Ord + Clone> IntoIterator for AvlMultiset<K> {
	type Item = K;
	type IntoIter = IntoIter<K>;

	fn into_iter(self) -> IntoIter<K> {
		IntoIter { inner: self }
	}
}

/// Borrowing iterator that repeats each key once per duplicate.
///
/// Both ends track how many repeats of their current node remain; the
/// logical `remaining` counter is the source of truth when the ends share a
/// node.
pub struct Iter<'a, K> {
	tree: &'a Tree<K, ()>,
	front: Option<NodeId>,
	front_left: usize,
	back: Option<NodeId>,
	back_left: usize,
	remaining: usize,
}

impl<'a, K> Iter<'a, K> {
	fn new(tree: &'a Tree<K, ()>) -> Iter<'a, K> {
		let front = tree.min_node();
		let back = tree.max_node();
		Iter {
			tree,
			front,
			front_left: front.map_or(0, |id| tree.count(id)),
			back,
			back_left: back.map_or(0, |id| tree.count(id)),
			remaining: tree.len(),
		}
	}
}

impl<'a, K> Iterator for Iter<'a, K> {
	type Item = &'a K;

	fn next(&mut self) -> Option<&'a K> {
		if self.remaining == 0 {
			return None;
		}
		if self.front_left == 0 {
			let id = self.front.expect("entries remain but the front is gone");
			self.front = self.tree.successor(id);
			self.front_left = self.front.map_or(0, |id| self.tree.count(id));
		}
		self.front_left -= 1;
		self.remaining -= 1;
		Some(self.tree.key(self.front.expect("front node present")))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.remaining, Some(self.remaining))
	}
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K> {
	fn next_back(&mut self) -> Option<&'a K> {
		if self.remaining == 0 {
			return None;
		}
		if self.back_left == 0 {
			let id = self.back.expect("entries remain but the back is gone");
			self.back = self.tree.predecessor(id);
			self.back_left = self.back.map_or(0, |id| self.tree.count(id));
		}
		self.back_left -= 1;
		self.remaining -= 1;
		Some(self.tree.key(self.back.expect("back node present")))
	}
}

impl<'a, K> ExactSizeIterator for Iter<'a, K> {
	fn len(&self) -> usize {
		self.remaining
	}
}

impl<'a, K> FusedIterator for Iter<'a, K> {}

impl<'a, K> Clone for Iter<'a, K> {
	fn clone(&self) -> Iter<'a, K> {
		Iter {
			tree: self.tree,
			front: self.front,
			front_left: self.front_left,
			back: self.back,
			back_left: self.back_left,
			remaining: self.remaining,
		}
	}
}

/// Owning iterator: drains the multiset in ascending order, one yielded key
/// per duplicate.
pub struct IntoIter<K> {
	inner: AvlMultiset<K>,
}

impl<K: Ord + Clone> Iterator for IntoIter<K> {
	type Item = K;

	fn next(&mut self) -> Option<K> {
		self.inner.pop_first()
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(self.inner.len(), Some(self.inner.len()))
	}
}

impl<K: Ord + Clone> DoubleEndedIterator for IntoIter<K> {
	fn next_back(&mut self) -> Option<K> {
		self.inner.pop_last()
	}
}

impl<K: Ord + Clone> ExactSizeIterator for IntoIter<K> {
	fn len(&self) -> usize {
		self.inner.len()
	}
}

impl<K: Ord + Clone> FusedIterator for IntoIter<K> {}
