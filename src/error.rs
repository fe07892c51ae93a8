//! # Error Types for the Ordered Containers
//!
//! This module defines the recoverable failures a caller can observe. The
//! containers never panic on bad *input*; they return one of the variants
//! below and leave the structure untouched.
//!
//! ## Error Handling Strategy
//!
//! Two kinds of failure exist in this crate and they are kept strictly
//! apart:
//!
//! - **Caller errors**: asking for a key that is not there, or a bound
//!   query past the maximum stored key. These are ordinary outcomes of
//!   ordinary use and are surfaced as [`Error`] values for the immediate
//!   caller to handle.
//! - **Structural corruption**: a parent link, height or balance factor
//!   that contradicts the tree invariants. These can only arise from a bug
//!   in the tree itself, so they are treated as programming errors:
//!   `debug_assert!` guards in the mutation paths and the test-gated
//!   `assert_invariants` validator panic with diagnostics instead of
//!   returning a value callers would be tempted to "handle".
//!
//! The only operation that substitutes a default instead of failing is
//! [`AvlMap::get_or_insert_default`](crate::AvlMap::get_or_insert_default),
//! whose documented contract is exactly "insert the default if absent".

use thiserror::Error;

/// Recoverable failures surfaced by the container facades.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	/// A keyed access ([`AvlMap::at`](crate::AvlMap::at) and friends) did
	/// not find the key.
	///
	/// Returned instead of silently defaulting; callers that want
	/// insert-if-absent behavior should say so and use
	/// [`AvlMap::get_or_insert_default`](crate::AvlMap::get_or_insert_default).
	#[error("key not found")]
	KeyNotFound,

	/// A bound query asked about keys beyond the stored maximum.
	///
	/// The tree carries no one-past-the-end sentinel node, so a
	/// `lower_bound`/`upper_bound`/`equal_range` query for a key strictly
	/// greater than the current maximum has no position to report and
	/// fails explicitly rather than yielding a dangling cursor. Queries on
	/// an empty multiset fail the same way, since no maximum exists to
	/// compare against.
	#[error("bound query past the maximum stored key")]
	OutOfBounds,
}

/// A Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
