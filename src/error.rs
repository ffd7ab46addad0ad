//! Error types returned by the arena.
//!
//! Every failure is reported to the caller as a value. The only thing that
//! panics is a [`ChainCorruption`] detected in a debug build, since carrying
//! on after that could hand out overlapping memory.

use thiserror::Error;

/// Errors from [`crate::Arena::init`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
  /// A pool of zero bytes was requested.
  #[error("pool size must be greater than zero")]
  ZeroSize,

  /// The arena already owns a pool; `destroy` it first.
  #[error("arena already initialized with a pool of {pool_size} bytes")]
  AlreadyInitialized { pool_size: usize },

  /// The backing buffer could not be obtained.
  #[error("could not obtain a pool of {pool_size} bytes")]
  PoolUnavailable { pool_size: usize },
}

/// Errors from [`crate::Arena::alloc`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
  #[error("arena is not initialized")]
  Uninitialized,

  /// Zero-byte requests are rejected.
  #[error("cannot allocate zero bytes")]
  InvalidSize,

  /// No free block is large enough. Recoverable: free something and retry.
  #[error("out of memory: requested {requested} bytes, largest free block is {largest_free} bytes")]
  OutOfMemory { requested: usize, largest_free: usize },
}

/// Errors from [`crate::Arena::free`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FreeError {
  #[error("arena is not initialized")]
  Uninitialized,

  /// The offset is not the start of any block.
  #[error("offset {offset} was not returned by this arena")]
  NotFound { offset: usize },

  /// The block starting at the offset is already free.
  #[error("double free at offset {offset}")]
  DoubleFree { offset: usize },
}

/// A broken chain invariant, found by [`crate::Arena::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainCorruption {
  #[error("chain is empty")]
  Empty,

  #[error("first block starts at {offset}, expected 0")]
  BadStart { offset: usize },

  #[error("block at {offset} should start at {expected}")]
  Discontiguous { offset: usize, expected: usize },

  #[error("block at {offset} has invalid size {size}")]
  BadSize { offset: usize, size: usize },

  #[error("blocks at {first} and {second} are both free")]
  AdjacentFree { first: usize, second: usize },

  #[error("block at {offset} has a broken back link")]
  BrokenLink { offset: usize },

  #[error("blocks cover {covered} bytes of a {pool_size} byte pool")]
  BadTotal { covered: usize, pool_size: usize },

  #[error("chain reports {recorded} blocks but links reach {reachable}")]
  LengthMismatch { recorded: usize, reachable: usize },
}

/// Error from parsing a [`crate::Strategy`] name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown placement strategy {input:?}")]
pub struct ParseStrategyError {
  pub input: String,
}
