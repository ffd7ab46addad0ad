//! # fitarena - A Fixed-Pool Arena Allocator
//!
//! This crate manages a single fixed-size byte pool and serves allocation and
//! free requests against it with one of four interchangeable **placement
//! strategies**: first fit, next fit, best fit and worst fit.
//!
//! ## Overview
//!
//! The pool is partitioned into an ordered chain of blocks, each either free
//! or allocated. There are never gaps or overlaps between blocks, and never
//! two free blocks next to each other:
//!
//! ```text
//!   Pool of 256 bytes:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                              POOL                                    │
//!   │                                                                      │
//!   │   ┌──────────┬────────┬──────────┬──────────────────────────────┐    │
//!   │   │ Alloc 64 │ Free 32│ Alloc 16 │           Free 144           │    │
//!   │   └──────────┴────────┴──────────┴──────────────────────────────┘    │
//!   │   0          64       96         112                           256   │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   fitarena
//!   ├── align      - Alignment unit and the align! macro
//!   ├── arena      - Arena facade: init, alloc, free, destroy, block_count
//!   ├── block      - Block metadata (offset, size, free/allocated)
//!   ├── chain      - BlockChain: split, coalesce, lookup, validation
//!   ├── config     - ArenaConfig and strategy parsing
//!   ├── engine     - Allocation engine driving strategy + chain
//!   ├── error      - Error types
//!   ├── pool       - The fixed byte buffer (libc calloc/free)
//!   └── strategy   - First/Next/Best/Worst fit selection
//! ```
//!
//! Only `align` is public. The chain, engine and pool stay behind the
//! [`Arena`] facade:
//!
//! ```rust,compile_fail
//! use fitarena::chain::BlockChain;
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitarena::{Arena, Strategy};
//!
//! let mut arena = Arena::new();
//! arena.init(6000, Strategy::FirstFit).unwrap();
//!
//! let first = arena.alloc(1024).unwrap();
//! let second = arena.alloc(256).unwrap();
//! assert_eq!(second, first + 1024);
//!
//! arena.free(second).unwrap();
//! arena.free(first).unwrap();
//! assert_eq!(arena.block_count(), 1);
//! ```
//!
//! ## How It Works
//!
//! Allocating asks the active strategy for a free block that is large enough
//! and splits it:
//!
//! ```text
//!   alloc(40) on a free block of 100 bytes:
//!
//!   Before:  ┌───────────────────────────────┐
//!            │            Free 100           │
//!            └───────────────────────────────┘
//!   After:   ┌────────────┬──────────────────┐
//!            │  Alloc 40  │     Free 60      │
//!            └────────────┴──────────────────┘
//! ```
//!
//! Freeing marks the block free and merges it with any free neighbour:
//!
//! ```text
//!   free(B):
//!
//!   Before:  ┌─────────┬─────────┬─────────┬─────────┐
//!            │ Alloc A │ Alloc B │ Free C  │ Alloc D │
//!            └─────────┴─────────┴─────────┴─────────┘
//!   After:   ┌─────────┬───────────────────┬─────────┐
//!            │ Alloc A │     Free B+C      │ Alloc D │
//!            └─────────┴───────────────────┴─────────┘
//! ```
//!
//! Sizes are rounded up to a 4 byte boundary, and callers get back offsets
//! into the pool rather than pointers. [`Arena::bytes_mut`] gives access to
//! the memory behind an offset.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed size**: The pool never grows or shrinks after `init`
//! - **Minimal alignment**: Only the 4 byte boundary is guaranteed
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]; install a subscriber to see them.

pub mod align;
mod arena;
mod block;
mod chain;
mod config;
mod engine;
mod error;
mod pool;
mod strategy;

pub use arena::{Arena, ArenaStats};
pub use block::{Block, BlockKind};
pub use config::{ArenaConfig, DEFAULT_POOL_SIZE};
pub use error::{AllocError, ChainCorruption, FreeError, InitError, ParseStrategyError};
pub use strategy::Strategy;
