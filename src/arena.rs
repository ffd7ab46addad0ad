use std::fmt;

use tracing::debug;

use crate::{
  align::ALIGNMENT,
  block::Block,
  config::ArenaConfig,
  engine::Engine,
  error::{AllocError, ChainCorruption, FreeError, InitError},
  pool::Pool,
  strategy::Strategy,
};

/// A fixed-size memory pool served by one of the fit strategies.
///
/// An `Arena` starts out uninitialized. [`Arena::init`] obtains the pool,
/// [`Arena::destroy`] (or dropping the arena) gives it back, after which the
/// arena can be initialized again.
///
/// Not thread-safe: callers sharing an arena must serialize access
/// themselves.
///
/// # Examples
///
/// ```rust
/// use fitarena::{Arena, Strategy};
///
/// let mut arena = Arena::new();
/// arena.init(256, Strategy::BestFit).unwrap();
///
/// let offset = arena.alloc(10).unwrap();
/// arena.bytes_mut(offset).unwrap()[0] = 42;
/// assert_eq!(arena.block_count(), 2);
///
/// arena.free(offset).unwrap();
/// assert_eq!(arena.block_count(), 1);
///
/// arena.destroy();
/// assert!(!arena.is_initialized());
/// ```
#[derive(Debug, Default)]
pub struct Arena {
  engine: Option<Engine>,
}

/// Point-in-time summary of an arena's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
  pub pool_size: usize,
  pub blocks: usize,
  pub free_blocks: usize,
  pub allocated_blocks: usize,
  pub free_bytes: usize,
  pub allocated_bytes: usize,
  pub largest_free: usize,
}

impl ArenaStats {
  /// Share of free memory that is not part of the largest free block. 0 means
  /// all free memory is contiguous, values near 1 mean it is scattered.
  pub fn fragmentation(&self) -> f64 {
    if self.free_bytes == 0 {
      return 0.0;
    }

    1.0 - self.largest_free as f64 / self.free_bytes as f64
  }
}

impl Arena {
  /// Creates an uninitialized arena.
  pub const fn new() -> Self {
    Self { engine: None }
  }

  /// Creates an arena that is already initialized from `config`.
  pub fn with_config(config: ArenaConfig) -> Result<Self, InitError> {
    let mut arena = Self::new();
    arena.init(config.pool_size, config.strategy)?;

    Ok(arena)
  }

  /// Obtains a pool of `pool_size` bytes, rounded up to the alignment unit,
  /// covered by a single free block.
  pub fn init(
    &mut self,
    pool_size: usize,
    strategy: Strategy,
  ) -> Result<(), InitError> {
    if pool_size == 0 {
      return Err(InitError::ZeroSize);
    }

    if let Some(engine) = &self.engine {
      return Err(InitError::AlreadyInitialized {
        pool_size: engine.chain().pool_size(),
      });
    }

    let aligned = pool_size
      .checked_add(ALIGNMENT - 1)
      .map(|size| size & !(ALIGNMENT - 1))
      .ok_or(InitError::PoolUnavailable { pool_size })?;

    let pool = Pool::obtain(aligned).ok_or(InitError::PoolUnavailable { pool_size: aligned })?;

    debug!(pool_size = aligned, %strategy, "arena initialized");

    self.engine = Some(Engine::new(pool, strategy));

    Ok(())
  }

  /// Releases the pool and every block. Does nothing if the arena is not
  /// initialized.
  pub fn destroy(&mut self) {
    if let Some(engine) = self.engine.take() {
      debug!(
        pool_size = engine.chain().pool_size(),
        blocks = engine.chain().len(),
        "arena destroyed"
      );
    }
  }

  /// Allocates `size` bytes and returns their offset within the pool.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Result<usize, AllocError> {
    self
      .engine
      .as_mut()
      .ok_or(AllocError::Uninitialized)?
      .allocate(size)
  }

  /// Frees the block that starts at `offset`. Passing `None` does nothing.
  pub fn free(
    &mut self,
    offset: impl Into<Option<usize>>,
  ) -> Result<(), FreeError> {
    let offset = offset.into();
    if offset.is_none() {
      return Ok(());
    }

    self
      .engine
      .as_mut()
      .ok_or(FreeError::Uninitialized)?
      .release(offset)
  }

  /// Number of blocks in the chain, free and allocated. 0 when uninitialized.
  pub fn block_count(&self) -> usize {
    self.engine.as_ref().map_or(0, |engine| engine.chain().len())
  }

  pub fn is_initialized(&self) -> bool {
    self.engine.is_some()
  }

  /// Pool size in bytes after alignment, 0 when uninitialized.
  pub fn pool_size(&self) -> usize {
    self
      .engine
      .as_ref()
      .map_or(0, |engine| engine.chain().pool_size())
  }

  pub fn strategy(&self) -> Option<Strategy> {
    self.engine.as_ref().map(Engine::strategy)
  }

  /// Switches the placement strategy of a live arena and returns the previous
  /// one. Returns `None` and does nothing when uninitialized.
  pub fn set_strategy(
    &mut self,
    strategy: Strategy,
  ) -> Option<Strategy> {
    let engine = self.engine.as_mut()?;
    let previous = engine.strategy();
    engine.set_strategy(strategy);

    debug!(from = %previous, to = %strategy, "strategy changed");

    Some(previous)
  }

  /// Contents of the allocated block starting at `offset`.
  pub fn bytes(
    &self,
    offset: usize,
  ) -> Option<&[u8]> {
    self.engine.as_ref()?.bytes(offset)
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
  ) -> Option<&mut [u8]> {
    self.engine.as_mut()?.bytes_mut(offset)
  }

  /// Blocks in address order.
  pub fn blocks(&self) -> impl Iterator<Item = &Block> {
    self
      .engine
      .iter()
      .flat_map(|engine| engine.chain().iter().map(|(_, block)| block))
  }

  pub fn stats(&self) -> ArenaStats {
    let mut stats = ArenaStats {
      pool_size: self.pool_size(),
      ..ArenaStats::default()
    };

    for block in self.blocks() {
      stats.blocks += 1;
      if block.is_free() {
        stats.free_blocks += 1;
        stats.free_bytes += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.allocated_blocks += 1;
        stats.allocated_bytes += block.size;
      }
    }

    stats
  }

  /// Checks the chain invariants. An uninitialized arena is trivially valid.
  pub fn validate(&self) -> Result<(), ChainCorruption> {
    match &self.engine {
      Some(engine) => engine.chain().validate(),
      None => Ok(()),
    }
  }
}

impl fmt::Display for Arena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match &self.engine {
      Some(engine) => write!(f, "{} arena\n{}", engine.strategy(), engine.chain()),
      None => f.write_str("uninitialized arena"),
    }
  }
}
