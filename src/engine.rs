use tracing::{debug, trace, warn};

use crate::{
  block::BlockId,
  chain::BlockChain,
  error::{AllocError, FreeError},
  pool::Pool,
  strategy::Strategy,
};

/// Owns the pool and its chain and turns placement decisions into splits and
/// releases into merges.
#[derive(Debug)]
pub struct Engine {
  pool: Pool,
  chain: BlockChain,
  strategy: Strategy,
  /// Block handed out by the last successful allocation. Read by next fit,
  /// maintained under every strategy.
  cursor: Option<BlockId>,
}

impl Engine {
  pub fn new(
    pool: Pool,
    strategy: Strategy,
  ) -> Self {
    let chain = BlockChain::new(pool.len());

    Self {
      pool,
      chain,
      strategy,
      cursor: None,
    }
  }

  pub fn chain(&self) -> &BlockChain {
    &self.chain
  }

  pub fn strategy(&self) -> Strategy {
    self.strategy
  }

  pub fn set_strategy(
    &mut self,
    strategy: Strategy,
  ) {
    self.strategy = strategy;
  }

  #[cfg(test)]
  pub fn cursor(&self) -> Option<BlockId> {
    self.cursor
  }

  /// Hands out `size` bytes, rounded up to [`crate::align::ALIGNMENT`], and
  /// returns the offset of the block within the pool.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<usize, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    if size > self.chain.pool_size() {
      return Err(self.out_of_memory(size));
    }

    let aligned = crate::align!(size);

    let Some(candidate) = self.strategy.select(&self.chain, aligned, self.cursor) else {
      return Err(self.out_of_memory(size));
    };

    // Splitting keeps the front of the candidate, so its offset is final.
    let Some(offset) = self.chain.get(candidate).map(|block| block.offset) else {
      return Err(self.out_of_memory(size));
    };

    let id = self.chain.split(candidate, aligned);
    self.cursor = Some(id);
    self.check();

    trace!(
      strategy = %self.strategy,
      requested = size,
      aligned,
      offset,
      blocks = self.chain.len(),
      "allocated"
    );

    Ok(offset)
  }

  /// Gives back the block starting at `offset`. `None` is a no-op.
  pub fn release(
    &mut self,
    offset: Option<usize>,
  ) -> Result<(), FreeError> {
    let Some(offset) = offset else {
      return Ok(());
    };

    let id = self.allocated_block_at(offset).inspect_err(|error| {
      warn!(offset, %error, "rejected free");
    })?;

    self.chain.mark_free(id);
    let merge = self.chain.coalesce(id);

    if let Some(cursor) = self.cursor {
      if merge.absorbed(cursor) {
        self.cursor = Some(merge.survivor);
      }
    }

    self.check();

    trace!(
      offset,
      survivor = ?self.chain.get(merge.survivor).map(|block| (block.offset, block.size)),
      blocks = self.chain.len(),
      "released"
    );

    Ok(())
  }

  /// Contents of the allocated block starting at `offset`.
  pub fn bytes(
    &self,
    offset: usize,
  ) -> Option<&[u8]> {
    let id = self.allocated_block_at(offset).ok()?;
    let size = self.chain.get(id)?.size;

    self.pool.bytes(offset, size)
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
  ) -> Option<&mut [u8]> {
    let id = self.allocated_block_at(offset).ok()?;
    let size = self.chain.get(id)?.size;

    self.pool.bytes_mut(offset, size)
  }

  fn allocated_block_at(
    &self,
    offset: usize,
  ) -> Result<BlockId, FreeError> {
    let id = self
      .chain
      .find_block_owning(offset)
      .ok_or(FreeError::NotFound { offset })?;

    match self.chain.get(id) {
      Some(block) if block.offset != offset => Err(FreeError::NotFound { offset }),
      Some(block) if block.is_free() => Err(FreeError::DoubleFree { offset }),
      Some(_) => Ok(id),
      None => Err(FreeError::NotFound { offset }),
    }
  }

  fn out_of_memory(
    &self,
    requested: usize,
  ) -> AllocError {
    let largest_free = self.chain.largest_free();

    debug!(
      strategy = %self.strategy,
      requested,
      largest_free,
      free_bytes = self.chain.free_bytes(),
      "out of memory"
    );

    AllocError::OutOfMemory {
      requested,
      largest_free,
    }
  }

  /// Continuing on a corrupted chain risks handing out overlapping memory,
  /// so debug builds stop right here.
  fn check(&self) {
    if cfg!(debug_assertions) {
      if let Err(corruption) = self.chain.validate() {
        panic!("block chain corrupted: {corruption}\n{}", self.chain);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::BlockKind::{self, Allocated, Free};

  fn engine(
    pool_size: usize,
    strategy: Strategy,
  ) -> Engine {
    Engine::new(Pool::obtain(pool_size).unwrap(), strategy)
  }

  fn spans(engine: &Engine) -> Vec<(BlockKind, usize)> {
    engine
      .chain()
      .iter()
      .map(|(_, block)| (block.kind, block.size))
      .collect()
  }

  #[test]
  fn test_allocate_rounds_up() {
    let mut engine = engine(64, Strategy::FirstFit);

    assert_eq!(engine.allocate(5), Ok(0));
    assert_eq!(engine.allocate(1), Ok(8));
    assert_eq!(spans(&engine), vec![(Allocated, 8), (Allocated, 4), (Free, 52)]);
  }

  #[test]
  fn test_zero_size_is_invalid() {
    let mut engine = engine(64, Strategy::FirstFit);

    assert_eq!(engine.allocate(0), Err(AllocError::InvalidSize));
    assert_eq!(engine.chain().len(), 1);
  }

  #[test]
  fn test_huge_request_does_not_overflow() {
    let mut engine = engine(64, Strategy::BestFit);

    assert_eq!(
      engine.allocate(usize::MAX),
      Err(AllocError::OutOfMemory {
        requested: usize::MAX,
        largest_free: 64
      })
    );
  }

  #[test]
  fn test_cursor_follows_allocations() {
    let mut engine = engine(64, Strategy::FirstFit);

    engine.allocate(8).unwrap();
    let second = engine.allocate(8).unwrap();

    let cursor = engine.cursor().and_then(|id| engine.chain().get(id));
    assert_eq!(cursor.map(|block| block.offset), Some(second));
  }

  #[test]
  fn test_cursor_moves_to_merge_survivor() {
    let mut engine = engine(64, Strategy::NextFit);

    let first = engine.allocate(8).unwrap();
    let second = engine.allocate(8).unwrap();
    engine.release(Some(first)).unwrap();
    engine.release(Some(second)).unwrap();

    let cursor = engine.cursor().and_then(|id| engine.chain().get(id));
    assert_eq!(cursor.map(|block| (block.offset, block.size)), Some((0, 64)));
    assert_eq!(engine.allocate(16), Ok(0));
  }

  #[test]
  fn test_next_fit_resumes_after_cursor() {
    let mut engine = engine(64, Strategy::NextFit);

    let a = engine.allocate(8).unwrap();
    let b = engine.allocate(8).unwrap();
    engine.allocate(8).unwrap();
    engine.release(Some(a)).unwrap();

    // The hole at 0 is skipped because the scan starts past the cursor.
    assert_eq!(engine.allocate(8), Ok(24));

    engine.release(Some(b)).unwrap();
    engine.set_strategy(Strategy::FirstFit);
    assert_eq!(engine.allocate(16), Ok(0));
  }

  #[test]
  fn test_offset_is_taken_from_chosen_block() {
    let mut engine = engine(64, Strategy::WorstFit);

    let a = engine.allocate(8).unwrap();
    engine.allocate(8).unwrap();
    engine.release(Some(a)).unwrap();

    let offset = engine.allocate(4).unwrap();
    let cursor = engine.cursor().and_then(|id| engine.chain().get(id));

    assert_eq!(offset, 16);
    assert_eq!(cursor.map(|block| (block.offset, block.size)), Some((16, 4)));
  }

  #[test]
  fn test_release_none_is_noop() {
    let mut engine = engine(64, Strategy::FirstFit);
    engine.allocate(8).unwrap();

    assert_eq!(engine.release(None), Ok(()));
    assert_eq!(engine.chain().len(), 2);
  }

  #[test]
  fn test_release_rejects_unknown_offsets() {
    let mut engine = engine(64, Strategy::FirstFit);
    engine.allocate(16).unwrap();

    assert_eq!(
      engine.release(Some(4)),
      Err(FreeError::NotFound { offset: 4 })
    );
    assert_eq!(
      engine.release(Some(64)),
      Err(FreeError::NotFound { offset: 64 })
    );
    assert_eq!(
      engine.release(Some(16)),
      Err(FreeError::DoubleFree { offset: 16 })
    );
  }

  #[test]
  fn test_double_free() {
    let mut engine = engine(64, Strategy::FirstFit);
    let offset = engine.allocate(16).unwrap();

    assert_eq!(engine.release(Some(offset)), Ok(()));
    assert_eq!(
      engine.release(Some(offset)),
      Err(FreeError::DoubleFree { offset })
    );
    assert_eq!(spans(&engine), vec![(Free, 64)]);
  }

  #[test]
  fn test_bytes_only_for_allocated_blocks() {
    let mut engine = engine(64, Strategy::FirstFit);
    let offset = engine.allocate(6).unwrap();

    engine.bytes_mut(offset).unwrap().fill(0xAB);

    assert_eq!(engine.bytes(offset), Some(&[0xAB; 8][..]));
    assert!(engine.bytes(8).is_none());
    assert!(engine.bytes(2).is_none());
  }
}
