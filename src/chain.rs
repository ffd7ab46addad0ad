use std::fmt;

use crate::{
  align::is_aligned,
  block::{Block, BlockId, BlockKind},
  error::ChainCorruption,
};

/// Ordered partition of the pool into blocks.
///
/// Nodes live in an indexed store and link to each other by [`BlockId`], so
/// removing a node can never leave a dangling reference behind: a stale id
/// simply stops resolving. Slots of removed nodes are recycled.
///
/// ```text
///   head                                                     tail
///    │                                                        │
///    ▼                                                        ▼
///   ┌──────────┐      ┌──────────┐      ┌──────────┐      ┌──────────┐
///   │ Alloc 64 │ ◄──► │ Free 32  │ ◄──► │ Alloc 16 │ ◄──► │ Free 144 │
///   └──────────┘      └──────────┘      └──────────┘      └──────────┘
///   0                 64                96                112        256
/// ```
#[derive(Debug, Clone)]
pub struct BlockChain {
  nodes: Vec<Option<Block>>,
  vacant: Vec<usize>,
  head: Option<BlockId>,
  tail: Option<BlockId>,
  len: usize,
  pool_size: usize,
}

/// Result of [`BlockChain::coalesce`]: the block that now spans the merged
/// region and the ids that stopped existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
  pub survivor: BlockId,
  pub absorbed: [Option<BlockId>; 2],
}

impl Merge {
  pub fn absorbed(
    &self,
    id: BlockId,
  ) -> bool {
    self.absorbed.contains(&Some(id))
  }
}

impl BlockChain {
  /// Creates a chain with one free block spanning the whole pool.
  pub fn new(pool_size: usize) -> Self {
    let mut chain = Self {
      nodes: Vec::new(),
      vacant: Vec::new(),
      head: None,
      tail: None,
      len: 0,
      pool_size,
    };

    let id = chain.store(Block::new(BlockKind::Free, 0, pool_size));
    chain.head = Some(id);
    chain.tail = Some(id);
    chain.len = 1;

    chain
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn pool_size(&self) -> usize {
    self.pool_size
  }

  #[cfg(test)]
  pub fn head(&self) -> Option<BlockId> {
    self.head
  }

  #[cfg(test)]
  pub fn tail(&self) -> Option<BlockId> {
    self.tail
  }

  /// Resolves `id`, or `None` if that node has been removed.
  pub fn get(
    &self,
    id: BlockId,
  ) -> Option<&Block> {
    self.nodes.get(id.0).and_then(Option::as_ref)
  }

  pub fn iter(&self) -> Iter<'_> {
    self.iter_from(self.head)
  }

  /// Walks the chain in address order starting at `start`.
  pub fn iter_from(
    &self,
    start: Option<BlockId>,
  ) -> Iter<'_> {
    Iter {
      chain: self,
      current: start,
    }
  }

  pub fn free_bytes(&self) -> usize {
    self
      .iter()
      .filter(|(_, block)| block.is_free())
      .map(|(_, block)| block.size)
      .sum()
  }

  pub fn largest_free(&self) -> usize {
    self
      .iter()
      .filter(|(_, block)| block.is_free())
      .map(|(_, block)| block.size)
      .max()
      .unwrap_or(0)
  }

  /// Carves `size` bytes off the front of the free block `id` and marks them
  /// allocated. Whatever is left over becomes a new free block right after
  /// it; an exact fit inserts nothing. Returns `id`, whose offset is
  /// unchanged.
  pub fn split(
    &mut self,
    id: BlockId,
    size: usize,
  ) -> BlockId {
    let block = self.node(id);
    debug_assert!(block.is_free(), "splitting an allocated block");
    debug_assert!(size > 0 && size <= block.size, "split size {size} out of range");
    debug_assert!(is_aligned(size));

    let remainder = block.size - size;
    let remainder_offset = block.offset + size;

    let block = self.node_mut(id);
    block.size = size;
    block.kind = BlockKind::Allocated;

    if remainder > 0 {
      self.insert_after(id, Block::new(BlockKind::Free, remainder_offset, remainder));
    }

    id
  }

  /// Marks `id` free. The caller is expected to [`coalesce`](Self::coalesce)
  /// right after.
  pub fn mark_free(
    &mut self,
    id: BlockId,
  ) {
    self.node_mut(id).kind = BlockKind::Free;
  }

  /// Merges the free block `id` with whichever neighbours are free. With the
  /// no-adjacent-free invariant holding beforehand, one step on each side is
  /// enough. When both sides are free the three spans collapse into the
  /// predecessor in a single pass.
  pub fn coalesce(
    &mut self,
    id: BlockId,
  ) -> Merge {
    debug_assert!(self.node(id).is_free(), "coalescing an allocated block");

    let mut merge = Merge {
      survivor: id,
      absorbed: [None, None],
    };

    if let Some(next) = self.node(id).next {
      if self.node(next).is_free() {
        self.absorb_next(id);
        merge.absorbed[1] = Some(next);
      }
    }

    if let Some(prev) = self.node(id).prev {
      if self.node(prev).is_free() {
        self.absorb_next(prev);
        merge.absorbed[0] = Some(id);
        merge.survivor = prev;
      }
    }

    merge
  }

  /// Finds the block whose span contains `offset`.
  pub fn find_block_owning(
    &self,
    offset: usize,
  ) -> Option<BlockId> {
    for (id, block) in self.iter() {
      if block.contains(offset) {
        return Some(id);
      }
      if block.offset > offset {
        break;
      }
    }

    None
  }

  /// Checks every structural invariant and reports the first one broken.
  pub fn validate(&self) -> Result<(), ChainCorruption> {
    let Some(head) = self.head else {
      return Err(ChainCorruption::Empty);
    };

    let first = self.get(head).ok_or(ChainCorruption::Empty)?;
    if first.offset != 0 {
      return Err(ChainCorruption::BadStart {
        offset: first.offset,
      });
    }

    let mut expected = 0;
    let mut reachable = 0;
    let mut prev: Option<(BlockId, &Block)> = None;

    for (id, block) in self.iter() {
      if block.offset != expected {
        return Err(ChainCorruption::Discontiguous {
          offset: block.offset,
          expected,
        });
      }

      if block.size == 0 || !is_aligned(block.size) {
        return Err(ChainCorruption::BadSize {
          offset: block.offset,
          size: block.size,
        });
      }

      if block.prev != prev.map(|(prev_id, _)| prev_id) {
        return Err(ChainCorruption::BrokenLink {
          offset: block.offset,
        });
      }

      if let Some((_, prev_block)) = prev {
        if prev_block.is_free() && block.is_free() {
          return Err(ChainCorruption::AdjacentFree {
            first: prev_block.offset,
            second: block.offset,
          });
        }
      }

      expected = block.end();
      reachable += 1;
      prev = Some((id, block));

      if reachable > self.len {
        break;
      }
    }

    if self.tail != prev.map(|(id, _)| id) {
      return Err(ChainCorruption::BrokenLink { offset: expected });
    }

    if reachable != self.len {
      return Err(ChainCorruption::LengthMismatch {
        recorded: self.len,
        reachable,
      });
    }

    if expected != self.pool_size {
      return Err(ChainCorruption::BadTotal {
        covered: expected,
        pool_size: self.pool_size,
      });
    }

    Ok(())
  }

  fn node(
    &self,
    id: BlockId,
  ) -> &Block {
    match self.get(id) {
      Some(block) => block,
      None => panic!("stale block id {id:?}"),
    }
  }

  fn node_mut(
    &mut self,
    id: BlockId,
  ) -> &mut Block {
    match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
      Some(block) => block,
      None => panic!("stale block id {id:?}"),
    }
  }

  fn store(
    &mut self,
    block: Block,
  ) -> BlockId {
    match self.vacant.pop() {
      Some(slot) => {
        self.nodes[slot] = Some(block);
        BlockId(slot)
      }
      None => {
        self.nodes.push(Some(block));
        BlockId(self.nodes.len() - 1)
      }
    }
  }

  fn insert_after(
    &mut self,
    id: BlockId,
    mut block: Block,
  ) -> BlockId {
    let next = self.node(id).next;
    block.prev = Some(id);
    block.next = next;

    let new = self.store(block);
    self.node_mut(id).next = Some(new);

    match next {
      Some(next) => self.node_mut(next).prev = Some(new),
      None => self.tail = Some(new),
    }

    self.len += 1;

    new
  }

  fn remove(
    &mut self,
    id: BlockId,
  ) -> Block {
    let block = match self.nodes.get_mut(id.0).and_then(Option::take) {
      Some(block) => block,
      None => panic!("stale block id {id:?}"),
    };

    match block.prev {
      Some(prev) => self.node_mut(prev).next = block.next,
      None => self.head = block.next,
    }

    match block.next {
      Some(next) => self.node_mut(next).prev = block.prev,
      None => self.tail = block.prev,
    }

    self.vacant.push(id.0);
    self.len -= 1;

    block
  }

  /// Folds the successor of `id` into `id`.
  fn absorb_next(
    &mut self,
    id: BlockId,
  ) {
    let Some(next) = self.node(id).next else {
      return;
    };

    let absorbed = self.remove(next);
    self.node_mut(id).size += absorbed.size;
  }

  /// Builds a chain from `(kind, size)` spans laid out back to back.
  #[cfg(test)]
  pub(crate) fn from_spans(spans: &[(BlockKind, usize)]) -> Self {
    let pool_size = spans.iter().map(|(_, size)| size).sum();
    let mut chain = Self::new(pool_size);

    let Some(head) = chain.head else {
      return chain;
    };

    let mut offset = 0;
    let mut last = head;
    for (i, &(kind, size)) in spans.iter().enumerate() {
      if i == 0 {
        let block = chain.node_mut(head);
        block.kind = kind;
        block.size = size;
      } else {
        last = chain.insert_after(last, Block::new(kind, offset, size));
      }
      offset += size;
    }

    chain
  }
}

impl fmt::Display for BlockChain {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "{:>10} {:>10}  {}", "offset", "size", "kind")?;
    for (_, block) in self.iter() {
      writeln!(f, "{:>10} {:>10}  {}", block.offset, block.size, block.kind)?;
    }
    write!(
      f,
      "{} blocks, {} of {} bytes free",
      self.len,
      self.free_bytes(),
      self.pool_size
    )
  }
}

/// Address-order iterator over `(id, block)` pairs.
pub struct Iter<'a> {
  chain: &'a BlockChain,
  current: Option<BlockId>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = (BlockId, &'a Block);

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.current?;
    let block = self.chain.get(id)?;
    self.current = block.next;

    Some((id, block))
  }
}
