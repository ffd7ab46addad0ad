use std::cmp::Reverse;

use crate::{
  block::{Block, BlockId},
  chain::BlockChain,
};

/// Policy used to pick a free block for a request.
///
/// ```text
///   Free blocks:   [ 100 ]  ...  [ 48 ]  ...  [ 200 ]      request: 40
///                     ▲            ▲             ▲
///   FirstFit ─────────┘            │             │
///   BestFit  ──────────────────────┘             │
///   WorstFit ────────────────────────────────────┘
///   NextFit  ── first fit after the last allocation, wrapping around
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
  #[default]
  FirstFit,
  NextFit,
  BestFit,
  WorstFit,
}

impl Strategy {
  pub const ALL: [Strategy; 4] = [
    Strategy::FirstFit,
    Strategy::NextFit,
    Strategy::BestFit,
    Strategy::WorstFit,
  ];

  /// Picks a free block of at least `size` bytes, or `None` if there is no
  /// such block. Never mutates the chain. `cursor` is only read by
  /// [`Strategy::NextFit`].
  pub fn select(
    self,
    chain: &BlockChain,
    size: usize,
    cursor: Option<BlockId>,
  ) -> Option<BlockId> {
    match self {
      Strategy::FirstFit => first_fit(chain, size),
      Strategy::NextFit => next_fit(chain, size, cursor),
      Strategy::BestFit => best_fit(chain, size),
      Strategy::WorstFit => worst_fit(chain, size),
    }
  }
}

#[inline]
fn fits(
  block: &Block,
  size: usize,
) -> bool {
  block.is_free() && block.size >= size
}

fn first_fit(
  chain: &BlockChain,
  size: usize,
) -> Option<BlockId> {
  chain
    .iter()
    .find(|(_, block)| fits(block, size))
    .map(|(id, _)| id)
}

/// Scans from the block after `cursor` to the tail, then from the head back
/// to the cursor itself. A missing or stale cursor degrades to first fit.
fn next_fit(
  chain: &BlockChain,
  size: usize,
  cursor: Option<BlockId>,
) -> Option<BlockId> {
  let Some((cursor, start)) = cursor.and_then(|id| chain.get(id).map(|block| (id, block.next())))
  else {
    return first_fit(chain, size);
  };

  let wrapped = chain.iter().scan(false, move |reached, item| {
    if *reached {
      return None;
    }
    *reached = item.0 == cursor;
    Some(item)
  });

  chain
    .iter_from(start)
    .chain(wrapped)
    .find(|(_, block)| fits(block, size))
    .map(|(id, _)| id)
}

fn best_fit(
  chain: &BlockChain,
  size: usize,
) -> Option<BlockId> {
  // min_by_key keeps the first of equal keys, i.e. the lowest offset.
  chain
    .iter()
    .filter(|(_, block)| fits(block, size))
    .min_by_key(|(_, block)| block.size - size)
    .map(|(id, _)| id)
}

fn worst_fit(
  chain: &BlockChain,
  size: usize,
) -> Option<BlockId> {
  chain
    .iter()
    .filter(|(_, block)| fits(block, size))
    .min_by_key(|(_, block)| Reverse(block.size - size))
    .map(|(id, _)| id)
}
