//! Behaviour of the public arena surface.

use fitarena::{AllocError, Arena, ArenaConfig, BlockKind, FreeError, InitError, Strategy};

fn arena(
  pool_size: usize,
  strategy: Strategy,
) -> Arena {
  Arena::with_config(ArenaConfig::new(pool_size, strategy)).unwrap()
}

fn layout(arena: &Arena) -> Vec<(BlockKind, usize, usize)> {
  arena
    .blocks()
    .map(|block| (block.kind, block.offset, block.size))
    .collect()
}

/// Free holes of 100, 48 and 200 bytes separated by 4 byte allocations.
/// Returns the arena and the offsets of the two separators.
fn three_holes(strategy: Strategy) -> (Arena, [usize; 2]) {
  let mut arena = arena(356, Strategy::FirstFit);

  let a = arena.alloc(100).unwrap();
  let s1 = arena.alloc(4).unwrap();
  let b = arena.alloc(48).unwrap();
  let s2 = arena.alloc(4).unwrap();
  let c = arena.alloc(200).unwrap();
  for offset in [a, b, c] {
    arena.free(offset).unwrap();
  }
  arena.set_strategy(strategy);

  (arena, [s1, s2])
}

#[test]
fn strategies_pick_different_holes() {
  let (mut first, _) = three_holes(Strategy::FirstFit);
  let (mut best, _) = three_holes(Strategy::BestFit);
  let (mut worst, _) = three_holes(Strategy::WorstFit);

  assert_eq!(first.alloc(40), Ok(0));
  assert_eq!(best.alloc(40), Ok(104));
  assert_eq!(worst.alloc(40), Ok(156));
}

#[test]
fn next_fit_resumes_after_previous_allocation() {
  let (mut arena, _) = three_holes(Strategy::FirstFit);

  let head = arena.alloc(40).unwrap();
  assert_eq!(head, 0);

  arena.set_strategy(Strategy::NextFit);
  assert_eq!(arena.alloc(60), Ok(40));
  assert_eq!(arena.alloc(40), Ok(104));

  // A hole behind the cursor is only reached after wrapping.
  arena.free(head).unwrap();
  assert_eq!(arena.alloc(40), Ok(156));
  assert_eq!(arena.alloc(150), Ok(196));

  arena.set_strategy(Strategy::FirstFit);
  assert_eq!(arena.alloc(40), Ok(0));
}

#[test]
fn exhaustion_leaves_chain_untouched() {
  let mut arena = arena(256, Strategy::FirstFit);

  assert_eq!(
    arena.alloc(300),
    Err(AllocError::OutOfMemory {
      requested: 300,
      largest_free: 256
    })
  );
  assert_eq!(arena.block_count(), 1);
  assert_eq!(layout(&arena), vec![(BlockKind::Free, 0, 256)]);
}

#[test]
fn double_free_is_rejected() {
  let mut arena = arena(256, Strategy::BestFit);
  let offset = arena.alloc(32).unwrap();

  assert_eq!(arena.free(offset), Ok(()));
  assert_eq!(arena.free(offset), Err(FreeError::DoubleFree { offset }));
  assert_eq!(arena.validate(), Ok(()));
}

#[test]
fn coalescing_merges_freed_neighbours() {
  let mut arena = arena(256, Strategy::FirstFit);

  let first = arena.alloc(100).unwrap();
  let middle = arena.alloc(50).unwrap();
  let last = arena.alloc(50).unwrap();
  assert_eq!((first, middle, last), (0, 100, 152));
  assert_eq!(arena.block_count(), 4);

  arena.free(middle).unwrap();
  assert_eq!(arena.block_count(), 4);

  arena.free(first).unwrap();
  assert_eq!(arena.block_count(), 3);
  assert_eq!(
    layout(&arena),
    vec![
      (BlockKind::Free, 0, 152),
      (BlockKind::Allocated, 152, 52),
      (BlockKind::Free, 204, 52)
    ]
  );

  arena.free(last).unwrap();
  assert_eq!(layout(&arena), vec![(BlockKind::Free, 0, 256)]);
}

#[test]
fn alloc_free_round_trip_restores_state() {
  for strategy in Strategy::ALL {
    let mut arena = arena(512, strategy);
    let kept = arena.alloc(24).unwrap();
    let before = arena.stats();

    let offsets: Vec<_> = [10, 33, 7, 64]
      .into_iter()
      .map(|size| arena.alloc(size).unwrap())
      .collect();
    for offset in offsets.into_iter().rev() {
      arena.free(offset).unwrap();
    }

    assert_eq!(arena.stats(), before, "{strategy}");
    arena.free(kept).unwrap();
    assert_eq!(arena.block_count(), 1, "{strategy}");
  }
}

#[test]
fn invariants_hold_under_churn() {
  for strategy in Strategy::ALL {
    let mut arena = arena(1000, strategy);
    let mut live = Vec::new();

    for round in 0..200usize {
      if round % 3 == 2 && !live.is_empty() {
        let offset = live.remove(round % live.len());
        arena.free(offset).unwrap();
      } else if let Ok(offset) = arena.alloc(1 + (round * 37) % 90) {
        live.push(offset);
      }

      assert_eq!(arena.validate(), Ok(()), "{strategy} round {round}");
      let stats = arena.stats();
      assert_eq!(stats.free_bytes + stats.allocated_bytes, 1000);
    }
  }
}

#[test]
fn lifecycle() {
  let mut arena = Arena::new();
  assert_eq!(arena.alloc(8), Err(AllocError::Uninitialized));

  arena.init(64, Strategy::NextFit).unwrap();
  assert_eq!(
    arena.init(64, Strategy::NextFit),
    Err(InitError::AlreadyInitialized { pool_size: 64 })
  );

  arena.alloc(8).unwrap();
  arena.destroy();
  arena.destroy();
  assert_eq!(arena.block_count(), 0);

  arena.init(128, Strategy::WorstFit).unwrap();
  assert_eq!(arena.block_count(), 1);
  assert_eq!(arena.free(None), Ok(()));
}
