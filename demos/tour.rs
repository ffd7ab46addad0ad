use std::{env, error::Error};

use fitarena::{Arena, ArenaConfig, Strategy};

/// Prints the arena's chain after a step so the effect of each call is
/// visible.
fn show(
  label: &str,
  arena: &Arena,
) {
  println!("\n[{label}]\n{arena}");
}

/// Runs the same request sequence under one strategy.
fn tour(strategy: Strategy) -> Result<(), Box<dyn Error>> {
  println!("\n==================== {strategy} ====================");

  let mut arena = Arena::with_config(ArenaConfig::default().with_strategy(strategy))?;
  show("start", &arena);

  // --------------------------------------------------------------------
  // 1) Carve out three blocks like the classic driver program does.
  // --------------------------------------------------------------------
  let first = arena.alloc(1024)?;
  let second = arena.alloc(256)?;
  let third = arena.alloc(256)?;
  show("1: alloc 1024, 256, 256", &arena);

  // --------------------------------------------------------------------
  // 2) Write into the second block to show the offsets address real bytes.
  // --------------------------------------------------------------------
  if let Some(bytes) = arena.bytes_mut(second) {
    bytes.fill(0xAB);
  }
  println!("[2] second block starts with {:#X}", arena.bytes(second).map_or(0, |b| b[0]));

  // --------------------------------------------------------------------
  // 3) Punch two holes of different sizes.
  // --------------------------------------------------------------------
  arena.free(first)?;
  arena.free(third)?;
  show("3: free first and third", &arena);

  // --------------------------------------------------------------------
  // 4) A small request: this is where the strategies disagree.
  // --------------------------------------------------------------------
  let small = arena.alloc(100)?;
  println!("\n[4] alloc 100 landed at offset {small}");
  show("4", &arena);

  // --------------------------------------------------------------------
  // 5) Ask for more than any hole can hold.
  // --------------------------------------------------------------------
  match arena.alloc(8000) {
    Ok(offset) => println!("\n[5] alloc 8000 unexpectedly landed at {offset}"),
    Err(error) => println!("\n[5] alloc 8000 refused: {error}"),
  }

  // --------------------------------------------------------------------
  // 6) Freeing twice is reported, not absorbed.
  // --------------------------------------------------------------------
  arena.free(second)?;
  if let Err(error) = arena.free(second) {
    println!("[6] second free refused: {error}");
  }

  let stats = arena.stats();
  println!(
    "[6] {} blocks, {} bytes free, fragmentation {:.2}",
    stats.blocks,
    stats.free_bytes,
    stats.fragmentation()
  );

  arena.free(small)?;
  show("7: everything freed", &arena);

  arena.destroy();

  Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
  // Pass strategy names to restrict the tour, e.g. `best-fit next`.
  let strategies = env::args()
    .skip(1)
    .map(|arg| arg.parse::<Strategy>())
    .collect::<Result<Vec<_>, _>>()?;

  let strategies = if strategies.is_empty() {
    Strategy::ALL.to_vec()
  } else {
    strategies
  };

  for strategy in strategies {
    tour(strategy)?;
  }

  Ok(())
}
