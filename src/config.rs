use std::{fmt, str::FromStr};

use crate::{error::ParseStrategyError, strategy::Strategy};

/// Pool size used when none is given.
pub const DEFAULT_POOL_SIZE: usize = 6000;

/// Everything [`crate::Arena::with_config`] needs to set up a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
  pub pool_size: usize,
  pub strategy: Strategy,
}

impl ArenaConfig {
  pub fn new(
    pool_size: usize,
    strategy: Strategy,
  ) -> Self {
    Self {
      pool_size,
      strategy,
    }
  }

  pub fn with_pool_size(
    mut self,
    pool_size: usize,
  ) -> Self {
    self.pool_size = pool_size;
    self
  }

  pub fn with_strategy(
    mut self,
    strategy: Strategy,
  ) -> Self {
    self.strategy = strategy;
    self
  }
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self::new(DEFAULT_POOL_SIZE, Strategy::default())
  }
}

impl Strategy {
  pub fn name(self) -> &'static str {
    match self {
      Strategy::FirstFit => "first-fit",
      Strategy::NextFit => "next-fit",
      Strategy::BestFit => "best-fit",
      Strategy::WorstFit => "worst-fit",
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Accepts `first-fit`, `first_fit`, `firstfit` or just `first`, in any case.
impl FromStr for Strategy {
  type Err = ParseStrategyError;

  fn from_str(input: &str) -> Result<Self, Self::Err> {
    let normalized: String = input
      .trim()
      .chars()
      .filter(|c| !matches!(c, '-' | '_' | ' '))
      .map(|c| c.to_ascii_lowercase())
      .collect();

    let stem = normalized.strip_suffix("fit").unwrap_or(&normalized);

    match stem {
      "first" => Ok(Strategy::FirstFit),
      "next" => Ok(Strategy::NextFit),
      "best" => Ok(Strategy::BestFit),
      "worst" => Ok(Strategy::WorstFit),
      _ => Err(ParseStrategyError {
        input: input.to_owned(),
      }),
    }
  }
}
