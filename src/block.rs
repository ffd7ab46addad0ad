use std::fmt;

/// Index of a block node inside its [`crate::chain::BlockChain`]. Only valid
/// for the chain that handed it out, and only while that node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) usize);

/// Whether a block is available or handed out to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
  Free,
  Allocated,
}

impl fmt::Display for BlockKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      BlockKind::Free => f.write_str("free"),
      BlockKind::Allocated => f.write_str("allocated"),
    }
  }
}

/// Bookkeeping node for a contiguous span `[offset, offset + size)` of the
/// pool. The links are owned by the chain and never exposed mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
  pub kind: BlockKind,
  pub offset: usize,
  pub size: usize,
  pub(crate) prev: Option<BlockId>,
  pub(crate) next: Option<BlockId>,
}

impl Block {
  pub(crate) fn new(
    kind: BlockKind,
    offset: usize,
    size: usize,
  ) -> Self {
    Self {
      kind,
      offset,
      size,
      prev: None,
      next: None,
    }
  }

  #[inline]
  pub fn is_free(&self) -> bool {
    self.kind == BlockKind::Free
  }

  /// First offset past the end of this block.
  #[inline]
  pub fn end(&self) -> usize {
    self.offset + self.size
  }

  #[inline]
  pub fn contains(
    &self,
    offset: usize,
  ) -> bool {
    self.offset <= offset && offset < self.end()
  }

  pub(crate) fn next(&self) -> Option<BlockId> {
    self.next
  }
}
