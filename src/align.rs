/// Alignment unit of the arena in bytes. Every block offset and size is a
/// multiple of this value.
pub const ALIGNMENT: usize = 4;

/// Rounds the given size up to the next multiple of [`ALIGNMENT`].
///
/// The caller must make sure `$value + ALIGNMENT - 1` does not overflow; the
/// engine rejects such requests before rounding.
///
/// # Examples
///
/// ```rust
/// use fitarena::align;
///
/// assert_eq!(align!(1), 4);
/// assert_eq!(align!(4), 4);
/// assert_eq!(align!(13), 16);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Whether `value` sits on an [`ALIGNMENT`] boundary.
#[inline]
pub const fn is_aligned(value: usize) -> bool {
  value % ALIGNMENT == 0
}
