use std::{ptr::NonNull, slice};

/// The fixed byte buffer an arena hands out pieces of. It is obtained once
/// from the C allocator and given back when dropped; it never grows.
///
/// ```text
///   libc::calloc(len, 1)
///          │
///          ▼
///   ┌──────────────────────────────────────────────┐
///   │ 0                 pool bytes             len │
///   └──────────────────────────────────────────────┘
///          ▲
///          └── libc::free on drop
/// ```
///
/// The raw pointer keeps `Pool` neither `Send` nor `Sync`, which is what we
/// want for a single-threaded arena.
pub struct Pool {
  ptr: NonNull<u8>,
  len: usize,
}

impl Pool {
  /// Obtains a zeroed buffer of `len` bytes, or `None` if the C allocator
  /// refuses.
  pub fn obtain(len: usize) -> Option<Self> {
    if len == 0 {
      return None;
    }

    // SAFETY: calloc either returns null or a pointer to `len` zeroed bytes.
    let raw = unsafe { libc::calloc(len, 1) } as *mut u8;

    NonNull::new(raw).map(|ptr| Self { ptr, len })
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Bytes in `[offset, offset + len)`, or `None` if that range leaves the
  /// pool.
  pub fn bytes(
    &self,
    offset: usize,
    len: usize,
  ) -> Option<&[u8]> {
    self.check_range(offset, len)?;

    // SAFETY: the range is inside the allocation and `&self` prevents any
    // mutable view from existing at the same time.
    Some(unsafe { slice::from_raw_parts(self.ptr.as_ptr().add(offset), len) })
  }

  pub fn bytes_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> Option<&mut [u8]> {
    self.check_range(offset, len)?;

    // SAFETY: the range is inside the allocation and `&mut self` makes this
    // the only view.
    Some(unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().add(offset), len) })
  }

  fn check_range(
    &self,
    offset: usize,
    len: usize,
  ) -> Option<()> {
    let end = offset.checked_add(len)?;
    (end <= self.len).then_some(())
  }
}

impl Drop for Pool {
  fn drop(&mut self) {
    // SAFETY: `ptr` came from calloc and is freed exactly once.
    unsafe { libc::free(self.ptr.as_ptr().cast()) };
  }
}

impl std::fmt::Debug for Pool {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    f.debug_struct("Pool")
      .field("ptr", &self.ptr)
      .field("len", &self.len)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_obtain_zeroed() {
    let pool = Pool::obtain(64).unwrap();

    assert_eq!(pool.len(), 64);
    assert!(pool.bytes(0, 64).unwrap().iter().all(|&b| b == 0));
  }

  #[test]
  fn test_zero_length_is_refused() {
    assert!(Pool::obtain(0).is_none());
  }

  #[test]
  fn test_write_then_read() {
    let mut pool = Pool::obtain(32).unwrap();

    pool.bytes_mut(8, 4).unwrap().copy_from_slice(&[1, 2, 3, 4]);

    assert_eq!(pool.bytes(8, 4).unwrap(), &[1, 2, 3, 4]);
    assert_eq!(pool.bytes(0, 8).unwrap(), &[0; 8]);
  }

  #[test]
  fn test_out_of_range() {
    let mut pool = Pool::obtain(32).unwrap();

    assert!(pool.bytes(30, 4).is_none());
    assert!(pool.bytes_mut(usize::MAX, 2).is_none());
    assert!(pool.bytes(32, 0).is_some());
  }
}
