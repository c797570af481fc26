use std::io;

use thiserror::Error;

/// Everything that can go wrong while driving a [`MemoryPool`](crate::MemoryPool).
///
/// All variants are recoverable: the pool's block list is left untouched by any
/// failing operation, so the caller can retry with corrected input.
#[derive(Debug, Error)]
pub enum PoolError {
  /// `initialize` was asked for a capacity outside `1..=65_535` words.
  /// The snapshot formats carry offsets and lengths as 16-bit fields, so the
  /// pool cannot represent anything larger.
  #[error("capacity of {0} words is outside the supported range 1..=65535")]
  InvalidCapacity(usize),

  /// `allocate` was called with a zero-byte request, or before `initialize`.
  #[error("allocation request is empty or the pool is uninitialized")]
  InvalidSize,

  /// No hole is large enough for the request. This is an expected outcome of
  /// a full pool, not a bug; callers typically free something and retry.
  #[error("no hole satisfies the requested size")]
  NoFit,

  /// `free` was handed an address that does not map to the start of a
  /// currently allocated block. The block list is unchanged.
  #[error("address does not correspond to an allocated block")]
  InvalidAddress,

  /// Writing the memory-map dump failed, or the host refused to hand out the
  /// arena buffer.
  #[error("i/o failure")]
  Io(#[from] io::Error),
}
