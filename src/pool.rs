use std::fs;
use std::io;
use std::path::Path;
use std::ptr;

use libc::{c_void, free, malloc};
use log::{debug, trace};

use crate::bitmap;
use crate::block::Block;
use crate::error::PoolError;
use crate::snapshot::HoleList;
use crate::strategy::FitStrategy;

/// Upper bound on the pool capacity: snapshot offsets and lengths are 16-bit.
pub const MAX_CAPACITY_WORDS: usize = 65_535;

/// The extent-list manager.
///
/// Owns a raw arena of `word_size * capacity_words` bytes and an ordered list
/// of blocks that partitions it. Allocation asks the active [`FitStrategy`]
/// for a hole and carves it; freeing re-merges neighbouring holes so that no
/// two adjacent blocks are ever both free.
///
/// The pool holds a raw pointer and is deliberately neither `Send` nor
/// `Sync`; callers sharing one across threads must serialize access
/// themselves.
pub struct MemoryPool {
  word_size: usize,
  capacity_words: usize,
  arena: *mut u8,
  blocks: Vec<Block>,
  strategy: Box<dyn FitStrategy>,
}

impl MemoryPool {
  /// Creates an uninitialized pool with the given word size in bytes and
  /// placement strategy. Call [`initialize`](Self::initialize) before
  /// allocating.
  ///
  /// # Panics
  ///
  /// Panics if `word_size` is zero.
  pub fn new(
    word_size: usize,
    strategy: impl FitStrategy + 'static,
  ) -> Self {
    assert!(word_size > 0, "word size must be nonzero");

    Self {
      word_size,
      capacity_words: 0,
      arena: ptr::null_mut(),
      blocks: Vec::new(),
      strategy: Box::new(strategy),
    }
  }

  /// Acquires the arena and resets the block list to a single hole spanning
  /// the whole capacity. Any previous arena is released first; pointers
  /// handed out before this call become invalid.
  pub fn initialize(
    &mut self,
    capacity_words: usize,
  ) -> Result<(), PoolError> {
    if capacity_words == 0 || capacity_words > MAX_CAPACITY_WORDS {
      return Err(PoolError::InvalidCapacity(capacity_words));
    }

    self.shutdown();

    let bytes = self.word_size * capacity_words;
    let arena = unsafe { malloc(bytes) } as *mut u8;
    if arena.is_null() {
      return Err(io::Error::new(io::ErrorKind::OutOfMemory, "arena allocation refused").into());
    }

    self.arena = arena;
    self.capacity_words = capacity_words;
    self.blocks.push(Block::new(0, capacity_words, false));

    debug!(
      "initialized pool: {} words of {} bytes at {:?}",
      capacity_words, self.word_size, self.arena
    );

    Ok(())
  }

  /// Releases the arena and clears the block list. Calling it on an already
  /// shut-down pool is a no-op. Also runs on drop, so the arena is returned
  /// to the host on every exit path.
  pub fn shutdown(&mut self) {
    if !self.arena.is_null() {
      debug!("releasing arena at {:?}", self.arena);
      unsafe { free(self.arena as *mut c_void) };
      self.arena = ptr::null_mut();
    }

    self.capacity_words = 0;
    self.blocks.clear();
  }

  /// Allocates `size_in_bytes` bytes, rounded up to whole words, and returns
  /// a pointer into the arena.
  ///
  /// Fails with [`PoolError::InvalidSize`] for a zero-byte request or an
  /// uninitialized pool, and with [`PoolError::NoFit`] when no hole can
  /// satisfy the request; the block list is unchanged on any failure.
  pub fn allocate(
    &mut self,
    size_in_bytes: usize,
  ) -> Result<*mut u8, PoolError> {
    if size_in_bytes == 0 || self.arena.is_null() {
      return Err(PoolError::InvalidSize);
    }

    let words = size_in_bytes.div_ceil(self.word_size);
    let snapshot = HoleList::from_blocks(&self.blocks);

    let Some(offset) = self.strategy.select_hole(words, &snapshot) else {
      trace!("no fit for {} words among {} holes", words, snapshot.len());
      return Err(PoolError::NoFit);
    };

    // The strategy is a plug-in; its answer is checked, not trusted. It must
    // name an existing hole large enough for the request.
    let index = self
      .blocks
      .iter()
      .position(|b| b.is_hole() && b.offset == offset && b.length >= words)
      .ok_or(PoolError::NoFit)?;

    if self.blocks[index].length == words {
      // Exact fit: the hole is consumed whole.
      self.blocks[index].allocated = true;
    } else {
      // Shrink the hole in place and put the allocation in front of it.
      self.blocks[index].offset += words;
      self.blocks[index].length -= words;
      self.blocks.insert(index, Block::new(offset, words, true));
    }

    trace!("allocated {} words at offset {}", words, offset);

    Ok(unsafe { self.arena.add(offset * self.word_size) })
  }

  /// Returns a previously allocated block to the pool and merges it with any
  /// free neighbour.
  ///
  /// The address must be one returned by [`allocate`](Self::allocate) since
  /// the last `initialize`; anything else fails with
  /// [`PoolError::InvalidAddress`] before any state is touched.
  pub fn free(
    &mut self,
    address: *mut u8,
  ) -> Result<(), PoolError> {
    let offset = self.offset_of(address)?;

    let index = self
      .blocks
      .iter()
      .position(|b| b.allocated && b.offset == offset)
      .ok_or(PoolError::InvalidAddress)?;

    self.blocks[index].allocated = false;

    // Merge with the following hole, if there is a following block at all.
    if index + 1 < self.blocks.len() && self.blocks[index + 1].is_hole() {
      self.blocks[index].length += self.blocks[index + 1].length;
      self.blocks.remove(index + 1);
    }

    // Merge backwards, symmetrically.
    if index > 0 && self.blocks[index - 1].is_hole() {
      self.blocks[index - 1].length += self.blocks[index].length;
      self.blocks.remove(index);
    }

    trace!("freed block at offset {}", offset);

    Ok(())
  }

  /// Swaps the placement strategy. Takes effect on the next `allocate`;
  /// already-placed blocks are unaffected.
  pub fn set_strategy(
    &mut self,
    strategy: impl FitStrategy + 'static,
  ) {
    debug!("strategy replaced");
    self.strategy = Box::new(strategy);
  }

  /// Encoded hole list (see [`HoleList::encode`]), or `None` when the pool
  /// is uninitialized. A fully allocated pool still yields `Some` with a
  /// zero hole count, which is how callers tell the two states apart.
  pub fn get_hole_list(&self) -> Option<Vec<u8>> {
    if self.blocks.is_empty() {
      return None;
    }

    Some(HoleList::from_blocks(&self.blocks).encode())
  }

  /// One-bit-per-word allocation bitmap over the whole capacity, preceded by
  /// a little-endian `u16` data-byte count.
  pub fn get_bitmap(&self) -> Vec<u8> {
    bitmap::encode(&self.blocks, self.capacity_words)
  }

  /// Writes the human-readable hole list to `path` as raw bytes.
  /// An uninitialized or fully allocated pool writes an empty file.
  pub fn dump_memory_map(
    &self,
    path: impl AsRef<Path>,
  ) -> Result<(), PoolError> {
    let text = HoleList::from_blocks(&self.blocks).to_string();
    fs::write(path, text.as_bytes())?;

    Ok(())
  }

  /// The word size in bytes chosen at construction.
  pub fn get_word_size(&self) -> usize {
    self.word_size
  }

  /// Base address of the arena; null while uninitialized.
  pub fn get_memory_start(&self) -> *mut u8 {
    self.arena
  }

  /// Total arena size in bytes; zero while uninitialized.
  pub fn get_memory_limit(&self) -> usize {
    self.word_size * self.capacity_words
  }

  /// Maps an arena address back to its word offset, rejecting anything that
  /// cannot have come from this arena.
  fn offset_of(
    &self,
    address: *mut u8,
  ) -> Result<usize, PoolError> {
    if self.arena.is_null() || address.is_null() {
      return Err(PoolError::InvalidAddress);
    }

    let base = self.arena as usize;
    let addr = address as usize;
    if addr < base || addr >= base + self.get_memory_limit() {
      return Err(PoolError::InvalidAddress);
    }

    Ok((addr - base) / self.word_size)
  }

  #[cfg(test)]
  pub(crate) fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  /// Checks the structural invariants of the block list. Test-only; public
  /// operations are expected to keep these true at all times.
  #[cfg(test)]
  pub(crate) fn assert_sane(&self) {
    if self.blocks.is_empty() {
      assert!(self.arena.is_null(), "initialized pool with no blocks");
      return;
    }

    let mut expected = 0;
    let mut previous_free = false;

    for block in &self.blocks {
      assert_eq!(block.offset, expected, "gap or overlap in block list");
      assert!(block.length > 0, "zero-length block");
      assert!(
        !(previous_free && block.is_hole()),
        "adjacent holes were not coalesced"
      );

      expected = block.end();
      previous_free = block.is_hole();
    }

    assert_eq!(expected, self.capacity_words, "blocks do not cover the arena");
  }
}

impl Drop for MemoryPool {
  fn drop(&mut self) {
    self.shutdown();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::strategy::{BestFit, WorstFit};

  fn pool_with_capacity(words: usize) -> MemoryPool {
    let mut pool = MemoryPool::new(1, BestFit);
    pool.initialize(words).unwrap();
    pool
  }

  #[test]
  fn test_initialize_rejects_oversized_capacity() {
    let mut pool = MemoryPool::new(4, BestFit);

    assert!(matches!(
      pool.initialize(MAX_CAPACITY_WORDS + 1),
      Err(PoolError::InvalidCapacity(_))
    ));
    assert!(pool.get_memory_start().is_null());

    pool.initialize(MAX_CAPACITY_WORDS).unwrap();
    assert_eq!(pool.get_memory_limit(), 4 * MAX_CAPACITY_WORDS);
  }

  #[test]
  fn test_initialize_rejects_zero_capacity() {
    let mut pool = MemoryPool::new(4, BestFit);

    assert!(matches!(
      pool.initialize(0),
      Err(PoolError::InvalidCapacity(0))
    ));
  }

  #[test]
  fn test_reinitialize_discards_state() {
    let mut pool = pool_with_capacity(20);
    pool.allocate(5).unwrap();

    pool.initialize(30).unwrap();

    assert_eq!(pool.blocks(), &[Block::new(0, 30, false)]);
    pool.assert_sane();
  }

  #[test]
  fn test_shutdown_is_idempotent() {
    let mut pool = pool_with_capacity(10);

    pool.shutdown();
    pool.shutdown();

    assert!(pool.get_memory_start().is_null());
    assert_eq!(pool.get_memory_limit(), 0);
    assert_eq!(pool.get_hole_list(), None);
  }

  #[test]
  fn test_allocate_rounds_bytes_up_to_words() {
    let mut pool = MemoryPool::new(8, BestFit);
    pool.initialize(10).unwrap();

    pool.allocate(9).unwrap();

    // 9 bytes at 8-byte words is a 2-word block.
    assert_eq!(pool.blocks()[0], Block::new(0, 2, true));
    pool.assert_sane();
  }

  #[test]
  fn test_allocate_rejects_zero_and_uninitialized() {
    let mut pool = MemoryPool::new(1, BestFit);

    assert!(matches!(pool.allocate(4), Err(PoolError::InvalidSize)));

    pool.initialize(10).unwrap();
    assert!(matches!(pool.allocate(0), Err(PoolError::InvalidSize)));
  }

  #[test]
  fn test_allocate_returns_addresses_inside_arena() {
    let mut pool = MemoryPool::new(4, BestFit);
    pool.initialize(16).unwrap();

    let base = pool.get_memory_start();
    let first = pool.allocate(4).unwrap();
    let second = pool.allocate(4).unwrap();

    assert_eq!(first, base);
    assert_eq!(second as usize, base as usize + 4);
    assert!((second as usize) < base as usize + pool.get_memory_limit());
  }

  #[test]
  fn test_no_fit_leaves_state_unchanged() {
    let mut pool = pool_with_capacity(10);
    pool.allocate(4).unwrap();
    let before = pool.blocks().to_vec();

    assert!(matches!(pool.allocate(7), Err(PoolError::NoFit)));

    assert_eq!(pool.blocks(), &before[..]);
    pool.assert_sane();
  }

  #[test]
  fn test_free_round_trip_restores_single_hole() {
    let mut pool = pool_with_capacity(20);
    let shape = pool.blocks().to_vec();

    let addr = pool.allocate(6).unwrap();
    pool.free(addr).unwrap();

    assert_eq!(pool.blocks(), &shape[..]);
    pool.assert_sane();
  }

  #[test]
  fn test_free_coalesces_both_sides() {
    let mut pool = pool_with_capacity(12);
    let a = pool.allocate(4).unwrap();
    let b = pool.allocate(4).unwrap();
    let c = pool.allocate(4).unwrap();

    pool.free(a).unwrap();
    pool.free(c).unwrap();
    // Freeing the middle block must merge all three holes into one.
    pool.free(b).unwrap();

    assert_eq!(pool.blocks(), &[Block::new(0, 12, false)]);
    pool.assert_sane();
  }

  #[test]
  fn test_free_does_not_merge_with_allocated_neighbour() {
    let mut pool = pool_with_capacity(20);
    let first = pool.allocate(4).unwrap();
    pool.allocate(16).unwrap();

    pool.free(first).unwrap();

    assert_eq!(pool.blocks()[0], Block::new(0, 4, false));
    assert_eq!(pool.blocks()[1], Block::new(4, 16, true));
    pool.assert_sane();
  }

  #[test]
  fn test_free_rejects_unknown_address() {
    let mut pool = pool_with_capacity(10);
    let addr = pool.allocate(4).unwrap();
    let before = pool.blocks().to_vec();

    // Inside the arena but not the start of an allocated block.
    let bogus = unsafe { addr.add(5) };
    assert!(matches!(pool.free(bogus), Err(PoolError::InvalidAddress)));

    // Outside the arena entirely.
    let mut elsewhere = 0u8;
    assert!(matches!(
      pool.free(&mut elsewhere as *mut u8),
      Err(PoolError::InvalidAddress)
    ));

    assert_eq!(pool.blocks(), &before[..]);
  }

  #[test]
  fn test_double_free_is_rejected() {
    let mut pool = pool_with_capacity(10);
    let addr = pool.allocate(4).unwrap();

    pool.free(addr).unwrap();
    assert!(matches!(pool.free(addr), Err(PoolError::InvalidAddress)));
  }

  #[test]
  fn test_strategy_swap_affects_next_allocation() {
    let mut pool = pool_with_capacity(30);

    // Carve holes of 4 and 16 words separated by an allocation:
    // [hole 4][alloc 2][hole 16][alloc 8]
    let a = pool.allocate(4).unwrap();
    pool.allocate(2).unwrap();
    let c = pool.allocate(16).unwrap();
    pool.allocate(8).unwrap();
    pool.free(a).unwrap();
    pool.free(c).unwrap();

    pool.set_strategy(WorstFit);
    let placed = pool.allocate(3).unwrap();

    // Worst fit lands in the 16-word hole at offset 6.
    let offset = (placed as usize - pool.get_memory_start() as usize) / pool.get_word_size();
    assert_eq!(offset, 6);
    pool.assert_sane();
  }

  #[test]
  fn test_misbehaving_strategy_is_contained() {
    let mut pool = pool_with_capacity(10);
    pool.allocate(10).unwrap();

    // Claims an offset that is not a hole.
    pool.set_strategy(|_words: usize, _holes: &HoleList| Some(0));

    let before = pool.blocks().to_vec();
    assert!(matches!(pool.allocate(1), Err(PoolError::NoFit)));
    assert_eq!(pool.blocks(), &before[..]);
  }

  #[test]
  fn test_hole_list_distinguishes_uninitialized_from_full() {
    let mut pool = MemoryPool::new(1, BestFit);
    assert_eq!(pool.get_hole_list(), None);

    pool.initialize(8).unwrap();
    pool.allocate(8).unwrap();

    // Fully allocated: a snapshot with zero holes, not `None`.
    assert_eq!(pool.get_hole_list(), Some(vec![0, 0]));
  }

  #[test]
  fn test_hole_list_encoding() {
    let mut pool = pool_with_capacity(18);
    let a = pool.allocate(10).unwrap();
    pool.allocate(2).unwrap();
    pool.free(a).unwrap();

    // Holes (0, 10) and (12, 6).
    assert_eq!(
      pool.get_hole_list(),
      Some(vec![2, 0, 0, 0, 10, 0, 12, 0, 6, 0])
    );
  }

  #[test]
  fn test_bitmap_for_ten_words() {
    let mut pool = pool_with_capacity(10);
    pool.allocate(2).unwrap();

    // ceil(10 / 8) = 2 data bytes; words 0 and 1 set.
    assert_eq!(pool.get_bitmap(), vec![2, 0, 0b11, 0]);
  }

  #[test]
  fn test_dump_memory_map() {
    let mut pool = pool_with_capacity(18);
    let a = pool.allocate(10).unwrap();
    pool.allocate(2).unwrap();
    pool.free(a).unwrap();

    let path = std::env::temp_dir().join("wordpool-dump-test.txt");
    pool.dump_memory_map(&path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "[0, 10] - [12, 6]");
    fs::remove_file(&path).unwrap();
  }

  #[test]
  fn test_dump_memory_map_surfaces_io_error() {
    let pool = pool_with_capacity(4);

    let result = pool.dump_memory_map("/definitely/not/a/real/dir/dump.txt");
    assert!(matches!(result, Err(PoolError::Io(_))));
  }

  #[test]
  fn test_exact_fit_then_isolated_hole() {
    // Best-fit allocate(4) lands at offset 0; allocate(16) consumes the
    // remainder exactly; freeing the first block leaves a 4-word hole that
    // cannot merge with its allocated neighbour.
    let mut pool = MemoryPool::new(1, BestFit);
    pool.initialize(20).unwrap();

    let first = pool.allocate(4).unwrap();
    assert_eq!(first, pool.get_memory_start());
    assert_eq!(pool.blocks()[1], Block::new(4, 16, false));

    pool.allocate(16).unwrap();
    assert_eq!(pool.blocks().len(), 2);
    assert!(pool.blocks().iter().all(|b| b.allocated));

    pool.free(first).unwrap();
    assert_eq!(pool.blocks()[0], Block::new(0, 4, false));
    assert_eq!(pool.blocks()[1], Block::new(4, 16, true));
    pool.assert_sane();
  }

  #[test]
  fn test_invariants_across_mixed_workload() {
    let mut pool = MemoryPool::new(2, BestFit);
    pool.initialize(64).unwrap();

    let mut live = Vec::new();
    for size in [6, 10, 2, 14, 8, 4] {
      live.push(pool.allocate(size).unwrap());
      pool.assert_sane();
    }

    // Free every other block, then fill back in with worst fit.
    for addr in live.iter().step_by(2) {
      pool.free(*addr).unwrap();
      pool.assert_sane();
    }

    pool.set_strategy(WorstFit);
    while pool.allocate(2).is_ok() {
      pool.assert_sane();
    }

    // Coverage must still hold once the pool reports no fit.
    pool.assert_sane();
  }
}
