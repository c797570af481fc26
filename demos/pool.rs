use wordpool::{BestFit, HoleList, MemoryPool, PoolError, WorstFit};

/// Prints the hole list and bitmap side by side so each step's effect on the
/// extent list is visible.
fn print_state(
  label: &str,
  pool: &MemoryPool,
) {
  println!(
    "[{}] holes = {:?}, bitmap = {:?}",
    label,
    pool.get_hole_list(),
    pool.get_bitmap()
  );
}

fn main() -> Result<(), PoolError> {
  // A pool of 32 words, 2 bytes each, placing with best fit.
  let mut pool = MemoryPool::new(2, BestFit);
  pool.initialize(32)?;

  println!(
    "arena: base = {:?}, limit = {} bytes, word size = {}",
    pool.get_memory_start(),
    pool.get_memory_limit(),
    pool.get_word_size()
  );
  print_state("start", &pool);

  // --------------------------------------------------------------------
  // 1) Carve three allocations. Each one splits the single big hole.
  // --------------------------------------------------------------------
  let a = pool.allocate(8)?; // 4 words at offset 0
  let b = pool.allocate(12)?; // 6 words at offset 4
  let c = pool.allocate(8)?; // 4 words at offset 10
  print_state("after three allocations", &pool);

  // --------------------------------------------------------------------
  // 2) Free the middle one. Its neighbours are allocated, so the hole
  //    stays put instead of merging.
  // --------------------------------------------------------------------
  pool.free(b)?;
  print_state("freed the middle block", &pool);

  // --------------------------------------------------------------------
  // 3) Best fit reuses the 6-word hole for a 5-word request because it is
  //    the tightest one that fits.
  // --------------------------------------------------------------------
  let d = pool.allocate(10)?;
  assert_eq!(d, b);
  print_state("best fit reused the hole", &pool);

  // --------------------------------------------------------------------
  // 4) Switch to worst fit: the next request lands in the largest hole,
  //    at the tail of the arena.
  // --------------------------------------------------------------------
  pool.set_strategy(WorstFit);
  let e = pool.allocate(4)?;
  println!(
    "[worst fit] placed at word offset {}",
    (e as usize - pool.get_memory_start() as usize) / pool.get_word_size()
  );

  // --------------------------------------------------------------------
  // 5) A custom strategy is just a closure over the snapshot: this one
  //    picks the first hole, i.e. classic first fit.
  // --------------------------------------------------------------------
  pool.set_strategy(|words: usize, holes: &HoleList| {
    holes
      .iter()
      .find(|h| h.length as usize >= words)
      .map(|h| h.offset as usize)
  });
  let f = pool.allocate(2)?;
  print_state("first-fit closure", &pool);

  // --------------------------------------------------------------------
  // 6) Freeing everything coalesces the arena back into a single hole.
  // --------------------------------------------------------------------
  for addr in [a, c, d, e, f] {
    pool.free(addr)?;
  }
  print_state("all freed", &pool);

  // --------------------------------------------------------------------
  // 7) Dump the memory map as text and request more than the pool holds.
  // --------------------------------------------------------------------
  let dump = std::env::temp_dir().join("wordpool-demo.txt");
  pool.dump_memory_map(&dump)?;
  println!("memory map written to {}", dump.display());

  match pool.allocate(1024) {
    Err(PoolError::NoFit) => println!("oversized request correctly reported no fit"),
    other => println!("unexpected outcome: {:?}", other.map(|p| p as usize)),
  }

  pool.shutdown();
  Ok(())
}
