//! # wordpool - A Simulated Memory Pool and Allocator
//!
//! This crate manages a fixed-capacity raw buffer (the **arena**) as an ordered
//! list of non-overlapping extents, each either allocated or free, with
//! pluggable placement strategies and machine-readable snapshots.
//!
//! ## Overview
//!
//! ```text
//!   Extent List Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                      ARENA (word_size * capacity bytes)              │
//!   │                                                                      │
//!   │   ┌────────┬──────┬────────────┬──────┬──────────────────────────┐   │
//!   │   │ alloc  │ hole │   alloc    │ hole │          hole            │   │
//!   │   │ (0, 4) │(4, 2)│  (6, 10)   │  ✗   │         (16, 24)         │   │
//!   │   └────────┴──────┴────────────┴──────┴──────────────────────────┘   │
//!   │                                  ▲                                   │
//!   │                        never happens: adjacent                       │
//!   │                        holes are always coalesced                    │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   The block list partitions [0, capacity) exactly: no gaps, no overlaps,
//!   no zero-length blocks, and no two neighbouring holes.
//! ```
//!
//! Every `allocate` builds a snapshot of the current holes, hands it to the
//! active [`FitStrategy`], and carves the chosen hole. Every `free` validates
//! the address, marks the block free, and re-merges it with free neighbours.
//!
//! ## Crate Structure
//!
//! ```text
//!   wordpool
//!   ├── block      - Block extent record (internal)
//!   ├── snapshot   - Hole-list snapshot, binary encoding, text rendering
//!   ├── bitmap     - Per-word allocation bitmap codec
//!   ├── strategy   - FitStrategy trait, BestFit, WorstFit
//!   ├── error      - PoolError
//!   └── pool       - MemoryPool, the extent-list manager
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use wordpool::{BestFit, MemoryPool, WorstFit};
//!
//! let mut pool = MemoryPool::new(8, BestFit);
//! pool.initialize(1024).unwrap();
//!
//! let addr = pool.allocate(100).unwrap();
//! // 100 bytes at 8-byte words occupies 13 words.
//!
//! pool.set_strategy(WorstFit);
//! let other = pool.allocate(64).unwrap();
//!
//! pool.free(addr).unwrap();
//! pool.free(other).unwrap();
//!
//! // One hole again, spanning the whole arena.
//! assert_eq!(pool.get_hole_list(), Some(vec![1, 0, 0, 0, 0, 4]));
//! ```
//!
//! ## Snapshot Formats
//!
//! Capacity is capped at 65 535 words so that both formats fit 16-bit fields:
//!
//! - **Hole list**: `u16` hole count, then `(u16 offset, u16 length)` per
//!   hole, little-endian, ascending by offset.
//! - **Bitmap**: `u16` data-byte count, then one bit per word (1 = allocated),
//!   packed least-significant-bit first, padded with zero bits to a whole
//!   number of bytes.
//! - **Text dump**: `"[offset, length] - [offset, length]"`, written to a file
//!   by [`MemoryPool::dump_memory_map`].
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the pool is `!Send`/`!Sync`; wrap it in a lock
//!   to share it.
//! - **No paging or virtual memory**: one flat arena, word-granular offsets.
//! - **Pointers are epoch-bound**: re-`initialize` and `shutdown` invalidate
//!   every previously returned address.
//!
//! ## Safety
//!
//! The arena is raw memory obtained through `libc`; handing out pointers into
//! it is inherently unsafe business. The pool itself validates every inbound
//! address against its block list instead of trusting pointer arithmetic.

mod bitmap;
mod block;
mod error;
mod pool;
mod snapshot;
mod strategy;

pub use error::PoolError;
pub use pool::{MAX_CAPACITY_WORDS, MemoryPool};
pub use snapshot::{Hole, HoleList};
pub use strategy::{BestFit, FitStrategy, WorstFit};
