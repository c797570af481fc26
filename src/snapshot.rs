use std::fmt;

use crate::block::Block;

/// One free extent, as seen by a fit strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hole {
  pub offset: u16,
  pub length: u16,
}

/// A snapshot of the free extents of the pool, ascending by offset.
///
/// Snapshots are transient: the pool builds one per `allocate` call (or per
/// caller request), hands it to the fit strategy, and drops it. They never
/// outlive the operation that produced them and never alias pool state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoleList {
  holes: Vec<Hole>,
}

impl HoleList {
  /// Collects the holes out of a block list. Offsets and lengths fit `u16`
  /// because the pool caps capacity at 65 535 words.
  pub(crate) fn from_blocks(blocks: &[Block]) -> Self {
    let holes = blocks
      .iter()
      .filter(|b| b.is_hole())
      .map(|b| Hole {
        offset: b.offset as u16,
        length: b.length as u16,
      })
      .collect();

    Self { holes }
  }

  pub fn holes(&self) -> &[Hole] {
    &self.holes
  }

  pub fn iter(&self) -> impl Iterator<Item = &Hole> {
    self.holes.iter()
  }

  pub fn len(&self) -> usize {
    self.holes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.holes.is_empty()
  }

  /// Packs the snapshot into its wire form: a `u16` hole count followed by an
  /// `(offset, length)` `u16` pair per hole, everything little-endian.
  pub fn encode(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + self.holes.len() * 4);

    out.extend_from_slice(&(self.holes.len() as u16).to_le_bytes());
    for hole in &self.holes {
      out.extend_from_slice(&hole.offset.to_le_bytes());
      out.extend_from_slice(&hole.length.to_le_bytes());
    }

    out
  }
}

/// Human-readable rendering: `[offset, length] - [offset, length]`, no
/// trailing separator. An empty snapshot renders as an empty string.
impl fmt::Display for HoleList {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    for (i, hole) in self.holes.iter().enumerate() {
      if i > 0 {
        write!(f, " - ")?;
      }
      write!(f, "[{}, {}]", hole.offset, hole.length)?;
    }

    Ok(())
  }
}
