/// A maximal run of contiguous words sharing one allocation status.
///
/// Offsets and lengths are expressed in words, never bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  pub offset: usize,
  pub length: usize,
  pub allocated: bool,
}

impl Block {
  pub fn new(
    offset: usize,
    length: usize,
    allocated: bool,
  ) -> Self {
    Self { offset, length, allocated }
  }

  /// The word offset one past this block.
  pub fn end(&self) -> usize {
    self.offset + self.length
  }

  pub fn is_hole(&self) -> bool {
    !self.allocated
  }
}
