use crate::snapshot::HoleList;

/// A placement policy: given a request size in words and a snapshot of the
/// current holes, picks the word offset of the hole to carve the allocation
/// from, or `None` when nothing fits.
///
/// Strategies are stateless and see only the snapshot, never the pool itself.
/// Any `Fn(usize, &HoleList) -> Option<usize>` closure qualifies, so one-off
/// policies can be plugged in without a named type.
pub trait FitStrategy {
  fn select_hole(
    &self,
    words: usize,
    holes: &HoleList,
  ) -> Option<usize>;
}

impl<F> FitStrategy for F
where
  F: Fn(usize, &HoleList) -> Option<usize>,
{
  fn select_hole(
    &self,
    words: usize,
    holes: &HoleList,
  ) -> Option<usize> {
    self(words, holes)
  }
}

/// Picks the smallest hole that still fits the request. Ties go to the
/// lowest offset, since only a strictly smaller hole replaces the candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BestFit;

impl FitStrategy for BestFit {
  fn select_hole(
    &self,
    words: usize,
    holes: &HoleList,
  ) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for hole in holes.iter() {
      let length = hole.length as usize;
      if length >= words && best.is_none_or(|(_, b)| length < b) {
        best = Some((hole.offset as usize, length));
      }
    }

    best.map(|(offset, _)| offset)
  }
}

/// Picks the largest hole that fits the request; ties go to the lowest
/// offset. Leaves the biggest possible remainder behind.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorstFit;

impl FitStrategy for WorstFit {
  fn select_hole(
    &self,
    words: usize,
    holes: &HoleList,
  ) -> Option<usize> {
    let mut worst: Option<(usize, usize)> = None;

    for hole in holes.iter() {
      let length = hole.length as usize;
      if length >= words && worst.is_none_or(|(_, w)| length > w) {
        worst = Some((hole.offset as usize, length));
      }
    }

    worst.map(|(offset, _)| offset)
  }
}
