use crate::block::Block;

/// Packs the allocation status of every word into a bitmap.
///
/// Data byte `m`, bit `k` (least significant first) holds word `8 * m + k`:
/// 1 for allocated, 0 for free. Words past the capacity pad the final byte
/// with zero bits. The output starts with a little-endian `u16` giving the
/// number of data bytes that follow.
pub fn encode(
  blocks: &[Block],
  capacity_words: usize,
) -> Vec<u8> {
  let data_len = capacity_words.div_ceil(8);
  let mut out = vec![0u8; 2 + data_len];

  out[..2].copy_from_slice(&(data_len as u16).to_le_bytes());

  for block in blocks.iter().filter(|b| b.allocated) {
    for word in block.offset..block.end() {
      out[2 + word / 8] |= 1 << (word % 8);
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_count_rounds_up() {
    let blocks = [Block::new(0, 10, false)];

    let bitmap = encode(&blocks, 10);

    assert_eq!(&bitmap[..2], &[2, 0]);
    assert_eq!(bitmap.len(), 4);
  }

  #[test]
  fn test_all_free_is_zero() {
    let blocks = [Block::new(0, 16, false)];

    assert_eq!(encode(&blocks, 16), vec![2, 0, 0, 0]);
  }

  #[test]
  fn test_padding_bits_stay_zero() {
    // Ten allocated words: the first byte fills up, the second byte only
    // carries words 8 and 9.
    let blocks = [Block::new(0, 10, true)];

    assert_eq!(encode(&blocks, 10), vec![2, 0, 0xFF, 0x03]);
  }

  #[test]
  fn test_mixed_blocks() {
    // Words 2..5 allocated, the rest free: bits 2, 3, 4 of the low byte.
    let blocks = [
      Block::new(0, 2, false),
      Block::new(2, 3, true),
      Block::new(5, 7, false),
    ];

    assert_eq!(encode(&blocks, 12), vec![2, 0, 0b0001_1100, 0]);
  }

  #[test]
  fn test_empty_pool() {
    assert_eq!(encode(&[], 0), vec![0, 0]);
  }
}
