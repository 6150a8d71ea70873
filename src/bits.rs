//! # 比特转换工具
//!
//! 编码和解码共用的位序约定：每个字节按高位在前 (MSB-first) 展开成 8 个比特。

use crate::constants::BITS_PER_BYTE;

/// 由若干字节展开得到的比特序列，每个元素为 0 或 1。
///
/// 只能由完整的字节构造，因此长度总是 8 的倍数。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitstream {
    bits: Vec<u8>,
}

impl Bitstream {
    /// 把字节序列按高位在前展开成比特流。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * BITS_PER_BYTE);
        bytes
            .iter()
            .for_each(|&byte| bits.extend_from_slice(&byte_to_bits(byte)));
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.bits.iter().copied()
    }
}

/// 把一个字节展开为 8 个比特，最高位在前。
pub fn byte_to_bits(byte: u8) -> [u8; BITS_PER_BYTE] {
    std::array::from_fn(|i| (byte >> (BITS_PER_BYTE - 1 - i)) & 1)
}

/// 把最多 8 个比特 (最高位在前) 重新组合成一个字节。
pub fn bits_to_byte(bits: &[u8]) -> u8 {
    bits.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1))
}

/// 把比特序列按 8 位一组重新组合成字节，丢弃末尾不足 8 位的残余。
pub fn bits_to_bytes(bits: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bits.chunks_exact(BITS_PER_BYTE).map(bits_to_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_is_expanded_most_significant_bit_first() {
        assert_eq!(byte_to_bits(b'H'), [0, 1, 0, 0, 1, 0, 0, 0]);
        assert_eq!(byte_to_bits(0xFF), [1; 8]);
        assert_eq!(byte_to_bits(0), [0; 8]);
    }

    #[test]
    fn bits_regroup_into_the_original_byte() {
        assert_eq!(bits_to_byte(&[0, 0, 1, 0, 0, 0, 1, 1]), b'#');
        assert_eq!(bits_to_byte(&byte_to_bits(0xA5)), 0xA5);
    }

    #[test]
    fn trailing_partial_group_is_dropped() {
        let mut bits = Bitstream::from_bytes(b"HI").as_slice().to_vec();
        bits.extend_from_slice(&[1, 1, 1]);
        let bytes: Vec<u8> = bits_to_bytes(&bits).collect();
        assert_eq!(bytes, b"HI");
    }

    #[test]
    fn bitstream_length_is_a_multiple_of_eight() {
        let stream = Bitstream::from_bytes(b"HI###");
        assert_eq!(stream.len(), 40);
        assert_eq!(stream.len() % BITS_PER_BYTE, 0);
        assert!(Bitstream::from_bytes(&[]).is_empty());
    }
}
