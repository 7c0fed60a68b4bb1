// copyright 2017 Kaz Wesley

use digest::Digest;
use std::ops::{Add, BitXor, BitXorAssign};

/// One 16-byte unit of scratchpad memory, held as two little-endian lanes.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
#[repr(C, align(16))]
pub struct Block(pub [u64; 2]);

impl Block {
    #[inline(always)]
    pub fn from_bytes(b: &[u8; 16]) -> Self {
        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&b[..8]);
        hi.copy_from_slice(&b[8..]);
        Block([u64::from_le_bytes(lo), u64::from_le_bytes(hi)])
    }

    #[inline(always)]
    pub fn to_bytes(self) -> [u8; 16] {
        let mut b = [0u8; 16];
        b[..8].copy_from_slice(&self.0[0].to_le_bytes());
        b[8..].copy_from_slice(&self.0[1].to_le_bytes());
        b
    }

    #[inline(always)]
    pub fn lo(self) -> u64 {
        self.0[0]
    }

    #[inline(always)]
    pub fn hi(self) -> u64 {
        self.0[1]
    }

    /// Block index addressed by the low 32 bits under a byte-granular mask.
    #[inline(always)]
    pub fn addr(self, mask: u32) -> usize {
        ((self.0[0] as u32 & mask) >> 4) as usize
    }
}

impl BitXor for Block {
    type Output = Block;
    #[inline(always)]
    fn bitxor(self, rhs: Block) -> Block {
        Block([self.0[0] ^ rhs.0[0], self.0[1] ^ rhs.0[1]])
    }
}

impl BitXorAssign for Block {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Block) {
        self.0[0] ^= rhs.0[0];
        self.0[1] ^= rhs.0[1];
    }
}

/// Lane-wise wrapping addition.
impl Add for Block {
    type Output = Block;
    #[inline(always)]
    fn add(self, rhs: Block) -> Block {
        Block([
            self.0[0].wrapping_add(rhs.0[0]),
            self.0[1].wrapping_add(rhs.0[1]),
        ])
    }
}

/// The 200-byte Keccak-f[1600] state the whole hash is threaded through.
#[derive(Copy, Clone)]
pub struct State([u64; 25]);

impl State {
    /// Absorb the input with Keccak (rate 136) and keep the full permuted state.
    pub fn keccak(input: &[u8]) -> Self {
        let full = sha3::Keccak256Full::digest(input);
        let mut words = [0u64; 25];
        for (w, chunk) in words.iter_mut().zip(full.chunks_exact(8)) {
            let mut b = [0u8; 8];
            b.copy_from_slice(chunk);
            *w = u64::from_le_bytes(b);
        }
        State(words)
    }

    #[inline(always)]
    pub fn word(&self, i: usize) -> u64 {
        self.0[i]
    }

    #[inline(always)]
    pub fn block(&self, i: usize) -> Block {
        Block([self.0[2 * i], self.0[2 * i + 1]])
    }

    #[inline(always)]
    pub fn set_block(&mut self, i: usize, b: Block) {
        self.0[2 * i] = b.0[0];
        self.0[2 * i + 1] = b.0[1];
    }

    pub fn permute(&mut self) {
        keccak::f1600(&mut self.0);
    }

    pub fn to_bytes(&self) -> [u8; 200] {
        let mut out = [0u8; 200];
        for (chunk, w) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn from_words(words: [u64; 25]) -> Self {
        State(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn block_bytes_are_little_endian_lanes() {
        let b = Block::from_bytes(&hex!("0102030405060708 1112131415161718"));
        assert_eq!(b.lo(), 0x0807_0605_0403_0201);
        assert_eq!(b.hi(), 0x1817_1615_1413_1211);
        assert_eq!(Block::from_bytes(&b.to_bytes()), b);
    }

    #[test]
    fn block_add_wraps_per_lane() {
        let a = Block([u64::max_value(), 1]);
        let b = Block([2, u64::max_value()]);
        assert_eq!(a + b, Block([1, 0]));
    }

    #[test]
    fn addr_masks_low_word_only() {
        let b = Block([0xffff_ffff_ffff_ffff, 0]);
        assert_eq!(b.addr(0x1F_FFF0), 0x1_FFFF);
        assert_eq!(b.addr(0x1_FFF0), 0x1FFF);
        assert_eq!(Block([0x0f, 0]).addr(0x1F_FFF0), 0);
    }

    #[test]
    fn keccak_state_matches_fast_hash() {
        // cn_fast_hash("") is the first 32 bytes of the Keccak state.
        let state = State::keccak(b"");
        assert_eq!(
            state.to_bytes()[..32],
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }
}
