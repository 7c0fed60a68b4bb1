// copyright 2017 Kaz Wesley

use crate::aes_round::{genkey, round};
use crate::policy::Geometry;
use crate::random_math::Program;
use crate::state::{Block, State};

#[inline(always)]
fn mul64(x: u64, y: u64) -> (u64, u64) {
    let lo = x.wrapping_mul(y);
    let hi = (u128::from(x).wrapping_mul(u128::from(y)) >> 64) as u64;
    (lo, hi)
}

/// Per-variant hooks into the main loop. Every hook defaults to the
/// original (variant 0) behavior.
pub(crate) trait Variant {
    /// Shuffle the three sibling blocks of `j` before it is written.
    #[inline(always)]
    fn shuffle(&mut self, _mem: &mut [Block], _j: usize, _a: Block, _b: Block, _c: &mut Block) {}
    /// Transform the block stored at the first address.
    #[inline(always)]
    fn first_store(&self, x: Block) -> Block {
        x
    }
    /// Perturb the multiplicand `d` and the accumulator copy `a` ahead of the multiply.
    #[inline(always)]
    fn pre_mul(&mut self, _a: &mut Block, _b: Block, _c: Block, _d: &mut Block) {}
    /// Transform the 128-bit product, laid out as (hi, lo).
    #[inline(always)]
    fn post_mul(&mut self, _mem: &mut [Block], _j: usize, prod: Block) -> Block {
        prod
    }
    /// Transform the block stored at the second address.
    #[inline(always)]
    fn second_store(&self, x: Block) -> Block {
        x
    }
    #[inline(always)]
    fn end_iter(&mut self, _b: Block) {}
}

#[derive(Default, Clone, Debug)]
pub struct Cnv0;

impl Variant for Cnv0 {}

/// Monero v7: a table lookup on byte 11 and a per-input 64-bit tweak.
#[derive(Clone, Debug)]
pub struct Cnv1 {
    tweak: u64,
}

impl Cnv1 {
    /// `blob` must be at least 43 bytes; the facade rejects shorter input.
    pub fn new(blob: &[u8], state: &State) -> Self {
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&blob[35..43]);
        Cnv1 {
            tweak: state.word(24) ^ u64::from_le_bytes(nonce),
        }
    }
}

impl Variant for Cnv1 {
    #[inline(always)]
    fn first_store(&self, mut x: Block) -> Block {
        let tmp = (x.0[1] >> 24) as u8;
        let index = ((((tmp >> 3) & 6) | (tmp & 1)) << 1) as u32;
        x.0[1] ^= u64::from((0x75310u32 >> index) & 0x30) << 24;
        x
    }
    #[inline(always)]
    fn second_store(&self, mut x: Block) -> Block {
        x.0[1] ^= self.tweak;
        x
    }
}

/// Shuffle-add of the 64-byte line around `j`; shared by v2 and cn/r.
#[inline(always)]
fn shuffle_add(mem: &mut [Block], j: usize, a: Block, b: Block, b1: Block) -> [Block; 3] {
    let chunk1 = mem[j ^ 1];
    let chunk2 = mem[j ^ 2];
    let chunk3 = mem[j ^ 3];
    mem[j ^ 1] = chunk3 + b1;
    mem[j ^ 2] = chunk1 + b;
    mem[j ^ 3] = chunk2 + a;
    [chunk1, chunk2, chunk3]
}

#[derive(Clone, Debug)]
pub struct Cnv2 {
    bb1: Block,
    div: u64,
    sqr: u32,
}

impl Cnv2 {
    pub fn new(state: &State) -> Self {
        Cnv2 {
            bb1: Block([state.word(8) ^ state.word(10), state.word(9) ^ state.word(11)]),
            div: state.word(12),
            sqr: state.word(13) as u32,
        }
    }
}

/// floor(sqrt(2^64 + input) * 2 - 2^33), exact.
#[inline(always)]
fn int_sqrt_v2(input: u64) -> u32 {
    let r = ((input as f64 + 18_446_744_073_709_551_616.0).sqrt() * 2.0 - 8_589_934_592.0) as u64;

    let s = r >> 1;
    let b = r & 1;
    let r2 = s.wrapping_mul(s + b).wrapping_add(r << 32);
    (r as u32)
        .wrapping_add((r2.wrapping_add(1 << 32) < input.wrapping_sub(s)) as u32)
        .wrapping_sub((r2.wrapping_add(b) > input) as u32)
}

impl Variant for Cnv2 {
    #[inline(always)]
    fn shuffle(&mut self, mem: &mut [Block], j: usize, a: Block, b: Block, _c: &mut Block) {
        shuffle_add(mem, j, a, b, self.bb1);
    }
    #[inline(always)]
    fn pre_mul(&mut self, _a: &mut Block, _b: Block, c: Block, d: &mut Block) {
        d.0[0] ^= self.div ^ (u64::from(self.sqr) << 32);
        let dividend = c.hi();
        let divisor = u64::from((c.lo() as u32).wrapping_add(self.sqr << 1) | 0x8000_0001);
        self.div = u64::from((dividend / divisor) as u32) + ((dividend % divisor) << 32);
        self.sqr = int_sqrt_v2(c.lo().wrapping_add(self.div));
    }
    #[inline(always)]
    fn post_mul(&mut self, mem: &mut [Block], j: usize, prod: Block) -> Block {
        mem[j ^ 1] ^= prod;
        prod ^ mem[j ^ 2]
    }
    #[inline(always)]
    fn end_iter(&mut self, bb: Block) {
        self.bb1 = bb;
    }
}

/// cn/r: v2 shuffles plus a height-seeded random program on nine 32-bit registers.
#[derive(Clone, Debug)]
pub struct Cnv4<'p> {
    bb1: Block,
    r: [u32; 9],
    program: &'p Program,
}

impl<'p> Cnv4<'p> {
    pub fn new(state: &State, program: &'p Program) -> Self {
        let (w12, w13) = (state.word(12), state.word(13));
        Cnv4 {
            bb1: Block([state.word(8) ^ state.word(10), state.word(9) ^ state.word(11)]),
            r: [w12 as u32, (w12 >> 32) as u32, w13 as u32, (w13 >> 32) as u32, 0, 0, 0, 0, 0],
            program,
        }
    }
}

impl<'p> Variant for Cnv4<'p> {
    #[inline(always)]
    fn shuffle(&mut self, mem: &mut [Block], j: usize, a: Block, b: Block, c: &mut Block) {
        let [chunk1, chunk2, chunk3] = shuffle_add(mem, j, a, b, self.bb1);
        *c ^= chunk1 ^ chunk2 ^ chunk3;
    }
    #[inline(always)]
    fn pre_mul(&mut self, a: &mut Block, b: Block, _c: Block, d: &mut Block) {
        let r = &mut self.r;
        d.0[0] ^= u64::from(r[0].wrapping_add(r[1]))
            | (u64::from(r[2].wrapping_add(r[3])) << 32);
        r[4] = a.lo() as u32;
        r[5] = a.hi() as u32;
        r[6] = b.lo() as u32;
        r[7] = self.bb1.lo() as u32;
        r[8] = self.bb1.hi() as u32;
        self.program.execute(r);
        a.0[0] ^= u64::from(r[2]) | (u64::from(r[3]) << 32);
        a.0[1] ^= u64::from(r[0]) | (u64::from(r[1]) << 32);
    }
    #[inline(always)]
    fn end_iter(&mut self, bb: Block) {
        self.bb1 = bb;
    }
}

/// The latency-bound main loop.
///
/// `mem` must hold exactly `geom.blocks()` blocks; every address the mask
/// can produce (and its three siblings) then lies inside it.
pub(crate) fn mix<V: Variant>(mem: &mut [Block], geom: Geometry, from: &State, mut var: V) {
    assert_eq!(mem.len(), geom.blocks());
    let mut aa = from.block(0) ^ from.block(2);
    let mut bb = from.block(1) ^ from.block(3);
    for _ in 0..geom.iterations {
        let j = aa.addr(geom.mask);
        let mut cc = round(mem[j], aa);
        var.shuffle(mem, j, aa, bb, &mut cc);
        mem[j] = var.first_store(bb ^ cc);

        let j = cc.addr(geom.mask);
        let mut dd = mem[j];
        let mut a1 = aa;
        var.pre_mul(&mut a1, bb, cc, &mut dd);
        let (lo, hi) = mul64(cc.lo(), dd.lo());
        let lohi = var.post_mul(mem, j, Block([hi, lo]));
        var.shuffle(mem, j, aa, bb, &mut cc);
        let sum = a1 + lohi;
        mem[j] = var.second_store(sum);

        aa = sum ^ dd;
        var.end_iter(bb);
        bb = cc;
    }
}

/// Fill the scratchpad by repeatedly encrypting state blocks 4..12.
pub(crate) fn explode(mem: &mut [Block], from: &State) {
    let keys = genkey(from.block(0), from.block(1));
    let mut text = [Block::default(); 8];
    for (i, t) in text.iter_mut().enumerate() {
        *t = from.block(4 + i);
    }
    for m in mem.chunks_exact_mut(8) {
        for t in text.iter_mut() {
            for k in keys.iter() {
                *t = round(*t, *k);
            }
        }
        m.copy_from_slice(&text);
    }
}

/// Fold the scratchpad back into state blocks 4..12.
pub(crate) fn implode(into: &mut State, mem: &[Block]) {
    let keys = genkey(into.block(2), into.block(3));
    let mut text = [Block::default(); 8];
    for (i, t) in text.iter_mut().enumerate() {
        *t = into.block(4 + i);
    }
    for m in mem.chunks_exact(8) {
        for (t, m) in text.iter_mut().zip(m) {
            *t ^= *m;
            for k in keys.iter() {
                *t = round(*t, *k);
            }
        }
    }
    for (i, t) in text.iter().enumerate() {
        into.set_block(4 + i, *t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_sqrt() {
        assert_eq!(int_sqrt_v2(0), 0);
        assert_eq!(int_sqrt_v2(1 << 32), 0);
        assert_eq!(int_sqrt_v2((1 << 32) + 1), 1);
        assert_eq!(int_sqrt_v2(1 << 50), 262140);
        assert_eq!(int_sqrt_v2((1 << 55) + 20963331), 8384515);
        assert_eq!(int_sqrt_v2((1 << 55) + 20963332), 8384516);
        assert_eq!(int_sqrt_v2((1 << 62) + 26599786), 1013904242);
        assert_eq!(int_sqrt_v2((1 << 62) + 26599787), 1013904243);
        assert_eq!(int_sqrt_v2(-1i64 as u64), 3558067407);
    }

    #[test]
    fn mul64_splits_product() {
        assert_eq!(mul64(u64::max_value(), 2), (u64::max_value() - 1, 1));
        assert_eq!(mul64(1 << 32, 1 << 32), (0, 1));
    }

    #[test]
    fn v1_byte_tweak_only_touches_byte_11() {
        let v = Cnv1 { tweak: 0 };
        for byte in 0..=255u64 {
            let x = Block([0x1122_3344_5566_7788, 0x9900_aabb_0000_ccdd | (byte << 24)]);
            let y = v.first_store(x);
            assert_eq!(x.0[0], y.0[0]);
            assert_eq!(x.0[1] & !0xff00_0000, y.0[1] & !0xff00_0000);
            assert_eq!((x.0[1] ^ y.0[1]) & !0x3000_0000, 0);
        }
    }

    #[test]
    fn shuffle_add_rotates_siblings() {
        let mut mem = [Block([1, 1]), Block([2, 2]), Block([3, 3]), Block([4, 4])];
        let a = Block([10, 10]);
        let b = Block([20, 20]);
        let b1 = Block([30, 30]);
        let old = shuffle_add(&mut mem, 0, a, b, b1);
        assert_eq!(old, [Block([2, 2]), Block([3, 3]), Block([4, 4])]);
        assert_eq!(mem[1], Block([34, 34]));
        assert_eq!(mem[2], Block([22, 22]));
        assert_eq!(mem[3], Block([13, 13]));
        assert_eq!(mem[0], Block([1, 1]));
    }
}
