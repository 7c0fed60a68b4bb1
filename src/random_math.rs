// copyright 2017 Kaz Wesley

//! Height-seeded random integer programs for cn/r (variant 4).
//!
//! The generator targets an abstract CPU with three ALUs (one of which can
//! multiply) and emits instructions until every variable register has
//! accumulated `TOTAL_LATENCY` cycles of dependent work.

use blake_hash::Blake256;
use digest::Digest;
use tracing::trace;

const TOTAL_LATENCY: usize = 15 * 3;
const NUM_INSTRUCTIONS_MIN: usize = 60;
const NUM_INSTRUCTIONS_MAX: usize = 70;
const ALU_COUNT_MUL: usize = 1;
const ALU_COUNT: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Mul,
    Add,
    Sub,
    Ror,
    Rol,
    Xor,
}

impl Op {
    fn latency(self) -> usize {
        match self {
            Op::Mul => 3,
            Op::Add | Op::Ror | Op::Rol => 2,
            Op::Sub | Op::Xor => 1,
        }
    }

    fn asic_latency(self) -> usize {
        match self {
            Op::Mul => 3,
            _ => 1,
        }
    }

    fn alus(self) -> usize {
        match self {
            Op::Mul => ALU_COUNT_MUL,
            _ => ALU_COUNT,
        }
    }

    fn is_rotation(self) -> bool {
        self == Op::Ror || self == Op::Rol
    }

    fn code(self) -> u32 {
        self as u32
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub dst: u8,
    pub src: u8,
    pub c: u32,
}

/// Byte stream that re-hashes itself with Blake-256 whenever it runs dry.
struct Seed {
    data: [u8; 32],
    index: usize,
}

impl Seed {
    fn new(height: u64) -> Self {
        let mut data = [0u8; 32];
        data[..8].copy_from_slice(&height.to_le_bytes());
        data[20] = 0xda;
        Seed { data, index: 32 }
    }

    fn reserve(&mut self, n: usize) {
        if self.index + n > self.data.len() {
            let next = Blake256::digest(&self.data);
            self.data.copy_from_slice(&next);
            self.index = 0;
        }
    }

    fn byte(&mut self) -> u8 {
        self.reserve(1);
        let b = self.data[self.index];
        self.index += 1;
        b
    }

    fn word(&mut self) -> u32 {
        self.reserve(4);
        let mut w = [0u8; 4];
        w.copy_from_slice(&self.data[self.index..self.index + 4]);
        self.index += 4;
        u32::from_le_bytes(w)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    code: Vec<Instruction>,
}

impl Program {
    pub fn generate(height: u64) -> Self {
        let mut seed = Seed::new(height);
        let mut attempts = 0;
        loop {
            attempts += 1;
            if let Some(code) = Self::attempt(&mut seed) {
                trace!(height, attempts, len = code.len(), "generated cn/r program");
                return Program { code };
            }
        }
    }

    /// One generation pass; `None` when the result must be discarded.
    fn attempt(seed: &mut Seed) -> Option<Vec<Instruction>> {
        let mut code = Vec::with_capacity(NUM_INSTRUCTIONS_MAX);
        let mut latency = [0usize; 9];
        let mut asic_latency = [0usize; 9];
        // low byte: value id of the register; byte 1: last opcode; byte 2: source value id
        let mut inst_data: [u32; 9] = [
            0, 1, 2, 3, 0xFF_FFFF, 0xFF_FFFF, 0xFF_FFFF, 0xFF_FFFF, 0xFF_FFFF,
        ];
        let mut alu_busy = [[false; ALU_COUNT]; TOTAL_LATENCY + 1];
        let mut rotated = [false; 4];
        let mut rotate_count = 0usize;
        let mut num_retries = 0;
        let mut total_iterations = 0;
        let mut r8_used = false;

        while latency[..4].iter().any(|&l| l < TOTAL_LATENCY) && num_retries < 64 {
            total_iterations += 1;
            if total_iterations > 256 {
                break;
            }

            let c = seed.byte();
            let op = match c & 7 {
                0..=2 => Op::Mul,
                3 => Op::Add,
                4 => Op::Sub,
                5 => {
                    if (seed.byte() as i8) >= 0 {
                        Op::Ror
                    } else {
                        Op::Rol
                    }
                }
                _ => Op::Xor,
            };
            let dst = usize::from((c >> 3) & 3);
            let mut src = usize::from((c >> 5) & 7);

            if (op == Op::Add || op == Op::Sub || op == Op::Xor) && dst == src {
                src = 8;
            }
            if op.is_rotation() && rotated[dst] {
                continue;
            }
            if op != Op::Mul
                && (inst_data[dst] & 0xFF_FF00) == (op.code() << 8) + ((inst_data[src] & 255) << 16)
            {
                continue;
            }

            let mut next_latency = latency[dst].max(latency[src]);
            let mut alu = None;
            while next_latency < TOTAL_LATENCY {
                for i in (0..op.alus()).rev() {
                    if alu_busy[next_latency][i] {
                        continue;
                    }
                    if op == Op::Add && alu_busy[next_latency + 1][i] {
                        continue;
                    }
                    if op.is_rotation() && next_latency < rotate_count * op.latency() {
                        continue;
                    }
                    alu = Some(i);
                    break;
                }
                if alu.is_some() {
                    break;
                }
                next_latency += 1;
            }

            // no register may sit unchanged for more than 7 cycles
            if next_latency > latency[dst] + 7 {
                continue;
            }

            next_latency += op.latency();

            match alu {
                Some(alu) if next_latency <= TOTAL_LATENCY => {
                    if op.is_rotation() {
                        rotate_count += 1;
                    }
                    let start = next_latency - op.latency();
                    alu_busy[start][alu] = true;
                    latency[dst] = next_latency;
                    asic_latency[dst] = asic_latency[dst].max(asic_latency[src]) + op.asic_latency();
                    rotated[dst] = op.is_rotation();
                    inst_data[dst] =
                        code.len() as u32 + (op.code() << 8) + ((inst_data[src] & 255) << 16);

                    if src == 8 {
                        r8_used = true;
                    }
                    let mut constant = 0;
                    if op == Op::Add {
                        alu_busy[start + 1][alu] = true;
                        constant = seed.word();
                    }
                    code.push(Instruction {
                        op,
                        dst: dst as u8,
                        src: src as u8,
                        c: constant,
                    });
                    if code.len() >= NUM_INSTRUCTIONS_MIN {
                        break;
                    }
                }
                _ => num_retries += 1,
            }
        }

        // pad with ROR/MUL chains until some register meets the ASIC latency target
        let prev_len = code.len();
        while code.len() < NUM_INSTRUCTIONS_MAX
            && asic_latency[..4].iter().all(|&l| l < TOTAL_LATENCY)
        {
            let mut min_idx = 0;
            let mut max_idx = 0;
            for i in 1..4 {
                if asic_latency[i] < asic_latency[min_idx] {
                    min_idx = i;
                }
                if asic_latency[i] > asic_latency[max_idx] {
                    max_idx = i;
                }
            }
            let op = [Op::Ror, Op::Mul, Op::Mul][(code.len() - prev_len) % 3];
            latency[min_idx] = latency[max_idx] + op.latency();
            asic_latency[min_idx] = asic_latency[max_idx] + op.asic_latency();
            code.push(Instruction {
                op,
                dst: min_idx as u8,
                src: max_idx as u8,
                c: 0,
            });
        }

        if r8_used && (NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&code.len()) {
            Some(code)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    #[inline(always)]
    pub fn execute(&self, r: &mut [u32; 9]) {
        for ins in &self.code {
            let src = r[usize::from(ins.src)];
            let dst = &mut r[usize::from(ins.dst)];
            *dst = match ins.op {
                Op::Mul => dst.wrapping_mul(src),
                Op::Add => dst.wrapping_add(src).wrapping_add(ins.c),
                Op::Sub => dst.wrapping_sub(src),
                Op::Ror => dst.rotate_right(src % 32),
                Op::Rol => dst.rotate_left(src % 32),
                Op::Xor => *dst ^ src,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_shape() {
        for height in (1_806_260..1_806_300).chain(0..8) {
            let p = Program::generate(height);
            assert!((NUM_INSTRUCTIONS_MIN..=NUM_INSTRUCTIONS_MAX).contains(&p.len()));
            assert!(p.instructions().iter().any(|i| i.src == 8));
            for i in p.instructions() {
                assert!(i.dst < 4);
                assert!(i.src < 9);
                if i.op != Op::Add {
                    assert_eq!(i.c, 0);
                }
            }
        }
    }

    #[test]
    fn program_is_a_function_of_height() {
        assert_eq!(Program::generate(1_806_260), Program::generate(1_806_260));
        assert_ne!(Program::generate(1_806_260), Program::generate(1_806_261));
    }

    #[test]
    fn interpreter_semantics() {
        let p = Program {
            code: vec![
                Instruction { op: Op::Mul, dst: 0, src: 4, c: 0 },
                Instruction { op: Op::Add, dst: 1, src: 5, c: 0xffff_ffff },
                Instruction { op: Op::Sub, dst: 2, src: 6, c: 0 },
                Instruction { op: Op::Ror, dst: 3, src: 7, c: 0 },
                Instruction { op: Op::Rol, dst: 0, src: 8, c: 0 },
                Instruction { op: Op::Xor, dst: 1, src: 2, c: 0 },
            ],
        };
        let mut r = [3, 10, 1, 0x8000_0001, 0x8000_0000, 5, 2, 33, 4];
        p.execute(&mut r);
        assert_eq!(r[0], 0x8000_0000u32.wrapping_mul(3).rotate_left(4));
        assert_eq!(r[2], 0xffff_ffff);
        assert_eq!(r[1], 14 ^ 0xffff_ffff);
        assert_eq!(r[3], 0xc000_0000);
    }
}
