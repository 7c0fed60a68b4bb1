// copyright 2017 Kaz Wesley

//! CryptoNight-family proof-of-work hashes: cn (variants 0 to 4), cn-lite,
//! cn-pico, cn/half and the Argon2id-based chukwa.

mod aes_round;
mod algo;
mod cn;
pub mod encoding;
mod error;
mod finalize;
mod kdf;
#[cfg(target_os = "linux")]
mod mmap;
pub mod policy;
mod random_math;
pub mod schedule;
mod scratchpad;
mod state;

use tracing::debug;

pub use crate::algo::{auto_variant, Algo, Algorithm, Params, UnknownAlgo, VariantSelector};
pub use crate::error::{Error, Result};
pub use crate::finalize::Finalizer;
pub use crate::kdf::{hash_kdf, KdfParams};
pub use crate::policy::{Geometry, Plan, Tweaks};
pub use crate::random_math::{Instruction, Op, Program};
pub use crate::schedule::{Activation, Schedule};
pub use crate::scratchpad::{AllocPolicy, Scratchpad};

use crate::cn::{Cnv0, Cnv1, Cnv2, Cnv4};
use crate::finalize::finalize;
use crate::state::{Block, State};

pub const MAX_INPUT_LEN: usize = 1024;

/// Where pool blobs carry their 32-bit nonce.
pub const NONCE_OFFSET: usize = 39;

fn set_nonce(blob: &mut [u8], nonce: u32) {
    blob[NONCE_OFFSET..NONCE_OFFSET + 4].copy_from_slice(&nonce.to_le_bytes());
}

/// Hash `input` once with a fresh scratchpad.
pub fn hash(input: &[u8], params: &Params) -> Result<[u8; 32]> {
    Hasher::default().hash(input, params)
}

/// Validate a request and resolve it into a plan.
fn prepare(input: &[u8], params: &Params) -> Result<Plan> {
    let bad_len = |min| Error::InvalidInputLength {
        len: input.len(),
        min,
        max: MAX_INPUT_LEN,
    };
    if input.is_empty() || input.len() > MAX_INPUT_LEN {
        return Err(bad_len(1));
    }
    let variant = params
        .variant
        .resolve(params.algorithm, input, params.height)?;
    let plan = policy::plan(params.algorithm, variant, params.height, params.light)?;
    if input.len() < plan.min_input_len() {
        return Err(bad_len(plan.min_input_len()));
    }
    debug!(
        algorithm = ?params.algorithm,
        variant,
        height = params.height,
        light = params.light,
        "planned hash"
    );
    Ok(plan)
}

fn cryptonight(mem: &mut [Block], blob: &[u8], geometry: Geometry, tweaks: &Tweaks) -> [u8; 32] {
    finalize(imploded(mem, blob, geometry, tweaks))
}

/// Keccak, explode, mix and implode: everything before the finalizer.
fn imploded(mem: &mut [Block], blob: &[u8], geometry: Geometry, tweaks: &Tweaks) -> State {
    let mut state = State::keccak(blob);
    cn::explode(mem, &state);
    match tweaks {
        Tweaks::Original => cn::mix(mem, geometry, &state, Cnv0),
        Tweaks::ByteTweak => cn::mix(mem, geometry, &state, Cnv1::new(blob, &state)),
        Tweaks::ShuffleIntMath => cn::mix(mem, geometry, &state, Cnv2::new(&state)),
        Tweaks::RandomMath(program) => {
            cn::mix(mem, geometry, &state, Cnv4::new(&state, program))
        }
    }
    cn::implode(&mut state, mem);
    state
}

/// A reusable hashing context. The scratchpad is kept between calls and
/// grows to the largest geometry requested.
pub struct Hasher {
    policy: AllocPolicy,
    memory: Option<Scratchpad>,
}

impl Default for Hasher {
    fn default() -> Self {
        Hasher::new(AllocPolicy::default())
    }
}

impl Hasher {
    pub fn new(policy: AllocPolicy) -> Self {
        Hasher {
            policy,
            memory: None,
        }
    }

    pub fn hash(&mut self, input: &[u8], params: &Params) -> Result<[u8; 32]> {
        let plan = prepare(input, params)?;
        self.run(input, &plan)
    }

    /// Release the scratchpad; the next hash allocates a new one.
    pub fn reset(&mut self) {
        self.memory = None;
    }

    /// Hash `blob` once per nonce, writing each nonce at `NONCE_OFFSET`.
    pub fn hashes<N: Iterator<Item = u32>>(
        &mut self,
        blob: Box<[u8]>,
        params: &Params,
        nonces: N,
    ) -> Result<Hashes<'_, N>> {
        if blob.len() < NONCE_OFFSET + 4 {
            return Err(Error::InvalidInputLength {
                len: blob.len(),
                min: NONCE_OFFSET + 4,
                max: MAX_INPUT_LEN,
            });
        }
        let plan = prepare(&blob, params)?;
        if plan.memory() > 0 {
            self.scratchpad(plan.memory())?;
        }
        Ok(Hashes {
            hasher: self,
            blob,
            plan,
            nonces,
        })
    }

    fn scratchpad(&mut self, bytes: usize) -> Result<&mut Scratchpad> {
        if self.memory.as_ref().map_or(false, |m| m.bytes() < bytes) {
            debug!(bytes, "growing scratchpad");
            self.memory = None;
        }
        let memory = match self.memory.take() {
            Some(m) => m,
            None => Scratchpad::new(bytes, self.policy)?,
        };
        Ok(self.memory.insert(memory))
    }

    fn run(&mut self, input: &[u8], plan: &Plan) -> Result<[u8; 32]> {
        match plan {
            Plan::Chukwa(kdf) => {
                let out = hash_kdf(input, kdf)?;
                let mut h = [0u8; 32];
                if out.len() != h.len() {
                    return Err(Error::InvalidConfiguration("kdf output is not 32 bytes"));
                }
                h.copy_from_slice(&out);
                Ok(h)
            }
            Plan::CryptoNight { geometry, tweaks } => {
                let memory = self.scratchpad(geometry.memory)?;
                let mem = &mut memory[..geometry.blocks()];
                Ok(cryptonight(mem, input, *geometry, tweaks))
            }
        }
    }
}

/// Digests of one blob over a nonce sequence.
pub struct Hashes<'a, N> {
    hasher: &'a mut Hasher,
    blob: Box<[u8]>,
    plan: Plan,
    nonces: N,
}

impl<'a, N: Iterator<Item = u32>> Iterator for Hashes<'a, N> {
    type Item = Result<(u32, [u8; 32])>;
    fn next(&mut self) -> Option<Self::Item> {
        let nonce = self.nonces.next()?;
        set_nonce(&mut self.blob, nonce);
        Some(self.hasher.run(&self.blob, &self.plan).map(|h| (nonce, h)))
    }
}
