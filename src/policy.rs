// copyright 2017 Kaz Wesley

//! Pure decision table from (algorithm, variant, height, light) to the
//! scratchpad geometry and tweak set the engine runs with.

use crate::algo::Algorithm;
use crate::error::{Error, Result};
use crate::kdf::KdfParams;
use crate::random_math::Program;
use crate::state::Block;

/// Scratchpad size, iteration count and address mask of one algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub memory: usize,
    pub iterations: u32,
    pub mask: u32,
}

impl Geometry {
    pub const CN: Geometry = Geometry {
        memory: 1 << 21,
        iterations: 0x80000,
        mask: 0x1F_FFF0,
    };
    pub const LITE: Geometry = Geometry {
        memory: 1 << 20,
        iterations: 0x40000,
        mask: 0x0F_FFF0,
    };
    pub const PICO: Geometry = Geometry {
        memory: 1 << 18,
        iterations: 0x10000,
        mask: 0x01_FFF0,
    };
    pub const HALF: Geometry = Geometry {
        memory: 1 << 21,
        iterations: 0x40000,
        mask: 0x1F_FFF0,
    };

    /// Scratchpad length in 16-byte blocks.
    pub fn blocks(&self) -> usize {
        self.memory / std::mem::size_of::<Block>()
    }

    /// Every masked address, and the rest of its 64-byte line, must fall
    /// inside the scratchpad.
    pub(crate) fn check(&self) -> Result<()> {
        let span = self.mask as usize + 16;
        let fits = span.is_power_of_two()
            && self.mask & 0x3F == 0x30
            && span <= self.memory
            && self.memory % 128 == 0;
        if fits && self.iterations > 0 {
            Ok(())
        } else {
            Err(Error::InvalidConfiguration("geometry mask does not match scratchpad size"))
        }
    }
}

/// What the main loop does beyond the original algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tweaks {
    Original,
    /// Monero v7.
    ByteTweak,
    /// Shuffle plus integer division and square root (variants 2 and 3).
    ShuffleIntMath,
    /// Shuffle plus the height-seeded program (variant 4).
    RandomMath(Program),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Plan {
    CryptoNight { geometry: Geometry, tweaks: Tweaks },
    Chukwa(KdfParams),
}

impl Plan {
    /// Shortest input this plan can hash.
    pub fn min_input_len(&self) -> usize {
        match self {
            Plan::CryptoNight {
                tweaks: Tweaks::ByteTweak,
                ..
            } => 43,
            Plan::CryptoNight { .. } => 1,
            Plan::Chukwa(kdf) => kdf.salt_len.max(1),
        }
    }

    /// Scratchpad bytes needed, if any.
    pub fn memory(&self) -> usize {
        match self {
            Plan::CryptoNight { geometry, .. } => geometry.memory,
            Plan::Chukwa(_) => 0,
        }
    }
}

/// Variants each algorithm defines.
pub fn supported(algorithm: Algorithm) -> &'static [u32] {
    match algorithm {
        Algorithm::CryptoNight => &[0, 1, 2, 3, 4],
        Algorithm::Lite => &[0, 1],
        Algorithm::Pico | Algorithm::Half => &[2],
        Algorithm::Chukwa => &[0],
    }
}

/// Resolve a fully specified request into a runnable plan.
///
/// `variant` must already be resolved (no auto-detection happens here).
/// Only variant 4 reads `height`.
pub fn plan(algorithm: Algorithm, variant: u32, height: u64, light: bool) -> Result<Plan> {
    let algorithm = match (algorithm, light) {
        (_, false) | (Algorithm::Lite, true) => algorithm,
        (Algorithm::CryptoNight, true) if variant == 4 => {
            return Err(Error::InvalidConfiguration("cn/r requires the full scratchpad"))
        }
        (Algorithm::CryptoNight, true) => Algorithm::Lite,
        (_, true) => {
            return Err(Error::InvalidConfiguration(
                "light mode only applies to cryptonight",
            ))
        }
    };
    if !supported(algorithm).contains(&variant) {
        return Err(Error::UnsupportedVariant { algorithm, variant });
    }
    let geometry = match algorithm {
        Algorithm::Chukwa => return Ok(Plan::Chukwa(KdfParams::CHUKWA)),
        Algorithm::CryptoNight => Geometry::CN,
        Algorithm::Lite => Geometry::LITE,
        Algorithm::Pico => Geometry::PICO,
        Algorithm::Half => Geometry::HALF,
    };
    geometry.check()?;
    let tweaks = match variant {
        0 => Tweaks::Original,
        1 => Tweaks::ByteTweak,
        2 | 3 => Tweaks::ShuffleIntMath,
        _ => Tweaks::RandomMath(Program::generate(height)),
    };
    Ok(Plan::CryptoNight { geometry, tweaks })
}
