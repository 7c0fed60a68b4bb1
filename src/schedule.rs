// copyright 2017 Kaz Wesley

//! Network activation heights.

use crate::algo::Algorithm;
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    pub height: u64,
    pub variant: u32,
}

/// Ordered list of activations; the first must be at height 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Schedule(pub &'static [Activation]);

impl Schedule {
    /// Monero mainnet: v7 at 1546000, v8 at 1685555, v10 (cn/r) at 1788000.
    pub const MONERO: Schedule = Schedule(&[
        Activation { height: 0, variant: 0 },
        Activation { height: 1_546_000, variant: 1 },
        Activation { height: 1_685_555, variant: 2 },
        Activation { height: 1_788_000, variant: 4 },
    ]);

    /// The variant of the last activation at or below `height`.
    pub fn variant_at(&self, height: u64) -> u32 {
        self.0
            .iter()
            .take_while(|a| a.height <= height)
            .last()
            .map_or(0, |a| a.variant)
    }

    /// The schedule governing `algorithm`, if the network has one.
    pub fn for_algorithm(algorithm: Algorithm) -> Result<Schedule> {
        match algorithm {
            Algorithm::CryptoNight => Ok(Schedule::MONERO),
            _ => Err(Error::InvalidConfiguration(
                "no activation schedule for this algorithm",
            )),
        }
    }
}
