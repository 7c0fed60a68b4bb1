// copyright 2017 Kaz Wesley

use std::str::FromStr;

use thiserror::Error;

use crate::error::{Error, Result};
use crate::policy::Geometry;
use crate::schedule::Schedule;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    CryptoNight,
    Lite,
    Pico,
    Half,
    /// Argon2id; skips the scratchpad engine.
    Chukwa,
}

impl Algorithm {
    pub fn from_id(id: i32) -> Result<Self> {
        Ok(match id {
            0 => Algorithm::CryptoNight,
            1 => Algorithm::Lite,
            2 => Algorithm::Pico,
            3 => Algorithm::Half,
            4 => Algorithm::Chukwa,
            id => return Err(Error::UnsupportedAlgorithm(id)),
        })
    }

    pub fn id(self) -> i32 {
        match self {
            Algorithm::CryptoNight => 0,
            Algorithm::Lite => 1,
            Algorithm::Pico => 2,
            Algorithm::Half => 3,
            Algorithm::Chukwa => 4,
        }
    }

    pub fn geometry(self) -> Option<Geometry> {
        match self {
            Algorithm::CryptoNight => Some(Geometry::CN),
            Algorithm::Lite => Some(Geometry::LITE),
            Algorithm::Pico => Some(Geometry::PICO),
            Algorithm::Half => Some(Geometry::HALF),
            Algorithm::Chukwa => None,
        }
    }
}

/// Variant from the blob's major version byte.
pub fn auto_variant(input: &[u8]) -> u32 {
    match input.first() {
        Some(&v) if v >= 7 => u32::from(v - 6),
        _ => 0,
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariantSelector {
    /// Detect from the input's first byte.
    Auto,
    /// Whatever the network schedule has active at the given height.
    Scheduled,
    Explicit(u32),
}

impl VariantSelector {
    /// `-1` is auto-detection.
    pub fn from_raw(variant: i32) -> Result<Self> {
        match variant {
            -1 => Ok(VariantSelector::Auto),
            v if v >= 0 => Ok(VariantSelector::Explicit(v as u32)),
            _ => Err(Error::InvalidConfiguration("negative variant id")),
        }
    }

    pub fn resolve(self, algorithm: Algorithm, input: &[u8], height: u64) -> Result<u32> {
        match self {
            VariantSelector::Auto => Ok(auto_variant(input)),
            VariantSelector::Scheduled => {
                Ok(Schedule::for_algorithm(algorithm)?.variant_at(height))
            }
            VariantSelector::Explicit(v) => Ok(v),
        }
    }
}

/// Everything that selects a hash function.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    pub algorithm: Algorithm,
    pub variant: VariantSelector,
    pub height: u64,
    pub light: bool,
}

impl Params {
    pub fn new(algorithm: Algorithm, variant: VariantSelector) -> Self {
        Params {
            algorithm,
            variant,
            height: 0,
            light: false,
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    pub fn light(mut self, light: bool) -> Self {
        self.light = light;
        self
    }

    /// The integer calling convention: algorithm id, variant id (`-1` for
    /// auto) and height.
    pub fn from_raw(algorithm: i32, variant: i32, height: u64) -> Result<Self> {
        Ok(Params::new(Algorithm::from_id(algorithm)?, VariantSelector::from_raw(variant)?)
            .with_height(height))
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::new(Algorithm::CryptoNight, VariantSelector::Auto)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown algorithm name {name:?}")]
pub struct UnknownAlgo {
    name: Box<str>,
}

/// A pool-protocol algorithm name.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Algo {
    pub algorithm: Algorithm,
    pub variant: VariantSelector,
}

impl FromStr for Algo {
    type Err = UnknownAlgo;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use self::Algorithm::*;
        use self::VariantSelector::*;
        let (algorithm, variant) = match s.to_ascii_lowercase().as_str() {
            "cn" | "cryptonight" => (CryptoNight, Auto),
            "cn/0" => (CryptoNight, Explicit(0)),
            "cn/1" => (CryptoNight, Explicit(1)),
            "cn/2" => (CryptoNight, Explicit(2)),
            "cn/3" => (CryptoNight, Explicit(3)),
            "cn/r" => (CryptoNight, Explicit(4)),
            "cn-lite" | "cryptonight-lite" => (Lite, Auto),
            "cn-lite/0" => (Lite, Explicit(0)),
            "cn-lite/1" => (Lite, Explicit(1)),
            "cn-pico/trtl" => (Pico, Explicit(2)),
            "cn/half" => (Half, Explicit(2)),
            "argon2/chukwa" => (Chukwa, Explicit(0)),
            _ => {
                return Err(UnknownAlgo {
                    name: s.to_owned().into_boxed_str(),
                })
            }
        };
        Ok(Algo { algorithm, variant })
    }
}

impl From<Algo> for Params {
    fn from(algo: Algo) -> Params {
        Params::new(algo.algorithm, algo.variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_variant_from_major_version() {
        assert_eq!(auto_variant(&[0x06, 0xff]), 0);
        assert_eq!(auto_variant(&[0x07]), 1);
        assert_eq!(auto_variant(&[0x09, 0x00]), 3);
        assert_eq!(auto_variant(&[0x01]), 0);
        assert_eq!(auto_variant(&[]), 0);
    }

    #[test]
    fn ids_round_trip() {
        for id in 0..5 {
            assert_eq!(Algorithm::from_id(id).unwrap().id(), id);
        }
        assert_eq!(Algorithm::from_id(5), Err(Error::UnsupportedAlgorithm(5)));
        assert_eq!(Algorithm::from_id(-1), Err(Error::UnsupportedAlgorithm(-1)));
    }

    #[test]
    fn raw_params() {
        let p = Params::from_raw(1, -1, 7).unwrap();
        assert_eq!(p.algorithm, Algorithm::Lite);
        assert_eq!(p.variant, VariantSelector::Auto);
        assert_eq!(p.height, 7);
        assert_eq!(
            Params::from_raw(0, 2, 0).unwrap().variant,
            VariantSelector::Explicit(2)
        );
        assert!(Params::from_raw(0, -2, 0).is_err());
        assert_eq!(Params::from_raw(9, 0, 0), Err(Error::UnsupportedAlgorithm(9)));
    }

    #[test]
    fn scheduled_resolution() {
        let s = VariantSelector::Scheduled;
        assert_eq!(s.resolve(Algorithm::CryptoNight, &[9], 1_685_554), Ok(1));
        assert_eq!(s.resolve(Algorithm::CryptoNight, &[9], 1_685_555), Ok(2));
        assert!(s.resolve(Algorithm::Pico, &[9], 0).is_err());
    }

    #[test]
    fn parse_names() {
        let a: Algo = "cn/r".parse().unwrap();
        assert_eq!(a.algorithm, Algorithm::CryptoNight);
        assert_eq!(a.variant, VariantSelector::Explicit(4));
        let a: Algo = "CryptoNight-Lite".parse().unwrap();
        assert_eq!(a.algorithm, Algorithm::Lite);
        assert_eq!(a.variant, VariantSelector::Auto);
        assert_eq!(
            "argon2/chukwa".parse::<Algo>().map(|a| a.algorithm),
            Ok(Algorithm::Chukwa)
        );
        assert!("cn/7".parse::<Algo>().is_err());
        assert!("cn-lite/2".parse::<Algo>().is_err());
    }
}
