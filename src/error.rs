// copyright 2017 Kaz Wesley

use thiserror::Error;

use crate::algo::Algorithm;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("input length {len} outside accepted range {min}..={max}")]
    InvalidInputLength { len: usize, min: usize, max: usize },

    #[error("invalid hex encoding: {0}")]
    InvalidEncoding(String),

    #[error("unsupported algorithm id {0}")]
    UnsupportedAlgorithm(i32),

    #[error("variant {variant} is not defined for {algorithm:?}")]
    UnsupportedVariant { algorithm: Algorithm, variant: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error("unable to allocate {bytes} byte scratchpad")]
    OutOfMemory { bytes: usize },

    #[error("argon2: {0}")]
    Kdf(argon2::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
