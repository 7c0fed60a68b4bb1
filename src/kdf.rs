// copyright 2017 Kaz Wesley

use argon2::{Argon2, Params, Version};

use crate::error::{Error, Result};

/// Argon2id cost parameters. The salt is the leading `salt_len` bytes of
/// the input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KdfParams {
    pub mem_kb: u32,
    pub out_len: usize,
    pub salt_len: usize,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KdfParams {
    /// TurtleCoin's Chukwa.
    pub const CHUKWA: KdfParams = KdfParams {
        mem_kb: 512,
        out_len: 32,
        salt_len: 16,
        iterations: 3,
        parallelism: 1,
    };
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfParams::CHUKWA
    }
}

pub fn hash_kdf(input: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    let min = params.salt_len.max(1);
    if input.len() < min || input.len() > crate::MAX_INPUT_LEN {
        return Err(Error::InvalidInputLength {
            len: input.len(),
            min,
            max: crate::MAX_INPUT_LEN,
        });
    }
    let cost = Params::new(
        params.mem_kb,
        params.iterations,
        params.parallelism,
        Some(params.out_len),
    )
    .map_err(Error::Kdf)?;
    let argon = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, cost);
    let mut out = vec![0u8; params.out_len];
    argon
        .hash_password_into(input, &input[..params.salt_len], &mut out)
        .map_err(Error::Kdf)?;
    Ok(out)
}
