// copyright 2017 Kaz Wesley

use blake_hash::Blake256;
use digest::Digest;
use groestl::Groestl256;
use jh_x86_64::Jh256;
use skein_hash::digest::generic_array::typenum::U32;
use skein_hash::Skein512;

use crate::state::State;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Finalizer {
    Blake,
    Groestl,
    Jh,
    Skein,
}

impl Finalizer {
    /// Chosen by the low two bits of the first state byte.
    pub fn select(bytes: &[u8; 200]) -> Finalizer {
        match bytes[0] & 3 {
            0 => Finalizer::Blake,
            1 => Finalizer::Groestl,
            2 => Finalizer::Jh,
            3 => Finalizer::Skein,
            _ => unreachable!(),
        }
    }

    pub fn digest(self, data: &[u8]) -> [u8; 32] {
        let mut h = [0u8; 32];
        match self {
            Finalizer::Blake => h.copy_from_slice(&Blake256::digest(data)),
            Finalizer::Groestl => h.copy_from_slice(&Groestl256::digest(data)),
            Finalizer::Jh => h.copy_from_slice(&Jh256::digest(data)),
            // skein-hash is on a newer digest than the other finalizers
            Finalizer::Skein => h.copy_from_slice(
                &<Skein512<U32> as skein_hash::digest::Digest>::digest(data),
            ),
        }
        h
    }
}

/// Permute the imploded state and hash it with the selected finalizer.
pub fn finalize(mut data: State) -> [u8; 32] {
    data.permute();
    let bytes = data.to_bytes();
    Finalizer::select(&bytes).digest(&bytes)
}
