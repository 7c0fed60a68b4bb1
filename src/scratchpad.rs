// copyright 2017 Kaz Wesley

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::{Error, Result};
#[cfg(target_os = "linux")]
use crate::mmap::Mmap;
use crate::state::Block;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AllocPolicy {
    /// Prefer huge pages, fall back to ordinary memory.
    AllowSlow,
    /// Fail unless huge pages can be mapped.
    RequireFast,
}

impl Default for AllocPolicy {
    fn default() -> Self {
        AllocPolicy::AllowSlow
    }
}

enum Backing {
    #[cfg(target_os = "linux")]
    Mapped(Mmap<Block>),
    Heap(Vec<Block>),
}

/// Exclusively owned scratchpad memory.
pub struct Scratchpad {
    backing: Backing,
}

impl Scratchpad {
    pub fn new(bytes: usize, policy: AllocPolicy) -> Result<Self> {
        let len = bytes / std::mem::size_of::<Block>();
        #[cfg(target_os = "linux")]
        {
            if let Some(m) = Mmap::new_huge(len) {
                debug!(bytes, "scratchpad on huge pages");
                return Ok(Scratchpad {
                    backing: Backing::Mapped(m),
                });
            }
            if policy == AllocPolicy::RequireFast {
                return Err(Error::OutOfMemory { bytes });
            }
            if let Some(m) = Mmap::new_slow(len) {
                warn!(bytes, "huge pages unavailable; scratchpad will be slow");
                return Ok(Scratchpad {
                    backing: Backing::Mapped(m),
                });
            }
        }
        if policy == AllocPolicy::RequireFast {
            return Err(Error::OutOfMemory { bytes });
        }
        let mut v = Vec::new();
        v.try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { bytes })?;
        v.resize(len, Block::default());
        warn!(bytes, "scratchpad on the heap");
        Ok(Scratchpad {
            backing: Backing::Heap(v),
        })
    }

    pub fn bytes(&self) -> usize {
        self.len() * std::mem::size_of::<Block>()
    }

    /// Whether the memory sits on explicit huge pages.
    pub fn is_huge(&self) -> bool {
        match &self.backing {
            #[cfg(target_os = "linux")]
            Backing::Mapped(m) => m.is_huge(),
            Backing::Heap(_) => false,
        }
    }
}

impl Deref for Scratchpad {
    type Target = [Block];

    fn deref(&self) -> &[Block] {
        match &self.backing {
            #[cfg(target_os = "linux")]
            Backing::Mapped(m) => &m[..],
            Backing::Heap(v) => &v[..],
        }
    }
}

impl DerefMut for Scratchpad {
    fn deref_mut(&mut self) -> &mut [Block] {
        match &mut self.backing {
            #[cfg(target_os = "linux")]
            Backing::Mapped(m) => &mut m[..],
            Backing::Heap(v) => &mut v[..],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_in_blocks() {
        let s = Scratchpad::new(1 << 18, AllocPolicy::AllowSlow).unwrap();
        assert_eq!(s.len(), 1 << 14);
        assert_eq!(s.bytes(), 1 << 18);
        assert!(s.iter().all(|b| *b == Block::default()));
    }

    #[test]
    fn require_fast_never_falls_back() {
        match Scratchpad::new(1 << 21, AllocPolicy::RequireFast) {
            Ok(s) => assert!(s.is_huge()),
            Err(e) => assert_eq!(e, Error::OutOfMemory { bytes: 1 << 21 }),
        }
    }

    #[test]
    fn impossible_size_is_out_of_memory() {
        let bytes = usize::max_value() & !15;
        assert_eq!(
            Scratchpad::new(bytes, AllocPolicy::AllowSlow).err(),
            Some(Error::OutOfMemory { bytes })
        );
    }
}
