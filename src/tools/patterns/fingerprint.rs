use std::hash::Hasher;

use crate::data_structs::typedef::PosType;

const OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// 64-bit FNV-1a hash used as the pattern identity.
///
/// Positions are folded as 4 little-endian bytes followed by the raw byte of
/// the call or base observed there, in the order they are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(OFFSET_BASIS)
    }
}

impl Fnv1a {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one (position, byte) observation.
    #[inline(always)]
    pub fn add(
        &mut self,
        pos: PosType,
        byte: u8,
    ) {
        self.write(&pos.to_le_bytes());
        self.write_u8(byte);
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    fn write(
        &mut self,
        bytes: &[u8],
    ) {
        for byte in bytes {
            self.0 ^= *byte as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Fixed-width uppercase hexadecimal form of a fingerprint.
pub fn format_fingerprint(hash: u64) -> String {
    format!("{:016X}", hash)
}
