//! Named digest functions used by the distribution engines.
//!
//! The partition-map engine folds a key to 32 bits with whichever digest the
//! config names in `hashAlgorithm`; the ketama engine always uses MD5. The
//! 32-bit outputs here are wire-compatible with the memcached client family:
//! the CRC digest keeps its historical `(crc32 >> 16) & 0x7fff` fold, and the
//! MD5 digests read little-endian words out of the raw 16-byte digest.

use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

const FNV_32_INIT: u32 = 0x811c_9dc5;
const FNV_32_PRIME: u32 = 0x0100_0193;
const FNV_64_INIT: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Digest selected by the config's `hashAlgorithm` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// CRC-32 folded to 15 bits; the default when the field is absent.
    #[default]
    Crc,
    /// First little-endian word of the MD5 digest.
    Md5,
    /// 64-bit FNV-1 truncated to 32 bits.
    Fnv1_64,
    /// 64-bit FNV-1a truncated to 32 bits.
    Fnv1a_64,
    /// 32-bit FNV-1.
    Fnv1_32,
    /// 32-bit FNV-1a.
    Fnv1a_32,
}

impl HashAlgorithm {
    /// Look up a digest by its config name, case-insensitively.
    ///
    /// `"default"` is an accepted alias for the CRC digest. Returns `None`
    /// for names this library does not carry.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" | "crc" => Some(HashAlgorithm::Crc),
            "md5" => Some(HashAlgorithm::Md5),
            "fnv1_64" => Some(HashAlgorithm::Fnv1_64),
            "fnv1a_64" => Some(HashAlgorithm::Fnv1a_64),
            "fnv1_32" => Some(HashAlgorithm::Fnv1_32),
            "fnv1a_32" => Some(HashAlgorithm::Fnv1a_32),
            _ => None,
        }
    }

    /// Fold a key to the 32-bit value used for partition selection.
    pub fn digest(self, key: &[u8]) -> u32 {
        match self {
            HashAlgorithm::Crc => (CRC32.checksum(key) >> 16) & 0x7fff,
            HashAlgorithm::Md5 => ketama_digest(key),
            HashAlgorithm::Fnv1_64 => fnv1_64(key) as u32,
            HashAlgorithm::Fnv1a_64 => fnv1a_64(key) as u32,
            HashAlgorithm::Fnv1_32 => fnv1_32(key),
            HashAlgorithm::Fnv1a_32 => fnv1a_32(key),
        }
    }
}

/// The 32-bit ketama point for a key: little-endian word 0 of md5(key).
pub fn ketama_digest(key: &[u8]) -> u32 {
    let md = md5::compute(key);
    u32::from_le_bytes([md[0], md[1], md[2], md[3]])
}

/// All four ring points carried by one virtual-node label: the 16-byte MD5
/// digest read as four little-endian 32-bit words.
pub fn ketama_points(label: &[u8]) -> [u32; 4] {
    let md = md5::compute(label);
    let mut points = [0u32; 4];
    for (h, point) in points.iter_mut().enumerate() {
        *point = u32::from_le_bytes([md[4 * h], md[4 * h + 1], md[4 * h + 2], md[4 * h + 3]]);
    }
    points
}

fn fnv1_64(key: &[u8]) -> u64 {
    let mut hash = FNV_64_INIT;
    for &b in key {
        hash = hash.wrapping_mul(FNV_64_PRIME);
        hash ^= u64::from(b);
    }
    hash
}

fn fnv1a_64(key: &[u8]) -> u64 {
    let mut hash = FNV_64_INIT;
    for &b in key {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_64_PRIME);
    }
    hash
}

fn fnv1_32(key: &[u8]) -> u32 {
    let mut hash = FNV_32_INIT;
    for &b in key {
        hash = hash.wrapping_mul(FNV_32_PRIME);
        hash ^= u32::from(b);
    }
    hash
}

fn fnv1a_32(key: &[u8]) -> u32 {
    let mut hash = FNV_32_INIT;
    for &b in key {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_32_PRIME);
    }
    hash
}
