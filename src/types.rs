//! Core types shared across the subscription service.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of a full block or transaction hash.
pub const HASH_SIZE: usize = 32;

/// Size of an address hash (RIPEMD-160 digest).
pub const SHORT_HASH_SIZE: usize = 20;

/// 32-byte block hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HashDigest(pub [u8; HASH_SIZE]);

/// The all-zero block hash carried by mempool notifications.
pub const NULL_HASH: HashDigest = HashDigest([0u8; HASH_SIZE]);

impl HashDigest {
    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(HashDigest(arr))
    }

    pub fn is_null(&self) -> bool {
        *self == NULL_HASH
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// 20-byte address hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShortHash(pub [u8; SHORT_HASH_SIZE]);

impl ShortHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Build from a slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(ShortHash)
    }
}

impl fmt::Debug for ShortHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortHash({})", hex::encode(self.0))
    }
}

/// Microseconds since Unix epoch (UTC).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    const MICROS_PER_MINUTE: i64 = 60 * 1_000_000;

    /// Current time. A clock set before the epoch reads as the epoch.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Timestamp(
            self.0
                .saturating_add(i64::from(minutes) * Self::MICROS_PER_MINUTE),
        )
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}
