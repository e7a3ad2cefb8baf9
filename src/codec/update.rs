//! Notification payloads pushed to subscribers.
//!
//! ```text
//! address.update          [ version:1 ][ hash:20 ][ height:4 ][ block_hash:32 ][ tx ]
//! address.stealth_update  [ prefix:4 ][ height:4 ][ block_hash:32 ][ tx ]
//! ```
//!
//! Integers are little-endian. Mempool transactions carry height 0 and the
//! null block hash.

use crate::types::{HashDigest, ShortHash, HASH_SIZE, SHORT_HASH_SIZE};

/// Fixed header size of an address update.
pub const ADDRESS_INFO_SIZE: usize = 1 + SHORT_HASH_SIZE + 4 + HASH_SIZE;

/// Fixed header size of a stealth update.
pub const STEALTH_INFO_SIZE: usize = 4 + 4 + HASH_SIZE;

/// An `address.update` payload.
#[derive(Clone, Copy, Debug)]
pub struct AddressUpdate<'a> {
    pub version: u8,
    pub hash: &'a ShortHash,
    pub height: u32,
    pub block_hash: &'a HashDigest,
    /// Serialized transaction.
    pub tx: &'a [u8],
}

impl AddressUpdate<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(ADDRESS_INFO_SIZE + self.tx.len());
        data.push(self.version);
        data.extend_from_slice(&self.hash.0);
        data.extend_from_slice(&self.height.to_le_bytes());
        data.extend_from_slice(&self.block_hash.0);
        debug_assert_eq!(data.len(), ADDRESS_INFO_SIZE);
        data.extend_from_slice(self.tx);
        data
    }
}

/// An `address.stealth_update` payload.
#[derive(Clone, Copy, Debug)]
pub struct StealthUpdate<'a> {
    pub prefix: u32,
    pub height: u32,
    pub block_hash: &'a HashDigest,
    /// Serialized transaction.
    pub tx: &'a [u8],
}

impl StealthUpdate<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(STEALTH_INFO_SIZE + self.tx.len());
        data.extend_from_slice(&self.prefix.to_le_bytes());
        data.extend_from_slice(&self.height.to_le_bytes());
        data.extend_from_slice(&self.block_hash.0);
        debug_assert_eq!(data.len(), STEALTH_INFO_SIZE);
        data.extend_from_slice(self.tx);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NULL_HASH;

    #[test]
    fn test_address_update_layout() {
        let hash = ShortHash([0x11; SHORT_HASH_SIZE]);
        let block_hash = HashDigest([0x22; HASH_SIZE]);
        let data = AddressUpdate {
            version: 0x05,
            hash: &hash,
            height: 100,
            block_hash: &block_hash,
            tx: &[0xde, 0xad],
        }
        .encode();

        assert_eq!(ADDRESS_INFO_SIZE, 57);
        assert_eq!(data.len(), ADDRESS_INFO_SIZE + 2);
        assert_eq!(data[0], 0x05);
        assert_eq!(&data[1..21], &hash.0);
        assert_eq!(&data[21..25], &[100, 0, 0, 0]);
        assert_eq!(&data[25..57], &block_hash.0);
        assert_eq!(&data[57..], &[0xde, 0xad]);
    }

    #[test]
    fn test_stealth_update_layout() {
        let data = StealthUpdate {
            prefix: 0x04030201,
            height: 0,
            block_hash: &NULL_HASH,
            tx: &[0x01],
        }
        .encode();

        assert_eq!(STEALTH_INFO_SIZE, 40);
        assert_eq!(&data[0..4], &[1, 2, 3, 4]);
        assert_eq!(&data[4..8], &[0, 0, 0, 0]);
        assert!(data[8..40].iter().all(|b| *b == 0));
        assert_eq!(&data[40..], &[0x01]);
    }

    #[test]
    fn test_empty_transaction() {
        let data = StealthUpdate {
            prefix: u32::MAX,
            height: u32::MAX,
            block_hash: &NULL_HASH,
            tx: &[],
        }
        .encode();
        assert_eq!(data.len(), STEALTH_INFO_SIZE);
        assert_eq!(&data[4..8], &[0xff; 4]);
    }
}
