//! Variable-length bit-string keys.
//!
//! A [`PrefixKey`] is the unit of subscription matching: a subscription for
//! key `k` matches every address hash (or stealth prefix) whose leading
//! `k.bit_len()` bits equal `k`. Bits are numbered most-significant first
//! within each byte.

use crate::error::PrefixError;
use std::fmt;

/// An ordered bit-string stored as (bit length, byte buffer).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct PrefixKey {
    bit_len: usize,
    /// `blocks_size(bit_len)` bytes; unused low bits of the last byte are zero.
    blocks: Vec<u8>,
}

impl PrefixKey {
    /// Number of bytes needed to hold `bit_len` bits.
    pub const fn blocks_size(bit_len: usize) -> usize {
        (bit_len + 7) / 8
    }

    /// Build a key from the leading `bit_len` bits of `blocks`.
    ///
    /// Extra bytes are ignored and bits past `bit_len` are cleared.
    pub fn new(bit_len: usize, blocks: &[u8]) -> Result<Self, PrefixError> {
        let needed = Self::blocks_size(bit_len);
        if blocks.len() < needed {
            return Err(PrefixError::Truncated {
                bits: bit_len,
                needed,
                got: blocks.len(),
            });
        }

        let mut blocks = blocks[..needed].to_vec();
        if let Some(last) = blocks.last_mut() {
            *last &= Self::tail_mask(bit_len);
        }

        Ok(Self { bit_len, blocks })
    }

    /// A key covering every bit of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bit_len: bytes.len() * 8,
            blocks: bytes.to_vec(),
        }
    }

    /// The 32-bit key of a stealth prefix (little-endian byte order).
    pub fn from_stealth(prefix: u32) -> Self {
        Self::from_bytes(&prefix.to_le_bytes())
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Value of bit `index`, or `None` past the end.
    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len {
            return None;
        }
        Some(self.blocks[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// True iff the first `bit_len` bits of `other` equal this key.
    ///
    /// Bits past the end of `other` read as zero, so a key longer than
    /// `other` matches only when its excess bits are all clear.
    pub fn is_prefix_of(&self, other: &[u8]) -> bool {
        Self::leading_bits_equal(&self.blocks, self.bit_len, other)
    }

    /// Prefix test against another key, reading bits past its end as zero.
    pub fn is_prefix_of_key(&self, other: &PrefixKey) -> bool {
        // Blocks are masked past `bit_len`, so the padding is already zero.
        Self::leading_bits_equal(&self.blocks, self.bit_len, &other.blocks)
    }

    /// Prefix test against a stealth prefix in its little-endian byte form.
    pub fn is_prefix_of_stealth(&self, prefix: u32) -> bool {
        self.is_prefix_of(&prefix.to_le_bytes())
    }

    fn leading_bits_equal(key: &[u8], key_bits: usize, other: &[u8]) -> bool {
        let other_byte = |i: usize| other.get(i).copied().unwrap_or(0);

        let full = key_bits / 8;
        if key[..full]
            .iter()
            .enumerate()
            .any(|(i, byte)| *byte != other_byte(i))
        {
            return false;
        }

        match key_bits % 8 {
            0 => true,
            rem => {
                let mask = 0xFFu8 << (8 - rem);
                key[full] & mask == other_byte(full) & mask
            }
        }
    }

    /// Mask keeping the significant bits of the final byte.
    fn tail_mask(bit_len: usize) -> u8 {
        match bit_len % 8 {
            0 => 0xFF,
            rem => 0xFFu8 << (8 - rem),
        }
    }
}

impl fmt::Display for PrefixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.bit_len {
            let bit = self.blocks[i / 8] & (0x80 >> (i % 8)) != 0;
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PrefixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrefixKey({}:{})", self.bit_len, hex::encode(&self.blocks))
    }
}
