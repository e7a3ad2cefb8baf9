//! Node-facing types and the script inspection seam.
//!
//! The node decodes blocks and transactions; this module only describes
//! the parts the notification path reads: scripts for extraction and the
//! serialized transaction for the update payload.

use crate::types::{HashDigest, ShortHash, HASH_SIZE, SHORT_HASH_SIZE};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const OP_0: u8 = 0x00;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_RETURN: u8 = 0x6a;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;

const COMPRESSED_KEY_SIZE: usize = 33;
const UNCOMPRESSED_KEY_SIZE: usize = 65;

/// A payment address: version byte plus 20-byte hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaymentAddress {
    pub version: u8,
    pub hash: ShortHash,
}

/// Transaction input as seen by the notification path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxInput {
    /// Unlocking script.
    pub script: Vec<u8>,
}

/// Transaction output as seen by the notification path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    /// Locking script.
    pub script: Vec<u8>,
}

/// A transaction together with its wire serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Serialized form, copied verbatim into update payloads.
    pub data: Vec<u8>,
}

/// A committed block.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub hash: HashDigest,
    pub transactions: Vec<Transaction>,
}

/// Extracts notification keys from scripts.
pub trait ScriptInspector: Send + Sync {
    /// Address spent by an unlocking script.
    fn input_address(&self, script: &[u8]) -> Option<PaymentAddress>;

    /// Address paid by a locking script.
    fn output_address(&self, script: &[u8]) -> Option<PaymentAddress>;

    /// Stealth prefix of a locking script.
    fn stealth_prefix(&self, script: &[u8]) -> Option<u32>;
}

pub type BlockHandler = Box<dyn Fn(u64, &Block) + Send + Sync>;
pub type TransactionHandler = Box<dyn Fn(&Transaction) + Send + Sync>;

/// Event source offered by the node.
pub trait NodeEvents {
    /// Called with `(height, block)` on every block commit.
    fn subscribe_blocks(&self, handler: BlockHandler);

    /// Called for every transaction accepted into the mempool.
    fn subscribe_transactions(&self, handler: TransactionHandler);
}

/// RIPEMD-160 of the SHA-256 of `data`.
pub fn hash160(data: &[u8]) -> ShortHash {
    let digest = Ripemd160::digest(Sha256::digest(data));
    let mut hash = [0u8; SHORT_HASH_SIZE];
    hash.copy_from_slice(&digest);
    ShortHash(hash)
}

fn is_public_key(data: &[u8]) -> bool {
    match data.len() {
        COMPRESSED_KEY_SIZE => matches!(data[0], 0x02 | 0x03),
        UNCOMPRESSED_KEY_SIZE => matches!(data[0], 0x04 | 0x06 | 0x07),
        _ => false,
    }
}

/// Split a push-only script into its pushed data, or `None` if it holds
/// any other opcode or a push runs past the end.
fn pushes(mut script: &[u8]) -> Option<Vec<&[u8]>> {
    let mut out = Vec::new();
    while let Some((&op, rest)) = script.split_first() {
        let (len, rest) = match op {
            OP_0 => (0, rest),
            1..=0x4b => (op as usize, rest),
            OP_PUSHDATA1 => {
                let (&len, rest) = rest.split_first()?;
                (len as usize, rest)
            }
            OP_PUSHDATA2 => {
                let len = rest.get(..2)?;
                (u16::from_le_bytes([len[0], len[1]]) as usize, &rest[2..])
            }
            OP_PUSHDATA4 => {
                let len = rest.get(..4)?;
                let len = u32::from_le_bytes([len[0], len[1], len[2], len[3]]);
                (usize::try_from(len).ok()?, &rest[4..])
            }
            _ => return None,
        };
        if rest.len() < len {
            return None;
        }
        let (data, rest) = rest.split_at(len);
        out.push(data);
        script = rest;
    }
    Some(out)
}

/// Recognizes the standard script templates.
///
/// Outputs:
/// - pay-to-pubkey: `<33 or 65 byte key> OP_CHECKSIG`
/// - pay-to-pubkey-hash: `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
/// - pay-to-script-hash: `OP_HASH160 <20> OP_EQUAL`
/// - stealth info: `OP_RETURN <push of at least 32 bytes>`
///
/// Inputs:
/// - pubkey-hash spend: `<signature> <public key>`
/// - script-hash spend: two or more pushes ending in the redeem script
#[derive(Clone, Copy, Debug)]
pub struct StandardScripts {
    pub pubkey_hash_version: u8,
    pub script_hash_version: u8,
}

impl StandardScripts {
    pub const MAINNET: StandardScripts = StandardScripts {
        pubkey_hash_version: 0x00,
        script_hash_version: 0x05,
    };

    pub const TESTNET: StandardScripts = StandardScripts {
        pubkey_hash_version: 0x6f,
        script_hash_version: 0xc4,
    };

    pub fn shared(self) -> Arc<dyn ScriptInspector> {
        Arc::new(self)
    }

    /// Data pushed by a stealth-info script, if it is one.
    fn stealth_data(script: &[u8]) -> Option<&[u8]> {
        let (&op, rest) = script.split_first()?;
        if op != OP_RETURN {
            return None;
        }

        let (&push, rest) = rest.split_first()?;
        let (len, data) = match push {
            1..=0x4b => (push as usize, rest),
            OP_PUSHDATA1 => {
                let (&len, data) = rest.split_first()?;
                (len as usize, data)
            }
            _ => return None,
        };

        if data.len() != len || len < HASH_SIZE {
            return None;
        }
        Some(data)
    }
}

impl Default for StandardScripts {
    fn default() -> Self {
        Self::MAINNET
    }
}

impl ScriptInspector for StandardScripts {
    fn input_address(&self, script: &[u8]) -> Option<PaymentAddress> {
        match pushes(script)?.as_slice() {
            [signature, key] if !signature.is_empty() && is_public_key(key) => {
                Some(PaymentAddress {
                    version: self.pubkey_hash_version,
                    hash: hash160(key),
                })
            }
            [_, .., redeem] if !redeem.is_empty() => Some(PaymentAddress {
                version: self.script_hash_version,
                hash: hash160(redeem),
            }),
            _ => None,
        }
    }

    fn output_address(&self, script: &[u8]) -> Option<PaymentAddress> {
        let push = SHORT_HASH_SIZE as u8;
        match script {
            [len, key @ .., OP_CHECKSIG] if *len as usize == key.len() && is_public_key(key) => {
                Some(PaymentAddress {
                    version: self.pubkey_hash_version,
                    hash: hash160(key),
                })
            }
            [OP_DUP, OP_HASH160, len, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG]
                if *len == push && hash.len() == SHORT_HASH_SIZE =>
            {
                Some(PaymentAddress {
                    version: self.pubkey_hash_version,
                    hash: ShortHash::from_slice(hash)?,
                })
            }
            [OP_HASH160, len, hash @ .., OP_EQUAL]
                if *len == push && hash.len() == SHORT_HASH_SIZE =>
            {
                Some(PaymentAddress {
                    version: self.script_hash_version,
                    hash: ShortHash::from_slice(hash)?,
                })
            }
            _ => None,
        }
    }

    fn stealth_prefix(&self, script: &[u8]) -> Option<u32> {
        Self::stealth_data(script)?;
        let digest = Sha256::digest(Sha256::digest(script));
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&digest[..4]);
        Some(u32::from_le_bytes(prefix))
    }
}
