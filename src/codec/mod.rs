//! Binary payloads exchanged with subscribers.
//!
//! Requests (subscribe and renew share one layout):
//!
//! ```text
//! [ type:1 ]        0 = address, anything else = stealth
//! [ bit_len:1 ]
//! [ prefix:ceil(bit_len / 8) ]
//! ```
//!
//! Responses carry a single little-endian `u32` status code. Update
//! payloads are described in [`update`].

pub mod request;
pub mod update;

pub use request::{decode_request, decode_status, encode_request, encode_status, SubscribeKind};
pub use update::{AddressUpdate, StealthUpdate, ADDRESS_INFO_SIZE, STEALTH_INFO_SIZE};

use crate::error::CodecError;

/// Cursor over a payload that fails instead of reading past the end.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn read_byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::EndOfStream)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::EndOfStream)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Fails if anything is left unread.
    pub(crate) fn finish(self) -> Result<(), CodecError> {
        match self.data.len() - self.pos {
            0 => Ok(()),
            rest => Err(CodecError::TrailingBytes(rest)),
        }
    }
}
