//! Subscribe/renew request bodies and status responses.

use super::Reader;
use crate::error::{CodecError, ErrorCode};
use crate::prefix::PrefixKey;

/// Which update stream a subscription follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscribeKind {
    Address,
    Stealth,
}

impl SubscribeKind {
    pub fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            SubscribeKind::Address
        } else {
            SubscribeKind::Stealth
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            SubscribeKind::Address => 0,
            SubscribeKind::Stealth => 1,
        }
    }
}

/// Decode a subscribe or renew body into its kind and prefix.
///
/// The payload must be consumed exactly; trailing bytes are an error.
pub fn decode_request(data: &[u8]) -> Result<(SubscribeKind, PrefixKey), CodecError> {
    let mut reader = Reader::new(data);
    let kind = SubscribeKind::from_byte(reader.read_byte()?);
    let bit_len = reader.read_byte()? as usize;
    let blocks = reader.read_bytes(PrefixKey::blocks_size(bit_len))?;
    reader.finish()?;

    let prefix = PrefixKey::new(bit_len, blocks).map_err(|_| CodecError::EndOfStream)?;
    Ok((kind, prefix))
}

/// Encode a subscribe or renew body.
pub fn encode_request(kind: SubscribeKind, prefix: &PrefixKey) -> Result<Vec<u8>, CodecError> {
    let bit_len = u8::try_from(prefix.bit_len())
        .map_err(|_| CodecError::PrefixTooLong(prefix.bit_len()))?;

    let mut data = Vec::with_capacity(2 + prefix.blocks().len());
    data.push(kind.to_byte());
    data.push(bit_len);
    data.extend_from_slice(prefix.blocks());
    Ok(data)
}

/// Encode a status response.
pub fn encode_status(code: ErrorCode) -> Vec<u8> {
    code.as_u32().to_le_bytes().to_vec()
}

/// Decode a status response.
pub fn decode_status(data: &[u8]) -> Result<ErrorCode, CodecError> {
    let mut reader = Reader::new(data);
    let value = reader.read_u32_le()?;
    reader.finish()?;
    ErrorCode::from_u32(value)
}
