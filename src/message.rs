//! Transport-facing message types.
//!
//! The transport owns connections; this crate only sees the requests it
//! forwards and hands replies back through a [`MessageSink`].

use std::fmt;

/// Command for a subscribe request.
pub const SUBSCRIBE_COMMAND: &str = "address.subscribe";

/// Command for a renew request.
pub const RENEW_COMMAND: &str = "address.renew";

/// Command for address notifications.
pub const ADDRESS_UPDATE_COMMAND: &str = "address.update";

/// Command for stealth notifications.
pub const STEALTH_UPDATE_COMMAND: &str = "address.stealth_update";

/// Opaque identifier of a client connection.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Origin(pub Vec<u8>);

impl Origin {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Origin(bytes.into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin({})", self.to_hex())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A request received from a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub origin: Origin,
    pub command: String,
    /// Client-chosen correlation id, echoed in the response.
    pub id: u32,
    pub data: Vec<u8>,
}

impl IncomingMessage {
    pub fn new(origin: Origin, command: impl Into<String>, id: u32, data: Vec<u8>) -> Self {
        Self {
            origin,
            command: command.into(),
            id,
            data,
        }
    }
}

/// A message queued for delivery to a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub destination: Origin,
    pub command: String,
    pub id: u32,
    pub data: Vec<u8>,
}

impl OutgoingMessage {
    /// Reply to `request`, echoing its command and id.
    pub fn response(request: &IncomingMessage, data: Vec<u8>) -> Self {
        Self {
            destination: request.origin.clone(),
            command: request.command.clone(),
            id: request.id,
            data,
        }
    }

    /// Unsolicited push to `destination`.
    pub fn notification(destination: Origin, command: &str, data: Vec<u8>) -> Self {
        Self {
            destination,
            command: command.to_string(),
            id: 0,
            data,
        }
    }
}

/// Delivery capability owned by the transport.
///
/// Sending is best-effort: implementations queue the message and return.
/// Subscriptions hold the sink weakly; once the transport drops its last
/// `Arc`, updates for that connection are skipped.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: OutgoingMessage);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_echoes_request() {
        let request = IncomingMessage::new(Origin::new(vec![1, 2]), SUBSCRIBE_COMMAND, 42, vec![0]);
        let response = OutgoingMessage::response(&request, vec![0, 0, 0, 0]);
        assert_eq!(response.destination, request.origin);
        assert_eq!(response.command, SUBSCRIBE_COMMAND);
        assert_eq!(response.id, 42);
    }

    #[test]
    fn test_origin_hex() {
        let origin = Origin::new(vec![0xde, 0xad]);
        assert_eq!(origin.to_string(), "dead");
        assert_eq!(format!("{:?}", origin), "Origin(dead)");
    }
}
