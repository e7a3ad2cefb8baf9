//! Subscription record held by the registry.

use crate::codec::SubscribeKind;
use crate::message::{MessageSink, Origin};
use crate::prefix::PrefixKey;
use crate::types::Timestamp;
use std::sync::{Arc, Weak};

/// One client's standing interest in a prefix.
pub struct Subscription {
    pub(crate) prefix: PrefixKey,
    pub(crate) kind: SubscribeKind,
    pub(crate) expiry_time: Timestamp,
    pub(crate) origin: Origin,
    /// Handle back into the transport; never keeps the connection alive.
    pub(crate) sink: Weak<dyn MessageSink>,
}

impl Subscription {
    pub fn prefix(&self) -> &PrefixKey {
        &self.prefix
    }

    pub fn kind(&self) -> SubscribeKind {
        self.kind
    }

    pub fn expiry_time(&self) -> Timestamp {
        self.expiry_time
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Expired subscriptions are only removed by a sweep.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry_time < now
    }

    /// Live transport handle, if the connection still exists.
    pub fn sink(&self) -> Option<Arc<dyn MessageSink>> {
        self.sink.upgrade()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("prefix", &self.prefix)
            .field("kind", &self.kind)
            .field("expiry_time", &self.expiry_time)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
