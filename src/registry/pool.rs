//! Insertion-ordered subscription pool with a hard size limit.

use crate::codec::SubscribeKind;
use crate::error::{Result, SubscribeError};
use crate::message::{MessageSink, Origin};
use crate::prefix::PrefixKey;
use crate::types::{ShortHash, Timestamp};
use std::sync::Weak;
use tracing::debug;

use super::types::Subscription;

/// The set of active subscriptions.
///
/// Duplicates are allowed: the same origin may hold several subscriptions
/// for one prefix, each expiring on its own.
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
    limit: u32,
}

impl SubscriptionRegistry {
    /// Create an empty registry holding at most `limit` subscriptions.
    pub fn new(limit: u32) -> Self {
        Self {
            subscriptions: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Subscriptions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.iter()
    }

    /// Add a subscription expiring `expiry_minutes` after `now`.
    ///
    /// Fails with [`SubscribeError::PoolFull`] without touching the registry
    /// when it already holds `limit` entries.
    pub fn add(
        &mut self,
        kind: SubscribeKind,
        prefix: PrefixKey,
        origin: Origin,
        sink: Weak<dyn MessageSink>,
        expiry_minutes: u32,
        now: Timestamp,
    ) -> Result<()> {
        if self.subscriptions.len() >= self.limit as usize {
            return Err(SubscribeError::PoolFull(self.limit));
        }

        self.subscriptions.push(Subscription {
            prefix,
            kind,
            expiry_time: now.plus_minutes(expiry_minutes),
            origin,
            sink,
        });

        Ok(())
    }

    /// Extend every subscription of `kind` from `origin` whose prefix is a
    /// prefix of `filter`. Returns how many were updated.
    ///
    /// Expiry only moves forward; an earlier `new_expiry` leaves the
    /// subscription as it was.
    pub fn renew(
        &mut self,
        kind: SubscribeKind,
        filter: &PrefixKey,
        origin: &Origin,
        new_expiry: Timestamp,
    ) -> usize {
        let mut renewed = 0;
        for subscription in self.subscriptions.iter_mut() {
            if subscription.kind != kind {
                continue;
            }

            // Only the client that created a subscription may extend it.
            if subscription.origin != *origin {
                continue;
            }

            if !subscription.prefix.is_prefix_of_key(filter) {
                continue;
            }

            if new_expiry > subscription.expiry_time {
                subscription.expiry_time = new_expiry;
            }
            renewed += 1;
        }
        renewed
    }

    /// Remove every subscription that expired before `now`, keeping the
    /// order of the rest. Returns the number removed.
    pub fn sweep(&mut self, now: Timestamp) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| {
            if !subscription.is_expired(now) {
                return true;
            }
            debug!(
                prefix = %subscription.prefix,
                origin = %subscription.origin,
                "deleting expired subscription"
            );
            false
        });
        before - self.subscriptions.len()
    }

    /// Address subscriptions whose prefix matches `hash`.
    pub fn matches_address<'a>(
        &'a self,
        hash: &'a ShortHash,
    ) -> impl Iterator<Item = &'a Subscription> + 'a {
        self.subscriptions.iter().filter(move |subscription| {
            subscription.kind == SubscribeKind::Address
                && subscription.prefix.is_prefix_of(hash.as_bytes())
        })
    }

    /// Stealth subscriptions whose prefix matches `prefix`.
    pub fn matches_stealth(&self, prefix: u32) -> impl Iterator<Item = &Subscription> + '_ {
        self.subscriptions.iter().filter(move |subscription| {
            subscription.kind == SubscribeKind::Stealth
                && subscription.prefix.is_prefix_of_stealth(prefix)
        })
    }
}
