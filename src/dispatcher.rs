//! Request handling and notification fan-out.
//!
//! The dispatcher runs the actual work behind each queued task. It owns the
//! registry behind one lock; every handler takes that lock for the span of a
//! single registry operation and releases it before talking to the transport.

use crate::chain::{PaymentAddress, ScriptInspector, Transaction};
use crate::codec::{decode_request, encode_status, AddressUpdate, StealthUpdate};
use crate::config::SubscribeConfig;
use crate::error::{ErrorCode, Result};
use crate::message::{
    IncomingMessage, MessageSink, Origin, OutgoingMessage, ADDRESS_UPDATE_COMMAND,
    STEALTH_UPDATE_COMMAND,
};
use crate::registry::{Subscription, SubscriptionRegistry};
use crate::types::{HashDigest, Timestamp};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Outcome of processing one transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitSummary {
    /// Notifications handed to subscriber sinks.
    pub updates_sent: usize,
    /// Subscriptions removed by the sweep that followed, if any.
    pub swept: usize,
}

/// Live delivery target collected under the registry lock.
type Target = (Origin, Arc<dyn MessageSink>);

/// Executes subscribe, renew and submit against the shared registry.
pub struct Dispatcher {
    registry: Mutex<SubscriptionRegistry>,
    expiration_minutes: u32,
    inspector: Arc<dyn ScriptInspector>,
    sweep_passes: AtomicU64,
}

impl Dispatcher {
    pub fn new(config: &SubscribeConfig, inspector: Arc<dyn ScriptInspector>) -> Self {
        Self {
            registry: Mutex::new(SubscriptionRegistry::new(config.maximum_subscriptions)),
            expiration_minutes: config.subscription_expiration_minutes,
            inspector,
            sweep_passes: AtomicU64::new(0),
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Number of sweep passes run so far.
    pub fn sweep_passes(&self) -> u64 {
        self.sweep_passes.load(Ordering::SeqCst)
    }

    /// Read the registry under its lock.
    pub fn with_registry<R>(&self, f: impl FnOnce(&SubscriptionRegistry) -> R) -> R {
        f(&self.registry.lock())
    }

    // --- Requests ---

    /// Handle a subscribe request and answer it through `sink`.
    pub fn on_subscribe(
        &self,
        request: &IncomingMessage,
        sink: &Arc<dyn MessageSink>,
        now: Timestamp,
    ) -> ErrorCode {
        let code = match self.add_subscription(request, sink, now) {
            Ok(()) => ErrorCode::Success,
            Err(err) => err.code(),
        };

        sink.send(OutgoingMessage::response(request, encode_status(code)));
        code
    }

    fn add_subscription(
        &self,
        request: &IncomingMessage,
        sink: &Arc<dyn MessageSink>,
        now: Timestamp,
    ) -> Result<()> {
        let (kind, prefix) = decode_request(&request.data).map_err(|err| {
            warn!(origin = %request.origin, %err, "incorrect format for subscribe data");
            err
        })?;

        debug!(origin = %request.origin, ?kind, %prefix, "adding subscription");

        self.registry.lock().add(
            kind,
            prefix,
            request.origin.clone(),
            Arc::downgrade(sink),
            self.expiration_minutes,
            now,
        )
    }

    /// Handle a renew request.
    ///
    /// A malformed request is dropped without a response. Otherwise the
    /// answer is always success, however many subscriptions matched; the
    /// match count is returned for the caller's benefit.
    pub fn on_renew(
        &self,
        request: &IncomingMessage,
        sink: &Arc<dyn MessageSink>,
        now: Timestamp,
    ) -> Option<usize> {
        let (kind, filter) = match decode_request(&request.data) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(origin = %request.origin, %err, "incorrect format for subscribe renew");
                return None;
            }
        };

        let expiry = now.plus_minutes(self.expiration_minutes);
        let renewed = self
            .registry
            .lock()
            .renew(kind, &filter, &request.origin, expiry);
        trace!(origin = %request.origin, renewed, "renewed subscriptions");

        sink.send(OutgoingMessage::response(
            request,
            encode_status(ErrorCode::Success),
        ));
        Some(renewed)
    }

    // --- Transactions ---

    /// Notify subscribers about `tx`.
    ///
    /// `height == 0` marks a mempool transaction. Confirmed transactions
    /// are followed by one sweep of expired subscriptions.
    pub fn on_transaction(
        &self,
        height: u64,
        block_hash: &HashDigest,
        tx: &Transaction,
        now: Timestamp,
    ) -> SubmitSummary {
        let mut summary = SubmitSummary::default();

        match u32::try_from(height) {
            Ok(height32) => summary.updates_sent = self.post_all(height32, block_hash, tx),
            Err(_) => warn!(height, "height does not fit the update format; not notifying"),
        }

        if height != 0 {
            summary.swept = self.registry.lock().sweep(now);
            self.sweep_passes.fetch_add(1, Ordering::SeqCst);
        }

        summary
    }

    fn post_all(&self, height: u32, block_hash: &HashDigest, tx: &Transaction) -> usize {
        let mut sent = 0;

        for input in &tx.inputs {
            if let Some(address) = self.inspector.input_address(&input.script) {
                sent += self.post_updates(&address, height, block_hash, tx);
            }
        }

        // An output is either an address payment or a stealth output, never both.
        for output in &tx.outputs {
            if let Some(address) = self.inspector.output_address(&output.script) {
                sent += self.post_updates(&address, height, block_hash, tx);
            } else if let Some(prefix) = self.inspector.stealth_prefix(&output.script) {
                sent += self.post_stealth_updates(prefix, height, block_hash, tx);
            }
        }

        sent
    }

    fn post_updates(
        &self,
        address: &PaymentAddress,
        height: u32,
        block_hash: &HashDigest,
        tx: &Transaction,
    ) -> usize {
        let targets = live_targets(self.registry.lock().matches_address(&address.hash));
        if targets.is_empty() {
            return 0;
        }

        let data = AddressUpdate {
            version: address.version,
            hash: &address.hash,
            height,
            block_hash,
            tx: &tx.data,
        }
        .encode();

        deliver(targets, ADDRESS_UPDATE_COMMAND, data)
    }

    fn post_stealth_updates(
        &self,
        prefix: u32,
        height: u32,
        block_hash: &HashDigest,
        tx: &Transaction,
    ) -> usize {
        let targets = live_targets(self.registry.lock().matches_stealth(prefix));
        if targets.is_empty() {
            return 0;
        }

        let data = StealthUpdate {
            prefix,
            height,
            block_hash,
            tx: &tx.data,
        }
        .encode();

        deliver(targets, STEALTH_UPDATE_COMMAND, data)
    }
}

fn live_targets<'a>(matches: impl Iterator<Item = &'a Subscription>) -> Vec<Target> {
    matches
        .filter_map(|subscription| match subscription.sink() {
            Some(sink) => Some((subscription.origin().clone(), sink)),
            None => {
                trace!(origin = %subscription.origin(), "subscriber connection is gone");
                None
            }
        })
        .collect()
}

fn deliver(targets: Vec<Target>, command: &str, data: Vec<u8>) -> usize {
    let count = targets.len();
    for (origin, sink) in targets {
        sink.send(OutgoingMessage::notification(origin, command, data.clone()));
    }
    trace!(command, count, "posted updates");
    count
}
