//! Task admission for the subscription service.
//!
//! Work is never done on the caller's thread. Tasks enter one of two lanes:
//! - the ordered lane (subscribe, submit) has a single worker, so its tasks
//!   run one at a time in submission order
//! - the unordered lane (renew) is served by a small pool and may run
//!   alongside the ordered lane
//!
//! Lanes only differ in ordering. Both reach the registry through the
//! dispatcher's lock, so registry operations never interleave.

use crate::chain::{Block, NodeEvents, ScriptInspector, StandardScripts, Transaction};
use crate::config::SubscribeConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Result, SubscribeError};
use crate::message::{IncomingMessage, MessageSink};
use crate::types::{HashDigest, Timestamp, NULL_HASH};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, Builder, JoinHandle};
use tracing::{info, warn};

/// Unit of work queued on a lane.
enum Task {
    Subscribe {
        request: IncomingMessage,
        sink: Arc<dyn MessageSink>,
    },
    Renew {
        request: IncomingMessage,
        sink: Arc<dyn MessageSink>,
    },
    Submit {
        height: u64,
        block_hash: HashDigest,
        tx: Transaction,
    },
}

impl Task {
    fn run(self, dispatcher: &Dispatcher) {
        let now = Timestamp::now();
        match self {
            Task::Subscribe { request, sink } => {
                dispatcher.on_subscribe(&request, &sink, now);
            }
            Task::Renew { request, sink } => {
                dispatcher.on_renew(&request, &sink, now);
            }
            Task::Submit {
                height,
                block_hash,
                tx,
            } => {
                dispatcher.on_transaction(height, &block_hash, &tx, now);
            }
        }
    }
}

/// Senders for both lanes. Dropping them lets the workers drain and exit.
struct Lanes {
    ordered: Sender<Task>,
    unordered: Sender<Task>,
}

struct ManagerInner {
    dispatcher: Arc<Dispatcher>,
    lanes: Mutex<Option<Lanes>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ManagerInner {
    fn enqueue(&self, ordered: bool, task: Task) -> Result<()> {
        let lanes = self.lanes.lock();
        let lanes = lanes.as_ref().ok_or(SubscribeError::Stopped)?;
        let sender = if ordered {
            &lanes.ordered
        } else {
            &lanes.unordered
        };
        sender.send(task).map_err(|_| SubscribeError::Stopped)
    }

    fn shutdown(&self) -> Result<()> {
        if self.lanes.lock().take().is_none() {
            return Ok(());
        }

        let workers = std::mem::take(&mut *self.workers.lock());
        let mut panicked = None;
        for worker in workers {
            // A sink holding the last handle can drop it on a worker thread.
            if worker.thread().id() == thread::current().id() {
                continue;
            }
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if worker.join().is_err() {
                panicked = Some(name);
            }
        }

        info!("subscription dispatch stopped");
        match panicked {
            Some(name) => Err(SubscribeError::WorkerPanicked(name)),
            None => Ok(()),
        }
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "subscription dispatch did not stop cleanly");
        }
    }
}

/// Entry point of the subscription service.
///
/// Cloning yields another handle to the same service. Every call only
/// queues work; results reach clients through their [`MessageSink`].
#[derive(Clone)]
pub struct SubscribeManager {
    inner: Arc<ManagerInner>,
}

impl SubscribeManager {
    /// Start a manager using the standard mainnet script templates.
    pub fn new(config: SubscribeConfig) -> Result<Self> {
        Self::with_inspector(config, StandardScripts::MAINNET.shared())
    }

    /// Start a manager with a node-supplied script inspector.
    pub fn with_inspector(
        config: SubscribeConfig,
        inspector: Arc<dyn ScriptInspector>,
    ) -> Result<Self> {
        let dispatcher = Arc::new(Dispatcher::new(&config, inspector));
        let (ordered, ordered_rx) = unbounded();
        let (unordered, unordered_rx) = unbounded();

        let inner = ManagerInner {
            dispatcher: Arc::clone(&dispatcher),
            lanes: Mutex::new(Some(Lanes { ordered, unordered })),
            workers: Mutex::new(Vec::new()),
        };

        // On a spawn failure `inner` drops here, closing the lanes and
        // joining whatever already started.
        let unordered_workers = config.unordered_workers.max(1);
        {
            let mut workers = inner.workers.lock();
            workers.push(spawn_worker(
                "subscribe-ordered".to_string(),
                ordered_rx,
                Arc::clone(&dispatcher),
            )?);
            for i in 0..unordered_workers {
                workers.push(spawn_worker(
                    format!("subscribe-unordered-{}", i),
                    unordered_rx.clone(),
                    Arc::clone(&dispatcher),
                )?);
            }
        }

        info!(
            limit = config.maximum_subscriptions,
            expiration_minutes = config.subscription_expiration_minutes,
            unordered_workers,
            "subscription dispatch started"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Queue a subscribe request (ordered lane).
    ///
    /// The registry keeps only a weak handle to `sink`. Updates flow for as
    /// long as the caller keeps that same `Arc` alive, so a transport should
    /// hold one sink per connection and pass clones of it, not build a new
    /// one per request.
    pub fn subscribe(&self, request: IncomingMessage, sink: Arc<dyn MessageSink>) -> Result<()> {
        self.inner.enqueue(true, Task::Subscribe { request, sink })
    }

    /// Queue a renew request (unordered lane).
    pub fn renew(&self, request: IncomingMessage, sink: Arc<dyn MessageSink>) -> Result<()> {
        self.inner.enqueue(false, Task::Renew { request, sink })
    }

    /// Queue a transaction for notification (ordered lane).
    ///
    /// Use height 0 and [`NULL_HASH`] for mempool transactions.
    pub fn submit(&self, height: u64, block_hash: HashDigest, tx: Transaction) -> Result<()> {
        self.inner.enqueue(
            true,
            Task::Submit {
                height,
                block_hash,
                tx,
            },
        )
    }

    /// Submit every transaction of a committed block.
    pub fn receive_block(&self, height: u64, block: &Block) -> Result<()> {
        for tx in &block.transactions {
            self.submit(height, block.hash, tx.clone())?;
        }
        Ok(())
    }

    /// Submit a mempool transaction.
    pub fn receive_transaction(&self, tx: &Transaction) -> Result<()> {
        self.submit(0, NULL_HASH, tx.clone())
    }

    /// Feed block and mempool events from `node` into this manager.
    pub fn register_with_node(&self, node: &impl NodeEvents) {
        let manager = self.clone();
        node.subscribe_blocks(Box::new(move |height: u64, block: &Block| {
            if let Err(err) = manager.receive_block(height, block) {
                warn!(height, %err, "dropping block notification");
            }
        }));

        let manager = self.clone();
        node.subscribe_transactions(Box::new(move |tx: &Transaction| {
            if let Err(err) = manager.receive_transaction(tx) {
                warn!(%err, "dropping transaction notification");
            }
        }));
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.inner.dispatcher
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.dispatcher.subscription_count()
    }

    /// Stop accepting work, let queued tasks finish and join the workers.
    ///
    /// Shared by every clone; later calls and later enqueues see
    /// [`SubscribeError::Stopped`] or succeed trivially.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown()
    }
}

fn spawn_worker(
    name: String,
    tasks: Receiver<Task>,
    dispatcher: Arc<Dispatcher>,
) -> Result<JoinHandle<()>> {
    let handle = Builder::new().name(name).spawn(move || {
        // Ends once every sender is gone and the queue is empty.
        for task in tasks.iter() {
            task.run(&dispatcher);
        }
    })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_status, encode_request, SubscribeKind};
    use crate::error::ErrorCode;
    use crate::message::testing::RecordingSink;
    use crate::message::{Origin, SUBSCRIBE_COMMAND};
    use crate::prefix::PrefixKey;

    fn config() -> SubscribeConfig {
        SubscribeConfig {
            maximum_subscriptions: 3,
            subscription_expiration_minutes: 10,
            unordered_workers: 2,
        }
    }

    fn subscribe_request(i: u8) -> IncomingMessage {
        let body = encode_request(SubscribeKind::Address, &PrefixKey::from_bytes(&[i])).unwrap();
        IncomingMessage::new(Origin::new(vec![i]), SUBSCRIBE_COMMAND, u32::from(i), body)
    }

    #[test]
    fn test_shutdown_drains_ordered_lane() {
        let manager = SubscribeManager::new(config()).unwrap();
        let recorder = RecordingSink::shared();
        let sink: Arc<dyn MessageSink> = recorder.clone();

        for i in 0..5u8 {
            manager.subscribe(subscribe_request(i), Arc::clone(&sink)).unwrap();
        }
        manager.shutdown().unwrap();

        let messages = recorder.take();
        let ids: Vec<u32> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        let codes: Vec<ErrorCode> = messages
            .iter()
            .map(|m| decode_status(&m.data).unwrap())
            .collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::Success,
                ErrorCode::Success,
                ErrorCode::Success,
                ErrorCode::PoolFull,
                ErrorCode::PoolFull
            ]
        );
        assert_eq!(manager.subscription_count(), 3);
    }

    #[test]
    fn test_enqueue_after_shutdown_fails() {
        let manager = SubscribeManager::new(config()).unwrap();
        manager.shutdown().unwrap();
        // Second shutdown is a no-op.
        manager.shutdown().unwrap();

        let sink: Arc<dyn MessageSink> = RecordingSink::shared();
        let result = manager.subscribe(subscribe_request(1), sink);
        assert!(matches!(result, Err(SubscribeError::Stopped)));
        assert!(matches!(
            manager.submit(0, NULL_HASH, Transaction::default()),
            Err(SubscribeError::Stopped)
        ));
    }

    #[test]
    fn test_zero_unordered_workers_still_serves_renew() {
        let manager = SubscribeManager::new(SubscribeConfig {
            unordered_workers: 0,
            ..config()
        })
        .unwrap();
        let recorder = RecordingSink::shared();
        let sink: Arc<dyn MessageSink> = recorder.clone();

        let mut renew = subscribe_request(9);
        renew.command = crate::message::RENEW_COMMAND.to_string();
        manager.renew(renew, sink).unwrap();
        manager.shutdown().unwrap();

        assert_eq!(recorder.len(), 1);
    }
}
