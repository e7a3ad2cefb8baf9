//! Shared fixtures for integration tests.

#![allow(dead_code)]

use addrwatch::{
    encode_request, Block, BlockHandler, IncomingMessage, MessageSink, NodeEvents, Origin,
    OutgoingMessage, PrefixKey, SubscribeConfig, SubscribeKind, SubscribeManager, Transaction,
    TransactionHandler, TxInput, TxOutput, RENEW_COMMAND, SUBSCRIBE_COMMAND,
};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Sink that forwards every message into a channel.
pub struct ChannelSink {
    sender: Sender<OutgoingMessage>,
}

impl MessageSink for ChannelSink {
    fn send(&self, message: OutgoingMessage) {
        let _ = self.sender.send(message);
    }
}

/// A client connection as the transport would hold it.
pub struct Client {
    pub sink: Arc<dyn MessageSink>,
    pub receiver: Receiver<OutgoingMessage>,
}

impl Client {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        let sink: Arc<dyn MessageSink> = Arc::new(ChannelSink { sender });
        Self { sink, receiver }
    }

    pub fn sink(&self) -> Arc<dyn MessageSink> {
        Arc::clone(&self.sink)
    }

    pub fn recv(&self) -> OutgoingMessage {
        self.receiver.recv_timeout(WAIT).unwrap()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<OutgoingMessage, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

pub fn manager(limit: u32, minutes: u32) -> SubscribeManager {
    init_tracing();
    SubscribeManager::new(SubscribeConfig {
        maximum_subscriptions: limit,
        subscription_expiration_minutes: minutes,
        unordered_workers: 2,
    })
    .unwrap()
}

pub fn request(
    command: &str,
    origin: &[u8],
    kind: SubscribeKind,
    prefix: &PrefixKey,
) -> IncomingMessage {
    IncomingMessage::new(
        Origin::new(origin),
        command,
        1,
        encode_request(kind, prefix).unwrap(),
    )
}

pub fn subscribe(origin: &[u8], kind: SubscribeKind, prefix: &PrefixKey) -> IncomingMessage {
    request(SUBSCRIBE_COMMAND, origin, kind, prefix)
}

pub fn renew(origin: &[u8], kind: SubscribeKind, prefix: &PrefixKey) -> IncomingMessage {
    request(RENEW_COMMAND, origin, kind, prefix)
}

/// Wait until every ordered-lane task queued so far has run.
///
/// A malformed subscribe goes through the ordered lane, changes nothing and
/// always gets an answer.
pub fn ordered_barrier(manager: &SubscribeManager) {
    let client = Client::new();
    let origin = Origin::new(b"barrier".to_vec());
    let barrier = IncomingMessage::new(origin, SUBSCRIBE_COMMAND, 0, Vec::new());
    manager.subscribe(barrier, client.sink()).unwrap();
    client.recv();
}

pub fn pay_to_pubkey_hash(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = vec![0x76, 0xa9, 20];
    script.extend_from_slice(hash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

pub fn stealth_info(ephemeral: &[u8]) -> Vec<u8> {
    let mut script = vec![0x6a, ephemeral.len() as u8];
    script.extend_from_slice(ephemeral);
    script
}

pub fn paying_tx(hash: &[u8; 20], data: &[u8]) -> Transaction {
    Transaction {
        inputs: vec![TxInput { script: vec![0x00] }],
        outputs: vec![TxOutput {
            value: 1_000,
            script: pay_to_pubkey_hash(hash),
        }],
        data: data.to_vec(),
    }
}

/// Node stand-in that lets a test fire block and mempool events.
#[derive(Default)]
pub struct MockNode {
    blocks: Mutex<Vec<BlockHandler>>,
    transactions: Mutex<Vec<TransactionHandler>>,
}

impl MockNode {
    pub fn commit_block(&self, height: u64, block: &Block) {
        for handler in self.blocks.lock().iter() {
            handler(height, block);
        }
    }

    pub fn accept_transaction(&self, tx: &Transaction) {
        for handler in self.transactions.lock().iter() {
            handler(tx);
        }
    }
}

impl NodeEvents for MockNode {
    fn subscribe_blocks(&self, handler: BlockHandler) {
        self.blocks.lock().push(handler);
    }

    fn subscribe_transactions(&self, handler: TransactionHandler) {
        self.transactions.lock().push(handler);
    }
}
