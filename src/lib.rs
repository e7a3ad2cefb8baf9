//! # Address Watch
//!
//! Prefix subscriptions for a blockchain node's client service: clients
//! register interest in address-hash or stealth prefixes and receive a
//! binary update whenever a matching transaction is seen, confirmed or in
//! the mempool.
//!
//! ## Core Concepts
//!
//! - **Prefix keys**: variable-length bit-strings matched with "is prefix of"
//! - **Leases**: subscriptions expire unless renewed; expired ones are swept
//!   after each confirmed transaction
//! - **Lanes**: subscribe and submit run in order, renew runs unordered, and
//!   all of them share one registry lock
//!
//! ## Example
//!
//! ```ignore
//! use addrwatch::{SubscribeConfig, SubscribeManager};
//!
//! let manager = SubscribeManager::new(SubscribeConfig::default())?;
//! manager.register_with_node(&node);
//!
//! // From the transport, for each `address.subscribe` request:
//! manager.subscribe(request, connection_sink)?;
//! ```

pub mod chain;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod message;
pub mod prefix;
pub mod registry;
pub mod types;

// Re-exports
pub use chain::{
    hash160, Block, BlockHandler, NodeEvents, PaymentAddress, ScriptInspector, StandardScripts,
    Transaction, TransactionHandler, TxInput, TxOutput,
};
pub use codec::{
    decode_request, decode_status, encode_request, encode_status, AddressUpdate, StealthUpdate,
    SubscribeKind, ADDRESS_INFO_SIZE, STEALTH_INFO_SIZE,
};
pub use config::SubscribeConfig;
pub use dispatcher::{Dispatcher, SubmitSummary};
pub use error::{CodecError, ErrorCode, PrefixError, Result, SubscribeError};
pub use gateway::SubscribeManager;
pub use message::{
    IncomingMessage, MessageSink, Origin, OutgoingMessage, ADDRESS_UPDATE_COMMAND, RENEW_COMMAND,
    STEALTH_UPDATE_COMMAND, SUBSCRIBE_COMMAND,
};
pub use prefix::PrefixKey;
pub use registry::{Subscription, SubscriptionRegistry};
pub use types::*;
