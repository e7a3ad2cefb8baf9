//! Registry of active prefix subscriptions.
//!
//! Subscriptions are time-bounded leases:
//! - created by a valid subscribe request, up to the configured limit
//! - extended by renew requests from the same origin
//! - removed only when a sweep sees them expired
//!
//! The registry itself is not synchronized. The dispatcher keeps it behind a
//! single lock so that every lane sees one operation at a time.

mod pool;
mod types;

pub use pool::SubscriptionRegistry;
pub use types::Subscription;
