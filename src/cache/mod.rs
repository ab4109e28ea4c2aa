//! Shared response cache in front of an [`Origin`].
//!
//! ## Core types
//!
//! - [`CacheController`]: runs one request through lookup, origin fetch or
//!   revalidation, and the store decision.
//! - [`CacheStore`] / [`MemoryStore`]: one [`CachedEntry`] per [`CacheKey`].
//! - [`TransactionOutcome`]: what the controller did, reported in the
//!   diagnostic header (`miss`, `miss, store`, `fresh`, `stale, valid, store`,
//!   `stale, invalid, store`).
//! - [`Origin`]: the application handler behind the cache.
//! - [`Clock`]: the time source used for entry ages.

mod clock;
mod controller;
mod entry;
mod key;
mod origin;
mod outcome;
mod store;

pub use clock::{Clock, SystemClock};
pub use controller::{CacheController, Transaction};
pub use entry::CachedEntry;
pub use key::CacheKey;
pub use origin::{Origin, OriginFuture};
pub use outcome::TransactionOutcome;
pub use store::{CacheStore, MemoryStore, StoreError};
