//! Per-request classification of what the cache did.

use std::fmt;

/// One label per transaction, emitted in the diagnostic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOutcome {
    /// Fetched from the origin, not stored.
    Miss,
    /// Fetched from the origin and stored.
    MissStore,
    /// Served from the store without contacting the origin.
    HitFresh,
    /// Revalidated; the origin confirmed the stored copy and it was refreshed.
    StaleValidStore,
    /// Revalidated; the origin sent a new representation which replaced the stored one.
    StaleInvalidStore,
}

impl TransactionOutcome {
    /// The diagnostic header value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miss => "miss",
            Self::MissStore => "miss, store",
            Self::HitFresh => "fresh",
            Self::StaleValidStore => "stale, valid, store",
            Self::StaleInvalidStore => "stale, invalid, store",
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
