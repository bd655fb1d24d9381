//! Single-writer, many-reader session store.
//!
//! The store holds at most one [`CredentialSnapshot`] behind an `Arc` and a
//! short-critical-section `RwLock`, so reads are cheap, synchronous, and
//! never observe a partially committed credential set. A `refreshing` flag
//! with compare-and-swap admission guarantees at most one acquisition is in
//! flight at any time.

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use crate::snapshot::CredentialSnapshot;

#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Arc<CredentialSnapshot>>>,
    refreshing: AtomicBool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if any acquisition has ever succeeded.
    ///
    /// Expired snapshots are still returned; staleness is the caller's
    /// decision to make via [`CredentialSnapshot::is_expired`], since a stale
    /// credential may still beat no credential.
    pub fn read(&self) -> Option<Arc<CredentialSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the store holds no live snapshot at `now_ms`.
    /// A never-populated store counts as expired.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.read().is_none_or(|s| s.is_expired(now_ms))
    }

    /// Claim the single refresh slot. Returns `false` when another
    /// acquisition already holds it.
    pub fn try_begin_refresh(&self) -> bool {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Atomically replace the current snapshot and release the refresh slot.
    /// Readers see either the old snapshot or the new one, never a mix.
    pub fn commit(&self, snapshot: CredentialSnapshot) {
        {
            let mut slot = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = Some(Arc::new(snapshot));
        }
        self.refreshing.store(false, Ordering::Release);
    }

    /// Release the refresh slot after a failed acquisition, leaving any
    /// previous snapshot untouched.
    pub fn abort_refresh(&self) {
        self.refreshing.store(false, Ordering::Release);
    }
}
