//! The session broker: acquires upstream credentials through browser
//! automation, holds the latest snapshot for concurrent readers, and keeps
//! it fresh proactively and on demand.
//!
//! Ownership is split four ways. The [`CredentialAcquirer`] runs one sign-in
//! attempt end to end. The [`SessionStore`] is the single-writer,
//! many-reader home of the current [`CredentialSnapshot`]. The
//! [`RefreshScheduler`] decides when acquisitions run and serializes them
//! through the store's refresh slot.

pub mod acquirer;
pub mod error;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use {
    acquirer::{AcquireSettings, CredentialAcquirer},
    error::AcquireError,
    scheduler::{RefreshScheduler, SchedulerConfig},
    snapshot::{CredentialSnapshot, now_ms},
    store::SessionStore,
};
