//! The automation seam: object-safe traits over a browser engine.
//!
//! One [`DriverSession`] corresponds to one browser process and lives for a
//! single acquisition attempt. Every suspension point takes an explicit
//! timeout; nothing here may hang indefinitely. Callers must invoke
//! [`DriverSession::close`] on every exit path.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    error::DriverError,
    types::{Cookie, ElementHandle, ElementKind, ScannedElement},
};

/// A browser automation engine that can open isolated sessions.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Launch a fresh browser session.
    async fn open(&self) -> Result<Box<dyn DriverSession>, DriverError>;
}

/// One live browser session (one process, one page).
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Navigate to `url` and wait for load settlement, bounded by `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Bounded presence probe for a CSS selector.
    ///
    /// Returns `Ok(None)` when the element is absent or the probe times out;
    /// `Err` is reserved for transport failures.
    async fn probe(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, DriverError>;

    /// Exhaustive scan of all elements of a generic kind, in DOM order.
    async fn scan(&self, kind: ElementKind) -> Result<Vec<ScannedElement>, DriverError>;

    /// Type text into an element, paced by `char_delay` per character.
    async fn type_into(
        &self,
        handle: &ElementHandle,
        text: &str,
        char_delay: Duration,
    ) -> Result<(), DriverError>;

    /// Click an element.
    async fn click(&self, handle: &ElementHandle) -> Result<(), DriverError>;

    /// Send an Enter key press to the focused element (fallback confirm).
    async fn press_enter(&self) -> Result<(), DriverError>;

    /// Wait for navigation/network settlement, bounded by `timeout`.
    /// A timed-out wait is treated as settled.
    async fn wait_settled(&self, timeout: Duration) -> Result<(), DriverError>;

    /// The session's cookie jar as ordered `(name, value)` pairs.
    async fn cookies(&self) -> Result<Vec<Cookie>, DriverError>;

    /// Tear down the session and its browser process.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}
