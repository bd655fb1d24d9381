//! Headless Chrome/Chromium automation behind an object-safe driver seam,
//! plus the resilient element locator used for automated sign-in.
//!
//! The [`Driver`]/[`DriverSession`] traits abstract the underlying automation
//! engine so locator and acquisition logic can be exercised against a
//! scripted DOM (see the `testing` module) instead of a live browser. The
//! production implementation, [`CdpDriver`], drives a detected
//! Chromium-based browser over CDP with one browser process per session.

pub mod cdp;
pub mod detect;
pub mod driver;
pub mod error;
pub mod locator;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use {
    cdp::CdpDriver,
    driver::{Driver, DriverSession},
    error::DriverError,
    locator::{CandidateList, locate},
    types::{Cookie, DriverConfig, ElementFacts, ElementHandle, ElementKind, FieldRole},
};
