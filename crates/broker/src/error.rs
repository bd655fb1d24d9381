//! Broker error types.

use sessmux_browser::{DriverError, FieldRole};
use thiserror::Error;

/// Terminal outcomes of a failed acquisition attempt.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("automation engine failed to start: {0}")]
    Launch(String),

    #[error("could not reach the sign-in surface: {0}")]
    Navigation(String),

    #[error("{0} not found on the sign-in surface")]
    FieldNotFound(FieldRole),

    /// The upstream did not grant a session: no cookies were set, or the
    /// browser never left the sign-in surface.
    #[error("login rejected ({reason}) at {url}")]
    LoginRejected { url: String, reason: &'static str },

    /// The whole attempt ran past the acquisition ceiling and was abandoned.
    #[error("acquisition exceeded its {0}ms ceiling")]
    Timeout(u64),

    #[error("driver failure: {0}")]
    Driver(DriverError),
}

impl From<DriverError> for AcquireError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::LaunchFailed(msg) => Self::Launch(msg),
            // A driver-level timeout only surfaces from bounded navigation.
            DriverError::NavigationFailed(msg) | DriverError::Timeout(msg) => {
                Self::Navigation(msg)
            },
            DriverError::FieldNotFound(role) => Self::FieldNotFound(role),
            other => Self::Driver(other),
        }
    }
}
