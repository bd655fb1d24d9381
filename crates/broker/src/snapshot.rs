//! Immutable credential snapshots.
//!
//! A snapshot is built once per successful acquisition and never mutated
//! afterwards; readers share it behind an `Arc` so a concurrent refresh can
//! never expose a half-written credential set.

use std::time::{SystemTime, UNIX_EPOCH};

use sessmux_browser::Cookie;

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One acquired credential set, frozen at acquisition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    cookies: Vec<Cookie>,
    cookie_header: String,
    acquired_at_ms: u64,
    expires_at_ms: u64,
}

impl CredentialSnapshot {
    /// Freeze a cookie jar into a snapshot. Returns `None` for an empty jar;
    /// an empty jar is never a valid credential.
    pub fn from_cookies(cookies: Vec<Cookie>, acquired_at_ms: u64, ttl_ms: u64) -> Option<Self> {
        if cookies.is_empty() {
            return None;
        }
        let cookie_header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        Some(Self {
            cookies,
            cookie_header,
            acquired_at_ms,
            expires_at_ms: acquired_at_ms.saturating_add(ttl_ms),
        })
    }

    /// Cookies in acquisition order.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Pre-joined `Cookie` request header value, derived once at
    /// construction so it always agrees with [`Self::cookies`].
    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    pub fn acquired_at_ms(&self) -> u64 {
        self.acquired_at_ms
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    /// Expiry is strict: a snapshot whose deadline equals `now_ms` is still
    /// live.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms < now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_preserves_cookie_order() {
        let snapshot = CredentialSnapshot::from_cookies(
            vec![Cookie::new("session", "abc"), Cookie::new("csrf", "def")],
            1_000,
            60_000,
        )
        .unwrap();
        assert_eq!(snapshot.cookie_header(), "session=abc; csrf=def");
        assert_eq!(snapshot.expires_at_ms(), 61_000);
    }

    #[test]
    fn empty_jar_is_not_a_credential() {
        assert!(CredentialSnapshot::from_cookies(Vec::new(), 1_000, 60_000).is_none());
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let snapshot =
            CredentialSnapshot::from_cookies(vec![Cookie::new("s", "v")], 1_000, 60_000).unwrap();
        assert!(!snapshot.is_expired(61_000));
        assert!(snapshot.is_expired(61_001));
    }
}
