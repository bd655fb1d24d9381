//! Config schema types (account, upstream, session, browser).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessmuxConfig {
    pub account: AccountConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub browser: BrowserConfig,
}

/// The shared account used for automated sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account identifier (email or username) typed into the identity field.
    pub identity: Option<String>,
    /// Account secret typed into the password field.
    #[serde(serialize_with = "serialize_option_secret")]
    pub secret: Option<Secret<String>>,
}

/// The upstream web property a session is acquired against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Sign-in page URL, navigated to at the start of every acquisition.
    pub sign_in_url: String,
    /// URL substrings that mark a page as (still) the sign-in surface.
    /// A post-submit URL containing any of these means the login was rejected.
    pub sign_in_markers: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            sign_in_url: String::new(),
            sign_in_markers: vec!["sign-in".into(), "signin".into(), "login".into()],
        }
    }
}

/// Session lifetime and refresh cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long an acquired credential snapshot is considered valid.
    pub ttl_secs: u64,
    /// Periodic refresh interval. Must be shorter than `ttl_secs` so the
    /// snapshot is replaced before it naturally expires.
    pub refresh_interval_secs: u64,
    /// Grace period after post-submit settlement, giving the upstream time
    /// to finish setting session cookies.
    pub settle_grace_ms: u64,
    /// Hard ceiling on a whole acquisition attempt.
    pub acquire_timeout_ms: u64,
    /// Consecutive login rejections before escalating to an error-level
    /// alert. Retrying with the same secret will not self-heal.
    pub rejection_alert_threshold: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 4 * 60 * 60,
            refresh_interval_secs: 3 * 60 * 60,
            settle_grace_ms: 3000,
            acquire_timeout_ms: 60_000,
            rejection_alert_threshold: 3,
        }
    }
}

/// Browser automation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to a Chromium-based browser binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run headless.
    pub headless: bool,
    /// User agent override.
    pub user_agent: Option<String>,
    /// Additional browser arguments.
    pub chrome_args: Vec<String>,
    /// Navigation timeout in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Per-candidate locator probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Delay between typed characters in milliseconds.
    pub type_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .into(),
            ),
            chrome_args: Vec::new(),
            navigation_timeout_ms: 30_000,
            probe_timeout_ms: 8_000,
            type_delay_ms: 100,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
