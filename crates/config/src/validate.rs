//! Configuration validation.
//!
//! Checks the loaded config for values the broker cannot run with: missing
//! credentials, an unusable sign-in URL, a refresh cadence that cannot beat
//! the session TTL, and zeroed timeouts.

use secrecy::ExposeSecret;

use crate::schema::SessmuxConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "session.refresh_interval_secs".
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn error(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            path,
            message: message.into(),
        });
    }

    fn warning(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path,
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate(cfg: &SessmuxConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match &cfg.account.identity {
        Some(id) if !id.trim().is_empty() => {},
        _ => result.error("account.identity", "account identity is required"),
    }

    match &cfg.account.secret {
        Some(s) if !s.expose_secret().trim().is_empty() => {
            if s.expose_secret().starts_with("${") {
                result.error(
                    "account.secret",
                    "secret still contains an unresolved ${ENV_VAR} placeholder",
                );
            }
        },
        _ => result.error("account.secret", "account secret is required"),
    }

    if cfg.upstream.sign_in_url.is_empty() {
        result.error("upstream.sign_in_url", "sign-in URL is required");
    } else {
        match url::Url::parse(&cfg.upstream.sign_in_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {},
            Ok(u) => result.error(
                "upstream.sign_in_url",
                format!("unsupported scheme '{}', only http/https", u.scheme()),
            ),
            Err(e) => result.error("upstream.sign_in_url", format!("invalid URL: {e}")),
        }
    }

    if cfg.upstream.sign_in_markers.is_empty() {
        result.warning(
            "upstream.sign_in_markers",
            "no sign-in markers configured; a rejected login cannot be detected from the URL",
        );
    }

    if cfg.session.ttl_secs == 0 {
        result.error("session.ttl_secs", "session TTL must be non-zero");
    }
    if cfg.session.refresh_interval_secs >= cfg.session.ttl_secs {
        result.warning(
            "session.refresh_interval_secs",
            format!(
                "refresh interval ({}s) is not shorter than the TTL ({}s); \
                 the snapshot will expire before it is refreshed",
                cfg.session.refresh_interval_secs, cfg.session.ttl_secs
            ),
        );
    }
    if cfg.session.acquire_timeout_ms == 0 {
        result.error(
            "session.acquire_timeout_ms",
            "acquisition ceiling must be non-zero",
        );
    }

    if cfg.browser.navigation_timeout_ms == 0 {
        result.error(
            "browser.navigation_timeout_ms",
            "navigation timeout must be non-zero",
        );
    }
    if cfg.browser.probe_timeout_ms == 0 {
        result.error(
            "browser.probe_timeout_ms",
            "locator probe timeout must be non-zero",
        );
    }

    result
}
