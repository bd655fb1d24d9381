//! Credential acquisition via scripted sign-in.
//!
//! One acquisition drives a fresh browser session through a fixed pipeline:
//! navigate to the sign-in surface, locate the form fields, submit the
//! account credentials with human-paced typing, wait for the page to settle,
//! then judge the outcome from the cookie jar and the landing URL. The
//! session is closed on every exit path.

use std::{fmt, sync::Arc, time::Duration};

use secrecy::{ExposeSecret, Secret};
use sessmux_browser::{CandidateList, Driver, DriverError, DriverSession, locate};
use sessmux_config::SessmuxConfig;
use tracing::{debug, info, warn};

use crate::{
    error::AcquireError,
    snapshot::{CredentialSnapshot, now_ms},
};

/// Pipeline stage, for log context.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Navigating,
    LocatingFields,
    Submitting,
    AwaitingSettlement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigating => write!(f, "navigating"),
            Self::LocatingFields => write!(f, "locating-fields"),
            Self::Submitting => write!(f, "submitting"),
            Self::AwaitingSettlement => write!(f, "awaiting-settlement"),
        }
    }
}

/// Everything one acquisition needs, resolved from configuration up front.
#[derive(Clone)]
pub struct AcquireSettings {
    pub sign_in_url: String,
    /// Lowercase URL fragments that mark a sign-in surface.
    pub sign_in_markers: Vec<String>,
    pub identity: String,
    pub secret: Secret<String>,
    pub session_ttl_ms: u64,
    pub navigation_timeout: Duration,
    pub probe_timeout: Duration,
    pub settle_grace: Duration,
    pub type_delay: Duration,
}

impl AcquireSettings {
    /// Resolve settings from validated configuration. Validation guarantees
    /// the account fields are present; missing values degrade to empty
    /// strings, which the upstream will reject like any bad credential.
    pub fn from_config(cfg: &SessmuxConfig) -> Self {
        Self {
            sign_in_url: cfg.upstream.sign_in_url.clone(),
            sign_in_markers: cfg
                .upstream
                .sign_in_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            identity: cfg.account.identity.clone().unwrap_or_default(),
            secret: cfg
                .account
                .secret
                .clone()
                .unwrap_or_else(|| Secret::new(String::new())),
            session_ttl_ms: cfg.session.ttl_secs.saturating_mul(1_000),
            navigation_timeout: Duration::from_millis(cfg.browser.navigation_timeout_ms),
            probe_timeout: Duration::from_millis(cfg.browser.probe_timeout_ms),
            settle_grace: Duration::from_millis(cfg.session.settle_grace_ms),
            type_delay: Duration::from_millis(cfg.browser.type_delay_ms),
        }
    }
}

/// Whether a landing URL still looks like the sign-in surface.
fn on_sign_in_surface(url: &str, markers: &[String]) -> bool {
    let url = url.to_lowercase();
    markers.iter().any(|marker| url.contains(marker))
}

pub struct CredentialAcquirer {
    driver: Arc<dyn Driver>,
    settings: AcquireSettings,
}

impl CredentialAcquirer {
    pub fn new(driver: Arc<dyn Driver>, settings: AcquireSettings) -> Self {
        Self { driver, settings }
    }

    /// Run one full acquisition attempt against a fresh browser session.
    pub async fn acquire(&self) -> Result<CredentialSnapshot, AcquireError> {
        let session = self.driver.open().await.map_err(AcquireError::from)?;
        let outcome = self.drive(session.as_ref()).await;
        if let Err(err) = session.close().await {
            warn!(error = %err, "browser session close failed");
        }
        outcome
    }

    async fn drive(
        &self,
        session: &dyn DriverSession,
    ) -> Result<CredentialSnapshot, AcquireError> {
        let settings = &self.settings;

        debug!(stage = %Stage::Navigating, url = %settings.sign_in_url, "opening sign-in surface");
        session
            .navigate(&settings.sign_in_url, settings.navigation_timeout)
            .await?;

        debug!(stage = %Stage::LocatingFields, "locating form fields");
        let identity = locate(session, &CandidateList::identity(), settings.probe_timeout).await?;
        let secret = locate(session, &CandidateList::secret(), settings.probe_timeout).await?;
        // A missing submit control is tolerated: Enter on the focused secret
        // field submits most login forms.
        let submit = match locate(session, &CandidateList::submit(), settings.probe_timeout).await
        {
            Ok(handle) => Some(handle),
            Err(DriverError::FieldNotFound(role)) => {
                debug!(role = %role, "not found, will fall back to Enter");
                None
            },
            Err(err) => return Err(err.into()),
        };

        debug!(stage = %Stage::Submitting, "submitting credentials");
        session
            .type_into(&identity, &settings.identity, settings.type_delay)
            .await?;
        session
            .type_into(&secret, settings.secret.expose_secret(), settings.type_delay)
            .await?;
        match &submit {
            Some(handle) => session.click(handle).await?,
            None => session.press_enter().await?,
        }

        debug!(stage = %Stage::AwaitingSettlement, "waiting for post-submit settlement");
        session.wait_settled(settings.navigation_timeout).await?;
        if !settings.settle_grace.is_zero() {
            // Late cookie writes land during this grace window.
            tokio::time::sleep(settings.settle_grace).await;
        }

        let landing_url = session.current_url().await?;
        if on_sign_in_surface(&landing_url, &settings.sign_in_markers) {
            return Err(AcquireError::LoginRejected {
                url: landing_url,
                reason: "still on the sign-in surface",
            });
        }

        let cookies = session.cookies().await?;
        let acquired_at = now_ms();
        let snapshot =
            CredentialSnapshot::from_cookies(cookies, acquired_at, settings.session_ttl_ms)
                .ok_or(AcquireError::LoginRejected {
                    url: landing_url.clone(),
                    reason: "no session cookies were set",
                })?;

        info!(
            url = %landing_url,
            cookies = snapshot.cookies().len(),
            expires_at_ms = snapshot.expires_at_ms(),
            "credentials acquired"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_match_is_case_insensitive_substring() {
        let markers = vec!["sign-in".to_string(), "login".to_string()];
        assert!(on_sign_in_surface(
            "https://upstream.example/Sign-In?err=1",
            &markers
        ));
        assert!(on_sign_in_surface(
            "https://upstream.example/account/login",
            &markers
        ));
        assert!(!on_sign_in_surface("https://upstream.example/home", &markers));
    }
}
