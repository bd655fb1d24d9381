//! CDP driver implementation on chromiumoxide.
//!
//! One browser process per [`DriverSession`]; the process is torn down on
//! `close` (and killed on drop if a session is abandoned mid-acquisition).

use std::time::Duration;

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType},
    },
    futures::StreamExt,
    tokio::time::timeout,
    tracing::{debug, trace, warn},
};

use crate::{
    detect,
    driver::{Driver, DriverSession},
    error::DriverError,
    types::{Cookie, DriverConfig, ElementFacts, ElementHandle, ElementKind, ScannedElement},
};

/// Poll interval for presence probes.
const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// JavaScript template for the fallback element scan. Tags each element of
/// the requested kind with a `data-sessmux-ref` attribute (fresh numbering
/// per scan) and returns its attribute/text facts in DOM order.
const SCAN_JS: &str = r#"
(() => {
    const kind = '__KIND__';
    const selector = kind === 'text-input'
        ? 'input, textarea'
        : 'button, input[type="submit"]';
    const skipTypes = ['hidden', 'submit', 'button', 'checkbox', 'radio', 'file'];
    const out = [];
    let ref = 1;
    for (const el of document.querySelectorAll(selector)) {
        const type = (el.type || '').toLowerCase();
        if (kind === 'text-input' && skipTypes.includes(type)) continue;
        el.dataset.sessmuxRef = String(ref);
        out.push({
            ref: ref,
            tag: el.tagName.toLowerCase(),
            type: type || null,
            name: el.name || null,
            id: el.id || null,
            placeholder: el.placeholder || null,
            aria_label: el.getAttribute('aria-label'),
            text: (el.innerText || el.value || '').trim().slice(0, 100) || null
        });
        ref += 1;
    }
    return out;
})()
"#;

#[derive(serde::Deserialize)]
struct RawScanned {
    #[serde(rename = "ref")]
    ref_: u32,
    #[serde(flatten)]
    facts: ElementFacts,
}

/// Launches one Chromium process per session over CDP.
pub struct CdpDriver {
    config: DriverConfig,
}

impl CdpDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn open(&self) -> Result<Box<dyn DriverSession>, DriverError> {
        let Some(path) = detect::find_browser(self.config.chrome_path.as_deref()) else {
            return Err(DriverError::LaunchFailed(detect::install_hint()));
        };

        let mut builder = CdpBrowserConfig::builder()
            .chrome_executable(&path)
            .request_timeout(Duration::from_millis(self.config.navigation_timeout_ms));

        // chromiumoxide runs headless by default; with_head() opts out.
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let cdp_config = builder
            .build()
            .map_err(|e| DriverError::LaunchFailed(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(|e| {
            DriverError::LaunchFailed(format!("{e}\n\n{}", detect::install_hint()))
        })?;

        // Drain browser events for the lifetime of the connection.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                trace!(?event, "browser event");
            }
            trace!("browser event handler exited");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        debug!(path = %path.display(), "browser session opened");

        Ok(Box::new(CdpSession { browser, page }))
    }
}

/// A live chromiumoxide session: one browser process, one page.
pub struct CdpSession {
    browser: Browser,
    page: Page,
}

#[async_trait]
impl DriverSession for CdpSession {
    async fn navigate(&self, url: &str, bound: Duration) -> Result<(), DriverError> {
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;
            // Settle redirects and late network activity; a settlement error
            // here is not fatal, the caller inspects the URL afterwards.
            if let Err(e) = self.page.wait_for_navigation().await {
                debug!(error = %e, "post-navigation settlement reported an error");
            }
            Ok(())
        };

        match timeout(bound, nav).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout(format!(
                "navigation to {url} exceeded {}ms",
                bound.as_millis()
            ))),
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;
        url.ok_or(DriverError::SessionClosed)
    }

    async fn probe(
        &self,
        selector: &str,
        bound: Duration,
    ) -> Result<Option<ElementHandle>, DriverError> {
        let quoted =
            serde_json::to_string(selector).map_err(|e| DriverError::Cdp(e.to_string()))?;
        let check_js = format!("document.querySelector({quoted}) !== null");

        let deadline = tokio::time::Instant::now() + bound;
        loop {
            let found: bool = self
                .page
                .evaluate(check_js.as_str())
                .await
                .map_err(|e| DriverError::JsEvalFailed(e.to_string()))?
                .into_value()
                .unwrap_or(false);

            if found {
                return Ok(Some(ElementHandle::new(selector)));
            }
            if tokio::time::Instant::now() + PROBE_INTERVAL > deadline {
                return Ok(None);
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    }

    async fn scan(&self, kind: ElementKind) -> Result<Vec<ScannedElement>, DriverError> {
        let kind_str = match kind {
            ElementKind::TextInput => "text-input",
            ElementKind::SubmitControl => "submit-control",
        };
        let js = SCAN_JS.replace("__KIND__", kind_str);

        let raw: Vec<RawScanned> = self
            .page
            .evaluate(js.as_str())
            .await
            .map_err(|e| DriverError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| DriverError::JsEvalFailed(format!("scan result: {e}")))?;

        debug!(kind = kind_str, elements = raw.len(), "scanned page elements");

        Ok(raw
            .into_iter()
            .map(|el| ScannedElement {
                handle: ElementHandle::new(format!("[data-sessmux-ref=\"{}\"]", el.ref_)),
                facts: el.facts,
            })
            .collect())
    }

    async fn type_into(
        &self,
        handle: &ElementHandle,
        text: &str,
        char_delay: Duration,
    ) -> Result<(), DriverError> {
        // Click to focus and place the caret.
        let element = self
            .page
            .find_element(&handle.selector)
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;

        // Paced per-character key events. The pacing is cosmetic (mimics a
        // human on anti-bot-sensitive forms), not a correctness requirement.
        for c in text.chars() {
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                let event = DispatchKeyEventParams::builder()
                    .r#type(kind)
                    .text(c.to_string())
                    .build()
                    .map_err(|e| DriverError::Cdp(e.to_string()))?;
                self.page
                    .execute(event)
                    .await
                    .map_err(|e| DriverError::Cdp(e.to_string()))?;
            }
            if !char_delay.is_zero() {
                tokio::time::sleep(char_delay).await;
            }
        }

        debug!(selector = %handle.selector, chars = text.chars().count(), "typed text");
        Ok(())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(&handle.selector)
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;

        debug!(selector = %handle.selector, "clicked element");
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), DriverError> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let event = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key("Enter")
                .code("Enter")
                .text("\r")
                .windows_virtual_key_code(13)
                .build()
                .map_err(|e| DriverError::Cdp(e.to_string()))?;
            self.page
                .execute(event)
                .await
                .map_err(|e| DriverError::Cdp(e.to_string()))?;
        }
        debug!("pressed enter");
        Ok(())
    }

    async fn wait_settled(&self, bound: Duration) -> Result<(), DriverError> {
        match timeout(bound, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {},
            Ok(Err(e)) => debug!(error = %e, "settlement wait reported an error"),
            Err(_) => debug!(bound_ms = bound.as_millis() as u64, "settlement wait timed out"),
        }
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| DriverError::Cdp(e.to_string()))?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie::new(c.name, c.value))
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        let mut browser = self.browser;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser close failed, process reaped on drop");
        }
        Ok(())
    }
}
