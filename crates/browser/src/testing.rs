//! Scripted in-memory driver for tests.
//!
//! Stands in for a real browser: a [`ScriptedPage`] describes the sign-in
//! surface (which selectors resolve, what the fallback scan sees, what
//! happens on submit) and the driver records every interaction so tests can
//! assert on typed values, click order, open counts, and close discipline.

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    driver::{Driver, DriverSession},
    error::DriverError,
    types::{Cookie, ElementFacts, ElementHandle, ElementKind, ScannedElement},
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted element on the synthetic page.
#[derive(Debug, Clone)]
pub struct ScriptedElement {
    /// CSS selectors this element answers a probe for.
    pub selectors: Vec<String>,
    pub kind: ElementKind,
    pub facts: ElementFacts,
    /// Whether clicking this element submits the form.
    pub submits: bool,
}

impl ScriptedElement {
    pub fn text_input(selectors: &[&str], facts: ElementFacts) -> Self {
        Self {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            kind: ElementKind::TextInput,
            facts,
            submits: false,
        }
    }

    pub fn submit_control(selectors: &[&str], facts: ElementFacts) -> Self {
        Self {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            kind: ElementKind::SubmitControl,
            facts,
            submits: true,
        }
    }
}

/// A synthetic sign-in surface.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub elements: Vec<ScriptedElement>,
    /// URL the page lands on after a successful submission.
    pub post_submit_url: String,
    /// Cookie jar visible once the form has been submitted.
    pub post_submit_cookies: Vec<Cookie>,
}

impl ScriptedPage {
    /// An empty page: probes miss, scans are empty, submission goes nowhere
    /// interesting and sets no cookies.
    pub fn blank() -> Self {
        Self {
            elements: Vec::new(),
            post_submit_url: "https://upstream.example/home".into(),
            post_submit_cookies: Vec::new(),
        }
    }

    /// A conventional sign-in form: `#username`, `#password`, and a
    /// `button[type="submit"]`.
    pub fn sign_in_form() -> Self {
        Self::blank()
            .with_element(ScriptedElement::text_input(
                &["#username"],
                ElementFacts {
                    tag: "input".into(),
                    name: Some("username".into()),
                    ..Default::default()
                },
            ))
            .with_element(ScriptedElement::text_input(
                &["#password"],
                ElementFacts {
                    tag: "input".into(),
                    type_attr: Some("password".into()),
                    name: Some("password".into()),
                    ..Default::default()
                },
            ))
            .with_element(ScriptedElement::submit_control(
                &[r#"button[type="submit"]"#],
                ElementFacts {
                    tag: "button".into(),
                    type_attr: Some("submit".into()),
                    text: Some("Sign In".into()),
                    ..Default::default()
                },
            ))
    }

    pub fn with_element(mut self, element: ScriptedElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_post_submit(mut self, url: &str, cookies: Vec<Cookie>) -> Self {
        self.post_submit_url = url.into();
        self.post_submit_cookies = cookies;
        self
    }
}

/// Everything the driver was asked to do, across all sessions it opened.
#[derive(Debug, Clone, Default)]
pub struct DriveLog {
    /// `(handle selector, text)` pairs in typing order.
    pub typed: Vec<(String, String)>,
    /// Handle selectors in click order.
    pub clicked: Vec<String>,
    pub enter_pressed: bool,
    /// Number of sessions closed. Must equal the open count after any
    /// acquisition attempt, success or failure.
    pub closed: usize,
}

/// A [`Driver`] over a [`ScriptedPage`].
pub struct ScriptedDriver {
    page: ScriptedPage,
    opens: AtomicUsize,
    latency: Duration,
    fail_launch: bool,
    fail_navigation: bool,
    log: Arc<Mutex<DriveLog>>,
}

impl ScriptedDriver {
    pub fn new(page: ScriptedPage) -> Self {
        Self {
            page,
            opens: AtomicUsize::new(0),
            latency: Duration::ZERO,
            fail_launch: false,
            fail_navigation: false,
            log: Arc::new(Mutex::new(DriveLog::default())),
        }
    }

    /// Delay each `navigate` by `latency`, widening race windows in
    /// concurrency tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every `open` fails with a launch error.
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Every `navigate` fails with a navigation error.
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// How many sessions have been opened (attempted acquisitions).
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Snapshot of the interaction log.
    pub fn log(&self) -> DriveLog {
        lock(&self.log).clone()
    }
}

#[async_trait]
impl Driver for ScriptedDriver {
    async fn open(&self) -> Result<Box<dyn DriverSession>, DriverError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_launch {
            return Err(DriverError::LaunchFailed("scripted launch failure".into()));
        }
        Ok(Box::new(ScriptedSession {
            page: self.page.clone(),
            current_url: Mutex::new("about:blank".into()),
            submitted: AtomicBool::new(false),
            latency: self.latency,
            fail_navigation: self.fail_navigation,
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedSession {
    page: ScriptedPage,
    current_url: Mutex<String>,
    submitted: AtomicBool,
    latency: Duration,
    fail_navigation: bool,
    log: Arc<Mutex<DriveLog>>,
}

impl ScriptedSession {
    /// Resolve a handle back to its scripted element: either a candidate
    /// selector the element answers to, or its scan-ref selector.
    fn resolve(&self, handle: &ElementHandle) -> Result<&ScriptedElement, DriverError> {
        if let Some(rest) = handle.selector.strip_prefix(r#"[data-scripted-ref=""#) {
            let index: usize = rest
                .strip_suffix(r#""]"#)
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| DriverError::Cdp(format!("bad scan ref: {}", handle.selector)))?;
            return self
                .page
                .elements
                .get(index)
                .ok_or_else(|| DriverError::Cdp(format!("stale scan ref: {index}")));
        }
        self.page
            .elements
            .iter()
            .find(|el| el.selectors.iter().any(|s| s == &handle.selector))
            .ok_or_else(|| DriverError::Cdp(format!("no element for: {}", handle.selector)))
    }

    fn submit(&self) {
        self.submitted.store(true, Ordering::SeqCst);
        *lock(&self.current_url) = self.page.post_submit_url.clone();
    }
}

#[async_trait]
impl DriverSession for ScriptedSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<(), DriverError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_navigation {
            return Err(DriverError::NavigationFailed(format!(
                "scripted navigation failure for {url}"
            )));
        }
        *lock(&self.current_url) = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(lock(&self.current_url).clone())
    }

    async fn probe(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<ElementHandle>, DriverError> {
        let present = self
            .page
            .elements
            .iter()
            .any(|el| el.selectors.iter().any(|s| s == selector));
        Ok(present.then(|| ElementHandle::new(selector)))
    }

    async fn scan(&self, kind: ElementKind) -> Result<Vec<ScannedElement>, DriverError> {
        Ok(self
            .page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.kind == kind)
            .map(|(index, el)| ScannedElement {
                handle: ElementHandle::new(format!(r#"[data-scripted-ref="{index}"]"#)),
                facts: el.facts.clone(),
            })
            .collect())
    }

    async fn type_into(
        &self,
        handle: &ElementHandle,
        text: &str,
        _char_delay: Duration,
    ) -> Result<(), DriverError> {
        self.resolve(handle)?;
        lock(&self.log)
            .typed
            .push((handle.selector.clone(), text.to_string()));
        Ok(())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<(), DriverError> {
        let submits = self.resolve(handle)?.submits;
        lock(&self.log).clicked.push(handle.selector.clone());
        if submits {
            self.submit();
        }
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), DriverError> {
        lock(&self.log).enter_pressed = true;
        // Enter on a focused form field submits the form.
        self.submit();
        Ok(())
    }

    async fn wait_settled(&self, _timeout: Duration) -> Result<(), DriverError> {
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        if self.submitted.load(Ordering::SeqCst) {
            Ok(self.page.post_submit_cookies.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        lock(&self.log).closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_interactions_and_close() {
        let driver = ScriptedDriver::new(
            ScriptedPage::blank()
                .with_element(ScriptedElement::text_input(
                    &["#username"],
                    ElementFacts::default(),
                ))
                .with_post_submit(
                    "https://upstream.example/home",
                    vec![Cookie::new("session", "abc")],
                ),
        );

        let session = driver.open().await.unwrap();
        session
            .navigate("https://upstream.example/sign-in", Duration::from_secs(1))
            .await
            .unwrap();
        session
            .type_into(
                &ElementHandle::new("#username"),
                "u@x.com",
                Duration::ZERO,
            )
            .await
            .unwrap();
        assert!(session.cookies().await.unwrap().is_empty());

        session.press_enter().await.unwrap();
        assert_eq!(
            session.current_url().await.unwrap(),
            "https://upstream.example/home"
        );
        assert_eq!(
            session.cookies().await.unwrap(),
            vec![Cookie::new("session", "abc")]
        );

        session.close().await.unwrap();

        let log = driver.log();
        assert_eq!(log.typed, vec![("#username".to_string(), "u@x.com".to_string())]);
        assert!(log.enter_pressed);
        assert_eq!(log.closed, 1);
        assert_eq!(driver.open_count(), 1);
    }

    #[tokio::test]
    async fn failing_launch_still_counts_the_attempt() {
        let driver = ScriptedDriver::new(ScriptedPage::blank()).failing_launch();
        assert!(driver.open().await.is_err());
        assert_eq!(driver.open_count(), 1);
    }
}
