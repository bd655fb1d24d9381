//! Resilient element locator.
//!
//! Two-tier strategy: an ordered chain of precise CSS selector candidates,
//! then a heuristic keyword scan over all elements of the role's generic
//! kind. This is the system's core defense against upstream markup drift and
//! must stay deterministic for a given DOM: stable ordering, first match
//! wins, no randomness.

use std::time::Duration;

use tracing::{debug, info};

use crate::{
    driver::DriverSession,
    error::DriverError,
    types::{ElementHandle, ElementKind, FieldRole},
};

/// Ordered element descriptors for one form role, with a keyword fallback.
#[derive(Debug, Clone)]
pub struct CandidateList {
    pub role: FieldRole,
    /// CSS selectors, tried in priority order.
    pub selectors: Vec<String>,
    /// Lowercase keywords for the fallback scan over `scan_kind` elements.
    pub keywords: &'static [&'static str],
    pub scan_kind: ElementKind,
}

impl CandidateList {
    /// Email/username field heuristics.
    pub fn identity() -> Self {
        Self {
            role: FieldRole::Identity,
            selectors: to_owned(&[
                "#username",
                r#"input[name="username"]"#,
                r#"input[name="email"]"#,
                r#"input[type="email"]"#,
                r#"input[placeholder*="email" i]"#,
                r#"input[placeholder*="username" i]"#,
                r#"[data-testid*="email"]"#,
                r#"[data-testid*="username"]"#,
                // Broadest candidate last: a bare text input.
                r#"input[type="text"]"#,
            ]),
            keywords: &["email", "user", "login"],
            scan_kind: ElementKind::TextInput,
        }
    }

    /// Password field heuristics.
    pub fn secret() -> Self {
        Self {
            role: FieldRole::Secret,
            selectors: to_owned(&[
                "#password",
                r#"input[name="password"]"#,
                r#"input[type="password"]"#,
                r#"input[placeholder*="password" i]"#,
                r#"[data-testid*="password"]"#,
            ]),
            keywords: &["password", "pass"],
            scan_kind: ElementKind::TextInput,
        }
    }

    /// Submit control heuristics.
    pub fn submit() -> Self {
        Self {
            role: FieldRole::Submit,
            selectors: to_owned(&[
                r#"button[type="submit"]"#,
                r#"input[type="submit"]"#,
                ".login-button",
                r#"[data-testid="login-submit"]"#,
            ]),
            keywords: &["sign in", "log in", "login", "submit", "continue"],
            scan_kind: ElementKind::SubmitControl,
        }
    }
}

fn to_owned(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| (*s).to_string()).collect()
}

/// Find the first live element matching a candidate list.
///
/// Tier one probes each selector with a bounded wait; the first present
/// candidate wins. Tier two scans every element of the role's generic kind
/// and returns the first whose attributes or text contain one of the role's
/// keywords (case-insensitive). Fails with
/// [`DriverError::FieldNotFound`] when both tiers come up empty.
pub async fn locate(
    session: &dyn DriverSession,
    list: &CandidateList,
    probe_timeout: Duration,
) -> Result<ElementHandle, DriverError> {
    for selector in &list.selectors {
        match session.probe(selector, probe_timeout).await? {
            Some(handle) => {
                debug!(role = %list.role, selector = %selector, "candidate matched");
                return Ok(handle);
            },
            None => {
                debug!(role = %list.role, selector = %selector, "candidate not present");
            },
        }
    }

    // Last resort: keyword scan over the generic element kind.
    let scanned = session.scan(list.scan_kind).await?;
    for element in scanned {
        if element.facts.matches_any(list.keywords) {
            info!(
                role = %list.role,
                handle = %element.handle.selector,
                "located via fallback keyword scan"
            );
            return Ok(element.handle);
        }
    }

    Err(DriverError::FieldNotFound(list.role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{ScriptedDriver, ScriptedElement, ScriptedPage},
        types::ElementFacts,
    };

    const PROBE: Duration = Duration::from_millis(20);

    fn input_facts(name: &str) -> ElementFacts {
        ElementFacts {
            tag: "input".into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    async fn open(page: ScriptedPage) -> Box<dyn DriverSession> {
        use crate::driver::Driver;
        ScriptedDriver::new(page).open().await.unwrap()
    }

    #[tokio::test]
    async fn first_matching_candidate_wins() {
        // Both #username and input[name="email"] exist; the earlier
        // candidate in the list must win even though both match.
        let page = ScriptedPage::blank()
            .with_element(ScriptedElement::text_input(
                &[r#"input[name="email"]"#],
                input_facts("email"),
            ))
            .with_element(ScriptedElement::text_input(
                &["#username"],
                input_facts("username"),
            ));
        let session = open(page).await;

        let handle = locate(session.as_ref(), &CandidateList::identity(), PROBE)
            .await
            .unwrap();
        assert_eq!(handle.selector, "#username");
    }

    #[tokio::test]
    async fn fallback_scan_finds_keyword_match() {
        // No candidate selector matches, but an input advertises "email"
        // in its placeholder-free name attribute.
        let page = ScriptedPage::blank().with_element(ScriptedElement::text_input(
            &["#obscure-field-42"],
            input_facts("customer_email_address"),
        ));
        let session = open(page).await;

        let handle = locate(session.as_ref(), &CandidateList::identity(), PROBE)
            .await
            .unwrap();
        // Fallback handles address the element by its scan ref.
        assert!(handle.selector.contains("data-scripted-ref"));
    }

    #[tokio::test]
    async fn fallback_is_deterministic_first_match() {
        let page = ScriptedPage::blank()
            .with_element(ScriptedElement::text_input(
                &["#first"],
                input_facts("user_one"),
            ))
            .with_element(ScriptedElement::text_input(
                &["#second"],
                input_facts("user_two"),
            ));
        let session = open(page).await;

        // Both qualify; DOM order decides, every time.
        for _ in 0..3 {
            let handle = locate(session.as_ref(), &CandidateList::identity(), PROBE)
                .await
                .unwrap();
            assert_eq!(handle.selector, r#"[data-scripted-ref="0"]"#);
        }
    }

    #[tokio::test]
    async fn missing_role_yields_field_not_found() {
        let page = ScriptedPage::blank().with_element(ScriptedElement::text_input(
            &["#username"],
            input_facts("username"),
        ));
        let session = open(page).await;

        let err = locate(session.as_ref(), &CandidateList::secret(), PROBE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::FieldNotFound(FieldRole::Secret)
        ));
    }

    #[tokio::test]
    async fn submit_scan_does_not_match_text_inputs() {
        // A text input mentioning "login" must not satisfy the submit role,
        // which scans a different element kind.
        let page = ScriptedPage::blank().with_element(ScriptedElement::text_input(
            &["#login-name"],
            input_facts("login"),
        ));
        let session = open(page).await;

        let err = locate(session.as_ref(), &CandidateList::submit(), PROBE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::FieldNotFound(FieldRole::Submit)
        ));
    }
}
