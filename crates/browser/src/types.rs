//! Element roles, handles, scan facts, and driver configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The role a located element plays in the sign-in form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Email/username entry.
    Identity,
    /// Password entry.
    Secret,
    /// The control that submits the form.
    Submit,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity field"),
            Self::Secret => write!(f, "secret field"),
            Self::Submit => write!(f, "submit control"),
        }
    }
}

/// Generic element kind scanned by the locator fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Text-entry inputs (excludes hidden/submit/checkbox and similar).
    TextInput,
    /// Buttons and `input[type="submit"]`.
    SubmitControl,
}

/// An addressable element on the current page.
///
/// The handle is a CSS selector that resolves to exactly the element it was
/// created for: either the candidate selector that matched, or a
/// `data-sessmux-ref` selector assigned during a fallback scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
}

impl ElementHandle {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

/// Attribute and text facts about a scanned element, used for keyword
/// fallback matching.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementFacts {
    #[serde(default)]
    pub tag: String,
    #[serde(default, rename = "type")]
    pub type_attr: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ElementFacts {
    /// Lowercased concatenation of every attribute and the text content.
    pub fn haystack(&self) -> String {
        let mut hay = String::new();
        for part in [
            Some(self.tag.as_str()),
            self.type_attr.as_deref(),
            self.name.as_deref(),
            self.id.as_deref(),
            self.placeholder.as_deref(),
            self.aria_label.as_deref(),
            self.text.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            hay.push_str(&part.to_lowercase());
            hay.push(' ');
        }
        hay
    }

    /// Whether any keyword appears in the element's attributes or text.
    /// Keywords are expected lowercase.
    pub fn matches_any(&self, keywords: &[&str]) -> bool {
        let hay = self.haystack();
        keywords.iter().any(|kw| hay.contains(kw))
    }
}

/// An element found by a fallback scan, in DOM order.
#[derive(Debug, Clone)]
pub struct ScannedElement {
    pub handle: ElementHandle,
    pub facts: ElementFacts,
}

/// A `(name, value)` cookie pair, in acquisition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Browser driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
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
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_agent: None,
            chrome_args: Vec::new(),
            navigation_timeout_ms: 30_000,
        }
    }
}

impl From<&sessmux_config::BrowserConfig> for DriverConfig {
    fn from(cfg: &sessmux_config::BrowserConfig) -> Self {
        Self {
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            user_agent: cfg.user_agent.clone(),
            chrome_args: cfg.chrome_args.clone(),
            navigation_timeout_ms: cfg.navigation_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(name: Option<&str>, placeholder: Option<&str>) -> ElementFacts {
        ElementFacts {
            tag: "input".into(),
            name: name.map(String::from),
            placeholder: placeholder.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn haystack_matches_case_insensitively() {
        let f = facts(None, Some("Your Email Address"));
        assert!(f.matches_any(&["email"]));
        assert!(!f.matches_any(&["password"]));
    }

    #[test]
    fn matches_across_attributes() {
        let f = facts(Some("user_login"), None);
        assert!(f.matches_any(&["user"]));
        assert!(f.matches_any(&["login"]));
    }

    #[test]
    fn cookie_pair_construction() {
        let c = Cookie::new("session", "abc");
        assert_eq!(c.name, "session");
        assert_eq!(c.value, "abc");
    }
}
