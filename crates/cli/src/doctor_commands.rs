//! `sessmux doctor` — config validation and environment audit.
//!
//! Prints a structured report with `[ok]`, `[warn]`, `[fail]`, or `[info]`
//! status indicators per item, then fails if any check found an error.

use std::path::Path;

use {
    sessmux_browser::detect,
    sessmux_config::{Severity, SessmuxConfig, validate},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct Section {
    title: &'static str,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn print(&self) {
        println!("{BOLD}{}{RESET}", self.title);
        for (status, message) in &self.items {
            println!(
                "  [{}{}{}] {}",
                status.color(),
                status.label(),
                RESET,
                message
            );
        }
        println!();
    }

    fn has_failure(&self) -> bool {
        self.items.iter().any(|(s, _)| *s == Status::Fail)
    }
}

pub fn run(config: &SessmuxConfig, config_path: &Path) -> anyhow::Result<()> {
    println!("{BOLD}sessmux doctor{RESET}\n");

    let mut configuration = Section::new("Configuration");
    if config_path.exists() {
        configuration.push(Status::Info, format!("config file: {}", config_path.display()));
    } else {
        configuration.push(
            Status::Warn,
            format!("no config file at {}, using defaults", config_path.display()),
        );
    }
    let report = validate(config);
    if report.diagnostics.is_empty() {
        configuration.push(Status::Ok, "no problems found");
    }
    for d in &report.diagnostics {
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        configuration.push(status, format!("{}: {}", d.path, d.message));
    }
    configuration.print();

    let mut upstream = Section::new("Upstream");
    if config.upstream.sign_in_url.is_empty() {
        upstream.push(Status::Fail, "sign-in URL: (not set)");
    } else {
        upstream.push(
            Status::Ok,
            format!("sign-in URL: {}", config.upstream.sign_in_url),
        );
    }
    upstream.push(
        Status::Info,
        format!(
            "rejection markers: {}",
            config.upstream.sign_in_markers.join(", ")
        ),
    );
    upstream.print();

    let mut browser = Section::new("Browser");
    match detect::find_browser(config.browser.chrome_path.as_deref()) {
        Some(path) => browser.push(Status::Ok, format!("browser binary: {}", path.display())),
        None => browser.push(Status::Fail, detect::install_hint()),
    }
    browser.push(
        Status::Info,
        format!(
            "headless: {}, navigation timeout: {}ms",
            config.browser.headless, config.browser.navigation_timeout_ms
        ),
    );
    browser.print();

    if report.has_errors()
        || configuration.has_failure()
        || upstream.has_failure()
        || browser.has_failure()
    {
        anyhow::bail!("doctor found problems that will prevent acquisition");
    }
    println!("{GREEN}All checks passed.{RESET}");
    Ok(())
}
