//! Browser binary discovery and install guidance.

use std::path::PathBuf;

/// Executable names searched on `$PATH`, in preference order. Anything
/// Chromium-based speaks CDP.
const EXECUTABLE_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "msedge",
    "microsoft-edge-stable",
    "brave-browser",
];

/// Well-known install locations checked before `$PATH` (which can contain
/// broken wrapper scripts).
fn well_known_paths() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
    }
}

/// Locate a Chromium-based browser binary.
///
/// Checks, in order: the configured path, the `CHROME` environment variable,
/// well-known install locations, then executable names on `$PATH`.
pub fn find_browser(configured: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = configured {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
        tracing::warn!(path, "configured browser path does not exist, falling back to detection");
    }

    if let Ok(path) = std::env::var("CHROME") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    for path in well_known_paths() {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }

    EXECUTABLE_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Platform-specific install instructions, shown when no browser is found.
pub fn install_hint() -> String {
    let how = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Debian/Ubuntu: sudo apt install chromium-browser\n  \
         Fedora:         sudo dnf install chromium\n  \
         Arch:           sudo pacman -S chromium"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n{how}\n\n\
         Or point [browser] chrome_path at a binary, or set the CHROME \
         environment variable."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_path_takes_precedence() {
        let dir = std::env::temp_dir();
        let fake = dir.join("sessmux-fake-browser");
        std::fs::write(&fake, "fake").unwrap();

        let found = find_browser(fake.to_str());
        assert_eq!(found.as_deref(), Some(fake.as_path()));

        std::fs::remove_file(&fake).unwrap();
    }

    #[test]
    fn bogus_configured_path_falls_through() {
        // Must not return the nonexistent path, whatever else it finds.
        let found = find_browser(Some("/nonexistent/sessmux/browser"));
        assert_ne!(
            found.as_deref().and_then(|p| p.to_str()),
            Some("/nonexistent/sessmux/browser")
        );
    }

    #[test]
    fn install_hint_mentions_a_package_manager() {
        let hint = install_hint();
        assert!(!hint.is_empty());
        assert!(
            hint.contains("brew") || hint.contains("winget") || hint.contains("apt"),
            "hint should carry a platform install command: {hint}"
        );
    }
}
