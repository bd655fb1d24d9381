//! Configuration loading, validation, and env substitution.
//!
//! Config files: `sessmux.toml`, `sessmux.yaml`, or `sessmux.json`
//! Searched in `./` then `~/.config/sessmux/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_or_default_config_path, load_config},
    schema::{AccountConfig, BrowserConfig, SessionConfig, SessmuxConfig, UpstreamConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
