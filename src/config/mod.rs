// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - TOML-backed data model (`model.rs`).
//! - Loading from disk with fallbacks (`loader.rs`).
//! - Validation of the raw model (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, SessionConfig};
pub use validate::validate_session_config;
