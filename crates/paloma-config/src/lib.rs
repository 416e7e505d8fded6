// SPDX-FileCopyrightText: 2026 Paloma Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Paloma relay.
//!
//! Provides environment-first configuration (`PALOMA_*` variables layered
//! over an optional `paloma.toml` and compiled defaults) with strict
//! validation (`deny_unknown_fields`), required-key enforcement, and
//! diagnostic error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use paloma_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("relay name: {}", config.relay.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PalomaConfig;

/// Load configuration from all sources and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from `paloma.toml` + env vars via Figment
/// 2. On success: runs post-deserialization validation (required keys,
///    semantic constraints)
/// 3. On Figment error: converts to miette diagnostics with typo suggestions
///
/// Returns either a valid `PalomaConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<PalomaConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<PalomaConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
