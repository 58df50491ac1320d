// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Mesabot helpdesk assistant.
//!
//! TOML with `deny_unknown_fields` models, a file hierarchy merged under
//! `MESABOT_*` env overrides, a non-fail-fast semantic validation pass,
//! and miette-rendered diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = match mesabot_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         mesabot_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("assistant: {}", config.agent.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MesabotConfig;

/// Load from the standard hierarchy, then validate.
///
/// Deserialization failures come back as diagnostics with source spans;
/// a config that deserializes still has to pass
/// [`validation::validate_config`], which collects every semantic
/// problem rather than stopping at the first.
pub fn load_and_validate() -> Result<MesabotConfig, Vec<ConfigError>> {
    finish(loader::load_config(), read_search_sources)
}

/// Load from a TOML string, then validate. Test and tooling entry point.
pub fn load_and_validate_str(toml_content: &str) -> Result<MesabotConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<MesabotConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<MesabotConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Re-read whichever hierarchy files exist so diagnostics can point into
/// them. The local path is absolutized to match figment's metadata.
fn read_search_sources() -> Vec<(String, String)> {
    loader::search_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let name = if path.is_relative() {
                std::env::current_dir()
                    .map(|dir| dir.join(&path).display().to_string())
                    .unwrap_or_else(|_| path.display().to_string())
            } else {
                path.display().to_string()
            };
            Some((name, content))
        })
        .collect()
}
