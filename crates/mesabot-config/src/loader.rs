// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading through Figment.
//!
//! Sources, weakest to strongest: compiled defaults, the system file,
//! the XDG user file, `./mesabot.toml`, and `MESABOT_*` environment
//! variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MesabotConfig;

/// TOML files consulted by [`load_config`], weakest first. Missing files
/// are skipped silently; [`crate::load_and_validate`] re-reads the same
/// list for error span resolution.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/mesabot/mesabot.toml")];
    if let Some(xdg) = dirs::config_dir() {
        paths.push(xdg.join("mesabot/mesabot.toml"));
    }
    paths.push(PathBuf::from("mesabot.toml"));
    paths
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<MesabotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MesabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MesabotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file plus env overrides,
/// skipping the hierarchy. Backs the `--config` CLI flag.
pub fn load_config_from_path(path: &Path) -> Result<MesabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MesabotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The pre-extraction Figment, exposed so diagnostics can inspect
/// provider metadata.
pub fn build_figment() -> Figment {
    let base = Figment::new().merge(Serialized::defaults(MesabotConfig::default()));
    search_paths()
        .into_iter()
        .fold(base, |figment, path| figment.merge(Toml::file(path)))
        .merge(env_provider())
}

/// Env provider with explicit section mapping.
///
/// `Env::split("_")` would be ambiguous for keys that themselves contain
/// underscores (`MESABOT_REDMINE_API_KEY` must become `redmine.api_key`,
/// not `redmine.api.key`), so the section prefix alone is rewritten.
fn env_provider() -> Env {
    const SECTIONS: &[&str] = &["agent", "transport", "redmine", "botpress", "storage"];
    Env::prefixed("MESABOT_").map(|key| {
        let name = key.as_str().to_ascii_lowercase();
        for section in SECTIONS {
            if let Some(rest) = name.strip_prefix(&format!("{section}_")) {
                return format!("{section}.{rest}").into();
            }
        }
        name.into()
    })
}
