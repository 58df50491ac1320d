// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mesabot helpdesk assistant.
//!
//! Every section carries `#[serde(deny_unknown_fields)]` so a typoed key
//! fails at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Mesabot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values; the
/// backend ids default to the production helpdesk's layout.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MesabotConfig {
    /// Assistant identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat transport behavior settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Ticketing backend (Redmine) settings.
    #[serde(default)]
    pub redmine: RedmineConfig,

    /// Dialogue engine (Botpress) settings.
    #[serde(default)]
    pub botpress: BotpressConfig,

    /// Local storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Assistant identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Log level filter: trace, debug, info, warn, or error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "mesabot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat transport behavior configuration.
///
/// The typing simulation delays each reply proportionally to its length,
/// clamped between the configured bounds, so replies read as typed rather
/// than machine-instant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Lower bound of the simulated typing delay, in milliseconds.
    #[serde(default = "default_typing_min_ms")]
    pub typing_min_ms: u64,

    /// Upper bound of the simulated typing delay, in milliseconds.
    #[serde(default = "default_typing_max_ms")]
    pub typing_max_ms: u64,

    /// Per-character contribution to the typing delay, in milliseconds.
    #[serde(default = "default_typing_per_char_ms")]
    pub typing_per_char_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            typing_min_ms: default_typing_min_ms(),
            typing_max_ms: default_typing_max_ms(),
            typing_per_char_ms: default_typing_per_char_ms(),
        }
    }
}

fn default_typing_min_ms() -> u64 {
    1000
}

fn default_typing_max_ms() -> u64 {
    3000
}

fn default_typing_per_char_ms() -> u64 {
    50
}

/// Ticketing backend (Redmine) configuration.
///
/// The numeric ids identify the project, tracker, statuses, priority, role
/// and custom fields the assistant works with; they mirror the helpdesk's
/// administrative setup and rarely change.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RedmineConfig {
    /// Base URL of the Redmine instance. `None` disables the helpdesk.
    #[serde(default)]
    pub url: Option<String>,

    /// Redmine API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Project identifier used in listing and membership URLs.
    #[serde(default = "default_project_identifier")]
    pub project_identifier: String,

    /// Numeric project id used when creating issues.
    #[serde(default = "default_project_id")]
    pub project_id: u64,

    /// Tracker id for created tickets.
    #[serde(default = "default_tracker_id")]
    pub tracker_id: u64,

    /// Status id assigned to freshly created tickets.
    #[serde(default = "default_new_status_id")]
    pub new_status_id: u64,

    /// Status id that marks a ticket as rejected/cancelled.
    #[serde(default = "default_rejected_status_id")]
    pub rejected_status_id: u64,

    /// Priority id for created tickets.
    #[serde(default = "default_priority_id")]
    pub priority_id: u64,

    /// Role id whose project members form the technician roster.
    #[serde(default = "default_support_role_id")]
    pub support_role_id: u64,

    /// Custom field id holding the employee name.
    #[serde(default = "default_employee_field_id")]
    pub employee_field_id: u64,

    /// Custom field id holding the office.
    #[serde(default = "default_office_field_id")]
    pub office_field_id: u64,

    /// Custom field id holding the reporter's phone digits.
    #[serde(default = "default_phone_field_id")]
    pub phone_field_id: u64,

    /// Issues fetched per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for RedmineConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            project_identifier: default_project_identifier(),
            project_id: default_project_id(),
            tracker_id: default_tracker_id(),
            new_status_id: default_new_status_id(),
            rejected_status_id: default_rejected_status_id(),
            priority_id: default_priority_id(),
            support_role_id: default_support_role_id(),
            employee_field_id: default_employee_field_id(),
            office_field_id: default_office_field_id(),
            phone_field_id: default_phone_field_id(),
            page_size: default_page_size(),
        }
    }
}

fn default_project_identifier() -> String {
    "soporte-tecnico-mpf".to_string()
}

fn default_project_id() -> u64 {
    33
}

fn default_tracker_id() -> u64 {
    26
}

fn default_new_status_id() -> u64 {
    1
}

fn default_rejected_status_id() -> u64 {
    6
}

fn default_priority_id() -> u64 {
    2
}

fn default_support_role_id() -> u64 {
    5
}

fn default_employee_field_id() -> u64 {
    4
}

fn default_office_field_id() -> u64 {
    7
}

fn default_phone_field_id() -> u64 {
    30
}

fn default_page_size() -> u64 {
    5
}

/// Dialogue engine (Botpress) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotpressConfig {
    /// Base URL of the Botpress server. `None` disables the engine.
    #[serde(default)]
    pub url: Option<String>,

    /// Bot id in the converse endpoint path.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,
}

impl Default for BotpressConfig {
    fn default() -> Self {
        Self {
            url: None,
            bot_id: default_bot_id(),
        }
    }
}

fn default_bot_id() -> String {
    "mesabot".to_string()
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Filesystem path of the SQLite database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Open the database in write-ahead-logging mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mesabot").join("mesabot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("mesabot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}
