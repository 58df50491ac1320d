// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks applied after deserialization.
//!
//! Serde attributes catch shape problems; this module catches values that
//! parse fine but make no sense at runtime, such as inverted typing bounds,
//! URLs without a scheme, or zeroed backend ids.

use crate::diagnostic::ConfigError;
use crate::model::MesabotConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

struct Checker {
    errors: Vec<ConfigError>,
}

impl Checker {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn require(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.errors.push(ConfigError::Validation {
                message: message.into(),
            });
        }
    }

    fn finish(self) -> Result<(), Vec<ConfigError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Check a deserialized configuration for semantic problems.
///
/// Collects every violation rather than stopping at the first, so the
/// operator sees the whole list in one run.
pub fn validate_config(config: &MesabotConfig) -> Result<(), Vec<ConfigError>> {
    let mut check = Checker::new();

    check.require(
        LOG_LEVELS.contains(&config.agent.log_level.as_str()),
        format!(
            "agent.log_level `{}` is not one of: {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ),
    );

    let transport = &config.transport;
    check.require(
        transport.typing_max_ms > 0,
        "transport.typing_max_ms must be greater than zero",
    );
    check.require(
        transport.typing_min_ms <= transport.typing_max_ms,
        format!(
            "transport.typing_min_ms ({}) must not exceed transport.typing_max_ms ({})",
            transport.typing_min_ms, transport.typing_max_ms
        ),
    );

    for (key, url) in [
        ("redmine.url", &config.redmine.url),
        ("botpress.url", &config.botpress.url),
    ] {
        if let Some(url) = url {
            check.require(
                has_http_scheme(url),
                format!("{key} `{url}` must start with http:// or https://"),
            );
        }
    }

    check.require(
        config.redmine.page_size > 0,
        "redmine.page_size must be at least 1",
    );

    // The ids mirror the helpdesk's administrative setup; a zero means the
    // operator forgot to fill one in.
    for (key, value) in [
        ("redmine.project_id", config.redmine.project_id),
        ("redmine.tracker_id", config.redmine.tracker_id),
        ("redmine.new_status_id", config.redmine.new_status_id),
        ("redmine.rejected_status_id", config.redmine.rejected_status_id),
        ("redmine.priority_id", config.redmine.priority_id),
        ("redmine.support_role_id", config.redmine.support_role_id),
        ("redmine.employee_field_id", config.redmine.employee_field_id),
        ("redmine.office_field_id", config.redmine.office_field_id),
        ("redmine.phone_field_id", config.redmine.phone_field_id),
    ] {
        check.require(value > 0, format!("{key} must be non-zero"));
    }

    check.require(
        !config.botpress.bot_id.trim().is_empty(),
        "botpress.bot_id must not be empty",
    );
    check.require(
        !config.storage.database_path.trim().is_empty(),
        "storage.database_path must not be empty",
    );

    check.finish()
}
