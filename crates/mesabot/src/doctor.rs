// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mesabot doctor` command implementation.
//!
//! Diagnoses the local environment: configuration, the record database,
//! and reachability of the Redmine and Botpress collaborators. `--deep`
//! adds slower checks (SQLite integrity, record counts, memory).

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use colored::Colorize;

use mesabot_botpress::BotpressDialogue;
use mesabot_config::model::MesabotConfig;
use mesabot_core::{HealthStatus, MesabotError, PluginAdapter};
use mesabot_redmine::RedmineHelpdesk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    fn tag(self, use_color: bool) -> String {
        match (self, use_color) {
            (CheckStatus::Pass, true) => "✓".green().to_string(),
            (CheckStatus::Warn, true) => "!".yellow().to_string(),
            (CheckStatus::Fail, true) => "✗".red().to_string(),
            (CheckStatus::Pass, false) => "[OK]  ".to_string(),
            (CheckStatus::Warn, false) => "[WARN]".to_string(),
            (CheckStatus::Fail, false) => "[FAIL]".to_string(),
        }
    }
}

/// Outcome of one diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn pass(name: &'static str, message: impl Into<String>, start: Instant) -> Self {
        Self::finish(name, CheckStatus::Pass, message, start)
    }

    fn warn(name: &'static str, message: impl Into<String>, start: Instant) -> Self {
        Self::finish(name, CheckStatus::Warn, message, start)
    }

    fn fail(name: &'static str, message: impl Into<String>, start: Instant) -> Self {
        Self::finish(name, CheckStatus::Fail, message, start)
    }

    fn finish(
        name: &'static str,
        status: CheckStatus,
        message: impl Into<String>,
        start: Instant,
    ) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `mesabot doctor` command.
pub async fn run_doctor(
    config: &MesabotConfig,
    deep: bool,
    plain: bool,
) -> Result<(), MesabotError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let mut results = vec![
        check_config().await,
        check_database(&config.storage.database_path).await,
        check_redmine(config).await,
        check_botpress(config).await,
    ];
    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_record_counts(&config.storage.database_path).await);
        results.push(check_memory_baseline().await);
    }

    report(&results, deep, use_color);
    Ok(())
}

fn report(results: &[CheckResult], deep: bool, use_color: bool) {
    println!();
    println!("  mesabot doctor");
    println!("  {}", "-".repeat(50));

    for result in results {
        let tag = result.status.tag(use_color);
        let ms = result.duration.as_millis();
        let message = match (result.status, use_color) {
            (CheckStatus::Warn, true) => result.message.yellow().to_string(),
            (CheckStatus::Fail, true) => result.message.red().to_string(),
            _ => result.message.clone(),
        };
        println!("    {tag} {:<20} {message} ({ms}ms)", result.name);
    }

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    }
    println!();
}

async fn check_config() -> CheckResult {
    let start = Instant::now();
    match mesabot_config::load_and_validate() {
        Ok(_) => CheckResult::pass("Configuration", "valid", start),
        Err(errors) => {
            CheckResult::fail("Configuration", format!("{} error(s)", errors.len()), start)
        }
    }
}

/// The database file must open and answer a trivial query. A missing
/// file is only a warning: first run creates it.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::warn(
            "Database",
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => return CheckResult::fail("Database", format!("open failed: {e}"), start),
    };
    let probed: Result<(), tokio_rusqlite::Error> = conn
        .call(|conn| {
            conn.execute_batch("SELECT 1")?;
            Ok(())
        })
        .await;
    match probed {
        Ok(()) => CheckResult::pass("Database", "connected", start),
        Err(e) => CheckResult::fail("Database", format!("query failed: {e}"), start),
    }
}

async fn check_redmine(config: &MesabotConfig) -> CheckResult {
    let start = Instant::now();
    if config.redmine.url.is_none() {
        return CheckResult::warn("Redmine", "not configured (redmine.url unset)", start);
    }
    match RedmineHelpdesk::new(config) {
        Ok(adapter) => health_result("Redmine", adapter.health_check().await, start),
        Err(e) => CheckResult::fail("Redmine", format!("init failed: {e}"), start),
    }
}

async fn check_botpress(config: &MesabotConfig) -> CheckResult {
    let start = Instant::now();
    if config.botpress.url.is_none() {
        return CheckResult::warn("Botpress", "not configured (botpress.url unset)", start);
    }
    match BotpressDialogue::new(config) {
        Ok(adapter) => health_result("Botpress", adapter.health_check().await, start),
        Err(e) => CheckResult::fail("Botpress", format!("init failed: {e}"), start),
    }
}

fn health_result(
    name: &'static str,
    health: Result<HealthStatus, MesabotError>,
    start: Instant,
) -> CheckResult {
    match health {
        Ok(HealthStatus::Healthy) => CheckResult::pass(name, "reachable", start),
        Ok(HealthStatus::Degraded(msg)) => CheckResult::warn(name, msg, start),
        Ok(HealthStatus::Unhealthy(msg)) => CheckResult::fail(name, msg, start),
        Err(e) => CheckResult::fail(name, format!("health check failed: {e}"), start),
    }
}

/// Deep check: `PRAGMA integrity_check` must come back as the single
/// row "ok".
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::warn("DB integrity", "database not found (skipped)", start);
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => return CheckResult::fail("DB integrity", format!("open failed: {e}"), start),
    };
    let rows: Result<Vec<String>, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .filter_map(|r| r.ok())
                .collect();
            Ok(rows)
        })
        .await;
    match rows {
        Ok(rows) if rows == ["ok"] => CheckResult::pass("DB integrity", "ok", start),
        Ok(rows) => CheckResult::fail("DB integrity", format!("{} issue(s) found", rows.len()), start),
        Err(e) => CheckResult::fail("DB integrity", format!("check failed: {e}"), start),
    }
}

/// Deep check: row counts of the record tables.
///
/// Raw SQL on purpose: going through the storage adapter would create
/// the file and run pending migrations as a side effect.
async fn check_record_counts(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::warn("Record counts", "database not found (skipped)", start);
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => return CheckResult::fail("Record counts", format!("open failed: {e}"), start),
    };
    let counts: Result<Vec<(&str, i64)>, tokio_rusqlite::Error> = conn
        .call(|conn| {
            let mut counts = Vec::new();
            for table in ["contacts", "messages", "sessions", "ticket_ratings"] {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                counts.push((table, n));
            }
            Ok(counts)
        })
        .await;
    match counts {
        Ok(counts) => {
            let summary = counts
                .iter()
                .map(|(table, n)| format!("{n} {table}"))
                .collect::<Vec<_>>()
                .join(", ");
            CheckResult::pass("Record counts", summary, start)
        }
        Err(e) => CheckResult::fail("Record counts", format!("query failed: {e}"), start),
    }
}

/// Deep check: jemalloc heap/resident baseline.
async fn check_memory_baseline() -> CheckResult {
    let start = Instant::now();

    #[cfg(not(target_env = "msvc"))]
    {
        let _ = tikv_jemalloc_ctl::epoch::advance();
        let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
        let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
        CheckResult::pass(
            "Memory baseline",
            format!(
                "heap: {:.1} MB, resident: {:.1} MB",
                allocated as f64 / (1024.0 * 1024.0),
                resident as f64 / (1024.0 * 1024.0),
            ),
            start,
        )
    }

    #[cfg(target_env = "msvc")]
    {
        CheckResult::warn("Memory baseline", "jemalloc not available on MSVC", start)
    }
}
