// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite record store for the Mesabot helpdesk assistant.
//!
//! Persists the conversation transcript, the per-sender session mirror, and
//! collected service ratings in WAL-mode SQLite with embedded migrations.
//! All writes are serialized through `tokio-rusqlite`'s single background
//! thread; the router treats every write here as best-effort.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use models::*;
