// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mesabot helpdesk assistant.

use thiserror::Error;

/// The primary error type used across all Mesabot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MesabotError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Record store errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (connection failure, send failure, presence failure).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Ticketing backend errors (API failure, malformed response, auth rejection).
    #[error("helpdesk error: {message}")]
    Helpdesk {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote dialogue engine errors. Client implementations degrade these to
    /// an apologetic reply segment; the variant exists for connect-time and
    /// health-check paths that must surface them.
    #[error("dialogue error: {message}")]
    Dialogue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
