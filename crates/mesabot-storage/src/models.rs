// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! The types crossing adapter trait boundaries live in `mesabot-core::types`
//! and are re-exported here. The structs below are storage-only rows read
//! back by the doctor command and by tests.

pub use mesabot_core::types::{Direction, SessionMirror};

/// One row of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub phone: String,
    /// "incoming" or "outgoing", as persisted.
    pub direction: String,
    pub body: String,
    pub created_at: String,
}

/// One recorded service rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingRecord {
    pub id: i64,
    pub phone: String,
    /// Absent for ratings collected at the end of a listing session.
    pub ticket_id: Option<i64>,
    pub score: u8,
    pub label: String,
    pub created_at: String,
}

/// Row counts reported by the doctor command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub contacts: i64,
    pub messages: i64,
    pub sessions: i64,
    pub ratings: i64,
}
