// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Mesabot workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a seam.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Transport,
    Helpdesk,
    Dialogue,
    Storage,
}

/// An inbound message received from the chat transport.
///
/// `sender_id` is the sender's phone-number-shaped identifier; one
/// conversation exists per sender. Messages authored by the assistant
/// itself arrive with `from_self` set and are ignored by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub sender_id: String,
    pub body: String,
    pub from_self: bool,
    /// RFC 3339 timestamp assigned by the transport.
    pub timestamp: String,
}

/// Presence state shown to the remote party while a reply is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Presence {
    Composing,
    Paused,
}

/// Direction of a message in the stored conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Status filter a sender can choose when listing their tickets.
///
/// The ticketing backend is inconsistent about status naming, so each
/// filter matches a small synonym set rather than one exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    New,
    InProgress,
}

impl StatusFilter {
    /// Status name sent to the backend query.
    pub fn query_name(&self) -> &'static str {
        match self {
            StatusFilter::New => "Nueva",
            StatusFilter::InProgress => "En curso",
        }
    }

    /// Label shown to the sender in listing headers.
    pub fn display_label(&self) -> &'static str {
        match self {
            StatusFilter::New => "Nuevo",
            StatusFilter::InProgress => "En curso",
        }
    }

    /// Whether a backend status name belongs to this filter's synonym set.
    pub fn matches_status(&self, status_name: &str) -> bool {
        let name = status_name.trim().to_lowercase();
        match self {
            StatusFilter::New => name == "nueva" || name == "nuevo",
            StatusFilter::InProgress => name == "en curso" || name == "en proceso",
        }
    }
}

/// A ticket as seen by the conversation core.
///
/// `contact_phone` carries the ticket's contact-phone custom field, already
/// extracted by the backend client, so listing can be filtered per sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub subject: String,
    pub status: String,
    pub priority: Option<String>,
    pub assigned_to: Option<String>,
    pub author: Option<String>,
    pub created_on: Option<String>,
    pub last_note: Option<String>,
    pub contact_phone: Option<String>,
}

/// Fields needed to create a ticket. Backend-specific identifiers
/// (project, tracker, status, priority, custom field ids) live in the
/// ticketing client's configuration, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    /// Sender's phone, digits only.
    pub phone_digits: String,
    pub employee: Option<String>,
    pub office: Option<String>,
    pub assigned_to: Option<u64>,
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
    NotFound,
}

/// One page of issues returned by the ticketing backend, before the
/// per-sender client-side filter is applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IssuePage {
    pub issues: Vec<Ticket>,
    pub total_count: u64,
}

/// A contact record from the ticketing backend's address book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub name: String,
    pub office: Option<String>,
    pub phones: Vec<String>,
}

/// A member of the support role, eligible for random assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: u64,
    pub name: String,
}

/// Reply from the remote dialogue engine: ordered text segments plus the
/// session variables the engine reports for state reconciliation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialogueReply {
    pub segments: Vec<String>,
    pub state: Option<String>,
    pub category: Option<String>,
}

/// Persisted snapshot of a conversation, written best-effort after each
/// handled message and read once per sender for crash recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMirror {
    pub node: String,
    pub last_input: Option<String>,
    pub last_bot_message: Option<String>,
    /// RFC 3339 timestamp of the last handled message.
    pub last_interaction: String,
}

/// Reduce a phone-number-shaped string to its digits.
///
/// Contact matching and the phone custom field both compare digits only,
/// so formatting differences ("+54 9 11..." vs "54911...") never matter.
pub fn normalize_digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_digits_strips_formatting() {
        assert_eq!(normalize_digits("+54 9 11-2345-6789"), "5491123456789");
        assert_eq!(normalize_digits("whatsapp:+1 (555) 000"), "1555000");
        assert_eq!(normalize_digits(""), "");
    }

    #[test]
    fn status_filter_synonyms() {
        assert!(StatusFilter::New.matches_status("Nueva"));
        assert!(StatusFilter::New.matches_status("nuevo"));
        assert!(!StatusFilter::New.matches_status("En curso"));
        assert!(StatusFilter::InProgress.matches_status("En curso"));
        assert!(StatusFilter::InProgress.matches_status("en proceso"));
        assert!(!StatusFilter::InProgress.matches_status("Rechazada"));
    }

    #[test]
    fn direction_round_trips_through_display() {
        use std::str::FromStr;
        for d in [Direction::Incoming, Direction::Outgoing] {
            let s = d.to_string();
            assert_eq!(Direction::from_str(&s).unwrap(), d);
        }
    }
}
