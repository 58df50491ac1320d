// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical intents produced by the intent mapper.
//!
//! The `Display` form of an intent is its canonical wire string. That
//! string is what the remote dialogue engine receives when the router
//! forwards a message, so the renderings here are part of the wire
//! contract with the engine's flow definitions.

use std::fmt;

/// A canonical intent. Structured variants drive the local ticket flow;
/// everything the flow does not own is forwarded as its wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start ticket creation (greeting option 1).
    Generate,
    /// Ask for a ticket id to query (greeting option 2).
    Query,
    /// Ask for a ticket id to cancel (greeting option 3).
    Cancel,
    /// Show the listing status menu (greeting option 4).
    ListAll,
    /// Show the help menu (greeting option 5).
    Help,
    /// Query one ticket by id.
    QueryTicket(u64),
    /// Cancel one ticket by id.
    CancelTicket(u64),
    /// Confirm ticket creation.
    Confirm,
    /// Abandon the draft at the confirmation prompt.
    Abort,
    /// A valid rating digit.
    Rating(u8),
    /// Anything else while a rating was expected.
    InvalidRating,
    /// Listing filter: new tickets.
    StatusNew,
    /// Listing filter: tickets in progress.
    StatusInProgress,
    /// Next listing page.
    Next,
    /// Previous listing page.
    Previous,
    /// Leave the listing.
    Exit,
    /// Back to the main menu.
    BackToMenu,
    /// Back to the category menu.
    BackToCategory,
    /// Unmatched text, forwarded verbatim.
    Free(String),
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Generate => f.write_str("generar"),
            Intent::Query => f.write_str("consultar"),
            Intent::Cancel => f.write_str("rechazar ticket"),
            Intent::ListAll => f.write_str("ver_todos"),
            Intent::Help => f.write_str("ayuda"),
            Intent::QueryTicket(id) => write!(f, "consultar_{id}"),
            Intent::CancelTicket(id) => write!(f, "cancelar_{id}"),
            Intent::Confirm => f.write_str("si"),
            Intent::Abort => f.write_str("cancelar"),
            Intent::Rating(n) => write!(f, "{n}"),
            Intent::InvalidRating => f.write_str("calificacion_invalida"),
            Intent::StatusNew => f.write_str("nuevo"),
            Intent::StatusInProgress => f.write_str("en_proceso"),
            Intent::Next => f.write_str("siguiente"),
            Intent::Previous => f.write_str("anterior"),
            Intent::Exit => f.write_str("salir"),
            Intent::BackToMenu => f.write_str("volver al menú principal"),
            Intent::BackToCategory => f.write_str("volver a categoría"),
            Intent::Free(text) => f.write_str(text),
        }
    }
}
