// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender conversation state.
//!
//! The conversation is a small state machine with stable node names. Node
//! names are wire-visible: the persisted mirror stores them and the remote
//! dialogue engine reports them back through its session state variable, so
//! they must never change meaning across versions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::StatusFilter;

/// Problem category a sender can open a ticket about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Printer,
    Pc,
    IpPhone,
    Internet,
    Conferencing,
}

impl Category {
    /// All categories in menu order (digits 1 through 5).
    pub const ALL: [Category; 5] = [
        Category::Printer,
        Category::Pc,
        Category::IpPhone,
        Category::Internet,
        Category::Conferencing,
    ];

    /// Canonical intent forwarded to the dialogue engine when this
    /// category is chosen; the engine replies with the problem menu.
    pub fn canonical_intent(&self) -> &'static str {
        match self {
            Category::Printer => "impresora",
            Category::Pc => "problema pc",
            Category::IpPhone => "problema teléfono ip",
            Category::Internet => "problema internet",
            Category::Conferencing => "problema audiencia",
        }
    }

    fn node_suffix(&self) -> &'static str {
        match self {
            Category::Printer => "impresora",
            Category::Pc => "pc",
            Category::IpPhone => "telefonoip",
            Category::Internet => "internet",
            Category::Conferencing => "audiencia",
        }
    }
}

/// A node in the conversation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvState {
    /// Main menu; also the state every reset returns to.
    Greeting,
    /// Category menu shown, waiting for a digit.
    AwaitingCategory,
    /// Problem menu for one category shown.
    Subcategory(Category),
    /// Draft summary shown, waiting for confirmation.
    ConfirmSend,
    /// Waiting for a ticket id to query.
    AwaitingQueryId,
    /// Waiting for a ticket id to cancel.
    AwaitingCancelId,
    /// Rating menu shown; digits 1-4 are captured locally.
    AwaitingRating,
    /// Status menu for the ticket listing shown.
    ListingMenu,
    /// Browsing a filtered ticket listing.
    Paginating,
    /// Help menu shown.
    Help,
}

impl ConvState {
    /// Stable node name, as stored in the mirror and reported by the
    /// remote engine.
    pub fn node_name(&self) -> String {
        match self {
            ConvState::Greeting => "nodo_saludo".to_string(),
            ConvState::AwaitingCategory => "esperando_categoria".to_string(),
            ConvState::Subcategory(cat) => format!("subcat_{}", cat.node_suffix()),
            ConvState::ConfirmSend => "nodo_confirmar_envio".to_string(),
            ConvState::AwaitingQueryId => "esperando_id_consulta".to_string(),
            ConvState::AwaitingCancelId => "esperando_id_cancelar".to_string(),
            ConvState::AwaitingRating => "esperando_calificacion".to_string(),
            ConvState::ListingMenu => "mostrando_tickets".to_string(),
            ConvState::Paginating => "paginando_tickets".to_string(),
            ConvState::Help => "nodo_ayuda".to_string(),
        }
    }

    /// Parse a stable node name. Unknown names return `None`; callers
    /// reconciling remote state fail closed on them.
    pub fn from_node_name(name: &str) -> Option<ConvState> {
        let state = match name {
            "nodo_saludo" => ConvState::Greeting,
            "esperando_categoria" => ConvState::AwaitingCategory,
            "subcat_impresora" => ConvState::Subcategory(Category::Printer),
            "subcat_pc" => ConvState::Subcategory(Category::Pc),
            "subcat_telefonoip" => ConvState::Subcategory(Category::IpPhone),
            "subcat_internet" => ConvState::Subcategory(Category::Internet),
            "subcat_audiencia" => ConvState::Subcategory(Category::Conferencing),
            "nodo_confirmar_envio" => ConvState::ConfirmSend,
            "esperando_id_consulta" => ConvState::AwaitingQueryId,
            "esperando_id_cancelar" => ConvState::AwaitingCancelId,
            "esperando_calificacion" => ConvState::AwaitingRating,
            "mostrando_tickets" => ConvState::ListingMenu,
            "paginando_tickets" => ConvState::Paginating,
            "nodo_ayuda" => ConvState::Help,
            _ => return None,
        };
        Some(state)
    }
}

impl fmt::Display for ConvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_name())
    }
}

/// Free-form context carried alongside the state node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvContext {
    /// First segment of the last reply sent to this sender. Confirmation
    /// parsing and two router rules key off it.
    pub last_bot_message: Option<String>,
    /// Ticket a pending operation refers to (cancel target, rating target).
    pub ticket_id: Option<u64>,
    /// Category name captured during ticket creation.
    pub category: Option<String>,
    /// Backend contact id resolved for the listing flow.
    pub contact_id: Option<u64>,
    /// Status filter chosen in the listing menu.
    pub status_filter: Option<StatusFilter>,
    /// The greeting was delivered at least once. Survives resets.
    pub greeting_sent: bool,
    /// A greeting call is in flight; concurrent messages are dropped.
    pub greeting_in_progress: bool,
}

/// One sender's conversation: state node, context, completion flag, and
/// the current listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub state: ConvState,
    pub context: ConvContext,
    /// Set when the conversation ended (farewell or terminal error). The
    /// next inbound message triggers a full reset before any processing.
    pub finished: bool,
    /// Listing page, always >= 1.
    pub current_page: u32,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            state: ConvState::Greeting,
            context: ConvContext::default(),
            finished: false,
            current_page: 1,
        }
    }

    /// Full reset: back to the greeting node with a cleared context.
    /// The greeting-sent flag survives so a reset sender is not greeted
    /// again.
    pub fn reset(&mut self) {
        let greeting_sent = self.context.greeting_sent;
        self.state = ConvState::Greeting;
        self.context = ConvContext {
            greeting_sent,
            ..ConvContext::default()
        };
        self.finished = false;
        self.current_page = 1;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.saturating_add(1);
    }

    /// Decrement the page, clamping at 1.
    pub fn prev_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
