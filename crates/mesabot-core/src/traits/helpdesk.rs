// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticketing backend trait.

use async_trait::async_trait;

use crate::error::MesabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CancelOutcome, Contact, IssuePage, StatusFilter, Technician, Ticket, TicketDraft};

/// Adapter for the ticketing backend (Redmine-style REST API).
///
/// Lookup operations return `None`/empty on not-found; only network-level
/// or protocol-level failures are errors. The flow engine relies on that
/// distinction to render specific replies instead of the generic apology.
#[async_trait]
pub trait HelpdeskAdapter: PluginAdapter {
    /// Fetches one ticket with its latest note, if it exists.
    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>, MesabotError>;

    /// Creates a ticket and returns it as stored by the backend.
    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, MesabotError>;

    /// Cancels a ticket, detecting tickets that were already cancelled.
    async fn cancel_ticket(&self, id: u64) -> Result<CancelOutcome, MesabotError>;

    /// Lists one page of the configured project's issues, newest update
    /// first. Status and contact filters are passed to the backend query,
    /// but the backend does not reliably honor them, so callers re-filter
    /// the returned page.
    async fn list_issues(
        &self,
        status: StatusFilter,
        contact_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<IssuePage, MesabotError>;

    /// Finds the contact whose phone matches the given number,
    /// digits-only comparison.
    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, MesabotError>;

    /// Members of the configured support role, eligible for assignment.
    async fn support_technicians(&self) -> Result<Vec<Technician>, MesabotError>;

    /// Phone number of one technician, when the backend knows it.
    async fn technician_phone(&self, technician_id: u64) -> Result<Option<String>, MesabotError>;

    /// Appends a private note to a ticket (used for rating records).
    async fn add_rating_note(&self, ticket_id: u64, note: &str) -> Result<(), MesabotError>;
}
