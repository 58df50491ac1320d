// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket listing with status filter and pagination.
//!
//! The backend query carries status, contact and paging parameters, but
//! the backend does not reliably honor the filters, so every fetched page
//! is re-filtered here: status through the synonym sets and contact
//! through digits-only phone equality.

use tracing::debug;

use mesabot_core::conversation::{ConvState, Conversation};
use mesabot_core::types::{StatusFilter, Ticket, normalize_digits};
use mesabot_core::MesabotError;

use crate::texts;
use crate::TicketFlow;

impl TicketFlow {
    pub(crate) fn show_status_menu(&self, conv: &mut Conversation) -> String {
        conv.state = ConvState::ListingMenu;
        conv.context.status_filter = None;
        texts::STATUS_MENU.to_string()
    }

    /// Resolve the sender's contact, store the chosen filter and render
    /// the first page. Without a contact the listing cannot be scoped to
    /// the sender, so the conversation falls back to the greeting node.
    pub(crate) async fn choose_status(
        &self,
        sender_id: &str,
        filter: StatusFilter,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        let Some(contact) = self.helpdesk.find_contact_by_phone(sender_id).await? else {
            conv.state = ConvState::Greeting;
            return Ok(texts::CONTACT_NOT_FOUND.to_string());
        };

        conv.context.contact_id = Some(contact.id);
        conv.context.status_filter = Some(filter);
        conv.current_page = 1;
        self.render_page(sender_id, conv).await
    }

    /// Fetch and render the current page for the stored filter.
    pub(crate) async fn render_page(
        &self,
        sender_id: &str,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        // Pagination input can arrive after the filter context was lost
        // (process restart between messages). Re-offer the menu.
        let Some(filter) = conv.context.status_filter else {
            conv.state = ConvState::ListingMenu;
            return Ok(texts::STATUS_MENU.to_string());
        };

        let page = conv.current_page;
        let offset = u64::from(page.saturating_sub(1)) * self.page_size;
        let fetched = self
            .helpdesk
            .list_issues(filter, conv.context.contact_id, offset, self.page_size)
            .await?;

        let digits = normalize_digits(sender_id);
        let mine: Vec<&Ticket> = fetched
            .issues
            .iter()
            .filter(|t| filter.matches_status(&t.status))
            .filter(|t| {
                t.contact_phone
                    .as_deref()
                    .is_some_and(|p| normalize_digits(p) == digits)
            })
            .collect();
        debug!(
            sender = sender_id,
            page,
            fetched = fetched.issues.len(),
            kept = mine.len(),
            "listing page filtered"
        );

        let header = texts::listing_header(filter.query_name());

        // Out of tickets while paging: close the loop with a rating
        // instead of dead pagination options. No ticket id, the rating
        // is recorded against the conversation alone.
        if mine.is_empty() && page > 1 {
            conv.state = ConvState::AwaitingRating;
            conv.context.ticket_id = None;
            return Ok(format!(
                "{header}\n{}\n\n{}",
                texts::EMPTY_PAGE,
                texts::LISTING_RATING_PROMPT
            ));
        }

        let body = if mine.is_empty() {
            texts::EMPTY_PAGE.to_string()
        } else {
            mine.iter()
                .map(|t| texts::ticket_line(t))
                .collect::<Vec<_>>()
                .join("\n")
        };

        // Whether more pages exist is approximated from the filtered
        // count of this fetch; the backend's total counts unfiltered
        // issues and cannot be used directly.
        let has_more = mine.len() as u64 > self.page_size;

        conv.state = ConvState::Paginating;
        Ok(format!(
            "{header}\n{body}\n{}",
            texts::page_options(page, has_more)
        ))
    }
}
