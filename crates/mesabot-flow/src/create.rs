// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmation-driven ticket creation.
//!
//! The draft never lives in conversation state: subject and category are
//! parsed back out of the summary message the dialogue engine showed the
//! sender, using two fixed markers. A summary without both markers is a
//! validation failure and must not reach the backend.

use std::sync::LazyLock;

use rand::seq::SliceRandom;
use regex::Regex;
use tracing::{info, warn};

use mesabot_core::conversation::{ConvState, Conversation};
use mesabot_core::types::{TicketDraft, normalize_digits};
use mesabot_core::MesabotError;

use crate::texts;
use crate::TicketFlow;

static SUBJECT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"🖊️ Asunto: ([^\n]+)").unwrap());
static CATEGORY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"📂 Categoría: ([^\n]+)").unwrap());

/// Extract `(subject, category)` from the confirmation summary.
fn parse_draft(summary: &str) -> Option<(String, String)> {
    let subject = SUBJECT_MARKER.captures(summary)?.get(1)?.as_str().trim();
    let category = CATEGORY_MARKER.captures(summary)?.get(1)?.as_str().trim();
    if subject.is_empty() || category.is_empty() {
        return None;
    }
    Some((subject.to_string(), category.to_string()))
}

impl TicketFlow {
    pub(crate) async fn create_ticket(
        &self,
        sender_id: &str,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        let summary = conv.context.last_bot_message.clone().unwrap_or_default();
        let Some((subject_base, category)) = parse_draft(&summary) else {
            warn!(sender = sender_id, "confirmation without a readable draft summary");
            conv.reset();
            return Ok(texts::DRAFT_INCOMPLETE.to_string());
        };

        let technicians = self.helpdesk.support_technicians().await?;
        let Some(assigned) = technicians.choose(&mut rand::thread_rng()).cloned() else {
            return Err(MesabotError::Helpdesk {
                message: "support roster is empty, nobody to assign".to_string(),
                source: None,
            });
        };

        // A missing contact never blocks creation; the ticket just goes
        // out without the employee and office fields.
        let contact = match self.helpdesk.find_contact_by_phone(sender_id).await {
            Ok(contact) => contact,
            Err(err) => {
                warn!(sender = sender_id, error = %err, "contact lookup failed, creating without contact data");
                None
            }
        };

        let draft = TicketDraft {
            subject: format!("{category}: {subject_base}"),
            description: format!("📋 Ticket generado vía Mesabot WhatsApp\n\n{summary}"),
            phone_digits: normalize_digits(sender_id),
            employee: contact.as_ref().map(|c| c.name.clone()),
            office: contact.as_ref().map(|c| {
                c.office
                    .clone()
                    .filter(|office| !office.is_empty())
                    .unwrap_or_else(|| "No especificada".to_string())
            }),
            assigned_to: Some(assigned.id),
        };
        let ticket = self.helpdesk.create_ticket(&draft).await?;
        info!(
            sender = sender_id,
            ticket = ticket.id,
            technician = assigned.id,
            category = %category,
            "ticket created"
        );

        if let Some(notifier) = &self.notifier {
            notifier.notify_assignment(ticket.id, assigned.id).await;
        }

        conv.state = ConvState::AwaitingRating;
        conv.context.ticket_id = Some(ticket.id);
        conv.context.category = Some(category);
        Ok(texts::create_success(&ticket))
    }
}
