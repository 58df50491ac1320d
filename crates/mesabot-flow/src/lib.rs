// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket flow engine.
//!
//! Owns every guided helpdesk transition: querying and cancelling tickets
//! by id, confirmation-driven creation, status listing with pagination,
//! and the closing rating capture. The engine receives already-mapped
//! intents from the router, talks to the ticketing backend, mutates the
//! sender's conversation in place and returns the reply text.
//!
//! Error policy: backend failures inside a transition never escape.
//! The sender gets a generic apology, the conversation resets and is
//! marked finished so the next message starts clean.

mod create;
mod listing;
mod notify;
mod texts;

pub use notify::TechnicianNotifier;

use std::sync::Arc;

use tracing::{error, warn};

use mesabot_core::conversation::{ConvState, Conversation};
use mesabot_core::intent::Intent;
use mesabot_core::traits::helpdesk::HelpdeskAdapter;
use mesabot_core::traits::storage::StorageAdapter;
use mesabot_core::types::StatusFilter;
use mesabot_core::MesabotError;

/// Default number of issues fetched per listing page.
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// The flow engine. One instance serves every sender; per-sender state
/// lives in the `Conversation` passed to [`TicketFlow::handle`].
pub struct TicketFlow {
    helpdesk: Arc<dyn HelpdeskAdapter>,
    storage: Option<Arc<dyn StorageAdapter>>,
    notifier: Option<Arc<TechnicianNotifier>>,
    page_size: u64,
}

impl TicketFlow {
    pub fn new(helpdesk: Arc<dyn HelpdeskAdapter>) -> Self {
        Self {
            helpdesk,
            storage: None,
            notifier: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Persist ratings locally through the given storage adapter.
    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Notify assigned technicians after creation.
    pub fn with_notifier(mut self, notifier: Arc<TechnicianNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Run one flow transition and return the reply text.
    ///
    /// Backend failures are absorbed here: the reply becomes the generic
    /// apology and the conversation is reset and finished.
    pub async fn handle(
        &self,
        sender_id: &str,
        intent: &Intent,
        conv: &mut Conversation,
    ) -> String {
        match self.dispatch(sender_id, intent, conv).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(sender = sender_id, intent = %intent, error = %err, "flow transition failed");
                conv.reset();
                conv.finished = true;
                texts::FLOW_ERROR.to_string()
            }
        }
    }

    async fn dispatch(
        &self,
        sender_id: &str,
        intent: &Intent,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        match intent {
            Intent::QueryTicket(id) => self.query_ticket(*id, conv).await,
            Intent::CancelTicket(id) => self.cancel_ticket(*id, conv).await,
            Intent::Confirm => self.create_ticket(sender_id, conv).await,
            Intent::Rating(score) => self.record_rating(sender_id, *score, conv).await,
            Intent::InvalidRating => Ok(texts::invalid_rating()),
            Intent::ListAll => Ok(self.show_status_menu(conv)),
            Intent::StatusNew => self.choose_status(sender_id, StatusFilter::New, conv).await,
            Intent::StatusInProgress => {
                self.choose_status(sender_id, StatusFilter::InProgress, conv)
                    .await
            }
            Intent::Next => {
                conv.next_page();
                self.render_page(sender_id, conv).await
            }
            Intent::Previous => {
                conv.prev_page();
                self.render_page(sender_id, conv).await
            }
            Intent::Exit => Ok(self.finish(conv)),
            other => {
                warn!(sender = sender_id, intent = %other, state = %conv.state, "unexpected intent in flow, re-showing options");
                Ok(self.reshow_options(conv))
            }
        }
    }

    async fn query_ticket(
        &self,
        id: u64,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        if id == 0 {
            return Ok(texts::INVALID_TICKET_NUMBER.to_string());
        }
        match self.helpdesk.get_ticket(id).await? {
            Some(ticket) => {
                conv.state = ConvState::AwaitingRating;
                conv.context.ticket_id = Some(id);
                Ok(texts::ticket_details(&ticket))
            }
            // The sender may simply retry with another id.
            None => Ok(texts::query_not_found(id)),
        }
    }

    async fn cancel_ticket(
        &self,
        id: u64,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        if id == 0 {
            return Ok(texts::INVALID_TICKET_NUMBER.to_string());
        }
        use mesabot_core::types::CancelOutcome;
        match self.helpdesk.cancel_ticket(id).await? {
            CancelOutcome::Cancelled => {
                conv.state = ConvState::AwaitingRating;
                conv.context.ticket_id = Some(id);
                Ok(texts::cancel_confirmed(id))
            }
            CancelOutcome::AlreadyCancelled => Ok(texts::already_cancelled(id)),
            CancelOutcome::NotFound => Ok(texts::cancel_not_found(id)),
        }
    }

    /// Persist the rating and close the conversation.
    ///
    /// The ticket note only exists when a ticket id is in context (query,
    /// cancel and creation set one; the listing rating has none). The
    /// local record is best-effort and never fails the transition.
    async fn record_rating(
        &self,
        sender_id: &str,
        score: u8,
        conv: &mut Conversation,
    ) -> Result<String, MesabotError> {
        let label = texts::rating_label(score);
        let ticket_id = conv.context.ticket_id;

        if let Some(id) = ticket_id {
            let note = format!("📊 Calificación del servicio: {label}");
            self.helpdesk.add_rating_note(id, &note).await?;
        }
        if let Some(storage) = &self.storage
            && let Err(err) = storage.save_rating(sender_id, ticket_id, score, label).await
        {
            warn!(sender = sender_id, error = %err, "failed to record rating locally");
        }

        conv.reset();
        conv.finished = true;
        Ok(texts::RATING_THANKS.to_string())
    }

    fn finish(&self, conv: &mut Conversation) -> String {
        conv.reset();
        conv.finished = true;
        texts::FAREWELL.to_string()
    }

    fn reshow_options(&self, conv: &mut Conversation) -> String {
        match conv.state {
            ConvState::Paginating => texts::INVALID_PAGE_OPTION.to_string(),
            ConvState::ListingMenu => texts::STATUS_MENU.to_string(),
            _ => texts::INVALID_MENU_OPTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mesabot_test_utils::MockHelpdesk;
    use mesabot_test_utils::mock_helpdesk::make_ticket;

    fn flow(helpdesk: &Arc<MockHelpdesk>) -> TicketFlow {
        TicketFlow::new(helpdesk.clone())
    }

    #[tokio::test]
    async fn query_moves_to_rating_with_ticket_in_context() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        helpdesk.add_ticket(make_ticket(42, "No imprime", "Nueva")).await;
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingQueryId;

        let reply = flow
            .handle("5491100000001", &Intent::QueryTicket(42), &mut conv)
            .await;

        assert!(reply.starts_with("📋 Detalles del ticket #42:"));
        assert!(reply.contains("calificá la atención"));
        assert_eq!(conv.state, ConvState::AwaitingRating);
        assert_eq!(conv.context.ticket_id, Some(42));
        assert!(!conv.finished);
    }

    #[tokio::test]
    async fn query_unknown_ticket_keeps_state_for_retry() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingQueryId;

        let reply = flow
            .handle("549", &Intent::QueryTicket(9), &mut conv)
            .await;

        assert_eq!(reply, "❌ No se encontró el ticket #9.");
        assert_eq!(conv.state, ConvState::AwaitingQueryId);
        assert_eq!(conv.context.ticket_id, None);
    }

    #[tokio::test]
    async fn zero_id_is_rejected_without_backend_call() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        helpdesk.set_failing(true);
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();

        let reply = flow.handle("549", &Intent::QueryTicket(0), &mut conv).await;
        assert!(reply.contains("Número de ticket inválido"));

        let reply = flow.handle("549", &Intent::CancelTicket(0), &mut conv).await;
        assert!(reply.contains("Número de ticket inválido"));
        assert!(!conv.finished);
    }

    #[tokio::test]
    async fn cancel_succeeds_then_reports_repeat() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        helpdesk.add_ticket(make_ticket(7, "PC lenta", "Nueva")).await;
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingCancelId;

        let reply = flow.handle("549", &Intent::CancelTicket(7), &mut conv).await;
        assert!(reply.contains("✅ El ticket #7 ha sido rechazado exitosamente."));
        assert!(reply.contains("📊 Estado: Rechazado"));
        assert_eq!(conv.state, ConvState::AwaitingRating);
        assert_eq!(conv.context.ticket_id, Some(7));

        let mut again = Conversation::new();
        again.state = ConvState::AwaitingCancelId;
        let reply = flow.handle("549", &Intent::CancelTicket(7), &mut again).await;
        assert_eq!(reply, "⚠️ El ticket #7 ya está rechazado");
        assert_eq!(again.state, ConvState::AwaitingCancelId);
    }

    #[tokio::test]
    async fn cancel_missing_ticket_reports_not_found() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingCancelId;

        let reply = flow.handle("549", &Intent::CancelTicket(99), &mut conv).await;
        assert_eq!(reply, "❌ No se encontró el ticket #99");
        assert_eq!(conv.state, ConvState::AwaitingCancelId);
    }

    #[tokio::test]
    async fn rating_with_ticket_writes_private_note_and_finishes() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        helpdesk.add_ticket(make_ticket(42, "x", "Nueva")).await;
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingRating;
        conv.context.ticket_id = Some(42);
        conv.context.greeting_sent = true;

        let reply = flow.handle("549", &Intent::Rating(3), &mut conv).await;

        assert!(reply.starts_with("¡Gracias por tu calificación!"));
        let notes = helpdesk.rating_notes().await;
        assert_eq!(
            notes,
            vec![(42, "📊 Calificación del servicio: Muy Buena 😊".to_string())]
        );
        assert!(conv.finished);
        assert_eq!(conv.state, ConvState::Greeting);
        assert!(conv.context.greeting_sent, "reset must keep the greeting flag");
    }

    #[tokio::test]
    async fn rating_without_ticket_skips_the_note() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingRating;

        let reply = flow.handle("549", &Intent::Rating(1), &mut conv).await;

        assert!(reply.starts_with("¡Gracias por tu calificación!"));
        assert!(helpdesk.rating_notes().await.is_empty());
        assert!(conv.finished);
    }

    #[tokio::test]
    async fn invalid_rating_reprompts_in_place() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingRating;

        let reply = flow.handle("549", &Intent::InvalidRating, &mut conv).await;

        assert!(reply.contains("calificá la atención"));
        assert_eq!(conv.state, ConvState::AwaitingRating);
        assert!(!conv.finished);
    }

    #[tokio::test]
    async fn backend_failure_apologizes_resets_and_finishes() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        helpdesk.set_failing(true);
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::AwaitingQueryId;
        conv.context.greeting_sent = true;

        let reply = flow.handle("549", &Intent::QueryTicket(42), &mut conv).await;

        assert_eq!(reply, "❌ Ocurrió un error. Por favor, intentá nuevamente.");
        assert_eq!(conv.state, ConvState::Greeting);
        assert!(conv.finished);
        assert!(conv.context.greeting_sent);
    }

    #[tokio::test]
    async fn exit_says_farewell_and_finishes() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);
        let mut conv = Conversation::new();
        conv.state = ConvState::ListingMenu;

        let reply = flow.handle("549", &Intent::Exit, &mut conv).await;

        assert!(reply.starts_with("🤖 Mesabot ha finalizado la conversación."));
        assert!(conv.finished);
        assert_eq!(conv.state, ConvState::Greeting);
    }

    #[tokio::test]
    async fn stray_input_reshows_the_menu_for_the_state() {
        let helpdesk = Arc::new(MockHelpdesk::new());
        let flow = flow(&helpdesk);

        let mut conv = Conversation::new();
        conv.state = ConvState::ListingMenu;
        let reply = flow
            .handle("549", &Intent::Free("hola".to_string()), &mut conv)
            .await;
        assert!(reply.contains("Elija el estado de los tickets"));
        assert_eq!(conv.state, ConvState::ListingMenu);

        conv.state = ConvState::Paginating;
        let reply = flow
            .handle("549", &Intent::Free("9".to_string()), &mut conv)
            .await;
        assert!(reply.contains("Opción no válida"));
        assert!(reply.contains("4️⃣ Siguiente"));
        assert_eq!(conv.state, ConvState::Paginating);
    }
}
