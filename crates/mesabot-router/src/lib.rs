// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message router for the Mesabot assistant.
//!
//! The [`MessageRouter`] is the central coordinator that:
//! - Receives inbound messages from the chat transport
//! - Applies the ordered precedence rules per sender
//! - Routes handled intents to the ticket flow engine, everything else to
//!   the remote dialogue engine
//! - Simulates typing before each outbound reply
//! - Records conversation history and mirrors sessions best-effort
//!
//! Messages for distinct senders are handled concurrently; a per-sender
//! guard serializes handling for one sender. The only exception is the
//! greeting-in-progress drop, checked before queueing, so a duplicate
//! first message is dropped rather than queued behind the greeting call.

pub mod reconcile;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mesabot_config::model::TransportConfig;
use mesabot_core::types::{DialogueReply, Direction, InboundMessage, Presence};
use mesabot_core::{
    ChatTransport, ConvState, Conversation, DialogueAdapter, Intent, MesabotError, StorageAdapter,
};
use mesabot_flow::TicketFlow;
use mesabot_session::SessionStore;

/// Apology sent by the outermost handler when message handling fails in a
/// way no rule anticipated.
const ROUTER_ERROR: &str =
    "⚠️ Disculpá, hubo un problema al procesar tu mensaje. Por favor, intentá nuevamente.";

/// Typing simulation parameters: each reply is delayed proportionally to
/// its length, clamped to a window, so replies read as typed rather than
/// instantaneous.
#[derive(Debug, Clone, Copy)]
pub struct TypingProfile {
    pub per_char_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl TypingProfile {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            per_char_ms: config.typing_per_char_ms,
            min_ms: config.typing_min_ms,
            max_ms: config.typing_max_ms,
        }
    }

    /// Zero-delay profile for tests and the local shell.
    pub fn instant() -> Self {
        Self {
            per_char_ms: 0,
            min_ms: 0,
            max_ms: 0,
        }
    }

    fn delay_for(&self, text: &str) -> Duration {
        let chars = text.chars().count() as u64;
        let ms = chars
            .saturating_mul(self.per_char_ms)
            .max(self.min_ms)
            .min(self.max_ms);
        Duration::from_millis(ms)
    }
}

impl Default for TypingProfile {
    fn default() -> Self {
        Self::from_config(&TransportConfig::default())
    }
}

/// The message router. One instance serves every sender.
pub struct MessageRouter {
    transport: Arc<dyn ChatTransport>,
    dialogue: Arc<dyn DialogueAdapter>,
    flow: Arc<TicketFlow>,
    sessions: Arc<SessionStore>,
    storage: Option<Arc<dyn StorageAdapter>>,
    typing: TypingProfile,
}

impl MessageRouter {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        dialogue: Arc<dyn DialogueAdapter>,
        flow: Arc<TicketFlow>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            transport,
            dialogue,
            flow,
            sessions,
            storage: None,
            typing: TypingProfile::default(),
        }
    }

    /// Record history and contacts through the given record store.
    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_typing(mut self, typing: TypingProfile) -> Self {
        self.typing = typing;
        self
    }

    /// Runs the router until the cancellation token is triggered.
    ///
    /// The loop:
    /// 1. Waits for inbound messages from the transport
    /// 2. Spawns a handling task per message, serialized per sender
    /// 3. On cancellation or a closed transport, closes storage and exits
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), MesabotError> {
        info!("message router running");

        loop {
            tokio::select! {
                msg = self.transport.receive() => {
                    match msg {
                        Ok(inbound) => self.dispatch(inbound),
                        Err(e) => {
                            error!(error = %e, "transport receive error");
                            // If the transport is closed, break out of the loop.
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping message router");
                    break;
                }
            }
        }

        if let Some(storage) = &self.storage {
            storage.close().await?;
        }

        info!("message router stopped");
        Ok(())
    }

    /// Hand one inbound message to a per-sender handling task.
    fn dispatch(self: &Arc<Self>, inbound: InboundMessage) {
        if inbound.from_self {
            debug!(message_id = %inbound.id, "ignoring own message");
            return;
        }

        // Checked before queueing on the per-sender guard: a duplicate
        // arriving while the greeting call is in flight is dropped, not
        // queued behind it.
        if self.sessions.greeting_in_progress(&inbound.sender_id) {
            debug!(sender_id = %inbound.sender_id, "greeting in flight, dropping concurrent message");
            return;
        }

        let router = Arc::clone(self);
        tokio::spawn(async move {
            let guard = router.sessions.guard(&inbound.sender_id);
            let _serial = guard.lock().await;
            if let Err(e) = router.handle_message(&inbound).await {
                error!(sender_id = %inbound.sender_id, error = %e, "message handling failed");
                router.apologize(&inbound.sender_id).await;
            }
        });
    }

    /// Apply the precedence rules to one message.
    async fn handle_message(&self, inbound: &InboundMessage) -> Result<(), MesabotError> {
        let sender = inbound.sender_id.as_str();
        let raw = inbound.body.trim();
        let lower = raw.to_lowercase();

        self.record_incoming(sender, raw).await;

        let mut conv = self.sessions.snapshot(sender).await;

        // A finished conversation starts over before any rule applies.
        if conv.finished {
            debug!(sender_id = sender, "previous conversation finished, resetting");
            conv.reset();
        }

        // Rating capture outranks everything else: digits here are scores,
        // not menu choices, and must never reach the remote engine.
        if conv.state == ConvState::AwaitingRating {
            let intent = mesabot_intent::map(raw, &mut conv);
            return self.run_flow(sender, &intent, &mut conv, raw).await;
        }

        // First contact: one greeting claim per sender.
        if !conv.context.greeting_sent && self.sessions.begin_greeting(sender) {
            return self.greet(sender, raw, conv).await;
        }

        if self.sessions.greeting_in_progress(sender) {
            debug!(sender_id = sender, "greeting in flight, dropping message");
            return Ok(());
        }

        // Bare digits while a ticket id is awaited.
        if conv.state == ConvState::AwaitingCancelId && all_digits(&lower) {
            let intent = mesabot_intent::map(raw, &mut conv);
            return self.run_flow(sender, &intent, &mut conv, raw).await;
        }
        if conv.state == ConvState::AwaitingQueryId && all_digits(&lower) {
            let intent = mesabot_intent::map(raw, &mut conv);
            return self.run_flow(sender, &intent, &mut conv, raw).await;
        }

        // Confirmation keys off the last reply rather than the state node,
        // so it still fires after state drift.
        if (lower == "si" || lower == "1") && last_contains(&conv, reconcile::CONFIRM_FRAGMENT) {
            return self.run_flow(sender, &Intent::Confirm, &mut conv, raw).await;
        }

        if matches!(conv.state, ConvState::ListingMenu | ConvState::Paginating) && lower == "3" {
            return self.run_flow(sender, &Intent::Exit, &mut conv, raw).await;
        }

        // Status choice works off the last reply for the same reason.
        if last_contains(&conv, reconcile::STATUS_MENU_FRAGMENT) && (lower == "1" || lower == "2")
        {
            let intent = if lower == "1" {
                Intent::StatusNew
            } else {
                Intent::StatusInProgress
            };
            return self.run_flow(sender, &intent, &mut conv, raw).await;
        }

        // Everything else goes through the mapper; the flow keeps what it
        // owns and the rest is forwarded as canonical intent text.
        let state_at_entry = conv.state;
        let intent = mesabot_intent::map(raw, &mut conv);
        if flow_owns(&intent, state_at_entry) {
            return self.run_flow(sender, &intent, &mut conv, raw).await;
        }

        let wire = intent.to_string();
        debug!(sender_id = sender, intent = %wire, state = %conv.state, "forwarding to dialogue engine");
        let reply = self.dialogue.converse(sender, &wire).await;
        for segment in reply.segments.iter().filter(|s| !s.trim().is_empty()) {
            if let Err(e) = self.deliver(sender, segment).await {
                warn!(sender_id = sender, error = %e, "reply delivery failed");
            }
        }
        self.record_engine_reply(&reply, &mut conv);
        self.sessions.commit(sender, &conv, Some(raw));
        Ok(())
    }

    /// First-contact greeting: call the engine, reply with the first
    /// segment only, release the claim.
    ///
    /// No early return between the claim and [`SessionStore::finish_greeting`];
    /// a leaked in-progress flag would drop every later message from the
    /// sender.
    async fn greet(
        &self,
        sender: &str,
        raw: &str,
        mut conv: Conversation,
    ) -> Result<(), MesabotError> {
        debug!(sender_id = sender, "greeting new sender");
        let reply = self.dialogue.converse(sender, raw).await;

        if let Some(first) = reply.segments.first().filter(|s| !s.trim().is_empty()) {
            if let Err(e) = self.deliver(sender, first).await {
                warn!(sender_id = sender, error = %e, "greeting delivery failed");
            }
        } else {
            warn!(sender_id = sender, "greeting reply carried no text");
        }

        self.record_engine_reply(&reply, &mut conv);
        conv.context.greeting_sent = true;
        conv.context.greeting_in_progress = false;
        self.sessions.finish_greeting(sender, true);
        self.sessions.commit(sender, &conv, Some(raw));
        Ok(())
    }

    /// Run one flow transition and deliver its reply.
    async fn run_flow(
        &self,
        sender: &str,
        intent: &Intent,
        conv: &mut Conversation,
        raw: &str,
    ) -> Result<(), MesabotError> {
        debug!(sender_id = sender, intent = %intent, state = %conv.state, "routing to ticket flow");
        let reply = self.flow.handle(sender, intent, conv).await;
        if let Err(e) = self.deliver(sender, &reply).await {
            warn!(sender_id = sender, error = %e, "flow reply delivery failed");
        }
        // Flow replies count as the last bot message too: the status menu
        // rule and confirmation parsing read it regardless of who spoke.
        if !reply.is_empty() {
            conv.context.last_bot_message = Some(reply);
        }
        self.sessions.commit(sender, conv, Some(raw));
        Ok(())
    }

    /// Record an engine reply into the conversation and reconcile state.
    fn record_engine_reply(&self, reply: &DialogueReply, conv: &mut Conversation) {
        let first = reply.segments.first().map(String::as_str).unwrap_or_default();
        if !first.is_empty() {
            conv.context.last_bot_message = Some(first.to_string());
        }
        if let Some(category) = reply.category.as_deref().filter(|c| !c.is_empty()) {
            conv.context.category = Some(category.to_string());
        }
        reconcile::reconcile(conv, reply.state.as_deref(), first);
    }

    /// Send one reply: presence on, simulated typing, presence off, send,
    /// history. Empty text is skipped and logged.
    async fn deliver(&self, to: &str, text: &str) -> Result<(), MesabotError> {
        if text.trim().is_empty() {
            warn!(to, "skipping empty outbound message");
            return Ok(());
        }

        if let Err(e) = self.transport.simulate_presence(to, Presence::Composing).await {
            debug!(to, error = %e, "presence update failed");
        }
        tokio::time::sleep(self.typing.delay_for(text)).await;
        if let Err(e) = self.transport.simulate_presence(to, Presence::Paused).await {
            debug!(to, error = %e, "presence update failed");
        }

        self.transport.send_text(to, text).await?;

        if let Some(storage) = &self.storage
            && let Err(e) = storage.save_message(to, Direction::Outgoing, text).await
        {
            warn!(to, error = %e, "outgoing history write failed");
        }
        Ok(())
    }

    async fn record_incoming(&self, sender: &str, body: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.get_or_create_contact(sender).await {
            warn!(sender_id = sender, error = %e, "contact upsert failed");
        }
        if let Err(e) = storage.save_message(sender, Direction::Incoming, body).await {
            warn!(sender_id = sender, error = %e, "incoming history write failed");
        }
    }

    async fn apologize(&self, sender: &str) {
        if let Err(e) = self.deliver(sender, ROUTER_ERROR).await {
            error!(sender_id = sender, error = %e, "failed to deliver the apology");
        }
    }
}

fn all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn last_contains(conv: &Conversation, fragment: &str) -> bool {
    conv.context
        .last_bot_message
        .as_deref()
        .is_some_and(|m| m.contains(fragment))
}

/// Whether a mapped intent belongs to the ticket flow given the state the
/// message arrived in.
fn flow_owns(intent: &Intent, state_at_entry: ConvState) -> bool {
    match intent {
        Intent::ListAll | Intent::QueryTicket(_) | Intent::CancelTicket(_) => true,
        Intent::Confirm => state_at_entry == ConvState::ConfirmSend,
        Intent::Rating(_) | Intent::InvalidRating => state_at_entry == ConvState::AwaitingRating,
        _ => matches!(
            state_at_entry,
            ConvState::ListingMenu | ConvState::Paginating
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mesabot_core::types::{Contact, IssuePage, Technician, Ticket};
    use mesabot_test_utils::mock_helpdesk::make_ticket;
    use mesabot_test_utils::mock_transport::make_inbound;
    use mesabot_test_utils::{MockDialogue, MockHelpdesk, MockTransport};

    use super::*;

    const SENDER: &str = "5491123456789";

    struct Fixture {
        transport: Arc<MockTransport>,
        dialogue: Arc<MockDialogue>,
        helpdesk: Arc<MockHelpdesk>,
        sessions: Arc<SessionStore>,
        router: Arc<MessageRouter>,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MockTransport::new());
        let dialogue = Arc::new(MockDialogue::new());
        let helpdesk = Arc::new(MockHelpdesk::new());
        let sessions = Arc::new(SessionStore::new());
        let flow = Arc::new(TicketFlow::new(helpdesk.clone()));
        let router = Arc::new(
            MessageRouter::new(
                transport.clone(),
                dialogue.clone(),
                flow,
                sessions.clone(),
            )
            .with_typing(TypingProfile::instant()),
        );
        Fixture {
            transport,
            dialogue,
            helpdesk,
            sessions,
            router,
        }
    }

    /// Seed a greeted conversation in the given state.
    async fn seed(fx: &Fixture, state: ConvState) -> Conversation {
        let mut conv = fx.sessions.snapshot(SENDER).await;
        conv.state = state;
        conv.context.greeting_sent = true;
        fx.sessions.commit(SENDER, &conv, None);
        conv
    }

    async fn handle(fx: &Fixture, body: &str) {
        fx.router
            .handle_message(&make_inbound(SENDER, body))
            .await
            .unwrap();
    }

    // ---- typing profile ----

    #[test]
    fn typing_delay_scales_with_length_and_clamps() {
        let typing = TypingProfile {
            per_char_ms: 50,
            min_ms: 1000,
            max_ms: 3000,
        };
        assert_eq!(typing.delay_for(""), Duration::from_millis(1000));
        assert_eq!(typing.delay_for(&"x".repeat(40)), Duration::from_millis(2000));
        assert_eq!(typing.delay_for(&"x".repeat(500)), Duration::from_millis(3000));
        assert_eq!(TypingProfile::instant().delay_for("hola"), Duration::ZERO);
    }

    #[test]
    fn typing_defaults_follow_the_transport_config() {
        let typing = TypingProfile::default();
        assert_eq!(typing.per_char_ms, 50);
        assert_eq!(typing.min_ms, 1000);
        assert_eq!(typing.max_ms, 3000);
    }

    // ---- delivery ----

    #[tokio::test]
    async fn deliver_wraps_the_send_in_presence_updates() {
        let fx = fixture();
        fx.router.deliver(SENDER, "hola").await.unwrap();

        let updates = fx.transport.presence_updates().await;
        assert_eq!(
            updates,
            vec![
                (SENDER.to_string(), Presence::Composing),
                (SENDER.to_string(), Presence::Paused),
            ]
        );
        assert_eq!(fx.transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn empty_text_is_skipped_entirely() {
        let fx = fixture();
        fx.router.deliver(SENDER, "   ").await.unwrap();
        assert_eq!(fx.transport.sent_count().await, 0);
        assert!(fx.transport.presence_updates().await.is_empty());
    }

    // ---- greeting ----

    #[tokio::test]
    async fn first_message_replies_with_the_first_segment_only() {
        let fx = fixture();
        fx.dialogue
            .add_reply(DialogueReply {
                segments: vec![
                    "¡Hola! Soy Mesabot 🤖".to_string(),
                    "Elegí una opción del menú".to_string(),
                ],
                state: Some("nodo_saludo".to_string()),
                category: None,
            })
            .await;

        handle(&fx, "hola").await;

        let sent = fx.transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "¡Hola! Soy Mesabot 🤖");

        let conv = fx.sessions.snapshot(SENDER).await;
        assert!(conv.context.greeting_sent);
        assert!(!conv.context.greeting_in_progress);
        assert_eq!(
            conv.context.last_bot_message.as_deref(),
            Some("¡Hola! Soy Mesabot 🤖")
        );
    }

    #[tokio::test]
    async fn second_message_skips_the_greeting() {
        let fx = fixture();
        fx.dialogue.add_segments(&["bienvenida"]).await;
        fx.dialogue.add_segments(&["respuesta normal"]).await;

        handle(&fx, "hola").await;
        handle(&fx, "buenas").await;

        let calls = fx.dialogue.calls().await;
        assert_eq!(calls.len(), 2);
        // The second call is a plain forward, not another greeting path.
        assert_eq!(calls[1].1, "buenas");
        assert_eq!(fx.transport.sent_count().await, 2);
    }

    #[tokio::test]
    async fn concurrent_message_during_greeting_is_dropped() {
        let fx = fixture();
        fx.dialogue.set_delay(Some(Duration::from_millis(150))).await;
        fx.dialogue.add_segments(&["¡Hola! Soy Mesabot 🤖"]).await;

        let cancel = CancellationToken::new();
        let loop_handle = tokio::spawn(fx.router.clone().run(cancel.clone()));

        fx.transport.inject_text(SENDER, "hola").await;
        // Give the first task time to claim the greeting, then send the
        // duplicate while the engine call is still sleeping.
        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.transport.inject_text(SENDER, "hola hola").await;

        assert!(fx.transport.wait_for_sent(1, Duration::from_secs(2)).await);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fx.dialogue.call_count().await, 1, "duplicate must not reach the engine");
        assert_eq!(fx.transport.sent_count().await, 1);

        cancel.cancel();
        loop_handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let fx = fixture();
        let cancel = CancellationToken::new();
        let loop_handle = tokio::spawn(fx.router.clone().run(cancel.clone()));

        let mut msg = make_inbound(SENDER, "me to myself");
        msg.from_self = true;
        fx.transport.inject_message(msg).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        assert_eq!(fx.transport.sent_count().await, 0);

        cancel.cancel();
        loop_handle.await.unwrap().unwrap();
    }

    // ---- rating priority ----

    #[tokio::test]
    async fn rating_digit_never_reaches_the_engine() {
        let fx = fixture();
        seed(&fx, ConvState::AwaitingRating).await;

        handle(&fx, "3").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.starts_with("¡Gracias por tu calificación!"));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert!(conv.finished);
    }

    #[tokio::test]
    async fn invalid_rating_reprompts_without_the_engine() {
        let fx = fixture();
        seed(&fx, ConvState::AwaitingRating).await;

        handle(&fx, "quiero generar un ticket").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("calificá la atención"));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::AwaitingRating);
    }

    // ---- awaited ids ----

    #[tokio::test]
    async fn digits_while_awaiting_query_id_query_the_ticket() {
        let fx = fixture();
        fx.helpdesk
            .add_ticket(make_ticket(482, "Sin internet", "Nueva"))
            .await;
        seed(&fx, ConvState::AwaitingQueryId).await;

        handle(&fx, "482").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("#482"));
        assert!(sent[0].1.contains("calificá la atención"));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::AwaitingRating);
    }

    #[tokio::test]
    async fn digits_while_awaiting_cancel_id_cancel_the_ticket() {
        let fx = fixture();
        fx.helpdesk
            .add_ticket(make_ticket(17, "PC lenta", "Nueva"))
            .await;
        seed(&fx, ConvState::AwaitingCancelId).await;

        handle(&fx, "17").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("✅ El ticket #17 ha sido rechazado"));
    }

    #[tokio::test]
    async fn non_digits_at_an_id_prompt_fall_through_to_the_engine() {
        let fx = fixture();
        fx.dialogue.add_segments(&["¿Qué número?"]).await;
        seed(&fx, ConvState::AwaitingQueryId).await;

        handle(&fx, "el de ayer").await;

        let calls = fx.dialogue.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "el de ayer");
    }

    // ---- confirmation ----

    const SUMMARY: &str = "Resumen del ticket 📝\n🖊️ Asunto: No imprime\n📂 Categoría: Impresora\n\n¿Deseás generar el ticket? (si/no)";

    #[tokio::test]
    async fn confirm_digit_fires_on_the_last_reply_even_after_state_drift() {
        let fx = fixture();
        fx.helpdesk
            .add_technician(
                Technician {
                    id: 9,
                    name: "Carlos Ruiz".to_string(),
                },
                None,
            )
            .await;
        // State drifted back to greeting; only the last reply says confirm.
        let mut conv = seed(&fx, ConvState::Greeting).await;
        conv.context.last_bot_message = Some(SUMMARY.to_string());
        fx.sessions.commit(SENDER, &conv, None);

        handle(&fx, "1").await;

        assert_eq!(fx.dialogue.call_count().await, 0, "1 must not map to the greeting menu");
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.starts_with("✅ Ticket creado con éxito"));
        assert_eq!(fx.helpdesk.created().await.len(), 1);
    }

    #[tokio::test]
    async fn confirm_without_draft_markers_is_rejected_before_the_backend() {
        let fx = fixture();
        let mut conv = seed(&fx, ConvState::ConfirmSend).await;
        conv.context.last_bot_message =
            Some("🖊️ Asunto: No imprime\n\n¿Deseás generar el ticket? (si/no)".to_string());
        fx.sessions.commit(SENDER, &conv, None);

        handle(&fx, "si").await;

        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("No pude leer los datos del ticket"));
        assert!(fx.helpdesk.created().await.is_empty());
    }

    // ---- listing rules ----

    async fn seed_listing_backend(fx: &Fixture, tickets: Vec<Ticket>) {
        fx.helpdesk
            .add_contact(Contact {
                id: 31,
                name: "Ana García".to_string(),
                office: None,
                phones: vec![SENDER.to_string()],
            })
            .await;
        let total = tickets.len() as u64;
        fx.helpdesk
            .push_page(IssuePage {
                issues: tickets,
                total_count: total,
            })
            .await;
    }

    fn mine(id: u64) -> Ticket {
        let mut ticket = make_ticket(id, "No imprime", "Nueva");
        ticket.contact_phone = Some(SENDER.to_string());
        ticket
    }

    #[tokio::test]
    async fn ver_todos_shows_the_status_menu_without_the_engine() {
        let fx = fixture();
        seed(&fx, ConvState::Greeting).await;

        handle(&fx, "4").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("Elija el estado de los tickets"));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::ListingMenu);
        assert!(
            conv.context
                .last_bot_message
                .as_deref()
                .is_some_and(|m| m.contains("Elija el estado de los tickets")),
            "flow replies must land in the last bot message"
        );
    }

    #[tokio::test]
    async fn status_digit_fires_on_the_last_reply_even_after_state_drift() {
        let fx = fixture();
        seed_listing_backend(&fx, vec![mine(1), mine(2)]).await;
        // State drifted, only the last reply shows the status menu.
        let mut conv = seed(&fx, ConvState::Greeting).await;
        conv.context.last_bot_message =
            Some("📋 Elija el estado de los tickets que desea ver:".to_string());
        fx.sessions.commit(SENDER, &conv, None);

        handle(&fx, "1").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("🎫 Ticket ID: 1"));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::Paginating);
        assert_eq!(conv.context.status_filter, Some(mesabot_core::StatusFilter::New));
    }

    #[tokio::test]
    async fn exit_digit_ends_the_listing() {
        let fx = fixture();
        seed(&fx, ConvState::Paginating).await;

        handle(&fx, "3").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.starts_with("🤖 Mesabot ha finalizado la conversación."));
        let conv = fx.sessions.snapshot(SENDER).await;
        assert!(conv.finished);
    }

    #[tokio::test]
    async fn previous_from_page_two_rerenders_page_one_with_the_stored_filter() {
        let fx = fixture();
        seed_listing_backend(&fx, vec![mine(1), mine(2)]).await;
        let mut conv = seed(&fx, ConvState::Paginating).await;
        conv.current_page = 2;
        conv.context.status_filter = Some(mesabot_core::StatusFilter::New);
        conv.context.contact_id = Some(31);
        fx.sessions.commit(SENDER, &conv, None);

        handle(&fx, "5").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let calls = fx.helpdesk.list_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Some(31), "stored contact is reused");
        assert_eq!(calls[0].2, 0, "page 1 starts at offset 0");
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.current_page, 1);
    }

    #[tokio::test]
    async fn free_text_while_paginating_stays_in_the_flow() {
        let fx = fixture();
        seed(&fx, ConvState::Paginating).await;

        handle(&fx, "que era esto?").await;

        assert_eq!(fx.dialogue.call_count().await, 0);
        let sent = fx.transport.sent_messages().await;
        assert!(sent[0].1.contains("Opción no válida"));
    }

    // ---- engine forwarding ----

    #[tokio::test]
    async fn free_text_forwards_all_segments_in_order() {
        let fx = fixture();
        fx.dialogue
            .add_reply(DialogueReply {
                segments: vec![
                    "primera parte".to_string(),
                    "   ".to_string(),
                    "segunda parte".to_string(),
                ],
                state: None,
                category: None,
            })
            .await;
        seed(&fx, ConvState::Greeting).await;

        handle(&fx, "necesito otra cosa").await;

        let sent = fx.transport.sent_messages().await;
        assert_eq!(sent.len(), 2, "blank segments are skipped");
        assert_eq!(sent[0].1, "primera parte");
        assert_eq!(sent[1].1, "segunda parte");
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.context.last_bot_message.as_deref(), Some("primera parte"));
    }

    #[tokio::test]
    async fn greeting_digit_forwards_the_canonical_intent() {
        let fx = fixture();
        fx.dialogue
            .add_segments(&["🔍 Ingresá el número de ticket:"])
            .await;
        seed(&fx, ConvState::Greeting).await;

        handle(&fx, "2").await;

        let calls = fx.dialogue.calls().await;
        assert_eq!(calls[0].1, "consultar");
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::AwaitingQueryId);
    }

    #[tokio::test]
    async fn engine_reported_state_is_reconciled() {
        let fx = fixture();
        // Free text moves nothing locally; the engine's session variable
        // is the only signal.
        fx.dialogue
            .add_reply(DialogueReply {
                segments: vec!["🔍 Ingresá el número de ticket:".to_string()],
                state: Some("esperando_id_consulta".to_string()),
                category: None,
            })
            .await;
        seed(&fx, ConvState::Greeting).await;

        handle(&fx, "hola de nuevo").await;

        let calls = fx.dialogue.calls().await;
        assert_eq!(calls[0].1, "hola de nuevo");
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::AwaitingQueryId);
    }

    #[tokio::test]
    async fn engine_reported_category_lands_in_context() {
        let fx = fixture();
        fx.dialogue
            .add_reply(DialogueReply {
                segments: vec!["Elegiste Impresora".to_string()],
                state: None,
                category: Some("Impresora".to_string()),
            })
            .await;
        seed(&fx, ConvState::Greeting).await;

        handle(&fx, "tengo un problema").await;

        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.context.category.as_deref(), Some("Impresora"));
    }

    #[tokio::test]
    async fn finished_conversation_resets_before_any_rule() {
        let fx = fixture();
        fx.dialogue.add_segments(&["menú principal"]).await;
        let mut conv = seed(&fx, ConvState::ListingMenu).await;
        conv.finished = true;
        fx.sessions.commit(SENDER, &conv, None);

        // Were the stale state honored, "3" would exit the listing. After
        // the reset it is a greeting digit instead.
        handle(&fx, "3").await;

        let calls = fx.dialogue.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "rechazar ticket");
        let conv = fx.sessions.snapshot(SENDER).await;
        assert_eq!(conv.state, ConvState::AwaitingCancelId);
        assert!(!conv.finished);
    }
}
