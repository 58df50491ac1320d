// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort technician notification on assignment.
//!
//! Delivery is fire-and-forget from the creation flow's point of view:
//! every failure is logged and swallowed, a notification must never fail
//! or delay ticket creation. A keyed dedup store keeps re-runs of the
//! same assignment from spamming the technician.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use mesabot_core::traits::helpdesk::HelpdeskAdapter;
use mesabot_core::traits::transport::ChatTransport;
use mesabot_core::types::Ticket;
use mesabot_core::MesabotError;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_CAPACITY: usize = 4096;

/// Sends the "ticket assigned" chat message to technicians.
pub struct TechnicianNotifier {
    helpdesk: Arc<dyn HelpdeskAdapter>,
    transport: Arc<dyn ChatTransport>,
    issue_url_base: Option<String>,
    sent: DashMap<String, Instant>,
    ttl: Duration,
    capacity: usize,
}

impl TechnicianNotifier {
    pub fn new(helpdesk: Arc<dyn HelpdeskAdapter>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            helpdesk,
            transport,
            issue_url_base: None,
            sent: DashMap::new(),
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Append a "view in browser" link built from this base URL.
    pub fn with_issue_url_base(mut self, base: impl Into<String>) -> Self {
        self.issue_url_base = Some(base.into());
        self
    }

    /// How long a delivered notification suppresses repeats.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Notify one technician about one assignment, at most once per TTL.
    pub async fn notify_assignment(&self, ticket_id: u64, technician_id: u64) {
        let key = format!("assigned_{ticket_id}_{technician_id}");
        if self.already_sent(&key) {
            debug!(ticket = ticket_id, technician = technician_id, "assignment notice already sent, skipping");
            return;
        }
        match self.deliver(ticket_id, technician_id).await {
            Ok(true) => self.record(key),
            Ok(false) => {}
            Err(err) => {
                warn!(
                    ticket = ticket_id,
                    technician = technician_id,
                    error = %err,
                    "assignment notification failed"
                );
            }
        }
    }

    fn already_sent(&self, key: &str) -> bool {
        if let Some(at) = self.sent.get(key)
            && at.elapsed() < self.ttl
        {
            return true;
        }
        self.sent.remove(key);
        false
    }

    fn record(&self, key: String) {
        if self.sent.len() >= self.capacity {
            self.sent.retain(|_, at| at.elapsed() < self.ttl);
        }
        if self.sent.len() >= self.capacity {
            // Still full after dropping expired entries: shed the oldest
            // quarter so the store stays bounded.
            let mut entries: Vec<(String, Instant)> = self
                .sent
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect();
            entries.sort_by_key(|(_, at)| *at);
            for (old, _) in entries.into_iter().take(self.capacity / 4) {
                self.sent.remove(&old);
            }
            warn!(retained = self.sent.len(), "notification dedup store trimmed");
        }
        self.sent.insert(key, Instant::now());
    }

    async fn deliver(&self, ticket_id: u64, technician_id: u64) -> Result<bool, MesabotError> {
        let Some(ticket) = self.helpdesk.get_ticket(ticket_id).await? else {
            warn!(ticket = ticket_id, "ticket vanished before its assignment notice");
            return Ok(false);
        };
        let Some(phone) = self.helpdesk.technician_phone(technician_id).await? else {
            info!(technician = technician_id, "no phone on file, skipping assignment notice");
            return Ok(false);
        };

        let message = self.format_notice(&ticket);
        self.transport.send_text(&phone, &message).await?;
        info!(ticket = ticket_id, technician = technician_id, "assignment notice delivered");
        Ok(true)
    }

    fn format_notice(&self, ticket: &Ticket) -> String {
        let mut out = format!(
            "🎫 *TICKET ASIGNADO*\n\n📋 *Ticket #{id}*\n📝 *Asunto:* {subject}\n👤 *Solicitante:* {author}\n⚡ *Prioridad:* {priority}\n📊 *Estado:* {status}\n\n🕒 *Creado:* {created}\n\n¡Tienes un nuevo ticket asignado! 👨‍💻",
            id = ticket.id,
            subject = ticket.subject,
            author = ticket.author.as_deref().unwrap_or("Usuario desconocido"),
            priority = ticket.priority.as_deref().unwrap_or("Normal"),
            status = if ticket.status.is_empty() { "Nuevo" } else { &ticket.status },
            created = ticket
                .created_on
                .as_deref()
                .map(crate::texts::format_date)
                .unwrap_or_else(|| "Desconocido".to_string()),
        );
        if let Some(base) = &self.issue_url_base {
            out.push_str(&format!(
                "\n\n🔗 Ver en Redmine: {}/issues/{}",
                base.trim_end_matches('/'),
                ticket.id
            ));
        }
        out
    }
}
