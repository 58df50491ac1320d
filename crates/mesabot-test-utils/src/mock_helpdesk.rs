// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory ticketing backend for deterministic testing.
//!
//! `MockHelpdesk` implements `HelpdeskAdapter` over plain maps. Listing
//! pages can be scripted, creation payloads are captured for assertion,
//! and every operation can be switched to fail for error-path tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use mesabot_core::MesabotError;
use mesabot_core::traits::adapter::PluginAdapter;
use mesabot_core::traits::helpdesk::HelpdeskAdapter;
use mesabot_core::types::{
    AdapterType, CancelOutcome, Contact, HealthStatus, IssuePage, StatusFilter, Technician,
    Ticket, TicketDraft, normalize_digits,
};

/// A mock ticketing backend for testing.
///
/// Tickets, contacts and technicians live in memory. `list_issues`
/// returns scripted pages pushed via `push_page()` (empty page when the
/// script runs out), matching how the real backend is exercised: the
/// flow engine re-filters whatever the backend returns.
pub struct MockHelpdesk {
    tickets: Mutex<HashMap<u64, Ticket>>,
    cancelled: Mutex<HashSet<u64>>,
    contacts: Mutex<Vec<Contact>>,
    technicians: Mutex<Vec<Technician>>,
    technician_phones: Mutex<HashMap<u64, String>>,
    pages: Mutex<VecDeque<IssuePage>>,
    created: Mutex<Vec<TicketDraft>>,
    rating_notes: Mutex<Vec<(u64, String)>>,
    list_calls: Mutex<Vec<(StatusFilter, Option<u64>, u64, u64)>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MockHelpdesk {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            cancelled: Mutex::new(HashSet::new()),
            contacts: Mutex::new(Vec::new()),
            technicians: Mutex::new(Vec::new()),
            technician_phones: Mutex::new(HashMap::new()),
            pages: Mutex::new(VecDeque::new()),
            created: Mutex::new(Vec::new()),
            rating_notes: Mutex::new(Vec::new()),
            list_calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            failing: AtomicBool::new(false),
        }
    }

    /// Seed a ticket.
    pub async fn add_ticket(&self, ticket: Ticket) {
        self.tickets.lock().await.insert(ticket.id, ticket);
    }

    /// Seed a contact.
    pub async fn add_contact(&self, contact: Contact) {
        self.contacts.lock().await.push(contact);
    }

    /// Seed a technician, optionally with a phone number on file.
    pub async fn add_technician(&self, technician: Technician, phone: Option<&str>) {
        if let Some(phone) = phone {
            self.technician_phones
                .lock()
                .await
                .insert(technician.id, phone.to_string());
        }
        self.technicians.lock().await.push(technician);
    }

    /// Script the next `list_issues` response.
    pub async fn push_page(&self, page: IssuePage) {
        self.pages.lock().await.push_back(page);
    }

    /// Make every operation return a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Drafts captured by `create_ticket`, in call order.
    pub async fn created(&self) -> Vec<TicketDraft> {
        self.created.lock().await.clone()
    }

    /// Rating notes captured by `add_rating_note`, in call order.
    pub async fn rating_notes(&self) -> Vec<(u64, String)> {
        self.rating_notes.lock().await.clone()
    }

    /// `(status, contact_id, offset, limit)` tuples from `list_issues` calls.
    pub async fn list_calls(&self) -> Vec<(StatusFilter, Option<u64>, u64, u64)> {
        self.list_calls.lock().await.clone()
    }

    fn fail_if_scripted(&self, operation: &str) -> Result<(), MesabotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MesabotError::Helpdesk {
                message: format!("mock backend failure during {operation}"),
                source: None,
            });
        }
        Ok(())
    }
}

impl Default for MockHelpdesk {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a minimal ticket for seeding tests.
pub fn make_ticket(id: u64, subject: &str, status: &str) -> Ticket {
    Ticket {
        id,
        subject: subject.to_string(),
        status: status.to_string(),
        priority: Some("Normal".to_string()),
        assigned_to: None,
        author: None,
        created_on: Some("2026-08-01T12:00:00Z".to_string()),
        last_note: None,
        contact_phone: None,
    }
}

#[async_trait]
impl PluginAdapter for MockHelpdesk {
    fn name(&self) -> &str {
        "mock-helpdesk"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Helpdesk
    }

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MesabotError> {
        Ok(())
    }
}

#[async_trait]
impl HelpdeskAdapter for MockHelpdesk {
    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>, MesabotError> {
        self.fail_if_scripted("get_ticket")?;
        Ok(self.tickets.lock().await.get(&id).cloned())
    }

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, MesabotError> {
        self.fail_if_scripted("create_ticket")?;
        self.created.lock().await.push(draft.clone());

        let assigned_to = match draft.assigned_to {
            Some(technician_id) => self
                .technicians
                .lock()
                .await
                .iter()
                .find(|t| t.id == technician_id)
                .map(|t| t.name.clone()),
            None => None,
        };
        let ticket = Ticket {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            subject: draft.subject.clone(),
            status: "Nueva".to_string(),
            priority: Some("Normal".to_string()),
            assigned_to,
            author: Some("Mesa de Ayuda".to_string()),
            created_on: Some(chrono::Utc::now().to_rfc3339()),
            last_note: None,
            contact_phone: Some(draft.phone_digits.clone()),
        };
        self.tickets.lock().await.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn cancel_ticket(&self, id: u64) -> Result<CancelOutcome, MesabotError> {
        self.fail_if_scripted("cancel_ticket")?;
        let mut tickets = self.tickets.lock().await;
        let Some(ticket) = tickets.get_mut(&id) else {
            return Ok(CancelOutcome::NotFound);
        };
        let mut cancelled = self.cancelled.lock().await;
        if cancelled.contains(&id) {
            return Ok(CancelOutcome::AlreadyCancelled);
        }
        cancelled.insert(id);
        ticket.status = "Rechazada".to_string();
        Ok(CancelOutcome::Cancelled)
    }

    async fn list_issues(
        &self,
        status: StatusFilter,
        contact_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<IssuePage, MesabotError> {
        self.fail_if_scripted("list_issues")?;
        self.list_calls
            .lock()
            .await
            .push((status, contact_id, offset, limit));
        Ok(self.pages.lock().await.pop_front().unwrap_or_default())
    }

    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, MesabotError> {
        self.fail_if_scripted("find_contact_by_phone")?;
        let wanted = normalize_digits(phone);
        if wanted.is_empty() {
            return Ok(None);
        }
        let contacts = self.contacts.lock().await;
        Ok(contacts
            .iter()
            .find(|c| {
                c.phones.iter().any(|p| {
                    let digits = normalize_digits(p);
                    !digits.is_empty() && (digits.contains(&wanted) || wanted.contains(&digits))
                })
            })
            .cloned())
    }

    async fn support_technicians(&self) -> Result<Vec<Technician>, MesabotError> {
        self.fail_if_scripted("support_technicians")?;
        Ok(self.technicians.lock().await.clone())
    }

    async fn technician_phone(&self, technician_id: u64) -> Result<Option<String>, MesabotError> {
        self.fail_if_scripted("technician_phone")?;
        Ok(self
            .technician_phones
            .lock()
            .await
            .get(&technician_id)
            .cloned())
    }

    async fn add_rating_note(&self, ticket_id: u64, note: &str) -> Result<(), MesabotError> {
        self.fail_if_scripted("add_rating_note")?;
        self.rating_notes
            .lock()
            .await
            .push((ticket_id, note.to_string()));
        Ok(())
    }
}
