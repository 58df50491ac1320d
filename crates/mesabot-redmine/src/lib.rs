// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redmine ticketing backend adapter for the Mesabot assistant.
//!
//! This crate implements [`HelpdeskAdapter`] over the Redmine REST API
//! (with the CRM contacts plugin), mapping wire issues, contacts and
//! memberships into the conversation-level types.

pub mod client;
pub mod types;

use async_trait::async_trait;
use mesabot_config::MesabotConfig;
use mesabot_core::error::MesabotError;
use mesabot_core::traits::{HelpdeskAdapter, PluginAdapter};
use mesabot_core::types::{
    normalize_digits, AdapterType, CancelOutcome, Contact, HealthStatus, IssuePage, StatusFilter,
    Technician, Ticket, TicketDraft,
};
use tracing::{debug, info};

use crate::client::RedmineClient;
use crate::types::{
    ContactDto, CustomFieldValue, IssueDto, IssueUpdate, NewIssue, RedmineSettings,
};

/// Private note attached to a ticket when the reporter cancels it.
const CANCEL_NOTE: &str = "🚫 Ticket rechazado vía Mesabot WhatsApp";

/// Redmine helpdesk backend implementing [`HelpdeskAdapter`].
///
/// API key resolution order: config -> `REDMINE_API_KEY` env var -> error.
pub struct RedmineHelpdesk {
    client: RedmineClient,
}

impl RedmineHelpdesk {
    /// Creates a new Redmine helpdesk adapter from the given configuration.
    ///
    /// Requires `redmine.url` to be set. The API key comes from
    /// `redmine.api_key` or the `REDMINE_API_KEY` environment variable.
    pub fn new(config: &MesabotConfig) -> Result<Self, MesabotError> {
        let url = resolve_url(&config.redmine.url)?;
        let api_key = resolve_api_key(&config.redmine.api_key)?;

        let settings = RedmineSettings {
            url,
            api_key,
            project_identifier: config.redmine.project_identifier.clone(),
            project_id: config.redmine.project_id,
            tracker_id: config.redmine.tracker_id,
            new_status_id: config.redmine.new_status_id,
            rejected_status_id: config.redmine.rejected_status_id,
            priority_id: config.redmine.priority_id,
            support_role_id: config.redmine.support_role_id,
            employee_field_id: config.redmine.employee_field_id,
            office_field_id: config.redmine.office_field_id,
            phone_field_id: config.redmine.phone_field_id,
        };

        let client = RedmineClient::new(settings)?;
        info!(
            project = config.redmine.project_identifier,
            "Redmine helpdesk initialized"
        );

        Ok(Self { client })
    }

    /// Creates an adapter with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: RedmineClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for RedmineHelpdesk {
    fn name(&self) -> &str {
        "redmine"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Helpdesk
    }

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MesabotError> {
        debug!("Redmine helpdesk shutting down");
        Ok(())
    }
}

#[async_trait]
impl HelpdeskAdapter for RedmineHelpdesk {
    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>, MesabotError> {
        let issue = self.client.get_issue(id).await?;
        Ok(issue.map(|dto| map_issue(dto, self.client.settings().phone_field_id)))
    }

    async fn create_ticket(&self, draft: &TicketDraft) -> Result<Ticket, MesabotError> {
        let new_issue = draft_to_new_issue(draft, self.client.settings());
        let created = self.client.create_issue(new_issue).await?;
        info!(ticket = created.id, "ticket created");
        Ok(map_issue(created, self.client.settings().phone_field_id))
    }

    async fn cancel_ticket(&self, id: u64) -> Result<CancelOutcome, MesabotError> {
        let Some(issue) = self.client.get_issue(id).await? else {
            return Ok(CancelOutcome::NotFound);
        };

        let rejected = self.client.settings().rejected_status_id;
        if issue.status.as_ref().is_some_and(|s| s.id == rejected) {
            debug!(ticket = id, "ticket already cancelled");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        self.client
            .update_issue(
                id,
                IssueUpdate {
                    status_id: Some(rejected),
                    notes: CANCEL_NOTE.to_string(),
                    private_notes: true,
                },
            )
            .await?;
        info!(ticket = id, "ticket cancelled");
        Ok(CancelOutcome::Cancelled)
    }

    async fn list_issues(
        &self,
        status: StatusFilter,
        contact_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<IssuePage, MesabotError> {
        let page = self
            .client
            .list_issues(status.query_name(), contact_id, offset, limit)
            .await?;

        let phone_field_id = self.client.settings().phone_field_id;
        Ok(IssuePage {
            issues: page
                .issues
                .into_iter()
                .map(|dto| map_issue(dto, phone_field_id))
                .collect(),
            total_count: page.total_count,
        })
    }

    async fn find_contact_by_phone(&self, phone: &str) -> Result<Option<Contact>, MesabotError> {
        let wanted = normalize_digits(phone);
        if wanted.is_empty() {
            return Ok(None);
        }

        // Stored numbers and the sender id differ in formatting and in
        // country-prefix length, so the match is containment either way.
        let contacts = self.client.list_contacts().await?;
        let found = contacts.into_iter().find(|c| {
            c.phones.iter().any(|p| {
                let digits = normalize_digits(&p.number);
                !digits.is_empty() && (digits.contains(&wanted) || wanted.contains(&digits))
            })
        });

        Ok(found.map(map_contact))
    }

    async fn support_technicians(&self) -> Result<Vec<Technician>, MesabotError> {
        let role_id = self.client.settings().support_role_id;
        let memberships = self.client.project_memberships().await?;

        let technicians: Vec<Technician> = memberships
            .into_iter()
            .filter(|m| m.roles.iter().any(|r| r.id == role_id))
            .filter_map(|m| m.user)
            .map(|user| Technician {
                id: user.id,
                name: user.name,
            })
            .collect();

        debug!(count = technicians.len(), "support roster fetched");
        Ok(technicians)
    }

    async fn technician_phone(&self, technician_id: u64) -> Result<Option<String>, MesabotError> {
        let Some(user) = self.client.get_user(technician_id).await? else {
            return Ok(None);
        };

        let phone_field_id = self.client.settings().phone_field_id;
        Ok(user
            .custom_fields
            .iter()
            .find(|f| f.id == phone_field_id)
            .and_then(|f| f.value_as_string()))
    }

    async fn add_rating_note(&self, ticket_id: u64, note: &str) -> Result<(), MesabotError> {
        self.client
            .update_issue(
                ticket_id,
                IssueUpdate {
                    status_id: None,
                    notes: note.to_string(),
                    private_notes: true,
                },
            )
            .await
    }
}

/// Resolves the backend base URL from config.
fn resolve_url(config_url: &Option<String>) -> Result<String, MesabotError> {
    if let Some(url) = config_url
        && !url.is_empty()
    {
        return Ok(url.clone());
    }

    Err(MesabotError::Config(
        "Redmine URL not found. Set redmine.url in config.".into(),
    ))
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, MesabotError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("REDMINE_API_KEY").map_err(|_| {
        MesabotError::Config(
            "Redmine API key not found. Set redmine.api_key in config or REDMINE_API_KEY environment variable.".into(),
        )
    })
}

/// Maps a wire issue into a conversation-level [`Ticket`].
///
/// The latest non-empty journal note becomes `last_note`; the phone custom
/// field becomes `contact_phone` so listings can be filtered per sender.
fn map_issue(issue: IssueDto, phone_field_id: u64) -> Ticket {
    let last_note = issue.journals.iter().rev().find_map(|j| {
        j.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    });

    let contact_phone = issue
        .custom_fields
        .iter()
        .find(|f| f.id == phone_field_id)
        .and_then(|f| f.value_as_string());

    Ticket {
        id: issue.id,
        subject: issue.subject,
        status: issue.status.map(|s| s.name).unwrap_or_default(),
        priority: issue.priority.map(|p| p.name),
        assigned_to: issue.assigned_to.map(|a| a.name),
        author: issue.author.map(|a| a.name),
        created_on: issue.created_on,
        last_note,
        contact_phone,
    }
}

fn map_contact(contact: ContactDto) -> Contact {
    let name = contact.full_name();
    Contact {
        id: contact.id,
        name,
        office: contact.company,
        phones: contact.phones.into_iter().map(|p| p.number).collect(),
    }
}

/// Builds the issue creation payload from a draft and the configured ids.
///
/// The phone custom field is always attached; employee and office only
/// when the contact lookup resolved them.
fn draft_to_new_issue(draft: &TicketDraft, settings: &RedmineSettings) -> NewIssue {
    let mut custom_fields = Vec::new();
    if let Some(employee) = &draft.employee {
        custom_fields.push(CustomFieldValue {
            id: settings.employee_field_id,
            value: employee.clone(),
        });
    }
    if let Some(office) = &draft.office {
        custom_fields.push(CustomFieldValue {
            id: settings.office_field_id,
            value: office.clone(),
        });
    }
    custom_fields.push(CustomFieldValue {
        id: settings.phone_field_id,
        value: draft.phone_digits.clone(),
    });

    NewIssue {
        project_id: settings.project_id,
        tracker_id: settings.tracker_id,
        status_id: settings.new_status_id,
        priority_id: settings.priority_id,
        subject: draft.subject.clone(),
        description: draft.description.clone(),
        assigned_to_id: draft.assigned_to,
        custom_fields,
    }
}
