// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redmine REST API request/response types.
//!
//! Field selection follows what the conversation flows actually read;
//! everything else the API returns is ignored by serde.

use serde::{Deserialize, Serialize};

/// Connection settings and backend ids for the Redmine client.
///
/// The id fields mirror the helpdesk's administrative setup: which project
/// tickets land in, which tracker/status/priority they get, which role
/// forms the technician roster and which custom fields carry the
/// employee, office and contact-phone values.
#[derive(Debug, Clone)]
pub struct RedmineSettings {
    pub url: String,
    pub api_key: String,
    pub project_identifier: String,
    pub project_id: u64,
    pub tracker_id: u64,
    pub new_status_id: u64,
    pub rejected_status_id: u64,
    pub priority_id: u64,
    pub support_role_id: u64,
    pub employee_field_id: u64,
    pub office_field_id: u64,
    pub phone_field_id: u64,
}

// --- Response types ---

/// A `{id, name}` reference as Redmine embeds it for status, priority,
/// assignee and author.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// One custom field entry on an issue, contact or user.
///
/// Values arrive as JSON strings or numbers depending on the field type,
/// so the raw value is kept and stringified on demand.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldDto {
    pub id: u64,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl CustomFieldDto {
    /// Returns the field value as a non-empty string, if it has one.
    pub fn value_as_string(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One journal entry; only the note text matters to the flows.
#[derive(Debug, Clone, Deserialize)]
pub struct JournalDto {
    #[serde(default)]
    pub notes: Option<String>,
}

/// An issue as returned by `GET /issues/{id}.json` and `GET /issues.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueDto {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    pub status: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub assigned_to: Option<NamedRef>,
    pub author: Option<NamedRef>,
    pub created_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDto>,
    #[serde(default)]
    pub journals: Vec<JournalDto>,
}

/// Envelope for a single issue response.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEnvelope {
    pub issue: IssueDto,
}

/// Envelope for a paged issue listing.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEnvelope {
    #[serde(default)]
    pub issues: Vec<IssueDto>,
    #[serde(default)]
    pub total_count: u64,
}

/// One phone entry on a contact record.
#[derive(Debug, Clone, Deserialize)]
pub struct PhoneDto {
    #[serde(default)]
    pub number: String,
}

/// A contact from the CRM plugin's address book.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactDto {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub phones: Vec<PhoneDto>,
}

impl ContactDto {
    /// Full display name, "First Last" with a lone first name when the
    /// last name is absent.
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.trim().is_empty() => {
                format!("{} {}", self.first_name, last)
            }
            _ => self.first_name.clone(),
        }
    }
}

/// Envelope for the contacts listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactsEnvelope {
    #[serde(default)]
    pub contacts: Vec<ContactDto>,
}

/// One project membership; memberships without a user (group entries)
/// are skipped by the roster filter.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipDto {
    pub user: Option<NamedRef>,
    #[serde(default)]
    pub roles: Vec<NamedRef>,
}

/// Envelope for the project memberships listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipsEnvelope {
    #[serde(default)]
    pub memberships: Vec<MembershipDto>,
}

/// A backend user, fetched to read a technician's phone custom field.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: u64,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDto>,
}

/// Envelope for a single user response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    pub user: UserDto,
}

// --- Request types ---

/// A custom field value submitted with a new issue.
#[derive(Debug, Clone, Serialize)]
pub struct CustomFieldValue {
    pub id: u64,
    pub value: String,
}

/// Body of an issue creation request.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub project_id: u64,
    pub tracker_id: u64,
    pub status_id: u64,
    pub priority_id: u64,
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<u64>,
    pub custom_fields: Vec<CustomFieldValue>,
}

/// Envelope wrapping an issue creation body.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssueEnvelope {
    pub issue: NewIssue,
}

/// Body of an issue update request. `status_id` is omitted when the
/// update only appends a note.
#[derive(Debug, Clone, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u64>,
    pub notes: String,
    pub private_notes: bool,
}

/// Envelope wrapping an issue update body.
#[derive(Debug, Clone, Serialize)]
pub struct IssueUpdateEnvelope {
    pub issue: IssueUpdate,
}
