// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Redmine REST API.
//!
//! Provides [`RedmineClient`] which handles request construction, API key
//! authentication and response decoding for the endpoints the conversation
//! flows use. Failures are terminal for the current turn; nothing here
//! retries.

use std::time::Duration;

use mesabot_core::MesabotError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{
    ContactDto, ContactsEnvelope, IssueDto, IssueEnvelope, IssueUpdate, IssueUpdateEnvelope,
    IssuesEnvelope, MembershipDto, MembershipsEnvelope, NewIssue, NewIssueEnvelope,
    RedmineSettings, UserDto, UserEnvelope,
};

/// HTTP request timeout for all backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Redmine API communication.
///
/// Holds the connection pool, the API key header and the backend ids
/// from [`RedmineSettings`].
#[derive(Debug, Clone)]
pub struct RedmineClient {
    client: reqwest::Client,
    settings: RedmineSettings,
    base_url: String,
}

impl RedmineClient {
    /// Creates a new Redmine API client from resolved settings.
    pub fn new(settings: RedmineSettings) -> Result<Self, MesabotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Redmine-API-Key",
            HeaderValue::from_str(&settings.api_key).map_err(|e| {
                MesabotError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MesabotError::Helpdesk {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let base_url = settings.url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    /// Backend ids and identifiers this client was built with.
    pub fn settings(&self) -> &RedmineSettings {
        &self.settings
    }

    /// Fetches one issue with its journals included. `None` on 404.
    pub async fn get_issue(&self, id: u64) -> Result<Option<IssueDto>, MesabotError> {
        let url = format!("{}/issues/{id}.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("include", "journals,watchers,relations")])
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(issue = id, "issue not found");
            return Ok(None);
        }

        let body = read_success(response).await?;
        let envelope: IssueEnvelope = decode(&body)?;
        Ok(Some(envelope.issue))
    }

    /// Creates an issue and returns it as the backend stored it.
    pub async fn create_issue(&self, issue: NewIssue) -> Result<IssueDto, MesabotError> {
        let url = format!("{}/issues.json", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&NewIssueEnvelope { issue })
            .send()
            .await
            .map_err(request_error)?;

        debug!(status = %response.status(), "issue creation response received");
        let body = read_success(response).await?;
        let envelope: IssueEnvelope = decode(&body)?;
        Ok(envelope.issue)
    }

    /// Applies a status change and/or note to an issue.
    pub async fn update_issue(&self, id: u64, update: IssueUpdate) -> Result<(), MesabotError> {
        let url = format!("{}/issues/{id}.json", self.base_url);
        let response = self
            .client
            .put(&url)
            .json(&IssueUpdateEnvelope { issue: update })
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        debug!(issue = id, status = %status, "issue update response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MesabotError::Helpdesk {
                message: format!("backend returned {status}: {body}"),
                source: None,
            });
        }
        Ok(())
    }

    /// One page of the configured project's issues, newest update first.
    ///
    /// `status_name` and `contact_id` are forwarded as query filters;
    /// the backend applies them loosely, so callers re-filter the page.
    pub async fn list_issues(
        &self,
        status_name: &str,
        contact_id: Option<u64>,
        offset: u64,
        limit: u64,
    ) -> Result<IssuesEnvelope, MesabotError> {
        let url = format!("{}/issues.json", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("project_id", self.settings.project_identifier.clone()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
            ("sort", "updated_on:desc".to_string()),
            ("status_name", status_name.to_string()),
        ];
        if let Some(contact) = contact_id {
            query.push(("contact_id", contact.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(request_error)?;

        let body = read_success(response).await?;
        decode(&body)
    }

    /// Every contact of the configured project, with custom fields.
    ///
    /// The CRM plugin has no server-side phone search, so phone matching
    /// is done by the caller over the full list.
    pub async fn list_contacts(&self) -> Result<Vec<ContactDto>, MesabotError> {
        let url = format!("{}/contacts.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("project_id", self.settings.project_id.to_string()),
                ("include", "custom_fields".to_string()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let body = read_success(response).await?;
        let envelope: ContactsEnvelope = decode(&body)?;
        Ok(envelope.contacts)
    }

    /// Memberships of the configured project.
    pub async fn project_memberships(&self) -> Result<Vec<MembershipDto>, MesabotError> {
        let url = format!(
            "{}/projects/{}/memberships.json",
            self.base_url, self.settings.project_identifier
        );
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        let body = read_success(response).await?;
        let envelope: MembershipsEnvelope = decode(&body)?;
        Ok(envelope.memberships)
    }

    /// Fetches one backend user. `None` on 404.
    pub async fn get_user(&self, id: u64) -> Result<Option<UserDto>, MesabotError> {
        let url = format!("{}/users/{id}.json", self.base_url);
        let response = self.client.get(&url).send().await.map_err(request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(user = id, "user not found");
            return Ok(None);
        }

        let body = read_success(response).await?;
        let envelope: UserEnvelope = decode(&body)?;
        Ok(Some(envelope.user))
    }

    /// Lightweight connectivity probe against the configured project.
    pub async fn ping(&self) -> Result<(), MesabotError> {
        let url = format!(
            "{}/projects/{}.json",
            self.base_url, self.settings.project_identifier
        );
        let response = self.client.get(&url).send().await.map_err(request_error)?;
        read_success(response).await.map(|_| ())
    }
}

fn request_error(e: reqwest::Error) -> MesabotError {
    MesabotError::Helpdesk {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn read_success(response: reqwest::Response) -> Result<String, MesabotError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MesabotError::Helpdesk {
            message: format!("backend returned {status}: {body}"),
            source: None,
        });
    }
    response.text().await.map_err(|e| MesabotError::Helpdesk {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, MesabotError> {
    serde_json::from_str(body).map_err(|e| MesabotError::Helpdesk {
        message: format!("failed to parse backend response: {e}"),
        source: Some(Box::new(e)),
    })
}
