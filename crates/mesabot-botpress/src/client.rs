// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Botpress converse API.

use std::time::Duration;

use mesabot_core::MesabotError;
use tracing::{debug, warn};

use crate::types::{ConverseRequest, ConverseResponse};

/// HTTP request timeout for converse calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the dialogue engine.
#[derive(Debug, Clone)]
pub struct BotpressClient {
    client: reqwest::Client,
    base_url: String,
    bot_id: String,
}

impl BotpressClient {
    /// Creates a new converse API client.
    pub fn new(url: &str, bot_id: &str) -> Result<Self, MesabotError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MesabotError::Dialogue {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            bot_id: bot_id.to_string(),
        })
    }

    /// Sends one text to the engine and returns the decoded envelope.
    ///
    /// The engine reports flow problems in the body rather than the HTTP
    /// status, so any received body is parsed regardless of status; a body
    /// that is not valid JSON becomes an empty envelope the adapter treats
    /// as protocol trouble. Only connection-level failures are errors.
    pub async fn converse(
        &self,
        sender_id: &str,
        text: &str,
    ) -> Result<ConverseResponse, MesabotError> {
        let url = format!(
            "{}/api/v1/bots/{}/converse/{}",
            self.base_url, self.bot_id, sender_id
        );

        debug!(sender = sender_id, "sending text to dialogue engine");
        let response = self
            .client
            .post(&url)
            .json(&ConverseRequest::text(text))
            .send()
            .await
            .map_err(|e| MesabotError::Dialogue {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| MesabotError::Dialogue {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(
                sender = sender_id,
                status = %status,
                error = %e,
                "engine body is not valid JSON"
            );
            ConverseResponse {
                responses: None,
                session: None,
            }
        }))
    }

    /// Connectivity probe. Any HTTP answer proves the engine is reachable;
    /// only connection-level failures are errors.
    pub async fn ping(&self) -> Result<(), MesabotError> {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| MesabotError::Dialogue {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn converse_posts_a_text_event_to_the_sender_path() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "responses": [{"type": "text", "text": "¡Hola! 👋"}],
            "session": {"estado": "saludo"}
        });

        Mock::given(method("POST"))
            .and(path("/api/v1/bots/mesabot/converse/5491123456789"))
            .and(body_json(serde_json::json!({"type": "text", "text": "hola"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = BotpressClient::new(&server.uri(), "mesabot").unwrap();
        let response = client.converse("5491123456789", "hola").await.unwrap();

        let items = response.responses.unwrap();
        assert_eq!(items[0].text.as_deref(), Some("¡Hola! 👋"));
        assert_eq!(
            response.session.unwrap().estado.as_deref(),
            Some("saludo")
        );
    }

    #[tokio::test]
    async fn non_json_body_becomes_an_empty_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let client = BotpressClient::new(&server.uri(), "mesabot").unwrap();
        let response = client.converse("549", "hola").await.unwrap();
        assert!(response.responses.is_none());
        assert!(response.session.is_none());
    }

    #[tokio::test]
    async fn error_status_with_json_body_is_still_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "flow crashed"})),
            )
            .mount(&server)
            .await;

        let client = BotpressClient::new(&server.uri(), "mesabot").unwrap();
        let response = client.converse("549", "hola").await.unwrap();
        assert!(response.responses.is_none());
    }

    #[tokio::test]
    async fn unreachable_engine_is_a_connection_error() {
        // A bare (non-pooled) server: dropping it actually closes the port.
        let server = MockServer::builder().start().await;
        let uri = server.uri();
        drop(server);

        let client = BotpressClient::new(&uri, "mesabot").unwrap();
        let err = client.converse("549", "hola").await.unwrap_err();
        assert!(err.to_string().contains("HTTP request failed"), "got: {err}");
    }
}
