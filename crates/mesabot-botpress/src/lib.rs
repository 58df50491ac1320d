// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Botpress dialogue engine adapter for the Mesabot assistant.
//!
//! This crate implements [`DialogueAdapter`] over the Botpress converse
//! API. The adapter is the degradation boundary required by the router:
//! every failure class collapses into a reply with a single apologetic
//! segment, so engine trouble never propagates as an error.

pub mod client;
pub mod types;

use async_trait::async_trait;
use mesabot_config::MesabotConfig;
use mesabot_core::error::MesabotError;
use mesabot_core::traits::{DialogueAdapter, PluginAdapter};
use mesabot_core::types::{AdapterType, DialogueReply, HealthStatus};
use tracing::{debug, error, info, warn};

use crate::client::BotpressClient;
use crate::types::{ResponseItem, SessionVars};

/// Reply sent when the engine cannot be reached at all.
const CONNECTION_APOLOGY: &str = "❌ Error de conexión con el servicio de chat.";

/// Reply sent when the engine answered but the body had no usable
/// response array.
const PROTOCOL_APOLOGY: &str = "⚠️ Error de comunicación con el bot.";

/// Botpress dialogue engine implementing [`DialogueAdapter`].
pub struct BotpressDialogue {
    client: BotpressClient,
}

impl BotpressDialogue {
    /// Creates a new dialogue adapter from the given configuration.
    /// Requires `botpress.url` to be set.
    pub fn new(config: &MesabotConfig) -> Result<Self, MesabotError> {
        let url = resolve_url(&config.botpress.url)?;
        let client = BotpressClient::new(&url, &config.botpress.bot_id)?;

        info!(
            bot = config.botpress.bot_id,
            "Botpress dialogue engine initialized"
        );
        Ok(Self { client })
    }

    /// Creates an adapter with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: BotpressClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for BotpressDialogue {
    fn name(&self) -> &str {
        "botpress"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dialogue
    }

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        match self.client.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MesabotError> {
        debug!("Botpress dialogue engine shutting down");
        Ok(())
    }
}

#[async_trait]
impl DialogueAdapter for BotpressDialogue {
    async fn converse(&self, sender_id: &str, text: &str) -> DialogueReply {
        match self.client.converse(sender_id, text).await {
            Ok(envelope) => match envelope.responses {
                Some(items) => build_reply(items, envelope.session),
                None => {
                    warn!(sender = sender_id, "engine reply carried no response array");
                    apology(PROTOCOL_APOLOGY)
                }
            },
            Err(e) => {
                error!(sender = sender_id, error = %e, "dialogue engine call failed");
                apology(CONNECTION_APOLOGY)
            }
        }
    }
}

/// Resolves the engine base URL from config.
fn resolve_url(config_url: &Option<String>) -> Result<String, MesabotError> {
    if let Some(url) = config_url
        && !url.is_empty()
    {
        return Ok(url.clone());
    }

    Err(MesabotError::Config(
        "Botpress URL not found. Set botpress.url in config.".into(),
    ))
}

/// Collapses the engine envelope into ordered text segments plus the
/// reported session variables. Elements without text (typing markers
/// and the like) are dropped.
fn build_reply(items: Vec<ResponseItem>, session: Option<SessionVars>) -> DialogueReply {
    let segments: Vec<String> = items
        .into_iter()
        .filter_map(|item| item.text)
        .filter(|text| !text.is_empty())
        .collect();

    let (state, category) = match session {
        Some(vars) => (vars.estado, vars.categoria),
        None => (None, None),
    };

    DialogueReply {
        segments,
        state,
        category,
    }
}

fn apology(text: &str) -> DialogueReply {
    DialogueReply {
        segments: vec![text.to_string()],
        state: None,
        category: None,
    }
}
