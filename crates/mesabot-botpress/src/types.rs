// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Botpress converse API.

use serde::{Deserialize, Serialize};

/// Outbound converse payload; the engine only accepts text events.
#[derive(Debug, Serialize)]
pub struct ConverseRequest<'a> {
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub text: &'a str,
}

impl<'a> ConverseRequest<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            event_type: "text",
            text,
        }
    }
}

/// Engine reply envelope.
///
/// `responses` stays `None` when the body carries no response array at
/// all; the adapter treats that as a protocol failure rather than an
/// empty reply.
#[derive(Debug, Deserialize)]
pub struct ConverseResponse {
    pub responses: Option<Vec<ResponseItem>>,
    pub session: Option<SessionVars>,
}

/// One reply element. Typing markers and other non-text elements arrive
/// without `text` and never reach the sender.
#[derive(Debug, Deserialize)]
pub struct ResponseItem {
    pub text: Option<String>,
}

/// Session variables the engine reports after each turn. The names
/// follow the engine's Spanish flow variables.
#[derive(Debug, Deserialize)]
pub struct SessionVars {
    pub estado: Option<String>,
    pub categoria: Option<String>,
}
