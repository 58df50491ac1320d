// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat transport trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::MesabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundMessage, Presence};

/// Adapter for the bidirectional chat transport the assistant lives on.
///
/// One conversation exists per sender id (phone-number-shaped). The
/// transport delivers inbound messages through `receive` and accepts
/// plain-text replies plus presence updates (the "typing..." indicator).
#[async_trait]
pub trait ChatTransport: PluginAdapter {
    /// Establishes the connection to the messaging platform.
    async fn connect(&self) -> Result<(), MesabotError>;

    /// Sends a plain-text message to a sender.
    ///
    /// Sending empty text is a caller bug; the router guards against it
    /// before reaching the transport.
    async fn send_text(&self, to: &str, text: &str) -> Result<(), MesabotError>;

    /// Updates the presence indicator shown to a sender.
    async fn simulate_presence(&self, to: &str, presence: Presence) -> Result<(), MesabotError>;

    /// Receives the next inbound message from the platform.
    async fn receive(&self) -> Result<InboundMessage, MesabotError>;
}
