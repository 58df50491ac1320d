// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote dialogue engine trait.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::DialogueReply;

/// Adapter for the remote dialogue engine (Botpress-style converse API).
///
/// `converse` is infallible by contract: implementations degrade every
/// failure (network, HTTP status, malformed body) into a reply holding a
/// single apologetic segment, so the router treats engine trouble exactly
/// like a normal reply. Connectivity problems surface through
/// `health_check` instead.
#[async_trait]
pub trait DialogueAdapter: PluginAdapter {
    /// Sends one text to the engine and returns its reply segments plus
    /// the session state variables it reports.
    async fn converse(&self, sender_id: &str, text: &str) -> DialogueReply;
}
