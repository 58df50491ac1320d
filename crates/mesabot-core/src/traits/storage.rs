// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for the persisted session mirror, conversation
//! history, and rating records.

use async_trait::async_trait;

use crate::error::MesabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Direction, SessionMirror};

/// Adapter for the local record store.
///
/// Everything here is best-effort from the router's perspective: a failed
/// write is logged and never blocks replying to the sender. Reads happen
/// once per sender (mirror hydration) and in the doctor command.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the store (runs migrations, opens connections).
    async fn initialize(&self) -> Result<(), MesabotError>;

    /// Closes the store, flushing pending writes.
    async fn close(&self) -> Result<(), MesabotError>;

    /// Returns the row id of the contact for this phone, creating it on
    /// first sight.
    async fn get_or_create_contact(&self, phone: &str) -> Result<i64, MesabotError>;

    /// Appends one message to the conversation history.
    async fn save_message(
        &self,
        phone: &str,
        direction: Direction,
        body: &str,
    ) -> Result<(), MesabotError>;

    /// Reads the persisted mirror for a sender, if one exists.
    async fn session_mirror(&self, phone: &str) -> Result<Option<SessionMirror>, MesabotError>;

    /// Writes (inserting or replacing) the persisted mirror for a sender.
    async fn upsert_session_mirror(
        &self,
        phone: &str,
        mirror: &SessionMirror,
    ) -> Result<(), MesabotError>;

    /// Records a rating. `ticket_id` is `None` for ratings collected at
    /// the end of a listing session.
    async fn save_rating(
        &self,
        phone: &str,
        ticket_id: Option<u64>,
        score: u8,
        label: &str,
    ) -> Result<(), MesabotError>;
}
