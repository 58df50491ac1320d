// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed session store for per-sender conversations.
//!
//! The in-memory map is the source of truth. A persisted mirror (through
//! the [`StorageAdapter`]) is written fire-and-forget after each commit and
//! read once per sender for crash recovery; mirror failures are logged and
//! never reach the message path.
//!
//! Callers work on snapshots: `snapshot` hands out a clone, the router and
//! flow mutate it freely across awaits, and `commit` writes it back. The
//! per-sender guard from [`SessionStore::guard`] serializes handling for
//! one sender, so snapshot-mutate-commit is not a lost-update hazard.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use mesabot_core::types::SessionMirror;
use mesabot_core::{ConvState, Conversation, StorageAdapter};

/// In-memory conversation store keyed by sender id.
pub struct SessionStore {
    sessions: DashMap<String, Conversation>,
    guards: DashMap<String, Arc<Mutex<()>>>,
    storage: Option<Arc<dyn StorageAdapter>>,
}

impl SessionStore {
    /// A store without a persisted mirror (tests, ephemeral runs).
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            guards: DashMap::new(),
            storage: None,
        }
    }

    /// A store that mirrors conversations through the given record store.
    pub fn with_storage(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            sessions: DashMap::new(),
            guards: DashMap::new(),
            storage: Some(storage),
        }
    }

    /// Fetch a copy of the sender's conversation, creating it lazily.
    ///
    /// On first sight of a sender the persisted mirror is consulted: a
    /// recovered node becomes the starting state and the sender is not
    /// greeted again. An unknown node name in the mirror is ignored
    /// (fail closed to a fresh conversation).
    pub async fn snapshot(&self, sender_id: &str) -> Conversation {
        if let Some(existing) = self.sessions.get(sender_id) {
            return existing.clone();
        }

        let conv = self.hydrate(sender_id).await;
        self.sessions
            .entry(sender_id.to_string())
            .or_insert(conv)
            .clone()
    }

    async fn hydrate(&self, sender_id: &str) -> Conversation {
        let Some(storage) = &self.storage else {
            return Conversation::new();
        };
        match storage.session_mirror(sender_id).await {
            Ok(Some(mirror)) => {
                let mut conv = Conversation::new();
                match ConvState::from_node_name(&mirror.node) {
                    Some(state) => {
                        conv.state = state;
                        conv.context.last_bot_message = mirror.last_bot_message;
                        debug!(sender_id, node = %mirror.node, "session recovered from mirror");
                    }
                    None => {
                        warn!(sender_id, node = %mirror.node, "mirror holds unknown node, starting fresh");
                    }
                }
                // A mirror exists, so this sender was greeted before.
                conv.context.greeting_sent = true;
                conv
            }
            Ok(None) => Conversation::new(),
            Err(e) => {
                warn!(sender_id, error = %e, "mirror read failed, starting fresh");
                Conversation::new()
            }
        }
    }

    /// Write a conversation back and trigger the non-blocking mirror write.
    pub fn commit(&self, sender_id: &str, conv: &Conversation, last_input: Option<&str>) {
        self.sessions
            .insert(sender_id.to_string(), conv.clone());

        let Some(storage) = &self.storage else {
            return;
        };
        let storage = Arc::clone(storage);
        let sender = sender_id.to_string();
        let mirror = SessionMirror {
            node: conv.state.node_name(),
            last_input: last_input.map(str::to_string),
            last_bot_message: conv.context.last_bot_message.clone(),
            last_interaction: chrono::Utc::now().to_rfc3339(),
        };
        tokio::spawn(async move {
            if let Err(e) = storage.upsert_session_mirror(&sender, &mirror).await {
                warn!(sender_id = %sender, error = %e, "session mirror write failed");
            }
        });
    }

    /// Full reset of a sender's conversation (greeting-sent flag kept).
    pub fn reset(&self, sender_id: &str) {
        self.sessions
            .entry(sender_id.to_string())
            .or_insert_with(Conversation::new)
            .reset();
    }

    /// Whether a greeting call is currently in flight for this sender.
    pub fn greeting_in_progress(&self, sender_id: &str) -> bool {
        self.sessions
            .get(sender_id)
            .map(|c| c.context.greeting_in_progress)
            .unwrap_or(false)
    }

    /// Atomically claim the greeting for this sender.
    ///
    /// Returns `true` exactly once per sender: the caller that gets `true`
    /// performs the greeting; everyone else observes sent-or-in-progress.
    pub fn begin_greeting(&self, sender_id: &str) -> bool {
        let mut entry = self
            .sessions
            .entry(sender_id.to_string())
            .or_insert_with(Conversation::new);
        let ctx = &mut entry.context;
        if ctx.greeting_sent || ctx.greeting_in_progress {
            return false;
        }
        ctx.greeting_in_progress = true;
        true
    }

    /// Mark the greeting delivered (or abandoned) for this sender.
    pub fn finish_greeting(&self, sender_id: &str, sent: bool) {
        if let Some(mut entry) = self.sessions.get_mut(sender_id) {
            entry.context.greeting_in_progress = false;
            entry.context.greeting_sent = entry.context.greeting_sent || sent;
        }
    }

    /// Per-sender guard used by the router to serialize message handling
    /// for one sender while distinct senders proceed concurrently.
    pub fn guard(&self, sender_id: &str) -> Arc<Mutex<()>> {
        self.guards
            .entry(sender_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of conversations currently held in memory.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
