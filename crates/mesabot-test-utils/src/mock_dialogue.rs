// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock dialogue engine for deterministic testing.
//!
//! `MockDialogue` implements `DialogueAdapter` with pre-configured replies,
//! enabling router tests without a running dialogue server.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mesabot_core::MesabotError;
use mesabot_core::traits::adapter::PluginAdapter;
use mesabot_core::traits::dialogue::DialogueAdapter;
use mesabot_core::types::{AdapterType, DialogueReply, HealthStatus};

/// A mock dialogue engine that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a
/// default single-segment reply is returned. An optional artificial
/// delay makes in-flight races (concurrent first messages) reproducible.
pub struct MockDialogue {
    replies: Arc<Mutex<VecDeque<DialogueReply>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockDialogue {
    /// Create a new mock engine with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a mock engine pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<DialogueReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: DialogueReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Add a reply made of plain text segments, no reported state.
    pub async fn add_segments(&self, segments: &[&str]) {
        self.add_reply(DialogueReply {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            state: None,
            category: None,
        })
        .await;
    }

    /// Delay every `converse` call by the given duration.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().await = delay;
    }

    /// `(sender_id, text)` pairs from `converse` calls, in order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }

    /// Get the count of `converse` calls.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl Default for MockDialogue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockDialogue {
    fn name(&self) -> &str {
        "mock-dialogue"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dialogue
    }

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MesabotError> {
        Ok(())
    }
}

#[async_trait]
impl DialogueAdapter for MockDialogue {
    async fn converse(&self, sender_id: &str, text: &str) -> DialogueReply {
        self.calls
            .lock()
            .await
            .push((sender_id.to_string(), text.to_string()));

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| DialogueReply {
                segments: vec!["mock dialogue reply".to_string()],
                state: None,
                category: None,
            })
    }
}
