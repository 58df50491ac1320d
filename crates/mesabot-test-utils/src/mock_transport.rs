// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport` with injectable inbound
//! messages and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use mesabot_core::MesabotError;
use mesabot_core::traits::adapter::PluginAdapter;
use mesabot_core::traits::transport::ChatTransport;
use mesabot_core::types::{AdapterType, HealthStatus, InboundMessage, Presence};

/// A mock chat transport for testing.
///
/// Provides three capture points:
/// - **inbound**: Messages injected via `inject_message()` are returned by `receive()`
/// - **sent**: `(to, text)` pairs passed to `send_text()` are captured
/// - **presence**: `(to, presence)` pairs passed to `simulate_presence()` are captured
pub struct MockTransport {
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    presence: Arc<Mutex<Vec<(String, Presence)>>>,
    notify: Arc<Notify>,
}

impl MockTransport {
    /// Create a new mock transport with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            presence: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Inject an inbound message into the receive queue.
    ///
    /// The next call to `receive()` will return this message.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Build and inject a plain-text message from the given sender.
    pub async fn inject_text(&self, sender_id: &str, body: &str) {
        self.inject_message(make_inbound(sender_id, body)).await;
    }

    /// Get all `(to, text)` pairs that were sent through `send_text()`.
    pub async fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Get all presence updates that were simulated.
    pub async fn presence_updates(&self) -> Vec<(String, Presence)> {
        self.presence.lock().await.clone()
    }

    /// Clear all captured sends and presence updates.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
        self.presence.lock().await.clear();
    }

    /// Wait until at least `n` messages have been sent, or time out.
    ///
    /// The router delivers replies asynchronously (typing simulation runs
    /// in between), so assertions usually need to wait rather than poll.
    pub async fn wait_for_sent(&self, n: usize, timeout: std::time::Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.sent.lock().await.len() >= n {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an inbound text message with fresh id and timestamp.
pub fn make_inbound(sender_id: &str, body: &str) -> InboundMessage {
    InboundMessage {
        id: format!("test-{}", uuid::Uuid::new_v4()),
        sender_id: sender_id.to_string(),
        body: body.to_string(),
        from_self: false,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, MesabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MesabotError> {
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn connect(&self) -> Result<(), MesabotError> {
        Ok(())
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<(), MesabotError> {
        self.sent
            .lock()
            .await
            .push((to.to_string(), text.to_string()));
        Ok(())
    }

    async fn simulate_presence(&self, to: &str, presence: Presence) -> Result<(), MesabotError> {
        self.presence.lock().await.push((to.to_string(), presence));
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, MesabotError> {
        loop {
            // Try to pop from queue
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            // Wait for notification that a new message was injected
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_returns_injected_messages() {
        let transport = MockTransport::new();
        transport.inject_text("5491100000001", "hola").await;

        let received = transport.receive().await.unwrap();
        assert_eq!(received.sender_id, "5491100000001");
        assert_eq!(received.body, "hola");
        assert!(!received.from_self);
    }

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let transport = MockTransport::new();
        transport.send_text("549110", "respuesta").await.unwrap();

        let sent = transport.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("549110".to_string(), "respuesta".to_string()));
    }

    #[tokio::test]
    async fn presence_updates_are_recorded() {
        let transport = MockTransport::new();
        transport
            .simulate_presence("549110", Presence::Composing)
            .await
            .unwrap();
        transport
            .simulate_presence("549110", Presence::Paused)
            .await
            .unwrap();

        let updates = transport.presence_updates().await;
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].1, Presence::Composing);
        assert_eq!(updates[1].1, Presence::Paused);
    }

    #[tokio::test]
    async fn multiple_messages_in_order() {
        let transport = MockTransport::new();
        transport.inject_text("s", "first").await;
        transport.inject_text("s", "second").await;

        assert_eq!(transport.receive().await.unwrap().body, "first");
        assert_eq!(transport.receive().await.unwrap().body, "second");
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let transport = Arc::new(MockTransport::new());
        let transport_clone = transport.clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            transport_clone.inject_text("s", "delayed").await;
        });

        let received =
            tokio::time::timeout(std::time::Duration::from_secs(2), transport.receive())
                .await
                .expect("receive timed out")
                .unwrap();
        assert_eq!(received.body, "delayed");
    }

    #[tokio::test]
    async fn wait_for_sent_observes_late_sends() {
        let transport = Arc::new(MockTransport::new());
        let transport_clone = transport.clone();

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            transport_clone.send_text("s", "late").await.unwrap();
        });

        assert!(
            transport
                .wait_for_sent(1, std::time::Duration::from_secs(2))
                .await
        );
        assert_eq!(transport.sent_count().await, 1);
    }
}
