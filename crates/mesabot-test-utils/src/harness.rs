// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete assistant stack: mock transport,
//! mock dialogue engine, mock helpdesk, a session store mirrored into a
//! temp SQLite database, and the message router running its receive loop.
//! Tests inject sender messages and assert on captured replies and on the
//! durable records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mesabot_config::model::StorageConfig;
use mesabot_core::types::DialogueReply;
use mesabot_core::{MesabotError, StorageAdapter};
use mesabot_flow::TicketFlow;
use mesabot_router::{MessageRouter, TypingProfile};
use mesabot_session::SessionStore;
use mesabot_storage::SqliteStorage;

use crate::mock_dialogue::MockDialogue;
use crate::mock_helpdesk::MockHelpdesk;
use crate::mock_transport::MockTransport;

/// Default wait for replies to land; the router delivers asynchronously.
const REPLY_WAIT: Duration = Duration::from_secs(2);

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<DialogueReply>,
    typing: TypingProfile,
    page_size: Option<u64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            typing: TypingProfile::instant(),
            page_size: None,
        }
    }

    /// Pre-load dialogue engine replies, popped in order.
    pub fn with_dialogue_replies(mut self, replies: Vec<DialogueReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Override the zero-delay typing profile (latency tests only).
    pub fn with_typing(mut self, typing: TypingProfile) -> Self {
        self.typing = typing;
        self
    }

    /// Override the listing page size.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Build the test harness and start the router loop.
    pub async fn build(self) -> Result<TestHarness, MesabotError> {
        // Temp directory for SQLite, removed when the harness drops.
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MesabotError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let transport = Arc::new(MockTransport::new());
        let dialogue = Arc::new(MockDialogue::with_replies(self.replies));
        let helpdesk = Arc::new(MockHelpdesk::new());
        let sessions = Arc::new(SessionStore::with_storage(
            storage.clone() as Arc<dyn StorageAdapter>
        ));

        let mut flow =
            TicketFlow::new(helpdesk.clone()).with_storage(storage.clone() as Arc<dyn StorageAdapter>);
        if let Some(page_size) = self.page_size {
            flow = flow.with_page_size(page_size);
        }
        let flow = Arc::new(flow);

        let router = Arc::new(
            MessageRouter::new(
                transport.clone(),
                dialogue.clone(),
                flow,
                sessions.clone(),
            )
            .with_storage(storage.clone() as Arc<dyn StorageAdapter>)
            .with_typing(self.typing),
        );

        let cancel = CancellationToken::new();
        let loop_handle = tokio::spawn(Arc::clone(&router).run(cancel.clone()));

        Ok(TestHarness {
            transport,
            dialogue,
            helpdesk,
            storage,
            sessions,
            router,
            cancel,
            loop_handle,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters, temp storage and the
/// router loop already running.
pub struct TestHarness {
    /// The mock chat transport: inject inbound, capture outbound.
    pub transport: Arc<MockTransport>,
    /// The mock dialogue engine.
    pub dialogue: Arc<MockDialogue>,
    /// The in-memory ticketing backend.
    pub helpdesk: Arc<MockHelpdesk>,
    /// SQLite record store (temp DB, cleaned up on drop). The concrete
    /// type is exposed so tests can read transcripts and row counts.
    pub storage: Arc<SqliteStorage>,
    /// The session store backing the router.
    pub sessions: Arc<SessionStore>,
    /// The router under test.
    pub router: Arc<MessageRouter>,
    cancel: CancellationToken,
    loop_handle: JoinHandle<Result<(), MesabotError>>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Inject one sender message into the running router loop.
    pub async fn send(&self, sender_id: &str, body: &str) {
        self.transport.inject_text(sender_id, body).await;
    }

    /// Wait until at least `n` replies have been delivered in total.
    pub async fn wait_for_replies(&self, n: usize) -> bool {
        self.transport.wait_for_sent(n, REPLY_WAIT).await
    }

    /// The text of the most recent delivered reply.
    pub async fn last_reply(&self) -> Option<String> {
        self.transport
            .sent_messages()
            .await
            .last()
            .map(|(_, text)| text.clone())
    }

    /// Stop the router loop and wait for it to exit. The loop closes the
    /// record store on the way out; reads still work afterwards, only the
    /// WAL has been checkpointed.
    pub async fn shutdown(self) -> Result<(), MesabotError> {
        self.cancel.cancel();
        match self.loop_handle.await {
            Ok(result) => result,
            Err(e) => Err(MesabotError::Internal(format!(
                "router loop join failed: {e}"
            ))),
        }
    }
}
