// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local chat transport backed by stdio.
//!
//! The production deployment puts the actual WhatsApp connection in a
//! separate bridge process; this transport is the assistant's side of
//! that split. `Bridge` style speaks a line protocol on stdout (one
//! reply per line, `recipient<TAB>body`, control characters escaped)
//! with inbound messages injected by `serve`'s stdin reader. `Pretty`
//! style prints reply text verbatim for the interactive shell.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use mesabot_core::MesabotError;
use mesabot_core::traits::adapter::PluginAdapter;
use mesabot_core::traits::transport::ChatTransport;
use mesabot_core::types::{AdapterType, HealthStatus, InboundMessage, Presence};

/// How outbound replies are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    /// `recipient<TAB>escaped-body` lines for a supervising bridge process.
    Bridge,
    /// Raw reply text for a human at a terminal.
    Pretty,
}

/// A `ChatTransport` whose wire is the process's own stdio.
///
/// Inbound messages arrive through the injector handle returned by
/// [`LocalTransport::new`]. The transport keeps no sender of its own,
/// so dropping the last injector (stdin EOF, shell exit) closes the
/// queue and `receive()` reports the transport as closed.
pub struct LocalTransport {
    inbound: Mutex<UnboundedReceiver<InboundMessage>>,
    style: OutputStyle,
    delivered: AtomicUsize,
}

impl LocalTransport {
    /// Create the transport and the injector handle that feeds it.
    pub fn new(style: OutputStyle) -> (Self, UnboundedSender<InboundMessage>) {
        let (injector, inbound) = mpsc::unbounded_channel();
        (
            Self {
                inbound: Mutex::new(inbound),
                style,
                delivered: AtomicUsize::new(0),
            },
            injector,
        )
    }

    /// Total replies written so far.
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Wait until at least one reply beyond `seen` has been written,
    /// then keep waiting until deliveries go quiet.
    ///
    /// Replies arrive asynchronously and may come in several segments
    /// with typing pauses in between, so "the turn is over" can only be
    /// approximated by a quiet window. Returns the new delivered count,
    /// or `seen` unchanged if nothing arrived before the timeout.
    pub async fn settle(&self, seen: usize, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.delivered() > seen {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let mut count = self.delivered();
        loop {
            tokio::time::sleep(Duration::from_millis(250)).await;
            let now = self.delivered();
            if now == count {
                return now;
            }
            count = now;
        }
    }
}

/// Build an inbound text message with fresh id and timestamp.
pub fn make_inbound(sender_id: &str, body: &str) -> InboundMessage {
    InboundMessage {
        id: format!("local-{}", uuid::Uuid::new_v4()),
        sender_id: sender_id.to_string(),
        body: body.to_string(),
        from_self: false,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Escape a message body for the one-line-per-message bridge protocol.
pub fn escape_line(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

/// Inverse of [`escape_line`]. Unknown escape sequences pass through.
pub fn unescape_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[async_trait]
impl PluginAdapter for LocalTransport {
    fn name(&self) -> &str {
        "local"
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
        debug!("local transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for LocalTransport {
    async fn connect(&self) -> Result<(), MesabotError> {
        debug!(style = ?self.style, "local transport ready");
        Ok(())
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<(), MesabotError> {
        match self.style {
            OutputStyle::Bridge => println!("{to}\t{}", escape_line(text)),
            OutputStyle::Pretty => println!("{text}"),
        }
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn simulate_presence(&self, to: &str, presence: Presence) -> Result<(), MesabotError> {
        // stdio has no presence channel; trace and move on.
        debug!(to, %presence, "presence update on local transport");
        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, MesabotError> {
        let mut inbound = self.inbound.lock().await;
        inbound.recv().await.ok_or_else(|| MesabotError::Transport {
            message: "local transport closed".to_string(),
            source: None,
        })
    }
}
