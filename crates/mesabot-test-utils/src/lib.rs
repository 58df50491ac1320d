// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mesabot integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock chat transport with message injection and capture
//! - [`MockHelpdesk`] - In-memory ticketing backend with scripted pages and failure injection
//! - [`MockDialogue`] - Mock dialogue engine with pre-configured replies
//! - [`TestHarness`] - Fully wired router over mocks and a temp database

pub mod harness;
pub mod mock_dialogue;
pub mod mock_helpdesk;
pub mod mock_transport;

pub use harness::TestHarness;
pub use mock_dialogue::MockDialogue;
pub use mock_helpdesk::MockHelpdesk;
pub use mock_transport::MockTransport;
