// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mesabot helpdesk assistant.
//!
//! This crate provides the trait definitions, error types, conversation
//! state machine, and canonical intents used throughout the Mesabot
//! workspace. All collaborator adapters implement traits defined here.

pub mod conversation;
pub mod error;
pub mod intent;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use conversation::{Category, ConvContext, ConvState, Conversation};
pub use error::MesabotError;
pub use intent::Intent;
pub use types::{AdapterType, HealthStatus, StatusFilter};

// Re-export all adapter traits at crate root.
pub use traits::{ChatTransport, DialogueAdapter, HelpdeskAdapter, PluginAdapter, StorageAdapter};
