// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the Mesabot collaborators.
//!
//! Each seam extends [`PluginAdapter`] and is object-safe via
//! `#[async_trait]`, so the router holds them as trait objects.

pub mod adapter;
pub mod dialogue;
pub mod helpdesk;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use dialogue::DialogueAdapter;
pub use helpdesk::HelpdeskAdapter;
pub use storage::StorageAdapter;
pub use transport::ChatTransport;
