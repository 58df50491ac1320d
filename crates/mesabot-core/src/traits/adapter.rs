// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every collaborator adapter.

use async_trait::async_trait;

use crate::error::MesabotError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and lifecycle for a collaborator adapter.
///
/// The transport, helpdesk, dialogue, and storage traits all extend
/// this one; the doctor command and the serve shutdown path work
/// against it without knowing the concrete adapter.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Probe the collaborator. Expected to be cheap; the doctor command
    /// calls it on demand.
    async fn health_check(&self) -> Result<HealthStatus, MesabotError>;

    /// Release held resources. Called once during shutdown.
    async fn shutdown(&self) -> Result<(), MesabotError>;
}
