// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema migrations, embedded at build time.
//!
//! The SQL files under `migrations/` are baked into the binary with
//! refinery's `embed_migrations!` and applied whenever a database is
//! opened, so a fresh file and an old file converge on the same schema.

use mesabot_core::MesabotError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply any migrations the database has not seen yet.
///
/// Refinery records what it has applied in `refinery_schema_history`,
/// so re-running against an up-to-date file is a no-op.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MesabotError> {
    embedded::migrations::runner()
        .run(conn)
        .map(|_| ())
        .map_err(|e| MesabotError::Storage {
            source: Box::new(e),
        })
}
