// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact rows, one per sender phone number.

use mesabot_core::MesabotError;
use rusqlite::params;

use crate::database::Database;

/// Return the contact row id for `phone`, inserting the row on first
/// sight. Every call refreshes `last_interaction`.
pub async fn get_or_create(db: &Database, phone: &str) -> Result<i64, MesabotError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (phone, last_interaction)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT (phone) DO UPDATE
                 SET last_interaction = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![phone],
            )?;
            let id: i64 = conn.query_row(
                "SELECT id FROM contacts WHERE phone = ?1",
                params![phone],
                |row| row.get(0),
            )?;
            Ok(id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of contact rows.
pub async fn count(db: &Database) -> Result<i64, MesabotError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
