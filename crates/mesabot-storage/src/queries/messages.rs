// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation transcript rows.

use mesabot_core::MesabotError;
use mesabot_core::types::Direction;
use rusqlite::params;

use crate::database::Database;
use crate::models::StoredMessage;

/// Append one message to the transcript. `created_at` is assigned by the
/// database clock.
pub async fn save(
    db: &Database,
    phone: &str,
    direction: Direction,
    body: &str,
) -> Result<(), MesabotError> {
    let phone = phone.to_string();
    let direction = direction.to_string();
    let body = body.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (phone, direction, body) VALUES (?1, ?2, ?3)",
                params![phone, direction, body],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transcript for one sender in chronological order.
///
/// Ordered by row id rather than `created_at`; consecutive writes can land
/// in the same millisecond.
pub async fn for_phone(
    db: &Database,
    phone: &str,
    limit: Option<i64>,
) -> Result<Vec<StoredMessage>, MesabotError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, phone, direction, body, created_at
                         FROM messages WHERE phone = ?1
                         ORDER BY id ASC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![phone, lim], |row| {
                        Ok(StoredMessage {
                            id: row.get(0)?,
                            phone: row.get(1)?,
                            direction: row.get(2)?,
                            body: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    })?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, phone, direction, body, created_at
                         FROM messages WHERE phone = ?1
                         ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![phone], |row| {
                        Ok(StoredMessage {
                            id: row.get(0)?,
                            phone: row.get(1)?,
                            direction: row.get(2)?,
                            body: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    })?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of transcript rows.
pub async fn count(db: &Database) -> Result<i64, MesabotError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
