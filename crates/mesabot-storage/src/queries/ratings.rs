// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service rating rows.

use mesabot_core::MesabotError;
use rusqlite::params;

use crate::database::Database;
use crate::models::RatingRecord;

/// Record one rating. `ticket_id` is absent for ratings collected at the
/// end of a listing session.
pub async fn save(
    db: &Database,
    phone: &str,
    ticket_id: Option<u64>,
    score: u8,
    label: &str,
) -> Result<(), MesabotError> {
    let phone = phone.to_string();
    let ticket_id = ticket_id.map(|id| id as i64);
    let label = label.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ticket_ratings (phone, ticket_id, score, label)
                 VALUES (?1, ?2, ?3, ?4)",
                params![phone, ticket_id, score, label],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Ratings for one sender, most recent first.
pub async fn for_phone(db: &Database, phone: &str) -> Result<Vec<RatingRecord>, MesabotError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone, ticket_id, score, label, created_at
                 FROM ticket_ratings WHERE phone = ?1 ORDER BY id DESC",
            )?;
            let rows = stmt.query_map(params![phone], |row| {
                Ok(RatingRecord {
                    id: row.get(0)?,
                    phone: row.get(1)?,
                    ticket_id: row.get(2)?,
                    score: row.get(3)?,
                    label: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut ratings = Vec::new();
            for row in rows {
                ratings.push(row?);
            }
            Ok(ratings)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of rating rows.
pub async fn count(db: &Database) -> Result<i64, MesabotError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM ticket_ratings", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
