// SPDX-FileCopyrightText: 2026 Mesabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted session mirror, one row per sender.
//!
//! The in-memory session table drives routing; these rows are the durable
//! copy written after each handled message and read back on hydration.

use mesabot_core::MesabotError;
use mesabot_core::types::SessionMirror;
use rusqlite::params;

use crate::database::Database;

/// Read the mirror row for a sender.
pub async fn get(db: &Database, phone: &str) -> Result<Option<SessionMirror>, MesabotError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT current_node, last_input, last_bot_message, last_interaction
                 FROM bot_sessions WHERE phone = ?1",
                params![phone],
                |row| {
                    Ok(SessionMirror {
                        node: row.get(0)?,
                        last_input: row.get(1)?,
                        last_bot_message: row.get(2)?,
                        last_interaction: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(mirror) => Ok(Some(mirror)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or replace the mirror row for a sender.
pub async fn upsert(
    db: &Database,
    phone: &str,
    mirror: &SessionMirror,
) -> Result<(), MesabotError> {
    let phone = phone.to_string();
    let mirror = mirror.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_sessions
                     (phone, current_node, last_input, last_bot_message, last_interaction)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (phone) DO UPDATE SET
                     current_node = excluded.current_node,
                     last_input = excluded.last_input,
                     last_bot_message = excluded.last_bot_message,
                     last_interaction = excluded.last_interaction,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    phone,
                    mirror.node,
                    mirror.last_input,
                    mirror.last_bot_message,
                    mirror.last_interaction,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of mirror rows.
pub async fn count(db: &Database) -> Result<i64, MesabotError> {
    db.connection()
        .call(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM bot_sessions", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn make_mirror(node: &str) -> SessionMirror {
        SessionMirror {
            node: node.to_string(),
            last_input: Some("hola".to_string()),
            last_bot_message: Some("¿En qué puedo ayudarte?".to_string()),
            last_interaction: "2026-02-01T10:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_get_roundtrips() {
        let (db, _dir) = setup_db().await;
        let mirror = make_mirror("esperando_categoria");

        upsert(&db, "549110001", &mirror).await.unwrap();
        let read = get(&db, "549110001").await.unwrap();
        assert_eq!(read, Some(mirror));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_unknown_phone_returns_none() {
        let (db, _dir) = setup_db().await;
        let read = get(&db, "549110001").await.unwrap();
        assert!(read.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let (db, _dir) = setup_db().await;

        upsert(&db, "549110001", &make_mirror("nodo_saludo")).await.unwrap();
        upsert(&db, "549110001", &make_mirror("nodo_confirmar_envio"))
            .await
            .unwrap();

        let read = get(&db, "549110001").await.unwrap().unwrap();
        assert_eq!(read.node, "nodo_confirmar_envio");
        assert_eq!(count(&db).await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mirrors_are_keyed_by_phone() {
        let (db, _dir) = setup_db().await;

        upsert(&db, "549110001", &make_mirror("esperando_id_consulta"))
            .await
            .unwrap();
        upsert(&db, "549110002", &make_mirror("mostrando_tickets"))
            .await
            .unwrap();

        assert_eq!(
            get(&db, "549110001").await.unwrap().unwrap().node,
            "esperando_id_consulta"
        );
        assert_eq!(
            get(&db, "549110002").await.unwrap().unwrap().node,
            "mostrando_tickets"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn null_optionals_roundtrip() {
        let (db, _dir) = setup_db().await;
        let mirror = SessionMirror {
            node: "nodo_saludo".to_string(),
            last_input: None,
            last_bot_message: None,
            last_interaction: "2026-02-01T10:00:00.000Z".to_string(),
        };

        upsert(&db, "549110001", &mirror).await.unwrap();
        let read = get(&db, "549110001").await.unwrap().unwrap();
        assert!(read.last_input.is_none());
        assert!(read.last_bot_message.is_none());

        db.close().await.unwrap();
    }
}
