// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message reads, inserts, and first-writer-wins translation updates.

use parley_core::{AttachOutcome, ParleyError};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::StoredMessage;

const COLUMNS: &str = "chat_id, seq, sender_id, text, timestamp, translation";

fn from_row(row: &Row<'_>) -> Result<StoredMessage, rusqlite::Error> {
    Ok(StoredMessage {
        chat_id: row.get(0)?,
        seq: row.get(1)?,
        sender_id: row.get(2)?,
        text: row.get(3)?,
        timestamp: row.get(4)?,
        translation: row.get(5)?,
    })
}

/// Insert messages in one transaction.
pub async fn insert_messages(db: &Database, messages: &[StoredMessage]) -> Result<(), ParleyError> {
    let messages = messages.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO messages (chat_id, seq, sender_id, text, timestamp, translation)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for msg in &messages {
                    stmt.execute(params![
                        msg.chat_id,
                        msg.seq,
                        msg.sender_id,
                        msg.text,
                        msg.timestamp,
                        msg.translation,
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

/// Get a single message.
pub async fn get_message(
    db: &Database,
    chat_id: &str,
    seq: i64,
) -> Result<Option<StoredMessage>, ParleyError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE chat_id = ?1 AND seq = ?2"),
                params![chat_id, seq],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get up to `limit` of a chat's messages, newest first.
pub async fn recent_messages(
    db: &Database,
    chat_id: &str,
    limit: usize,
) -> Result<Vec<StoredMessage>, ParleyError> {
    let chat_id = chat_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE chat_id = ?1
                 ORDER BY seq DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![chat_id, limit], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Get up to `limit` of the messages before `seq` in a chat, newest first.
pub async fn messages_before(
    db: &Database,
    chat_id: &str,
    seq: i64,
    limit: usize,
) -> Result<Vec<StoredMessage>, ParleyError> {
    let chat_id = chat_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE chat_id = ?1 AND seq < ?2
                 ORDER BY seq DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![chat_id, seq, limit], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Attach a translation unless one is already present.
///
/// The update and the follow-up existence check run in a single call on the
/// writer thread, so no other write can interleave between them.
pub async fn attach_translation(
    db: &Database,
    chat_id: &str,
    seq: i64,
    translation: &str,
) -> Result<AttachOutcome, ParleyError> {
    let chat_id = chat_id.to_string();
    let translation = translation.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET translation = ?3,
                     translated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE chat_id = ?1 AND seq = ?2 AND translation IS NULL",
                params![chat_id, seq, translation],
            )?;
            if changed > 0 {
                return Ok(AttachOutcome::Attached);
            }
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE chat_id = ?1 AND seq = ?2)",
                params![chat_id, seq],
                |row| row.get(0),
            )?;
            Ok(if exists {
                AttachOutcome::AlreadyTranslated
            } else {
                AttachOutcome::Missing
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a message. Returns whether a row was removed.
pub async fn delete_message(db: &Database, chat_id: &str, seq: i64) -> Result<bool, ParleyError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM messages WHERE chat_id = ?1 AND seq = ?2",
                params![chat_id, seq],
            )?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}
