// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only turn log operations.
//!
//! Sequence numbers are assigned inside the insert transaction from
//! `MAX(seq)`, so they are strictly increasing and gap-free per user even
//! across batches, and a paired assistant/tool batch can never be torn.

use std::str::FromStr;

use rusqlite::params;

use donna_core::DonnaError;
use donna_core::types::{Turn, TurnRole};

use crate::database::Database;

/// Append a batch of turns for one user atomically, assigning sequence numbers.
///
/// All turns in the batch must belong to `user_id`; the stored `user_id`
/// column is taken from the argument, not the individual turns.
pub async fn append_turns(db: &Database, user_id: &str, turns: &[Turn]) -> Result<(), DonnaError> {
    if turns.is_empty() {
        return Ok(());
    }
    let user_id = user_id.to_string();
    let turns = turns.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let next_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM turns WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            for (offset, turn) in turns.iter().enumerate() {
                tx.execute(
                    "INSERT INTO turns
                        (id, user_id, seq, role, content, tool_name, tool_args, tool_call_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        turn.id,
                        user_id,
                        next_seq + offset as i64,
                        turn.role.to_string(),
                        turn.content,
                        turn.tool_name,
                        turn.tool_args,
                        turn.tool_call_id,
                        turn.created_at,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read the most recent `limit` turns for a user, in chronological order.
pub async fn recent_turns(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<Turn>, DonnaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, seq, role, content, tool_name, tool_args, tool_call_id, created_at
                 FROM turns WHERE user_id = ?1
                 ORDER BY seq DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit as i64], |row| {
                let role_str: String = row.get(3)?;
                let role = TurnRole::from_str(&role_str).map_err(|_| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        format!("unknown turn role `{role_str}`").into(),
                    )
                })?;
                Ok(Turn {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    seq: row.get(2)?,
                    role,
                    content: row.get(4)?,
                    tool_name: row.get(5)?,
                    tool_args: row.get(6)?,
                    tool_call_id: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?;
            let mut turns = Vec::new();
            for row in rows {
                turns.push(row?);
            }
            // Fetched newest-first for the LIMIT; callers want chronological.
            turns.reverse();
            Ok(turns)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
