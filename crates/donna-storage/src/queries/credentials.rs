// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar credential operations.
//!
//! Expiry timestamps are stored as RFC3339 text and parsed back at the
//! boundary; a row that fails to parse is a storage error, not a silent
//! `None`.

use chrono::{DateTime, Utc};
use rusqlite::params;

use donna_core::DonnaError;
use donna_core::types::Credential;

use crate::database::Database;

/// Store or replace the user's credential.
pub async fn put_credential(
    db: &Database,
    user_id: &str,
    cred: &Credential,
) -> Result<(), DonnaError> {
    let user_id = user_id.to_string();
    let cred = cred.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO credentials (user_id, access_token, refresh_token, expires_at, scope, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (user_id) DO UPDATE SET
                     access_token = excluded.access_token,
                     refresh_token = excluded.refresh_token,
                     expires_at = excluded.expires_at,
                     scope = excluded.scope,
                     updated_at = excluded.updated_at",
                params![
                    user_id,
                    cred.access_token,
                    cred.refresh_token,
                    cred.expires_at.map(|t| t.to_rfc3339()),
                    cred.scope,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the user's credential, if any.
pub async fn get_credential(
    db: &Database,
    user_id: &str,
) -> Result<Option<Credential>, DonnaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT access_token, refresh_token, expires_at, scope
                 FROM credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let expires_at: Option<String> = row.get(2)?;
                    let expires_at = match expires_at {
                        Some(s) => Some(
                            DateTime::parse_from_rfc3339(&s)
                                .map(|t| t.with_timezone(&Utc))
                                .map_err(|e| {
                                    rusqlite::Error::FromSqlConversionFailure(
                                        2,
                                        rusqlite::types::Type::Text,
                                        Box::new(e),
                                    )
                                })?,
                        ),
                        None => None,
                    };
                    Ok(Credential {
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        expires_at,
                        scope: row.get(3)?,
                    })
                },
            );
            match result {
                Ok(cred) => Ok(Some(cred)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the user's credential. Missing rows are not an error.
pub async fn delete_credential(db: &Database, user_id: &str) -> Result<(), DonnaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM credentials WHERE user_id = ?1", params![user_id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
