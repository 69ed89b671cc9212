// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registry operations.

use rusqlite::params;

use donna_core::DonnaError;
use donna_core::types::UserRecord;

use crate::database::Database;

/// Insert or update a user record. `created_at` is preserved on update.
pub async fn upsert_user(db: &Database, user: &UserRecord) -> Result<(), DonnaError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (user_id, username, first_name, last_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (user_id) DO UPDATE SET
                     username = excluded.username,
                     first_name = excluded.first_name,
                     last_name = excluded.last_name,
                     updated_at = excluded.updated_at",
                params![
                    user.user_id,
                    user.username,
                    user.first_name,
                    user.last_name,
                    user.created_at,
                    user.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a user record by id.
pub async fn get_user(db: &Database, user_id: &str) -> Result<Option<UserRecord>, DonnaError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT user_id, username, first_name, last_name, created_at, updated_at
                 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserRecord {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Total number of registered users.
pub async fn count_users(db: &Database) -> Result<i64, DonnaError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
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
        let db_path = dir.path().join("users.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn make_user(id: &str) -> UserRecord {
        UserRecord {
            user_id: id.to_string(),
            username: Some("ada".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            updated_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_get_user() {
        let (db, _dir) = setup_db().await;

        upsert_user(&db, &make_user("42")).await.unwrap();
        let user = get_user(&db, "42").await.unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("ada"));

        assert!(get_user(&db, "999").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_preserves_created_at() {
        let (db, _dir) = setup_db().await;

        upsert_user(&db, &make_user("42")).await.unwrap();

        let mut updated = make_user("42");
        updated.username = Some("ada2".to_string());
        updated.created_at = "2026-02-02T00:00:00+00:00".to_string();
        updated.updated_at = "2026-02-02T00:00:00+00:00".to_string();
        upsert_user(&db, &updated).await.unwrap();

        let user = get_user(&db, "42").await.unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("ada2"));
        assert_eq!(user.created_at, "2026-01-01T00:00:00+00:00");
        assert_eq!(user.updated_at, "2026-02-02T00:00:00+00:00");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn count_users_counts_distinct_ids() {
        let (db, _dir) = setup_db().await;
        assert_eq!(count_users(&db).await.unwrap(), 0);

        upsert_user(&db, &make_user("1")).await.unwrap();
        upsert_user(&db, &make_user("2")).await.unwrap();
        upsert_user(&db, &make_user("1")).await.unwrap();
        assert_eq!(count_users(&db).await.unwrap(), 2);
        db.close().await.unwrap();
    }
}
