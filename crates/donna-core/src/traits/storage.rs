// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::DonnaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credential, Turn, UserRecord};

/// Adapter for storage and persistence backends.
///
/// Storage adapters own the user registry, the per-user credential rows,
/// and the append-only conversation turn log. Rows for distinct users are
/// independent; no cross-user transactions are required.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DonnaError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), DonnaError>;

    // --- Users ---

    /// Inserts or updates a user record, preserving `created_at` on update.
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), DonnaError>;

    /// Fetches a user record by id.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, DonnaError>;

    /// Total number of registered users.
    async fn count_users(&self) -> Result<i64, DonnaError>;

    // --- Turns ---

    /// Appends a batch of turns for one user atomically, assigning strictly
    /// increasing, gap-free sequence numbers.
    ///
    /// All turns in the batch must belong to `user_id`. Either the whole
    /// batch is written or none of it is, so a paired assistant/tool write
    /// can never be torn.
    async fn append_turns(&self, user_id: &str, turns: &[Turn]) -> Result<(), DonnaError>;

    /// Reads the bounded trailing window: the most recent `limit` turns for
    /// `user_id`, returned in chronological (ascending seq) order.
    async fn recent_turns(&self, user_id: &str, limit: usize) -> Result<Vec<Turn>, DonnaError>;

    // --- Credentials ---

    /// Stores or replaces the user's calendar credential.
    async fn put_credential(&self, user_id: &str, cred: &Credential) -> Result<(), DonnaError>;

    /// Fetches the user's calendar credential, if any.
    async fn get_credential(&self, user_id: &str) -> Result<Option<Credential>, DonnaError>;

    /// Deletes the user's calendar credential. Deleting a missing row is not
    /// an error.
    async fn delete_credential(&self, user_id: &str) -> Result<(), DonnaError>;
}
