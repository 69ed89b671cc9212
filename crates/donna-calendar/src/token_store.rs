// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user OAuth2 credential lifecycle over the storage adapter.
//!
//! [`TokenStore`] owns the refresh state machine: it hands out access tokens
//! that are guaranteed to outlive the configured margin, refreshing and
//! persisting behind the scenes, and discards credentials the provider has
//! revoked so the user is cleanly back in the "not connected" state.

use std::sync::Arc;

use chrono::{Duration, Utc};
use donna_config::model::GoogleConfig;
use donna_core::types::Credential;
use donna_core::{DonnaError, StorageAdapter};
use tracing::{debug, info, warn};

use crate::oauth::OAuthClient;
use crate::types::TokenResponse;

/// Manages calendar credentials for all users.
pub struct TokenStore {
    storage: Arc<dyn StorageAdapter>,
    oauth: OAuthClient,
    refresh_margin: Duration,
}

impl TokenStore {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        oauth: OAuthClient,
        config: &GoogleConfig,
    ) -> Self {
        Self {
            storage,
            oauth,
            refresh_margin: Duration::seconds(config.refresh_margin_secs as i64),
        }
    }

    /// The consent URL the user opens to authorize calendar access.
    pub fn consent_url(&self) -> String {
        self.oauth.consent_url()
    }

    /// Completes the connect flow: exchanges the pasted authorization code
    /// and persists the resulting credential.
    pub async fn connect(&self, user_id: &str, code: &str) -> Result<(), DonnaError> {
        let token = self.oauth.exchange_code(code).await?;
        let cred = credential_from(token, None);
        if cred.refresh_token.is_none() {
            warn!(user_id, "connect flow yielded no refresh token");
        }
        self.storage.put_credential(user_id, &cred).await?;
        info!(user_id, "calendar connected");
        Ok(())
    }

    /// Removes the user's credential. Disconnecting when not connected is a no-op.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), DonnaError> {
        self.storage.delete_credential(user_id).await?;
        info!(user_id, "calendar disconnected");
        Ok(())
    }

    /// The stored credential as-is, without triggering a refresh.
    pub async fn status(&self, user_id: &str) -> Result<Option<Credential>, DonnaError> {
        self.storage.get_credential(user_id).await
    }

    /// Returns a credential whose access token is valid for at least the
    /// configured margin, refreshing and persisting if needed.
    ///
    /// `Ok(None)` means the user is not connected, including the case where
    /// a stale credential could not be refreshed and was discarded. Transient
    /// refresh failures propagate as errors so the caller's recovery policy
    /// can retry.
    pub async fn get_valid(&self, user_id: &str) -> Result<Option<Credential>, DonnaError> {
        let Some(cred) = self.storage.get_credential(user_id).await? else {
            return Ok(None);
        };
        if !cred.expires_within(self.refresh_margin) {
            return Ok(Some(cred));
        }
        self.refresh_and_persist(user_id, cred).await
    }

    /// Forces a refresh regardless of expiry, for recovery after the calendar
    /// API rejects a token that looked fresh.
    pub async fn force_refresh(&self, user_id: &str) -> Result<Option<Credential>, DonnaError> {
        let Some(cred) = self.storage.get_credential(user_id).await? else {
            return Ok(None);
        };
        self.refresh_and_persist(user_id, cred).await
    }

    async fn refresh_and_persist(
        &self,
        user_id: &str,
        cred: Credential,
    ) -> Result<Option<Credential>, DonnaError> {
        let Some(refresh_token) = cred.refresh_token.clone() else {
            warn!(user_id, "credential expiring with no refresh token, discarding");
            self.storage.delete_credential(user_id).await?;
            return Ok(None);
        };

        match self.oauth.refresh(&refresh_token).await {
            Ok(token) => {
                debug!(user_id, "access token refreshed");
                let refreshed = credential_from(token, Some(refresh_token));
                self.storage.put_credential(user_id, &refreshed).await?;
                Ok(Some(refreshed))
            }
            Err(DonnaError::Auth { message }) => {
                warn!(user_id, %message, "refresh token revoked, discarding credential");
                self.storage.delete_credential(user_id).await?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Builds a credential from a token response.
///
/// The refresh grant usually omits `refresh_token`; in that case the
/// previous one is carried over.
fn credential_from(token: TokenResponse, previous_refresh: Option<String>) -> Credential {
    Credential {
        access_token: token.access_token,
        refresh_token: token.refresh_token.or(previous_refresh),
        expires_at: token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
        scope: token.scope,
    }
}
