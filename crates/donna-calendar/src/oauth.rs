// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth2 client for the Google token endpoint.
//!
//! Handles the authorization-code exchange and the refresh grant. Grant
//! rejections (revoked or expired refresh tokens) surface as
//! [`DonnaError::Auth`] so the token store can discard the credential;
//! everything else carries the HTTP status for the recovery policy.

use std::time::Duration;

use donna_config::model::GoogleConfig;
use donna_core::DonnaError;
use tracing::debug;

use crate::types::{TokenErrorResponse, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google OAuth2 consent page.
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Client for the OAuth2 authorization-code and refresh grants.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    token_url: String,
}

impl OAuthClient {
    /// Builds an OAuth client from configuration.
    ///
    /// Returns a config error when the client id/secret pair is absent.
    pub fn new(config: &GoogleConfig) -> Result<Self, DonnaError> {
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| DonnaError::Config("google.client_id not set".into()))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| DonnaError::Config("google.client_secret not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DonnaError::Calendar {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            client_id,
            client_secret,
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            token_url: TOKEN_URL.to_string(),
        })
    }

    /// Overrides the token endpoint URL (for testing with wiremock).
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    /// The consent page URL the user opens to authorize calendar access.
    ///
    /// Requests offline access so the exchange yields a refresh token.
    pub fn consent_url(&self) -> String {
        let url = reqwest::Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", &self.scopes.join(" ")),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        );
        match url {
            Ok(url) => url.to_string(),
            // AUTH_URL is a valid base; parse_with_params cannot fail on it.
            Err(_) => AUTH_URL.to_string(),
        }
    }

    /// Exchanges an authorization code for an access/refresh token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, DonnaError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ];
        self.token_request(&params).await
    }

    /// Obtains a fresh access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, DonnaError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];
        self.token_request(&params).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, DonnaError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| DonnaError::Calendar {
                message: format!("token endpoint request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "token endpoint response received");

        if status.is_success() {
            return response
                .json::<TokenResponse>()
                .await
                .map_err(|e| DonnaError::Calendar {
                    message: format!("failed to parse token response: {e}"),
                    status: None,
                    source: Some(Box::new(e)),
                });
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
            // Grant rejections mean the credential is dead, not that the
            // request should be retried.
            if matches!(
                err.error.as_str(),
                "invalid_grant" | "invalid_client" | "unauthorized_client"
            ) {
                return Err(DonnaError::Auth {
                    message: format!(
                        "token grant rejected ({}): {}",
                        err.error,
                        err.error_description.unwrap_or_default()
                    ),
                });
            }
            return Err(DonnaError::Calendar {
                message: format!(
                    "token endpoint error ({}): {}",
                    err.error,
                    err.error_description.unwrap_or_default()
                ),
                status: Some(status.as_u16()),
                source: None,
            });
        }
        Err(DonnaError::Calendar {
            message: format!("token endpoint returned {status}: {body}"),
            status: Some(status.as_u16()),
            source: None,
        })
    }
}
