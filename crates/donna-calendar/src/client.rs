// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Google Calendar API.
//!
//! All operations run against the user's primary calendar. A 401 surfaces as
//! [`DonnaError::Auth`] so the caller can refresh the access token and retry;
//! other failures carry the HTTP status for the recovery policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use donna_core::DonnaError;
use tracing::debug;

use crate::types::{Event, EventDraft, EventsListResponse};

/// Base URL for the Google Calendar API.
const API_BASE_URL: &str = "https://www.googleapis.com";

/// Events endpoint path on the primary calendar.
const EVENTS_PATH: &str = "/calendar/v3/calendars/primary/events";

/// Upper bound on events returned per listing.
const MAX_RESULTS: usize = 50;

/// Client for the Google Calendar API.
#[derive(Debug, Clone)]
pub struct CalendarClient {
    client: reqwest::Client,
    base_url: String,
}

impl CalendarClient {
    pub fn new() -> Result<Self, DonnaError> {
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
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Lists events on the primary calendar within `[time_min, time_max)`,
    /// with recurring events expanded and sorted by start time.
    pub async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<Event>, DonnaError> {
        let url = format!("{}{}", self.base_url, EVENTS_PATH);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", MAX_RESULTS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| DonnaError::Calendar {
                message: format!("events list request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "events list response received");
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        let listing: EventsListResponse =
            response.json().await.map_err(|e| DonnaError::Calendar {
                message: format!("failed to parse events list: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        Ok(listing.items)
    }

    /// Inserts a new event into the primary calendar.
    pub async fn create_event(
        &self,
        access_token: &str,
        draft: &EventDraft,
    ) -> Result<Event, DonnaError> {
        let url = format!("{}{}", self.base_url, EVENTS_PATH);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(draft)
            .send()
            .await
            .map_err(|e| DonnaError::Calendar {
                message: format!("event insert request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "event insert response received");
        if !status.is_success() {
            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        response.json().await.map_err(|e| DonnaError::Calendar {
            message: format!("failed to parse created event: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }
}

fn api_error(status: reqwest::StatusCode, body: String) -> DonnaError {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return DonnaError::Auth {
            message: format!("calendar API rejected access token: {body}"),
        };
    }
    DonnaError::Calendar {
        message: format!("calendar API returned {status}: {body}"),
        status: Some(status.as_u16()),
        source: None,
    }
}
