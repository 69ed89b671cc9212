// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Calendar API and OAuth2 token endpoint wire types.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar event as returned by the Google Calendar API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    /// Opaque event id.
    pub id: String,

    /// Event title. Absent for events created without one.
    #[serde(default)]
    pub summary: Option<String>,

    /// Start of the event.
    pub start: EventTime,

    /// End of the event.
    pub end: EventTime,

    /// Free-form location.
    #[serde(default)]
    pub location: Option<String>,

    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Start or end of an event: either a timed instant or an all-day date.
///
/// Exactly one of the two fields is set in practice; the API never sends both.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventTime {
    /// RFC 3339 timestamp for timed events.
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,

    /// Calendar date for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl EventTime {
    /// A timed event boundary.
    pub fn at(instant: DateTime<FixedOffset>) -> Self {
        Self {
            date_time: Some(instant),
            date: None,
        }
    }

    /// An all-day event boundary.
    pub fn on(day: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(day),
        }
    }
}

/// A new event to be inserted into the user's primary calendar.
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response envelope for the events list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsListResponse {
    #[serde(default)]
    pub items: Vec<Event>,
}

/// Successful response from the OAuth2 token endpoint.
///
/// Both the authorization-code exchange and the refresh grant return this
/// shape; the refresh grant usually omits `refresh_token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error body returned by the OAuth2 token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}
