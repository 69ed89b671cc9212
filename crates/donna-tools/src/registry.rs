// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool registry: what the model can call, and how calls are executed.
//!
//! Execution never raises. Every failure path, from bad arguments to an
//! exhausted retry budget, is folded into an error [`ToolOutcome`] that goes
//! back to the model as a tool result, so one bad tool call cannot sink the
//! surrounding conversation turn.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use donna_calendar::types::{EventDraft, EventTime};
use donna_calendar::{CalendarClient, TokenStore};
use donna_config::model::SessionConfig;
use donna_core::recovery::{classify, RecoveryAction, RecoveryPolicy};
use donna_core::types::{ToolCallRequest, ToolOutcome, ToolSpec};
use donna_core::DonnaError;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::format::{format_event_line, format_events};

/// Tool result sent to the model when the user has no calendar credential.
pub const NOT_CONNECTED_MESSAGE: &str =
    "Calendar not connected. Please use /connect_calendar to connect your Google Calendar.";

/// Registry of calendar tools exposed to the model.
pub struct ToolRegistry {
    calendar: CalendarClient,
    tokens: Arc<TokenStore>,
    policy: RecoveryPolicy,
    call_timeout: Duration,
}

/// A parsed, validated tool operation ready to run against the calendar.
enum Op {
    Listing { days: i64 },
    Creation { draft: EventDraft },
}

impl ToolRegistry {
    pub fn new(calendar: CalendarClient, tokens: Arc<TokenStore>, config: &SessionConfig) -> Self {
        Self {
            calendar,
            tokens,
            policy: RecoveryPolicy {
                max_retries: config.max_retries,
                ..RecoveryPolicy::default()
            },
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }

    /// Tool definitions advertised to the model on every request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "get_today_events".into(),
                description: "Get the user's calendar events for today.".into(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }),
            },
            ToolSpec {
                name: "get_week_events".into(),
                description: "Get the user's calendar events for the next seven days.".into(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }),
            },
            ToolSpec {
                name: "create_event".into(),
                description: "Create an event in the user's calendar.".into(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "summary": {
                            "type": "string",
                            "description": "Event title"
                        },
                        "start": {
                            "type": "string",
                            "description": "Start as an RFC 3339 timestamp, or YYYY-MM-DD for an all-day event"
                        },
                        "end": {
                            "type": "string",
                            "description": "End as an RFC 3339 timestamp, or YYYY-MM-DD for an all-day event"
                        },
                        "location": {
                            "type": "string",
                            "description": "Optional location"
                        },
                        "description": {
                            "type": "string",
                            "description": "Optional longer description"
                        }
                    },
                    "required": ["summary", "start", "end"],
                    "additionalProperties": false
                }),
            },
        ]
    }

    /// Executes one tool call for `user_id`.
    pub async fn execute(&self, user_id: &str, request: &ToolCallRequest) -> ToolOutcome {
        debug!(user_id, tool = %request.name, call_id = %request.call_id, "executing tool call");
        let op = match request.name.as_str() {
            "get_today_events" => match parse_args::<EmptyArgs>(&request.arguments) {
                Ok(_) => Op::Listing { days: 1 },
                Err(msg) => return invalid_args(&request.name, &msg),
            },
            "get_week_events" => match parse_args::<EmptyArgs>(&request.arguments) {
                Ok(_) => Op::Listing { days: 7 },
                Err(msg) => return invalid_args(&request.name, &msg),
            },
            "create_event" => {
                let args = match parse_args::<CreateEventArgs>(&request.arguments) {
                    Ok(args) => args,
                    Err(msg) => return invalid_args(&request.name, &msg),
                };
                match args.into_draft() {
                    Ok(draft) => Op::Creation { draft },
                    Err(msg) => return invalid_args(&request.name, &msg),
                }
            }
            other => return ToolOutcome::error(format!("Unknown tool: {other}")),
        };
        self.run_with_recovery(user_id, op).await
    }

    /// Runs an operation under the recovery policy: transient failures back
    /// off and retry, a rejected access token triggers one forced refresh,
    /// and anything else degrades to an error outcome.
    async fn run_with_recovery(&self, user_id: &str, op: Op) -> ToolOutcome {
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::time::timeout(self.call_timeout, self.attempt(user_id, &op)).await;
            let err = match result {
                Ok(Ok(Some(content))) => return ToolOutcome::ok(content),
                Ok(Ok(None)) => return ToolOutcome::error(NOT_CONNECTED_MESSAGE),
                Ok(Err(err)) => err,
                Err(_) => DonnaError::Timeout {
                    duration: self.call_timeout,
                },
            };
            match self.policy.decide(classify(&err), attempt) {
                RecoveryAction::Retry { delay } => {
                    warn!(user_id, attempt, error = %err, "tool call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                RecoveryAction::RefreshAndRetry => {
                    warn!(user_id, error = %err, "access token rejected, forcing refresh");
                    match self.tokens.force_refresh(user_id).await {
                        Ok(Some(_)) => {}
                        Ok(None) => return ToolOutcome::error(NOT_CONNECTED_MESSAGE),
                        Err(refresh_err) => {
                            return ToolOutcome::error(format!(
                                "Calendar request failed: {refresh_err}"
                            ));
                        }
                    }
                }
                RecoveryAction::GiveUp => {
                    warn!(user_id, attempt, error = %err, "tool call failed, giving up");
                    return ToolOutcome::error(format!("Calendar request failed: {err}"));
                }
            }
            attempt += 1;
        }
    }

    /// One attempt. `Ok(None)` means the user has no usable credential.
    async fn attempt(&self, user_id: &str, op: &Op) -> Result<Option<String>, DonnaError> {
        let Some(cred) = self.tokens.get_valid(user_id).await? else {
            return Ok(None);
        };
        match op {
            Op::Listing { days } => {
                let (min, max) = local_window(*days);
                let events = self
                    .calendar
                    .list_events(&cred.access_token, min, max)
                    .await?;
                Ok(Some(format_events(&events)))
            }
            Op::Creation { draft } => {
                let event = self.calendar.create_event(&cred.access_token, draft).await?;
                Ok(Some(format!("Event created:\n{}", format_event_line(&event))))
            }
        }
    }
}

/// `[local midnight, local midnight + days)` expressed in UTC.
fn local_window(days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|t| t.and_local_timezone(Local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight exists in every real offset; worst case the window
        // starts now instead of at midnight.
        .unwrap_or_else(Utc::now);
    (start, start + chrono::Duration::days(days))
}

fn parse_args<T: for<'de> Deserialize<'de> + Default>(
    arguments: &serde_json::Value,
) -> Result<T, String> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(arguments.clone()).map_err(|e| e.to_string())
}

fn invalid_args(tool: &str, message: &str) -> ToolOutcome {
    ToolOutcome::error(format!("Invalid arguments for {tool}: {message}"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyArgs {}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateEventArgs {
    summary: String,
    start: String,
    end: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl CreateEventArgs {
    fn into_draft(self) -> Result<EventDraft, String> {
        if self.summary.trim().is_empty() {
            return Err("summary must not be empty".into());
        }
        let start = parse_event_time(&self.start)?;
        let end = parse_event_time(&self.end)?;
        match (&start.date_time, &end.date_time) {
            (Some(s), Some(e)) if e <= s => {
                return Err("end must be after start".into());
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err("start and end must both be timestamps or both be dates".into());
            }
            _ => {}
        }
        Ok(EventDraft {
            summary: self.summary,
            start,
            end,
            location: self.location,
            description: self.description,
        })
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` all-day date.
fn parse_event_time(value: &str) -> Result<EventTime, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(EventTime::at(instant));
    }
    if let Ok(day) = value.parse::<chrono::NaiveDate>() {
        return Ok(EventTime::on(day));
    }
    Err(format!(
        "'{value}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date"
    ))
}
