// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands handled outside the model loop.
//!
//! Commands are deterministic plumbing (connect, status, disconnect) and
//! never reach the model. Anything that is not a recognized command falls
//! through to the session engine as a normal conversational turn.

use std::sync::Arc;

use donna_calendar::TokenStore;
use donna_core::types::ToolCallRequest;
use donna_core::StorageAdapter;
use donna_tools::ToolRegistry;
use tracing::warn;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/connect_calendar` without a code starts the flow; with a code it
    /// completes the exchange.
    ConnectCalendar(Option<String>),
    CalendarStatus,
    Today,
    DisconnectCalendar,
    /// A slash command Donna does not know.
    Unknown(String),
}

const HELP_TEXT: &str = "Here's what I can do:\n\
    /connect_calendar - connect your Google Calendar\n\
    /calendar_status - check the calendar connection\n\
    /today - list today's events\n\
    /disconnect_calendar - remove the calendar connection\n\
    /help - show this message\n\
    \n\
    Or just ask me in plain language, e.g. \"what's on my schedule this week?\"";

/// Parses a message as a slash command.
///
/// Returns `None` for ordinary text, which goes to the session engine.
/// Accepts the `/command@BotName` form Telegram uses in some clients.
pub fn parse(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let mut parts = trimmed.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head);
    let arg = parts.next().map(String::from);

    let command = match name {
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/connect_calendar" => Command::ConnectCalendar(arg),
        "/calendar_status" => Command::CalendarStatus,
        "/today" => Command::Today,
        "/disconnect_calendar" => Command::DisconnectCalendar,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

/// Executes slash commands. Never fails; failures become reply text.
pub struct CommandHandler {
    storage: Arc<dyn StorageAdapter>,
    tokens: Arc<TokenStore>,
    tools: Arc<ToolRegistry>,
    agent_name: String,
}

impl CommandHandler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        tokens: Arc<TokenStore>,
        tools: Arc<ToolRegistry>,
        agent_name: String,
    ) -> Self {
        Self {
            storage,
            tokens,
            tools,
            agent_name,
        }
    }

    pub async fn handle(&self, user_id: &str, command: Command) -> String {
        match command {
            Command::Start => {
                let mut greeting = format!(
                    "Hi! I'm {}, your calendar assistant. Connect your Google Calendar \
                     with /connect_calendar and then just ask about your schedule. \
                     Send /help for the full command list.",
                    self.agent_name
                );
                match self.storage.count_users().await {
                    Ok(count) => {
                        greeting.push_str(&format!("\n\nYou're one of {count} people I help."));
                    }
                    Err(e) => warn!(user_id, error = %e, "user count unavailable"),
                }
                greeting
            }
            Command::Help => HELP_TEXT.to_string(),
            Command::ConnectCalendar(None) => format!(
                "Open this link, grant calendar access, and send me the code you \
                 receive as:\n/connect_calendar <code>\n\n{}",
                self.tokens.consent_url()
            ),
            Command::ConnectCalendar(Some(code)) => {
                match self.tokens.connect(user_id, &code).await {
                    Ok(()) => "Calendar connected! Try /today or just ask about your schedule."
                        .to_string(),
                    Err(e) => {
                        warn!(user_id, error = %e, "calendar connect failed");
                        format!("Connection failed: {e}. Get a fresh code with /connect_calendar.")
                    }
                }
            }
            Command::CalendarStatus => match self.tokens.status(user_id).await {
                Ok(Some(cred)) => match cred.expires_at {
                    Some(expiry) => format!(
                        "Calendar connected. Access token valid until {}.",
                        expiry.format("%Y-%m-%d %H:%M UTC")
                    ),
                    None => "Calendar connected.".to_string(),
                },
                Ok(None) => {
                    "Calendar not connected. Use /connect_calendar to begin.".to_string()
                }
                Err(e) => {
                    warn!(user_id, error = %e, "calendar status check failed");
                    format!("Couldn't check the calendar connection: {e}")
                }
            },
            Command::Today => {
                let request = ToolCallRequest {
                    call_id: "command-today".to_string(),
                    name: "get_today_events".to_string(),
                    arguments: serde_json::json!({}),
                };
                self.tools.execute(user_id, &request).await.content
            }
            Command::DisconnectCalendar => match self.tokens.disconnect(user_id).await {
                Ok(()) => "Calendar disconnected.".to_string(),
                Err(e) => {
                    warn!(user_id, error = %e, "calendar disconnect failed");
                    format!("Couldn't disconnect the calendar: {e}")
                }
            },
            Command::Unknown(name) => {
                format!("I don't know {name}. Send /help for the command list.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_text_is_not_a_command() {
        assert_eq!(parse("what's on today?"), None);
        assert_eq!(parse("meet at 5/6"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn known_commands_parse() {
        assert_eq!(parse("/start"), Some(Command::Start));
        assert_eq!(parse("/help"), Some(Command::Help));
        assert_eq!(parse("/today"), Some(Command::Today));
        assert_eq!(parse("/calendar_status"), Some(Command::CalendarStatus));
        assert_eq!(
            parse("/disconnect_calendar"),
            Some(Command::DisconnectCalendar)
        );
    }

    #[test]
    fn connect_calendar_takes_an_optional_code() {
        assert_eq!(
            parse("/connect_calendar"),
            Some(Command::ConnectCalendar(None))
        );
        assert_eq!(
            parse("/connect_calendar 4/0AbCdEf"),
            Some(Command::ConnectCalendar(Some("4/0AbCdEf".into())))
        );
    }

    #[test]
    fn bot_suffix_form_is_accepted() {
        assert_eq!(parse("/today@DonnaBot"), Some(Command::Today));
    }

    #[test]
    fn unknown_slash_commands_are_flagged() {
        assert_eq!(
            parse("/frobnicate now"),
            Some(Command::Unknown("/frobnicate".into()))
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse("  /help  "), Some(Command::Help));
    }
}
