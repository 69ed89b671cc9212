// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Donna workspace.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the plugin registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

// --- Channel types ---

/// An inbound message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    /// Channel name, e.g. "telegram".
    pub channel: String,
    /// Channel-scoped user identity. This is the user key for the turn log
    /// and the credential store.
    pub sender_id: String,
    pub text: String,
    /// RFC3339 receive timestamp.
    pub timestamp: String,
    /// Channel-specific routing data as a JSON string (e.g. `{"chat_id": ...}`).
    pub metadata: Option<String>,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: String,
    pub content: String,
    /// Formatting hint for channels that support it (e.g. "MarkdownV2").
    pub parse_mode: Option<String>,
    /// Channel-specific routing data as a JSON string.
    pub metadata: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    pub supports_typing: bool,
    pub max_message_length: Option<usize>,
}

// --- Conversation types ---

/// Role of a persisted conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    Tool,
}

/// One persisted unit of conversation.
///
/// Turns are immutable once written. `seq` is assigned by the storage layer
/// and is strictly increasing and gap-free per user. A `Tool` turn's
/// `tool_call_id` references the `Assistant` turn that requested it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub user_id: String,
    pub seq: i64,
    pub role: TurnRole,
    pub content: String,
    pub tool_name: Option<String>,
    /// Tool arguments as JSON text, present on tool-requesting assistant turns.
    pub tool_args: Option<String>,
    pub tool_call_id: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

impl Turn {
    fn base(user_id: &str, role: TurnRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            seq: 0,
            role,
            content,
            tool_name: None,
            tool_args: None,
            tool_call_id: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// A user-authored turn. `seq` is assigned on append.
    pub fn user(user_id: &str, content: impl Into<String>) -> Self {
        Self::base(user_id, TurnRole::User, content.into())
    }

    /// A plain assistant reply turn.
    pub fn assistant(user_id: &str, content: impl Into<String>) -> Self {
        Self::base(user_id, TurnRole::Assistant, content.into())
    }

    /// An assistant turn recording one requested tool call.
    pub fn assistant_tool_call(user_id: &str, request: &ToolCallRequest, content: String) -> Self {
        let mut turn = Self::base(user_id, TurnRole::Assistant, content);
        turn.tool_name = Some(request.name.clone());
        turn.tool_args = Some(request.arguments.to_string());
        turn.tool_call_id = Some(request.call_id.clone());
        turn
    }

    /// A tool turn recording the result of a prior requested call.
    pub fn tool_result(user_id: &str, call_id: &str, tool_name: &str, content: String) -> Self {
        let mut turn = Self::base(user_id, TurnRole::Tool, content);
        turn.tool_name = Some(tool_name.to_string());
        turn.tool_call_id = Some(call_id.to_string());
        turn
    }
}

/// A registered chat user, created on first contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRecord {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            user_id: user_id.to_string(),
            username: None,
            first_name: None,
            last_name: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

// --- Credential types ---

/// OAuth2 access/refresh token pair plus expiry, scoped to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl Credential {
    /// Whether the access token expires within `margin` from now.
    ///
    /// A credential without an expiry never reports as expiring.
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(expiry) => expiry - Utc::now() <= margin,
            None => false,
        }
    }
}

// --- Provider types ---

/// A request to an LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: u32,
}

/// One message in a provider request, model-ready.
#[derive(Debug, Clone)]
pub struct ProviderMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// A content block within a provider message.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A declared tool, as handed to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A model-issued request to execute a named tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The result of executing one tool call.
///
/// Tool execution never raises past the registry boundary; failures are
/// carried here with `is_error` set so the model can react in-conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Discriminated outcome of one provider round-trip.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The model produced a final text reply; the loop terminates.
    FinalReply { text: String, usage: TokenUsage },
    /// The model requested one or more tool calls, in order.
    ToolCalls {
        /// Text the model emitted alongside the calls, if any.
        text: Option<String>,
        requests: Vec<ToolCallRequest>,
        usage: TokenUsage,
    },
}
