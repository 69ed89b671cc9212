// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ProviderAdapter implementation over the Anthropic Messages API.
//!
//! Translates the engine's provider request into the wire format and the
//! response into a discriminated [`CompletionOutcome`]: a final text reply,
//! or an ordered list of tool-call requests.

use async_trait::async_trait;

use donna_config::model::AnthropicConfig;
use donna_core::types::{
    AdapterType, CompletionOutcome, ContentBlock, HealthStatus, ProviderRequest, TokenUsage,
    ToolCallRequest,
};
use donna_core::{DonnaError, PluginAdapter, ProviderAdapter};

use crate::client::AnthropicClient;
use crate::types::{
    ApiContent, ApiContentBlock, ApiMessage, MessageRequest, MessageResponse,
    ResponseContentBlock, ToolDefinition,
};

/// Anthropic-backed LLM provider adapter.
pub struct AnthropicProvider {
    client: AnthropicClient,
}

impl AnthropicProvider {
    /// Build a provider from configuration.
    ///
    /// The API key comes from config or, failing that, the
    /// `ANTHROPIC_API_KEY` environment variable.
    pub fn new(config: &AnthropicConfig) -> Result<Self, DonnaError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                DonnaError::Config(
                    "anthropic.api_key not set and ANTHROPIC_API_KEY not in environment".into(),
                )
            })?;
        let client = AnthropicClient::new(
            api_key,
            config.api_version.clone(),
            config.default_model.clone(),
        )?;
        Ok(Self { client })
    }

    /// Build a provider around an existing client (used by tests).
    pub fn with_client(client: AnthropicClient) -> Self {
        Self { client }
    }
}

/// Convert an engine request into the Messages API wire format.
fn to_message_request(request: &ProviderRequest) -> MessageRequest {
    let messages = request
        .messages
        .iter()
        .map(|msg| ApiMessage {
            role: msg.role.clone(),
            content: ApiContent::Blocks(msg.content.iter().map(to_api_block).collect()),
        })
        .collect();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|t| ToolDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    input_schema: t.input_schema.clone(),
                })
                .collect(),
        )
    };

    MessageRequest {
        model: request.model.clone(),
        messages,
        system: request.system_prompt.clone(),
        max_tokens: request.max_tokens,
        tools,
    }
}

fn to_api_block(block: &ContentBlock) -> ApiContentBlock {
    match block {
        ContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
        ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => ApiContentBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
            is_error: if *is_error { Some(true) } else { None },
        },
    }
}

/// Convert a wire response into the engine's discriminated outcome.
///
/// A response with no text and no tool_use blocks is malformed model output
/// and becomes a provider error, which the engine degrades per policy.
fn to_outcome(response: MessageResponse) -> Result<CompletionOutcome, DonnaError> {
    let usage = TokenUsage {
        input_tokens: response.usage.input_tokens,
        output_tokens: response.usage.output_tokens,
    };

    let mut text_parts = Vec::new();
    let mut requests = Vec::new();
    for block in response.content {
        match block {
            ResponseContentBlock::Text { text } => text_parts.push(text),
            ResponseContentBlock::ToolUse { id, name, input } => {
                requests.push(ToolCallRequest {
                    call_id: id,
                    name,
                    arguments: input,
                });
            }
        }
    }
    let text = text_parts.join("\n");

    if !requests.is_empty() {
        return Ok(CompletionOutcome::ToolCalls {
            text: if text.is_empty() { None } else { Some(text) },
            requests,
            usage,
        });
    }
    if text.trim().is_empty() {
        return Err(DonnaError::Provider {
            message: "model returned empty content".into(),
            status: None,
            source: None,
        });
    }
    Ok(CompletionOutcome::FinalReply { text, usage })
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, DonnaError> {
        // No cheap unauthenticated ping endpoint; a constructed client is healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DonnaError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<CompletionOutcome, DonnaError> {
        let wire_request = to_message_request(&request);
        let response = self.client.complete_message(&wire_request).await?;
        to_outcome(response)
    }
}
