// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session engine: one conversational turn from user text to reply.
//!
//! A turn is a bounded function-calling loop. Each round loads the trailing
//! turn window from storage, asks the model to complete, and either returns
//! its final text or executes the tools it requested and goes around again.
//! When the round budget runs out the turn degrades to a fixed apology
//! instead of looping forever.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use donna_config::model::DonnaConfig;
use donna_core::recovery::{classify, RecoveryAction, RecoveryPolicy};
use donna_core::types::{
    CompletionOutcome, ContentBlock, ProviderMessage, ProviderRequest, Turn, TurnRole,
};
use donna_core::{DonnaError, ProviderAdapter, StorageAdapter};
use donna_tools::ToolRegistry;
use tracing::{debug, info, warn};

/// Reply sent when a turn cannot be completed.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't finish that request. Please try again in a moment.";

/// Drives the model/tool loop for all users. Stateless between turns; the
/// turn log in storage is the only conversation state.
pub struct SessionEngine {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    tools: Arc<ToolRegistry>,
    config: DonnaConfig,
    policy: RecoveryPolicy,
}

impl SessionEngine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        tools: Arc<ToolRegistry>,
        config: DonnaConfig,
    ) -> Self {
        let policy = RecoveryPolicy {
            max_retries: config.session.max_retries,
            ..RecoveryPolicy::default()
        };
        Self {
            storage,
            provider,
            tools,
            config,
            policy,
        }
    }

    /// Processes one user message and returns the reply text.
    ///
    /// The user turn is persisted before the first model call, so the
    /// message is never lost even if everything after it fails. Tool rounds
    /// are bounded by `session.max_tool_rounds`; past the bound, and when
    /// the recovery policy gives up on the provider, the turn is closed
    /// with [`APOLOGY_MESSAGE`]. The apology is persisted like any other
    /// assistant turn, so the reply returned here is always the last turn
    /// in the log. `Err` is reserved for storage failures.
    pub async fn handle_turn(&self, user_id: &str, text: &str) -> Result<String, DonnaError> {
        self.storage
            .append_turns(user_id, &[Turn::user(user_id, text)])
            .await?;

        for round in 0..self.config.session.max_tool_rounds {
            let request = self.build_request(user_id).await?;
            let outcome = match self.complete_with_recovery(request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(user_id, round, error = %err, "provider gave up, degrading");
                    return self.close_with_apology(user_id).await;
                }
            };

            match outcome {
                CompletionOutcome::FinalReply { text, usage } => {
                    info!(
                        user_id,
                        round,
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "turn complete"
                    );
                    self.storage
                        .append_turns(user_id, &[Turn::assistant(user_id, text.clone())])
                        .await?;
                    return Ok(text);
                }
                CompletionOutcome::ToolCalls {
                    text,
                    requests,
                    usage,
                } => {
                    debug!(
                        user_id,
                        round,
                        calls = requests.len(),
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "model requested tools"
                    );
                    // Each requested call becomes an assistant turn paired
                    // with its tool turn; the whole round is one atomic
                    // append so the pairing can never be torn.
                    let mut preamble = text;
                    let mut batch = Vec::with_capacity(requests.len() * 2);
                    for request in &requests {
                        let outcome = self.tools.execute(user_id, request).await;
                        batch.push(Turn::assistant_tool_call(
                            user_id,
                            request,
                            preamble.take().unwrap_or_default(),
                        ));
                        batch.push(Turn::tool_result(
                            user_id,
                            &request.call_id,
                            &request.name,
                            outcome.content,
                        ));
                    }
                    self.storage.append_turns(user_id, &batch).await?;
                }
            }
        }

        warn!(
            user_id,
            max_tool_rounds = self.config.session.max_tool_rounds,
            "tool round budget exhausted, degrading"
        );
        self.close_with_apology(user_id).await
    }

    async fn close_with_apology(&self, user_id: &str) -> Result<String, DonnaError> {
        self.storage
            .append_turns(user_id, &[Turn::assistant(user_id, APOLOGY_MESSAGE)])
            .await?;
        Ok(APOLOGY_MESSAGE.to_string())
    }

    async fn build_request(&self, user_id: &str) -> Result<ProviderRequest, DonnaError> {
        let window = self
            .storage
            .recent_turns(user_id, self.config.session.history_window_turns)
            .await?;
        Ok(ProviderRequest {
            model: self.config.anthropic.default_model.clone(),
            system_prompt: Some(self.config.agent.system_prompt.clone()),
            messages: messages_from_turns(&window),
            tools: self.tools.specs(),
            max_tokens: self.config.anthropic.max_tokens,
        })
    }

    /// One provider call under the recovery policy. The provider path has
    /// no credential to refresh, so only transient failures are retried.
    async fn complete_with_recovery(
        &self,
        request: ProviderRequest,
    ) -> Result<CompletionOutcome, DonnaError> {
        let timeout = Duration::from_secs(self.config.session.call_timeout_secs);
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::time::timeout(timeout, self.provider.complete(request.clone()));
            let err = match result.await {
                Ok(Ok(outcome)) => return Ok(outcome),
                Ok(Err(err)) => err,
                Err(_) => DonnaError::Timeout { duration: timeout },
            };
            match self.policy.decide(classify(&err), attempt) {
                RecoveryAction::Retry { delay } => {
                    warn!(attempt, error = %err, "provider call failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                _ => return Err(err),
            }
            attempt += 1;
        }
    }
}

/// Converts a chronological turn window into model-ready messages.
///
/// Three window-boundary repairs keep the history valid for the provider:
/// turns before the first user turn are trimmed, tool results whose
/// requesting assistant turn fell outside the window are dropped, and
/// consecutive same-role messages are merged.
fn messages_from_turns(turns: &[Turn]) -> Vec<ProviderMessage> {
    let start = turns
        .iter()
        .position(|t| t.role == TurnRole::User)
        .unwrap_or(turns.len());

    let mut seen_tool_use: HashSet<&str> = HashSet::new();
    let mut messages: Vec<ProviderMessage> = Vec::new();

    for turn in &turns[start..] {
        let (role, blocks) = match turn.role {
            TurnRole::User => (
                "user",
                vec![ContentBlock::Text {
                    text: turn.content.clone(),
                }],
            ),
            TurnRole::Assistant => {
                let mut blocks = Vec::new();
                if !turn.content.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: turn.content.clone(),
                    });
                }
                if let (Some(call_id), Some(name)) = (&turn.tool_call_id, &turn.tool_name) {
                    seen_tool_use.insert(call_id.as_str());
                    let input = turn
                        .tool_args
                        .as_deref()
                        .and_then(|a| serde_json::from_str(a).ok())
                        .unwrap_or_else(|| serde_json::json!({}));
                    blocks.push(ContentBlock::ToolUse {
                        id: call_id.clone(),
                        name: name.clone(),
                        input,
                    });
                }
                if blocks.is_empty() {
                    continue;
                }
                ("assistant", blocks)
            }
            TurnRole::Tool => {
                let Some(call_id) = turn.tool_call_id.as_deref() else {
                    continue;
                };
                if !seen_tool_use.contains(call_id) {
                    // The requesting turn fell outside the window.
                    continue;
                }
                (
                    "user",
                    vec![ContentBlock::ToolResult {
                        tool_use_id: call_id.to_string(),
                        content: turn.content.clone(),
                        is_error: false,
                    }],
                )
            }
        };

        match messages.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => messages.push(ProviderMessage {
                role: role.to_string(),
                content: blocks,
            }),
        }
    }

    messages
}
