// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use donna_core::types::{
    AdapterType, CompletionOutcome, HealthStatus, ProviderRequest, TokenUsage, ToolCallRequest,
};
use donna_core::{DonnaError, PluginAdapter, ProviderAdapter};

/// A mock provider that replays scripted outcomes.
///
/// Outcomes (and errors) are popped from a FIFO queue; when the queue is
/// empty a plain "mock reply" is returned. Every request is recorded so
/// tests can assert on the exact history the engine sent.
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Result<CompletionOutcome, DonnaError>>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a final text reply.
    pub async fn push_reply(&self, text: &str) {
        self.push_outcome(CompletionOutcome::FinalReply {
            text: text.to_string(),
            usage: mock_usage(),
        })
        .await;
    }

    /// Queues a single tool-call request.
    pub async fn push_tool_call(&self, call_id: &str, name: &str, arguments: serde_json::Value) {
        self.push_outcome(CompletionOutcome::ToolCalls {
            text: None,
            requests: vec![ToolCallRequest {
                call_id: call_id.to_string(),
                name: name.to_string(),
                arguments,
            }],
            usage: mock_usage(),
        })
        .await;
    }

    /// Queues an arbitrary outcome.
    pub async fn push_outcome(&self, outcome: CompletionOutcome) {
        self.script.lock().await.push_back(Ok(outcome));
    }

    /// Queues a failure.
    pub async fn push_error(&self, err: DonnaError) {
        self.script.lock().await.push_back(Err(err));
    }

    /// All requests the engine has made, in order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, DonnaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DonnaError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<CompletionOutcome, DonnaError> {
        self.requests.lock().await.push(request);
        self.script.lock().await.pop_front().unwrap_or_else(|| {
            Ok(CompletionOutcome::FinalReply {
                text: "mock reply".to_string(),
                usage: mock_usage(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "test-model".into(),
            system_prompt: None,
            messages: vec![],
            tools: vec![],
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn scripted_outcomes_come_back_in_order() {
        let provider = MockProvider::new();
        provider
            .push_tool_call("toolu_1", "get_today_events", serde_json::json!({}))
            .await;
        provider.push_reply("done").await;

        match provider.complete(request()).await.unwrap() {
            CompletionOutcome::ToolCalls { requests, .. } => {
                assert_eq!(requests[0].name, "get_today_events");
            }
            other => panic!("expected ToolCalls, got {other:?}"),
        }
        match provider.complete(request()).await.unwrap() {
            CompletionOutcome::FinalReply { text, .. } => assert_eq!(text, "done"),
            other => panic!("expected FinalReply, got {other:?}"),
        }
        assert_eq!(provider.request_count().await, 2);
    }

    #[tokio::test]
    async fn empty_queue_returns_default_reply() {
        let provider = MockProvider::new();
        match provider.complete(request()).await.unwrap() {
            CompletionOutcome::FinalReply { text, .. } => assert_eq!(text, "mock reply"),
            other => panic!("expected FinalReply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scripted_errors_are_returned() {
        let provider = MockProvider::new();
        provider
            .push_error(DonnaError::Provider {
                message: "overloaded".into(),
                status: Some(529),
                source: None,
            })
            .await;
        let err = provider.complete(request()).await.unwrap_err();
        assert_eq!(err.http_status(), Some(529));
    }
}
