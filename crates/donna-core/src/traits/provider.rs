// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM integrations (Anthropic, etc.).

use async_trait::async_trait;

use crate::error::DonnaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionOutcome, ProviderRequest};

/// Adapter for LLM provider integrations.
///
/// One round-trip: conversation history plus the declared tool schema go in,
/// and a discriminated outcome comes back — either a final text reply or an
/// ordered set of tool-call requests for the engine to resolve.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the discriminated outcome.
    async fn complete(&self, request: ProviderRequest) -> Result<CompletionOutcome, DonnaError>;
}
