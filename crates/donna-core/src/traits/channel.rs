// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging platform integrations (Telegram, etc.).

use async_trait::async_trait;

use crate::error::DonnaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging channel integrations.
///
/// Channel adapters connect Donna to external messaging platforms,
/// handling message ingestion and delivery. The session engine is
/// transport-agnostic; any text-in/text-out channel satisfies this.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), DonnaError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DonnaError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, DonnaError>;

    /// Shows a typing indicator for the given metadata target, if supported.
    async fn send_typing(&self, metadata: Option<&str>) -> Result<(), DonnaError> {
        let _ = metadata;
        Ok(())
    }
}
