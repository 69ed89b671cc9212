// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Donna calendar assistant.
//!
//! Implements [`ChannelAdapter`] over the Bot API via teloxide: long
//! polling for inbound DMs, MarkdownV2 delivery with a plain-text fallback,
//! and a typing indicator while a turn is being processed.

pub mod handler;
pub mod markdown;

use std::sync::Arc;

use async_trait::async_trait;
use donna_config::model::TelegramConfig;
use donna_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, InboundMessage, MessageId, OutboundMessage,
};
use donna_core::{ChannelAdapter, DonnaError, PluginAdapter};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ParseMode, Recipient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter.
///
/// Long-polls the Bot API, drops anything that is not an authorized private
/// text message, and queues the rest for the agent loop.
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates the adapter. Requires `telegram.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, DonnaError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            DonnaError::Config("telegram.bot_token is required for the Telegram adapter".into())
        })?;
        if token.is_empty() {
            return Err(DonnaError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DonnaError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), DonnaError> {
        debug!("Telegram channel shutting down");
        // Dropping the adapter aborts the polling task; the agent loop
        // stops calling receive() before shutdown is invoked.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), DonnaError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();
        let allowed_users: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let endpoint = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = allowed_users.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }
                    if !handler::is_authorized(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        return respond(());
                    }
                    match handler::to_inbound_message(&msg) {
                        Some(inbound) => {
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring non-text message");
                        }
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, endpoint)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DonnaError> {
        let chat_id = target_chat(&msg)?;

        // Plain text was requested explicitly.
        if msg.parse_mode.as_deref() == Some("plain") {
            let sent = self
                .bot
                .send_message(Recipient::Id(chat_id), &msg.content)
                .await
                .map_err(send_error)?;
            return Ok(MessageId(sent.id.0.to_string()));
        }

        // MarkdownV2 first; Telegram rejects the whole message on a parse
        // error, so fall back to plain text rather than dropping the reply.
        let escaped = markdown::escape_markdown_v2(&msg.content);
        match self
            .bot
            .send_message(Recipient::Id(chat_id), &escaped)
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            Ok(sent) => Ok(MessageId(sent.id.0.to_string())),
            Err(e) => {
                warn!(error = %e, "MarkdownV2 send failed, retrying as plain text");
                let sent = self
                    .bot
                    .send_message(Recipient::Id(chat_id), &msg.content)
                    .await
                    .map_err(send_error)?;
                Ok(MessageId(sent.id.0.to_string()))
            }
        }
    }

    async fn receive(&self) -> Result<InboundMessage, DonnaError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| DonnaError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send_typing(&self, metadata: Option<&str>) -> Result<(), DonnaError> {
        let Some(chat_id) = metadata.and_then(chat_id_from_metadata) else {
            return Ok(());
        };
        self.bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
            .map_err(|e| DonnaError::Channel {
                message: format!("failed to send typing indicator: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(())
    }
}

fn send_error(e: teloxide::RequestError) -> DonnaError {
    DonnaError::Channel {
        message: format!("failed to send message: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Resolves the target chat: `chat_id` from metadata, or the channel field
/// when it is a bare numeric id.
fn target_chat(msg: &OutboundMessage) -> Result<ChatId, DonnaError> {
    if let Some(chat_id) = msg.metadata.as_deref().and_then(chat_id_from_metadata) {
        return Ok(chat_id);
    }
    msg.channel
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| DonnaError::Channel {
            message: "no valid chat_id in message metadata or channel field".into(),
            source: None,
        })
}

fn chat_id_from_metadata(metadata: &str) -> Option<ChatId> {
    let meta: serde_json::Value = serde_json::from_str(metadata).ok()?;
    meta.get("chat_id")?
        .as_str()?
        .parse::<i64>()
        .ok()
        .map(ChatId)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            allowed_users: vec![],
        }
    }

    #[test]
    fn new_requires_a_bot_token() {
        assert!(TelegramChannel::new(config(None)).is_err());
        assert!(TelegramChannel::new(config(Some(""))).is_err());
        assert!(TelegramChannel::new(config(Some("123456:ABC-DEF"))).is_ok());
    }

    #[test]
    fn capabilities_reflect_telegram_limits() {
        let channel = TelegramChannel::new(config(Some("t:k"))).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_typing);
        assert_eq!(caps.max_message_length, Some(4096));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(config(Some("t:k"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[test]
    fn target_chat_prefers_metadata() {
        let msg = OutboundMessage {
            channel: "telegram".into(),
            content: "hello".into(),
            parse_mode: None,
            metadata: Some(r#"{"chat_id":"4242"}"#.into()),
        };
        assert_eq!(target_chat(&msg).unwrap().0, 4242);
    }

    #[test]
    fn target_chat_falls_back_to_numeric_channel() {
        let msg = OutboundMessage {
            channel: "4242".into(),
            content: "hello".into(),
            parse_mode: None,
            metadata: None,
        };
        assert_eq!(target_chat(&msg).unwrap().0, 4242);
    }

    #[test]
    fn target_chat_fails_without_an_id() {
        let msg = OutboundMessage {
            channel: "telegram".into(),
            content: "hello".into(),
            parse_mode: None,
            metadata: Some(r#"{"thread":"x"}"#.into()),
        };
        assert!(target_chat(&msg).is_err());
    }
}
