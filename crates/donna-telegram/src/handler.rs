// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization filtering and inbound message conversion.
//!
//! Donna answers only private chats from users on the allow-list; everything
//! else is dropped before it reaches the session engine.

use donna_core::types::InboundMessage;
use teloxide::prelude::*;
use teloxide::types::ChatKind;

/// Whether the sender is on the allow-list, by user id or username
/// (with or without a leading `@`, case-insensitive).
///
/// An empty allow-list rejects everyone. Messages without a sender
/// (channel posts) are always rejected.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|entry| {
        if *entry == user_id {
            return true;
        }
        user.username.as_deref().is_some_and(|username| {
            username.eq_ignore_ascii_case(entry.strip_prefix('@').unwrap_or(entry))
        })
    })
}

/// Whether the message comes from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Converts a Telegram message into a channel-agnostic [`InboundMessage`].
///
/// Returns `None` for non-text messages (stickers, photos, voice) and for
/// messages without a sender. The chat id goes into metadata so replies can
/// be routed back.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;
    let sender_id = msg.from.as_ref().map(|u| u.id.0.to_string())?;
    let metadata = serde_json::json!({
        "chat_id": msg.chat.id.0.to_string(),
    })
    .to_string();

    Some(InboundMessage {
        id: msg.id.0.to_string(),
        channel: "telegram".to_string(),
        sender_id,
        text: text.to_string(),
        timestamp: msg.date.to_rfc3339(),
        metadata: Some(metadata),
    })
}
