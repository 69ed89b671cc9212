// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Calendar integration for the Donna calendar assistant.
//!
//! Three layers: the OAuth2 client for the token endpoint, the calendar API
//! client for event listing and creation, and the [`TokenStore`] that keeps
//! per-user credentials valid across both.

pub mod client;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use client::CalendarClient;
pub use oauth::OAuthClient;
pub use token_store::TokenStore;
pub use types::{Event, EventDraft, EventTime};
