// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API integration for the Donna calendar assistant.
//!
//! Provides the wire types, HTTP client, and the [`ProviderAdapter`]
//! implementation that drives the function-calling loop.
//!
//! [`ProviderAdapter`]: donna_core::ProviderAdapter

pub mod client;
pub mod provider;
pub mod types;

pub use client::AnthropicClient;
pub use provider::AnthropicProvider;
