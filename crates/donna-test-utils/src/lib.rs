// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock adapters for fast, deterministic, CI-runnable tests.
//!
//! - [`MockProvider`]: scripted completion outcomes, popped in order
//! - [`MockChannel`]: injectable inbound messages, captured outbound messages

pub mod mock_channel;
pub mod mock_provider;

pub use mock_channel::MockChannel;
pub use mock_provider::MockProvider;
