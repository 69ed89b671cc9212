// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar tools exposed to the model through function calling.

pub mod format;
pub mod registry;

pub use registry::{ToolRegistry, NOT_CONNECTED_MESSAGE};
