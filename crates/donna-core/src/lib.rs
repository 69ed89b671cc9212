// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Donna calendar assistant.
//!
//! This crate provides the foundational trait definitions, error types,
//! common types, and the error recovery policy used throughout the Donna
//! workspace. All adapter plugins implement traits defined here.

pub mod error;
pub mod recovery;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DonnaError;
pub use recovery::{ErrorClass, RecoveryAction, RecoveryPolicy, classify};
pub use types::{AdapterType, HealthStatus, MessageId};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donna_error_has_all_variants() {
        // Verify all 10 error variants exist and can be constructed.
        let _config = DonnaError::Config("test".into());
        let _storage = DonnaError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = DonnaError::Channel {
            message: "test".into(),
            source: None,
        };
        let _provider = DonnaError::Provider {
            message: "test".into(),
            status: None,
            source: None,
        };
        let _calendar = DonnaError::Calendar {
            message: "test".into(),
            status: Some(503),
            source: None,
        };
        let _auth = DonnaError::Auth {
            message: "test".into(),
        };
        let _invalid = DonnaError::InvalidArguments {
            tool: "create_event".into(),
            message: "test".into(),
        };
        let _tool = DonnaError::Tool {
            message: "test".into(),
        };
        let _timeout = DonnaError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = DonnaError::Internal("test".into());
    }

    #[test]
    fn http_status_accessor() {
        let provider = DonnaError::Provider {
            message: "overloaded".into(),
            status: Some(529),
            source: None,
        };
        assert_eq!(provider.http_status(), Some(529));

        let internal = DonnaError::Internal("boom".into());
        assert_eq!(internal.http_status(), None);
    }

    #[test]
    fn adapter_type_has_three_variants() {
        use std::str::FromStr;

        let variants = [AdapterType::Channel, AdapterType::Provider, AdapterType::Storage];

        // Verify Display and FromStr round-trip for all variants.
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // If any trait module is missing or has a compile error, this test
        // won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
