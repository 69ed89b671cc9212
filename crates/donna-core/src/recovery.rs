// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error recovery policy shared by the session engine and the tool registry.
//!
//! Classifies external-call failures and decides retry vs. refresh vs.
//! give-up as a pure function of (error class, attempt count). The policy
//! holds no state beyond its configured bounds.

use std::time::Duration;

use crate::error::DonnaError;

/// Classification of an external-call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network failure, timeout, 408/429, or 5xx. Retry with backoff.
    Transient,
    /// 401 or an expired/revoked credential. Refresh, then retry once.
    Auth,
    /// Everything else. No retry.
    Permanent,
}

/// What the caller should do about a failure on a given attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Wait `delay`, then retry the same call.
    Retry { delay: Duration },
    /// Refresh the credential, then retry the call once.
    RefreshAndRetry,
    /// Stop; surface a structured error or degrade.
    GiveUp,
}

/// Classify an error for recovery purposes.
pub fn classify(err: &DonnaError) -> ErrorClass {
    match err {
        DonnaError::Timeout { .. } => ErrorClass::Transient,
        DonnaError::Channel { .. } => ErrorClass::Transient,
        DonnaError::Auth { .. } => ErrorClass::Auth,
        DonnaError::Provider { status, .. } | DonnaError::Calendar { status, .. } => {
            match status {
                // No response at all: connect/read failure.
                None => ErrorClass::Transient,
                Some(401) => ErrorClass::Auth,
                Some(408) | Some(429) => ErrorClass::Transient,
                Some(s) if *s >= 500 => ErrorClass::Transient,
                Some(_) => ErrorClass::Permanent,
            }
        }
        _ => ErrorClass::Permanent,
    }
}

/// Retry bounds for the recovery policy.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPolicy {
    /// Maximum transient retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff for the first retry; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RecoveryPolicy {
    /// Decide the next action for a failure of `class` on attempt `attempt`
    /// (zero-based: 0 is the first, un-retried call).
    pub fn decide(&self, class: ErrorClass, attempt: u32) -> RecoveryAction {
        match class {
            ErrorClass::Transient if attempt < self.max_retries => RecoveryAction::Retry {
                delay: self.base_delay * 2u32.saturating_pow(attempt),
            },
            // A credential refresh is attempted exactly once per call chain.
            ErrorClass::Auth if attempt == 0 => RecoveryAction::RefreshAndRetry,
            _ => RecoveryAction::GiveUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_err(status: Option<u16>) -> DonnaError {
        DonnaError::Provider {
            message: "test".into(),
            status,
            source: None,
        }
    }

    #[test]
    fn classify_by_status() {
        assert_eq!(classify(&provider_err(None)), ErrorClass::Transient);
        assert_eq!(classify(&provider_err(Some(500))), ErrorClass::Transient);
        assert_eq!(classify(&provider_err(Some(529))), ErrorClass::Transient);
        assert_eq!(classify(&provider_err(Some(429))), ErrorClass::Transient);
        assert_eq!(classify(&provider_err(Some(408))), ErrorClass::Transient);
        assert_eq!(classify(&provider_err(Some(401))), ErrorClass::Auth);
        assert_eq!(classify(&provider_err(Some(400))), ErrorClass::Permanent);
        assert_eq!(classify(&provider_err(Some(404))), ErrorClass::Permanent);
    }

    #[test]
    fn classify_non_http_errors() {
        assert_eq!(
            classify(&DonnaError::Timeout {
                duration: Duration::from_secs(30)
            }),
            ErrorClass::Transient
        );
        assert_eq!(
            classify(&DonnaError::Auth {
                message: "expired".into()
            }),
            ErrorClass::Auth
        );
        assert_eq!(
            classify(&DonnaError::Internal("boom".into())),
            ErrorClass::Permanent
        );
        assert_eq!(
            classify(&DonnaError::Storage {
                source: Box::new(std::io::Error::other("disk"))
            }),
            ErrorClass::Permanent
        );
        assert_eq!(
            classify(&DonnaError::InvalidArguments {
                tool: "create_event".into(),
                message: "missing summary".into()
            }),
            ErrorClass::Permanent
        );
    }

    #[test]
    fn transient_retries_with_doubling_backoff_then_gives_up() {
        let policy = RecoveryPolicy::default();

        assert_eq!(
            policy.decide(ErrorClass::Transient, 0),
            RecoveryAction::Retry {
                delay: Duration::from_millis(500)
            }
        );
        assert_eq!(
            policy.decide(ErrorClass::Transient, 1),
            RecoveryAction::Retry {
                delay: Duration::from_millis(1000)
            }
        );
        assert_eq!(
            policy.decide(ErrorClass::Transient, 2),
            RecoveryAction::GiveUp
        );
    }

    #[test]
    fn auth_refreshes_once_then_gives_up() {
        let policy = RecoveryPolicy::default();
        assert_eq!(
            policy.decide(ErrorClass::Auth, 0),
            RecoveryAction::RefreshAndRetry
        );
        assert_eq!(policy.decide(ErrorClass::Auth, 1), RecoveryAction::GiveUp);
    }

    #[test]
    fn permanent_never_retries() {
        let policy = RecoveryPolicy::default();
        assert_eq!(
            policy.decide(ErrorClass::Permanent, 0),
            RecoveryAction::GiveUp
        );
    }

    #[test]
    fn zero_retry_policy_gives_up_immediately() {
        let policy = RecoveryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(
            policy.decide(ErrorClass::Transient, 0),
            RecoveryAction::GiveUp
        );
    }
}
