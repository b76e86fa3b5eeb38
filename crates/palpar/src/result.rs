//! Result and error types for Palpar.
//!
//! Failures fall into three categories so that environment breakage is never
//! mistaken for a product regression: element lookups that time out, scenario
//! assertions that evaluate false, and infrastructure faults (server, session,
//! transport, configuration).

use thiserror::Error;

/// Result type for Palpar operations
pub type PalparResult<T> = Result<T, PalparError>;

/// Coarse failure classification surfaced to test reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureCategory {
    /// A required UI element did not appear within the allotted wait
    Element,
    /// A scenario postcondition evaluated false
    Assertion,
    /// Server/session/transport/configuration fault
    Infrastructure,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element => write!(f, "element"),
            Self::Assertion => write!(f, "assertion"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Errors that can occur in Palpar
#[derive(Debug, Error)]
pub enum PalparError {
    /// A required element did not appear within the allotted wait
    #[error("element not found: {locator} (waited {waited_ms}ms)")]
    ElementNotFound {
        /// The locator that failed to resolve
        locator: String,
        /// How long the lookup polled before giving up
        waited_ms: u64,
    },

    /// A scenario postcondition evaluated false
    #[error("assertion failed: {message}")]
    AssertionFailed {
        /// Verbatim assertion message
        message: String,
    },

    /// The automation server did not respond at the configured endpoint
    #[error("automation server unreachable at {endpoint}: {message}")]
    ServerUnreachable {
        /// Endpoint URL that was probed
        endpoint: String,
        /// Underlying error message
        message: String,
    },

    /// Failed to launch the automation server process
    #[error("failed to launch automation server: {message}")]
    ServerLaunch {
        /// Error message
        message: String,
    },

    /// Session creation or teardown failed
    #[error("session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// HTTP transport failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a protocol-level error response
    #[error("protocol error {status}: {error}: {message}")]
    Protocol {
        /// HTTP status code
        status: u16,
        /// WebDriver error code (e.g. "invalid selector")
        error: String,
        /// Server-provided message
        message: String,
    },

    /// Configuration is missing or invalid
    #[error("invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A bounded wait elapsed without the condition holding
    #[error("operation timed out after {ms}ms: {what}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        what: String,
    },
}

impl PalparError {
    /// Classify this error for reporting.
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::ElementNotFound { .. } => FailureCategory::Element,
            Self::AssertionFailed { .. } => FailureCategory::Assertion,
            Self::ServerUnreachable { .. }
            | Self::ServerLaunch { .. }
            | Self::Session { .. }
            | Self::Transport(_)
            | Self::Protocol { .. }
            | Self::Config { .. }
            | Self::Timeout { .. } => FailureCategory::Infrastructure,
        }
    }

    /// Construct an assertion failure with the given message.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Construct a session error with the given message.
    #[must_use]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_category() {
        let err = PalparError::ElementNotFound {
            locator: "accessibility id=test-Username".to_string(),
            waited_ms: 10_000,
        };
        assert_eq!(err.category(), FailureCategory::Element);
    }

    #[test]
    fn test_assertion_category() {
        let err = PalparError::assertion("Login failed or inventory screen not found");
        assert_eq!(err.category(), FailureCategory::Assertion);
    }

    #[test]
    fn test_infrastructure_categories() {
        let errs = [
            PalparError::ServerUnreachable {
                endpoint: "http://127.0.0.1:4723".to_string(),
                message: "connection refused".to_string(),
            },
            PalparError::ServerLaunch {
                message: "appium not on PATH".to_string(),
            },
            PalparError::session("no session id in response"),
            PalparError::Protocol {
                status: 500,
                error: "unknown error".to_string(),
                message: "boom".to_string(),
            },
            PalparError::Config {
                message: "missing capabilities".to_string(),
            },
            PalparError::Timeout {
                ms: 30_000,
                what: "app ready".to_string(),
            },
        ];
        for err in errs {
            assert_eq!(err.category(), FailureCategory::Infrastructure);
        }
    }

    #[test]
    fn test_element_not_found_message_names_locator() {
        let err = PalparError::ElementNotFound {
            locator: "accessibility id=test-LOGIN".to_string(),
            waited_ms: 250,
        };
        let msg = err.to_string();
        assert!(msg.contains("test-LOGIN"));
        assert!(msg.contains("250ms"));
    }

    #[test]
    fn test_assertion_message_is_verbatim() {
        let err = PalparError::assertion("Login failed or inventory screen not found");
        assert_eq!(
            err.to_string(),
            "assertion failed: Login failed or inventory screen not found"
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(FailureCategory::Element.to_string(), "element");
        assert_eq!(FailureCategory::Assertion.to_string(), "assertion");
        assert_eq!(FailureCategory::Infrastructure.to_string(), "infrastructure");
    }
}
