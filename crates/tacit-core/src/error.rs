//! Error types for the tacit search adapter.

use std::fmt;

use thiserror::Error;

/// Result type alias using the adapter's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error is attributed to when reported at the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Re-encoding a request or document.
    Marshal,
    /// Decoding caller parameters or backend payloads into typed records.
    Unmarshal,
    /// Collection checks and backend execution.
    Search,
    /// Rendering a normalized response.
    Format,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Marshal => "marshal",
            Stage::Unmarshal => "unmarshal",
            Stage::Search => "search",
            Stage::Format => "format",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for adapter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller parameters could not be coerced into the expected request shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Requested collection is not on the allow-list
    #[error("Invalid collection: {0}")]
    InvalidCollection(String),

    /// Transport failure, non-success status, or undecodable backend payload
    #[error("Backend error: {0}")]
    Backend(String),

    /// Primary failed and the single fallback attempt failed too
    #[error("Primary backend failed: {primary}; secondary backend failed: {secondary}")]
    Fallback {
        primary: Box<Error>,
        secondary: Box<Error>,
    },

    /// Required configuration or credential is absent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization of an outgoing value failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Stage this error is reported under at the tool boundary.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Decode(_) => Stage::Unmarshal,
            Error::Serialization(_) => Stage::Marshal,
            Error::InvalidCollection(_)
            | Error::Backend(_)
            | Error::Fallback { .. }
            | Error::Config(_) => Stage::Search,
        }
    }

    /// Whether a Primary failure of this kind may be retried on the Secondary.
    ///
    /// Only backend failures qualify. Decode, collection and configuration
    /// errors are caller or deployment problems a second backend cannot fix.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Backend(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_decode() {
        let err = Error::Decode("page: invalid type".to_string());
        assert_eq!(err.to_string(), "Decode error: page: invalid type");
    }

    #[test]
    fn test_error_display_invalid_collection() {
        let err = Error::InvalidCollection("users".to_string());
        assert_eq!(err.to_string(), "Invalid collection: users");
    }

    #[test]
    fn test_error_display_backend() {
        let err = Error::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("TACITBASE_AUTH_TOKEN is not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: TACITBASE_AUTH_TOKEN is not set"
        );
    }

    #[test]
    fn test_error_display_fallback_names_both_failures() {
        let err = Error::Fallback {
            primary: Box::new(Error::Backend("timeout".to_string())),
            secondary: Box::new(Error::Backend("status 502".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("Primary backend failed: Backend error: timeout"));
        assert!(msg.contains("secondary backend failed: Backend error: status 502"));
    }

    #[test]
    fn test_stage_attribution() {
        assert_eq!(Error::Decode(String::new()).stage(), Stage::Unmarshal);
        assert_eq!(Error::Serialization(String::new()).stage(), Stage::Marshal);
        assert_eq!(Error::InvalidCollection(String::new()).stage(), Stage::Search);
        assert_eq!(Error::Backend(String::new()).stage(), Stage::Search);
        assert_eq!(Error::Config(String::new()).stage(), Stage::Search);
        assert_eq!(Stage::Format.to_string(), "format");
    }

    #[test]
    fn test_only_backend_errors_are_fallback_eligible() {
        assert!(Error::Backend("x".to_string()).is_fallback_eligible());
        assert!(!Error::Config("x".to_string()).is_fallback_eligible());
        assert!(!Error::InvalidCollection("x".to_string()).is_fallback_eligible());
        assert!(!Error::Decode("x".to_string()).is_fallback_eligible());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
