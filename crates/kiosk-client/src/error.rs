//! Backend client error types.

/// Shown when the backend rejected a request without explaining why.
pub const GENERIC_REQUEST_FAILED: &str = "The request could not be completed. Please try again.";

/// Shown when the backend could not be reached.
pub const CONNECTIVITY_FAILED: &str = "Unable to reach the locker service. Please try again.";

/// Errors from backend calls.
#[derive(Debug, thiserror::Error)]
pub enum LockerApiError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Backend returned a non-2xx status.
    #[error("backend {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        /// `message` field of the JSON error body, if any.
        message: Option<String>,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
}

impl LockerApiError {
    /// Text to show on the kiosk screen.
    ///
    /// Backend rejections surface the server's `message` verbatim; every
    /// other failure maps to a generic line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Api { .. } | Self::Deserialization { .. } => GENERIC_REQUEST_FAILED.to_string(),
            Self::Http { .. } => CONNECTIVITY_FAILED.to_string(),
        }
    }

    /// Whether the backend was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// HTTP status of a backend rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
