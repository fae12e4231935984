//! Error taxonomy shared by the reporter and the admin client

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The payload could not be serialized
    #[error("unable to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// Connection, timeout or client setup failure; nothing usable came back
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's cancellation token fired before the call completed
    #[error("request cancelled")]
    Cancelled,

    /// The remote answered 404 with a decodable error body
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success status
    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// A success response whose body did not match the expected shape
    #[error("unable to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid admin address: {0}")]
    InvalidAddress(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// HTTP status for `Http` and `NotFound` outcomes
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_not_found() {
        let not_found = Error::NotFound {
            message: "node not found".to_string(),
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.status(), Some(404));
        assert_eq!(not_found.to_string(), "not found: node not found");

        let http = Error::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(!http.is_not_found());
        assert_eq!(http.status(), Some(500));

        assert_eq!(Error::Cancelled.status(), None);
    }
}
