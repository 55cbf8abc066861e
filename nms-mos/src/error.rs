//! Error types for the MOS gateway
//!
//! Every variant renders into the `<message>` of an ERROR acknowledgment, so
//! messages are short and name the MOS identifier involved.

use thiserror::Error;

/// Gateway error type
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced rundown or story does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Command is structurally unusable (e.g. empty `roID`)
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] nms_common::Error),

    /// Handler exceeded its time budget (including rundown lock wait)
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Store(nms_common::Error::Database(err))
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_ack_ready() {
        let err = Error::NotFound("rundown RO-9".to_string());
        assert_eq!(err.to_string(), "Not found: rundown RO-9");

        let err = Error::Timeout(5000);
        assert_eq!(err.to_string(), "Timed out after 5000 ms");
    }

    #[test]
    fn test_store_errors_convert() {
        let err: Error = nms_common::Error::StoryNotFound(7).into();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.to_string(), "Store error: story id 7 not found");
    }
}
