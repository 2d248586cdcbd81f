//! Error types for jobql

use thiserror::Error;

/// Core error type for jobql operations
#[derive(Error, Debug)]
pub enum JobqlError {
    /// The backend refused the job. The text is kept verbatim so it can be
    /// fed to the diagnostic parser.
    #[error("{0}")]
    JobRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    /// The editor surface failed to load before a session could mount
    #[error("Editor unavailable: {0}")]
    EditorUnavailable(String),
}

/// Result type alias for jobql operations
pub type Result<T> = std::result::Result<T, JobqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_error_displays_raw_text() {
        let err = JobqlError::JobRejected("Syntax error: Unexpected end at [1:8]".into());
        assert_eq!(err.to_string(), "Syntax error: Unexpected end at [1:8]");
    }

    #[test]
    fn test_decode_error_is_prefixed() {
        let err = JobqlError::Decode("content: expected value".into());
        assert_eq!(err.to_string(), "Decode error: content: expected value");
    }
}
