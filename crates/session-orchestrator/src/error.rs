//! Error types for session operations.

use thiserror::Error;

/// Failure of a session operation that never reached the bridge.
///
/// Bridge failures are not errors at this level: they are rendered inline
/// in the region that issued the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The named table has no open tab.
    #[error("No open tab for table '{0}'")]
    TabNotOpen(String),

    /// A precondition is missing (no device, package or snapshot selected).
    #[error("{0}")]
    Validation(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_not_open_display() {
        let err = SessionError::TabNotOpen("users".to_string());
        assert_eq!(err.to_string(), "No open tab for table 'users'");
    }

    #[test]
    fn validation_display_is_verbatim() {
        let err = SessionError::Validation("Please select a database first.".to_string());
        assert_eq!(err.to_string(), "Please select a database first.");
    }
}
