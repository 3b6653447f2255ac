//! Error types for thread library operations
//!
//! Lookups that match nothing return `None` rather than an error, and
//! broken synchronization invariants panic instead of being reported.

use thiserror::Error;

use crate::types::ThreadId;

/// Result type for thread library operations
pub type Result<T> = core::result::Result<T, ThreadError>;

/// Recoverable failures returned to the immediate caller
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// An argument was out of its valid range
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Allocation of a record, node or bucket array failed
    #[error("out of memory")]
    OutOfMemory,

    /// No record with this library id is in the thread table
    #[error("no thread with library id {0}")]
    NoSuchThread(ThreadId),

    /// Every library id has been handed out
    #[error("library thread ids exhausted")]
    IdsExhausted,

    /// Another thread already claimed the join on this id
    #[error("thread {0} is already being joined")]
    AlreadyJoined(ThreadId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ThreadError::NoSuchThread(ThreadId(7)).to_string(),
            "no thread with library id 7"
        );
        assert_eq!(
            ThreadError::InvalidArgument("stack size is zero").to_string(),
            "invalid argument: stack size is zero"
        );
        assert_eq!(ThreadError::OutOfMemory.to_string(), "out of memory");
    }
}
