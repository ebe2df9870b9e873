//! SST error types

use thiserror::Error;

/// Result type for SST operations
pub type SstResult<T> = std::result::Result<T, SstError>;

/// Errors that can occur while planning, writing or reading a shared string table
#[derive(Debug, Error)]
pub enum SstError {
    /// IO error (also covers CFB errors which use std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream ended where more data was required
    #[error("Truncated SST stream: {0}")]
    TruncatedStream(String),

    /// The serializer produced a frame whose length differs from the plan.
    ///
    /// This is an internal fault: the output must be discarded.
    #[error("SST frame {frame} planned as {planned} bytes but {written} bytes were written")]
    PlanSerializeMismatch {
        frame: usize,
        planned: usize,
        written: usize,
    },

    /// The duplicate-key padding retry ran out of attempts
    #[error("Could not resolve duplicate SST entry {text:?} after {attempts} padding attempts")]
    DuplicateKeyUnresolved { text: String, attempts: usize },

    /// A string longer than 65535 UTF-16 code units
    #[error("String of {0} UTF-16 code units exceeds the 65535 limit")]
    StringTooLong(usize),

    /// Invalid container or record layout
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
