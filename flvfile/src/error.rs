//! Error types for FLV file sessions.
//!
//! Every fallible operation returns [`FlvError`]. Callers that only care about the broad
//! category (storage failure, truncated stream, malformed data, bad caller input) can match
//! on [`FlvError::kind`].

use thiserror::Error;

/// Broad classification of an [`FlvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying storage failed (open, read, write, seek, flush).
    Io,
    /// A read returned fewer bytes than the frame requires.
    UnexpectedEof,
    /// The bytes on disk are not a well-formed FLV stream.
    Format,
    /// The caller passed a value the format cannot represent.
    InvalidInput,
}

/// FLV file error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlvError {
    /// Invalid FLV signature (expected "FLV").
    #[error("Invalid FLV signature: expected 'FLV', got '{0}'")]
    InvalidSignature(String),

    /// Previous tag size trailer does not match the tag it follows.
    #[error("Previous tag size mismatch at offset {offset}: expected {expected}, got {actual}")]
    PreviousTagSizeMismatch {
        /// Byte offset of the trailer.
        offset: u64,
        /// `data_size + 11` of the tag just read.
        expected: u32,
        /// Value found on disk.
        actual: u32,
    },

    /// Payload does not fit in the 24-bit data size field.
    #[error("Tag payload too large: {0} bytes (max 16777215)")]
    TagTooLarge(usize),

    /// Invalid AMF data.
    #[error("Invalid AMF data: {0}")]
    InvalidAmf(String),

    /// Invalid AMF type marker.
    #[error("Invalid AMF type marker: {0}")]
    InvalidAmfType(u8),

    /// AMF string too long.
    #[error("AMF string too long: {0} bytes (max 65535)")]
    AmfStringTooLong(usize),

    /// Stream ended in the middle of a frame.
    #[error("Unexpected end of data at offset {offset}")]
    UnexpectedEnd {
        /// Byte offset where the frame being read started.
        offset: u64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl FlvError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlvError::Io(_) => ErrorKind::Io,
            FlvError::UnexpectedEnd { .. } => ErrorKind::UnexpectedEof,
            FlvError::InvalidSignature(_)
            | FlvError::PreviousTagSizeMismatch { .. }
            | FlvError::InvalidAmf(_)
            | FlvError::InvalidAmfType(_) => ErrorKind::Format,
            FlvError::TagTooLarge(_) | FlvError::AmfStringTooLong(_) => ErrorKind::InvalidInput,
        }
    }

    /// Whether the stream on disk is malformed.
    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Attach a byte offset to a short read. Other errors pass through unchanged.
    pub(crate) fn at_offset(self, offset: u64) -> Self {
        match self {
            FlvError::UnexpectedEnd { .. } => FlvError::UnexpectedEnd { offset },
            other => other,
        }
    }
}

impl From<std::io::Error> for FlvError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => FlvError::UnexpectedEnd { offset: 0 },
            _ => FlvError::Io(err.to_string()),
        }
    }
}

/// Result type for FLV operations.
pub type Result<T> = std::result::Result<T, FlvError>;
