//! Error types for tcp_info acquisition and decoding
//!
//! Two failure kinds reach the caller:
//!
//! - `AcquisitionFailure`: the OS call that reads the raw structure failed.
//!   The decoder never ran. The underlying `io::Error` is kept intact and
//!   tagged with the name of the failing operation (`"getsockopt"`).
//! - `MalformedInput`: the raw bytes cannot be decoded with the selected
//!   layout. The reason is carried in [`Malformed`].
//!
//! Neither kind is retried. A failed call yields no `Info` at all.

use std::io;

use thiserror::Error;

/// Why a raw buffer could not be decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// Buffer size does not match the layout size exactly
    #[error("tcp_info buffer is {actual} bytes, layout expects exactly {expected}")]
    LengthMismatch {
        /// Size documented by the layout
        expected: usize,
        /// Size actually handed to the decoder
        actual: usize,
    },

    /// `tcpi_state` is not one of the 12 known connection states
    #[error("connection state index {0} out of range (valid: 0..=11)")]
    StateOutOfRange(u8),

    /// A layout table points past the end of its own structure
    #[error("field `{field}` at offset {offset} overruns the tcp_info buffer")]
    FieldOutOfBounds {
        /// Field name as spelled in the kernel header
        field: &'static str,
        /// Byte offset from the layout table
        offset: usize,
    },
}

/// Errors returned by [`crate::parse_tcp_info`] and [`crate::fetch_info`]
#[derive(Debug, Error)]
pub enum TcpInfoError {
    /// The raw structure could not be read from the OS
    #[error("{operation} failed: {source}")]
    AcquisitionFailure {
        /// Name of the failing OS operation
        operation: &'static str,
        /// Error reported by the OS, unchanged
        #[source]
        source: io::Error,
    },

    /// The raw structure could not be decoded
    #[error("malformed tcp_info: {0}")]
    MalformedInput(#[from] Malformed),
}

impl TcpInfoError {
    pub(crate) fn acquisition(operation: &'static str, source: io::Error) -> Self {
        Self::AcquisitionFailure { operation, source }
    }

    /// Returns the decode failure reason, if this is a `MalformedInput`
    pub fn malformed(&self) -> Option<&Malformed> {
        match self {
            Self::MalformedInput(reason) => Some(reason),
            Self::AcquisitionFailure { .. } => None,
        }
    }

    /// `io::ErrorKind` of an acquisition failure
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::AcquisitionFailure { source, .. } => Some(source.kind()),
            Self::MalformedInput(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquisition_message_names_operation() {
        let err = TcpInfoError::acquisition(
            "getsockopt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "getsockopt failed: denied");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(err.malformed().is_none());
    }

    #[test]
    fn test_malformed_converts_with_question_mark() {
        fn decode() -> Result<(), TcpInfoError> {
            Err::<(), _>(Malformed::StateOutOfRange(12))?;
            Ok(())
        }

        let err = decode().unwrap_err();
        assert_eq!(err.malformed(), Some(&Malformed::StateOutOfRange(12)));
        assert_eq!(
            err.to_string(),
            "malformed tcp_info: connection state index 12 out of range (valid: 0..=11)"
        );
    }

    #[test]
    fn test_length_mismatch_message() {
        let reason = Malformed::LengthMismatch {
            expected: 104,
            actual: 50,
        };
        assert_eq!(
            reason.to_string(),
            "tcp_info buffer is 50 bytes, layout expects exactly 104"
        );
    }
}
