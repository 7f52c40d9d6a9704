use crate::descriptor::FileKind;
use std::os::unix::io::RawFd;
use thiserror::Error;

/// Failure kinds for descriptor validation, region verification and seeking.
///
/// A content mismatch is not an error: it is reported through
/// [`crate::verify::VerificationResult::Mismatch`].
#[derive(Error, Debug)]
pub enum Error {
    /// Negative offset, length or descriptor, zero length or zero block size.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The descriptor is stale, closed or not open for reading.
    #[error("couldn't open file descriptor {fd}: {reason}")]
    NotOpenable { fd: RawFd, reason: String },

    /// The descriptor refers to something other than a regular file.
    #[error("file descriptor {fd} is not a regular file ({kind})")]
    NotRegularFile { fd: RawFd, kind: FileKind },

    /// The requested region could not be mapped or read.
    #[error("cannot map {length} bytes at offset {offset}: {reason}")]
    MapFailure {
        offset: u64,
        length: u64,
        reason: String,
    },

    /// The descriptor did not end up at the requested position.
    #[error("couldn't seek to offset {requested}, current offset is {current}")]
    SeekFailed { requested: u64, current: i64 },
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_failure_reports_current_offset() {
        let err = Error::SeekFailed {
            requested: 5_242_880,
            current: 1_048_576,
        };
        assert_eq!(
            err.to_string(),
            "couldn't seek to offset 5242880, current offset is 1048576"
        );
    }

    #[test]
    fn test_not_regular_file_names_the_kind() {
        let err = Error::NotRegularFile {
            fd: 7,
            kind: FileKind::Fifo,
        };
        assert_eq!(err.to_string(), "file descriptor 7 is not a regular file (pipe)");
    }
}
