use super::Descriptor;
use crate::{Error, Result};
use nix::unistd::{lseek, Whence};
use std::os::unix::io::RawFd;
use tracing::{debug, warn};

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Repositions an inherited descriptor to an absolute offset, given in
/// megabytes from the start of the file.
pub struct DescriptorSeeker {
    unit: u64,
}

impl DescriptorSeeker {
    pub fn new() -> Self {
        Self { unit: BYTES_PER_MB }
    }

    /// Convert a signed megabyte count into a byte offset.
    pub fn offset_in_bytes(&self, offset_mb: i64) -> Result<u64> {
        let mb = u64::try_from(offset_mb).map_err(|_| {
            Error::invalid(format!("offset must be a non-negative integer, got {offset_mb}"))
        })?;
        mb.checked_mul(self.unit)
            .filter(|bytes| i64::try_from(*bytes).is_ok())
            .ok_or_else(|| Error::invalid(format!("offset of {offset_mb} MB is out of range")))
    }

    /// Seek `fd` to `offset_mb` megabytes and return the new position.
    ///
    /// Succeeds only when the resulting position equals the request. Seeking
    /// past end of file is left to the OS; Linux allows it for regular files.
    pub fn seek(&self, fd: RawFd, offset_mb: i64) -> Result<u64> {
        let requested = self.offset_in_bytes(offset_mb)?;
        let desc = Descriptor::from_raw(fd)?;
        self.seek_to(&desc, requested)
    }

    pub fn seek_to(&self, desc: &Descriptor, requested: u64) -> Result<u64> {
        let target = i64::try_from(requested)
            .map_err(|_| Error::invalid(format!("offset {requested} is out of range")))?;

        let current = match lseek(desc.raw(), target, Whence::SeekSet) {
            Ok(pos) => pos,
            Err(errno) => {
                warn!(fd = desc.raw(), requested, %errno, "lseek failed");
                lseek(desc.raw(), 0, Whence::SeekCur).unwrap_or(-1)
            }
        };

        if current != target {
            return Err(Error::SeekFailed { requested, current });
        }

        debug!(fd = desc.raw(), position = requested, "descriptor repositioned");
        Ok(requested)
    }
}

impl Default for DescriptorSeeker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;
    use std::os::unix::io::AsRawFd;
    use tempfile::NamedTempFile;

    #[test]
    fn test_seek_into_ten_megabyte_file() -> anyhow::Result<()> {
        let temp_file = NamedTempFile::new()?;
        temp_file.as_file().set_len(10 * BYTES_PER_MB)?;

        let seeker = DescriptorSeeker::new();
        let position = seeker.seek(temp_file.as_file().as_raw_fd(), 5)?;
        assert_eq!(position, 5_242_880);

        let mut file = temp_file.as_file();
        assert_eq!(file.stream_position()?, 5_242_880);
        Ok(())
    }

    #[test]
    fn test_seek_beyond_end_of_file() -> anyhow::Result<()> {
        let temp_file = NamedTempFile::new()?;
        temp_file.as_file().set_len(BYTES_PER_MB)?;

        let position = DescriptorSeeker::new().seek(temp_file.as_file().as_raw_fd(), 3)?;
        assert_eq!(position, 3 * BYTES_PER_MB);
        Ok(())
    }

    #[test]
    fn test_negative_offset_rejected() {
        let err = DescriptorSeeker::new().offset_in_bytes(-1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_overflowing_offset_rejected() {
        let err = DescriptorSeeker::new().offset_in_bytes(i64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_seek_on_closed_descriptor() {
        let err = DescriptorSeeker::new().seek(1_000_000, 1).unwrap_err();
        assert!(matches!(err, Error::NotOpenable { .. }));
    }
}
