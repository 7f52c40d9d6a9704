pub mod seek;

use crate::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::stat::{fstat, FileStat, SFlag};
use std::fmt;
use std::os::unix::io::RawFd;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    Symlink,
    Unknown,
}

impl FileKind {
    pub fn from_stat(stat: &FileStat) -> Self {
        let fmt = SFlag::from_bits_truncate(stat.st_mode & SFlag::S_IFMT.bits());

        if fmt == SFlag::S_IFREG {
            FileKind::Regular
        } else if fmt == SFlag::S_IFDIR {
            FileKind::Directory
        } else if fmt == SFlag::S_IFCHR {
            FileKind::CharDevice
        } else if fmt == SFlag::S_IFBLK {
            FileKind::BlockDevice
        } else if fmt == SFlag::S_IFIFO {
            FileKind::Fifo
        } else if fmt == SFlag::S_IFSOCK {
            FileKind::Socket
        } else if fmt == SFlag::S_IFLNK {
            FileKind::Symlink
        } else {
            FileKind::Unknown
        }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, FileKind::Regular)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Regular => "regular file",
            FileKind::Directory => "directory",
            FileKind::CharDevice => "character device",
            FileKind::BlockDevice => "block device",
            FileKind::Fifo => "pipe",
            FileKind::Socket => "socket",
            FileKind::Symlink => "symbolic link",
            FileKind::Unknown => "unknown file type",
        };
        f.write_str(name)
    }
}

/// An inherited descriptor that has been checked to be open for reading and
/// to refer to a regular file.
///
/// The descriptor is borrowed: it is never closed here.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    raw: RawFd,
    size: u64,
}

impl Descriptor {
    /// Validate a raw descriptor number.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a negative number
    /// - `NotOpenable` if the descriptor is closed or write-only
    /// - `NotRegularFile` for directories, pipes, sockets and devices
    pub fn from_raw(raw: RawFd) -> Result<Self> {
        if raw < 0 {
            return Err(Error::invalid(format!(
                "file descriptor must be a non-negative integer, got {raw}"
            )));
        }

        let flags = fcntl(raw, FcntlArg::F_GETFL).map_err(|errno| not_openable(raw, errno))?;
        let access = OFlag::from_bits_truncate(flags) & OFlag::O_ACCMODE;
        if access == OFlag::O_WRONLY {
            return Err(Error::NotOpenable {
                fd: raw,
                reason: "descriptor is open for writing only".to_string(),
            });
        }

        let stat = fstat(raw).map_err(|errno| not_openable(raw, errno))?;
        let kind = FileKind::from_stat(&stat);
        if !kind.is_regular() {
            return Err(Error::NotRegularFile { fd: raw, kind });
        }

        // st_size of a regular file is never negative
        let size = u64::try_from(stat.st_size).unwrap_or(0);
        debug!(fd = raw, size, "validated descriptor");

        Ok(Self { raw, size })
    }

    pub fn raw(&self) -> RawFd {
        self.raw
    }

    /// File size at validation time.
    pub fn size(&self) -> u64 {
        self.size
    }
}

fn not_openable(fd: RawFd, errno: Errno) -> Error {
    Error::NotOpenable {
        fd,
        reason: errno.desc().to_string(),
    }
}
