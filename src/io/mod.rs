use crate::{Descriptor, Error, Result, ViewAccess};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use tracing::debug;

/// Read-only bytes of a file region. Released on drop.
pub enum RegionView {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl Deref for RegionView {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            RegionView::Mapped(mmap) => &mmap[..],
            RegionView::Buffered(buf) => &buf[..],
        }
    }
}

pub trait RegionSource {
    /// Bring `length` bytes starting at `offset` into memory.
    fn view(&self, desc: &Descriptor, offset: u64, length: u64) -> Result<RegionView>;
}

pub struct MmapSource;

impl RegionSource for MmapSource {
    fn view(&self, desc: &Descriptor, offset: u64, length: u64) -> Result<RegionView> {
        let len = check_range(desc, offset, length)?;

        // SAFETY:
        // - Mapping is read-only (PROT_READ, MAP_SHARED)
        // - The range was checked against the file size, so no page past EOF
        //   is touched unless the file shrinks while mapped
        // - memmap2 aligns `offset` down to a page boundary internally
        let mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(len)
                .map(desc.raw())
                .map_err(|e| map_failure(offset, length, e.to_string()))?
        };

        debug!(fd = desc.raw(), offset, length, "mapped region");
        Ok(RegionView::Mapped(mmap))
    }
}

/// Fallback for files that cannot be mapped: positional reads into a buffer.
///
/// The descriptor is reopened read-only through `/proc/self/fd`, so the
/// caller's descriptor and its file offset are left untouched.
pub struct ReadSource;

impl RegionSource for ReadSource {
    fn view(&self, desc: &Descriptor, offset: u64, length: u64) -> Result<RegionView> {
        let len = check_range(desc, offset, length)?;

        let path = PathBuf::from(format!("/proc/self/fd/{}", desc.raw()));
        let file = File::open(&path).map_err(|e| {
            map_failure(offset, length, format!("cannot reopen {}: {e}", path.display()))
        })?;

        let mut buf = vec![0u8; len];
        file.read_exact_at(&mut buf, offset)
            .map_err(|e| map_failure(offset, length, e.to_string()))?;

        debug!(fd = desc.raw(), offset, length, "read region into buffer");
        Ok(RegionView::Buffered(buf))
    }
}

pub fn source_for(access: ViewAccess) -> Box<dyn RegionSource> {
    match access {
        ViewAccess::Mmap => Box::new(MmapSource),
        ViewAccess::Read => Box::new(ReadSource),
    }
}

fn check_range(desc: &Descriptor, offset: u64, length: u64) -> Result<usize> {
    if length == 0 {
        return Err(map_failure(offset, length, "zero-length region"));
    }

    let end = offset
        .checked_add(length)
        .ok_or_else(|| map_failure(offset, length, "region end overflows"))?;
    if end > desc.size() {
        return Err(map_failure(
            offset,
            length,
            format!("region ends at {end}, past end of file at {}", desc.size()),
        ));
    }

    usize::try_from(length).map_err(|_| map_failure(offset, length, "region too large for address space"))
}

fn map_failure(offset: u64, length: u64, reason: impl Into<String>) -> Error {
    Error::MapFailure {
        offset,
        length,
        reason: reason.into(),
    }
}
