pub mod report;

use crate::io::{source_for, RegionSource};
use crate::patterns::ReferenceBlock;
use crate::{Descriptor, Error, FillcheckConfig, Result, TailPolicy, ViewAccess, DEFAULT_BLOCK_SIZE};
use indicatif::ProgressBar;
use std::os::unix::io::RawFd;
use tracing::{debug, info};

pub use report::Mismatch;

/// The region to check and the byte it must consist of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationRequest {
    pub offset: u64,
    pub length: u64,
    pub fill: u8,
}

impl VerificationRequest {
    pub fn new(offset: u64, length: u64, fill: u8) -> Self {
        Self {
            offset,
            length,
            fill,
        }
    }

    /// Build a request from signed values as they arrive on the command line.
    pub fn from_signed(offset: i64, length: i64, fill: u8) -> Result<Self> {
        let offset = u64::try_from(offset).map_err(|_| {
            Error::invalid(format!("offset must be a non-negative integer, got {offset}"))
        })?;
        let length = u64::try_from(length).map_err(|_| {
            Error::invalid(format!("length must be a non-negative integer, got {length}"))
        })?;
        Ok(Self::new(offset, length, fill))
    }

    fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(Error::invalid("length must be greater than zero"));
        }
        if self.offset.checked_add(self.length).is_none() {
            return Err(Error::invalid(format!(
                "region at offset {} with length {} overflows",
                self.offset, self.length
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Verified,
    Mismatch(Mismatch),
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationResult::Verified)
    }

    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            VerificationResult::Verified => None,
            VerificationResult::Mismatch(m) => Some(m),
        }
    }
}

/// Compares a file region against a repeated fill byte, one block at a time.
///
/// Mismatches are detected at block granularity: `bytes_verified` in the
/// result is always a multiple of the block size. The exact byte is reported
/// separately as [`Mismatch::first_bad_offset`].
pub struct RegionVerifier {
    block_size: usize,
    tail: TailPolicy,
    source: Box<dyn RegionSource>,
    progress: Option<ProgressBar>,
}

impl RegionVerifier {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            tail: TailPolicy::Clamp,
            source: source_for(ViewAccess::Mmap),
            progress: None,
        }
    }

    pub fn from_config(config: &FillcheckConfig) -> Self {
        Self::new(config.block_size)
            .with_tail(config.tail)
            .with_access(config.access)
    }

    pub fn with_tail(mut self, tail: TailPolicy) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_access(mut self, access: ViewAccess) -> Self {
        self.source = source_for(access);
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Verify `length` bytes at `offset` of the inherited descriptor `fd`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for negative values, zero length or zero block size
    /// - `NotOpenable` / `NotRegularFile` from descriptor validation
    /// - `MapFailure` if the region cannot be brought into memory
    pub fn verify(&self, fd: RawFd, offset: i64, length: i64, fill: u8) -> Result<VerificationResult> {
        let request = VerificationRequest::from_signed(offset, length, fill)?;
        request.validate()?;
        let desc = Descriptor::from_raw(fd)?;
        self.verify_request(&desc, &request)
    }

    pub fn verify_request(
        &self,
        desc: &Descriptor,
        request: &VerificationRequest,
    ) -> Result<VerificationResult> {
        request.validate()?;
        if self.block_size == 0 {
            return Err(Error::invalid("block size must be greater than zero"));
        }
        let span = self.span(desc, request);
        // No chunk is ever longer than the span, so neither is the reference.
        let reference_len = usize::try_from(span).map_or(self.block_size, |span| self.block_size.min(span));
        let reference = ReferenceBlock::new(request.fill, reference_len)?;

        debug!(
            fd = desc.raw(),
            offset = request.offset,
            length = request.length,
            span,
            block_size = self.block_size,
            reference_len = reference.len(),
            fill = %reference.name(),
            "verifying region"
        );

        let view = self.source.view(desc, request.offset, span)?;
        if let Some(pb) = &self.progress {
            pb.set_length(span);
        }

        let mut bytes_verified = 0u64;
        for chunk in view.chunks(self.block_size) {
            if bytes_verified >= request.length {
                break;
            }

            if !reference.matches(chunk) {
                let index = reference.first_difference(chunk).unwrap_or(0) as u64;
                let mismatch = Mismatch {
                    bytes_verified,
                    diverging_offset: request.offset + bytes_verified,
                    first_bad_offset: request.offset + bytes_verified + index,
                    diverging_bytes: chunk.to_vec(),
                };
                info!(
                    offset = request.offset,
                    bytes_verified,
                    first_bad_offset = mismatch.first_bad_offset,
                    "region mismatch"
                );
                if let Some(pb) = &self.progress {
                    pb.abandon_with_message("mismatch");
                }
                return Ok(VerificationResult::Mismatch(mismatch));
            }

            bytes_verified += self.block_size as u64;
            if let Some(pb) = &self.progress {
                pb.inc(chunk.len() as u64);
            }
        }

        info!(offset = request.offset, length = request.length, "region verified");
        if let Some(pb) = &self.progress {
            pb.finish_with_message("verified");
        }
        Ok(VerificationResult::Verified)
    }

    /// Number of bytes to bring into memory for `request`.
    fn span(&self, desc: &Descriptor, request: &VerificationRequest) -> u64 {
        match self.tail {
            TailPolicy::Clamp => request.length,
            TailPolicy::FullBlock => {
                let block = self.block_size as u64;
                let rounded = request.length.div_ceil(block).saturating_mul(block);
                let available = desc.size().saturating_sub(request.offset);
                // A region that already runs past EOF keeps its length so the
                // view reports the failure.
                rounded.min(available).max(request.length)
            }
        }
    }
}

impl Default for RegionVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE)
    }
}
