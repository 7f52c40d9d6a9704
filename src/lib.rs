pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod io;
pub mod patterns;
pub mod verify;

pub use descriptor::{seek::DescriptorSeeker, Descriptor, FileKind};
pub use error::Error;
pub use verify::{Mismatch, RegionVerifier, VerificationRequest, VerificationResult};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Block size used when neither the config file nor the command line set one.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// How the last, partial block of a region is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TailPolicy {
    /// Compare only the bytes inside `[offset, offset + length)`.
    #[default]
    Clamp,
    /// Always compare a whole block, reading file bytes past the end of the
    /// region (up to end of file).
    FullBlock,
}

/// How the region bytes are brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewAccess {
    #[default]
    Mmap,
    Read,
}

#[derive(Debug, Clone)]
pub struct FillcheckConfig {
    pub block_size: usize,
    pub tail: TailPolicy,
    pub access: ViewAccess,
    pub progress: bool,
}

impl Default for FillcheckConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            tail: TailPolicy::Clamp,
            access: ViewAccess::Mmap,
            progress: false,
        }
    }
}
