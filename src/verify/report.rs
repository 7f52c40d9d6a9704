use std::fmt;

/// Where and how a region diverged from its fill byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Bytes of the region that matched before the failing block. Always a
    /// multiple of the block size.
    pub bytes_verified: u64,
    /// Absolute file offset of the failing block.
    pub diverging_offset: u64,
    /// Absolute file offset of the first byte that is not the fill byte.
    pub first_bad_offset: u64,
    /// Raw contents of the failing block.
    pub diverging_bytes: Vec<u8>,
}

impl Mismatch {
    /// The failing block up to its first NUL, with non-printable bytes
    /// escaped. Safe to print to a terminal as-is.
    pub fn snippet(&self) -> String {
        let end = self
            .diverging_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.diverging_bytes.len());
        self.diverging_bytes[..end].escape_ascii().to_string()
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stopped after {} bytes read (first differing byte at offset {})",
            self.diverging_offset, self.first_bad_offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch_with(bytes: &[u8]) -> Mismatch {
        Mismatch {
            bytes_verified: 1024,
            diverging_offset: 5120,
            first_bad_offset: 5121,
            diverging_bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_snippet_stops_at_nul() {
        assert_eq!(mismatch_with(b"abc\0def").snippet(), "abc");
        assert_eq!(mismatch_with(b"\0abc").snippet(), "");
        assert_eq!(mismatch_with(b"plain").snippet(), "plain");
    }

    #[test]
    fn test_snippet_escapes_control_and_format_bytes() {
        let snippet = mismatch_with(b"%s%n\x1b[2J\xff").snippet();
        assert_eq!(snippet, "%s%n\\x1b[2J\\xff");
    }

    #[test]
    fn test_display_reports_absolute_offsets() {
        let text = mismatch_with(b"x").to_string();
        assert_eq!(
            text,
            "Stopped after 5120 bytes read (first differing byte at offset 5121)"
        );
    }
}
