use crate::{Error, Result};

/// A block of `block_size` bytes, all equal to the fill byte.
#[derive(Debug, Clone)]
pub struct ReferenceBlock {
    bytes: Box<[u8]>,
    fill: u8,
}

impl ReferenceBlock {
    pub fn new(fill: u8, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::invalid("block size must be greater than zero"));
        }

        Ok(Self {
            bytes: vec![fill; block_size].into_boxed_slice(),
            fill,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether `chunk` equals the first `chunk.len()` bytes of the block.
    ///
    /// Plain byte comparison; NUL bytes get no special treatment.
    pub fn matches(&self, chunk: &[u8]) -> bool {
        chunk.len() <= self.bytes.len() && chunk == &self.bytes[..chunk.len()]
    }

    /// Index of the first byte in `chunk` that is not the fill byte.
    pub fn first_difference(&self, chunk: &[u8]) -> Option<usize> {
        chunk.iter().position(|&b| b != self.fill)
    }

    pub fn name(&self) -> String {
        match self.fill {
            0x00 => "zeros".to_string(),
            0xFF => "ones".to_string(),
            byte => format!("{byte:#04x}"),
        }
    }
}

/// Parse a fill byte given as decimal (`170`) or hex (`0xAA`).
///
/// Values outside `0..=255`, signs and anything non-numeric are rejected.
pub fn parse_fill_byte(s: &str) -> Result<u8> {
    let trimmed = s.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u8::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<u8>()
    };

    parsed.map_err(|_| Error::invalid(format!("fill byte must be in 0..=255 or 0x00..=0xFF, got '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_block_contents() -> anyhow::Result<()> {
        let block = ReferenceBlock::new(0xAA, 16)?;
        assert_eq!(block.len(), 16);
        assert!(block.matches(&[0xAA; 16]));
        assert!(block.matches(&[0xAA; 5]));
        assert!(!block.matches(&[0xAA; 17]));
        Ok(())
    }

    #[test]
    fn test_zero_fill_is_compared_bytewise() -> anyhow::Result<()> {
        let block = ReferenceBlock::new(0x00, 8)?;
        assert!(!block.matches(&[0, 0, 0, b'x', 0, 0, 0, 0]));
        assert_eq!(block.first_difference(&[0, 0, 0, b'x']), Some(3));
        Ok(())
    }

    #[test]
    fn test_zero_block_size_rejected() {
        assert!(matches!(
            ReferenceBlock::new(0x55, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pattern_names() -> anyhow::Result<()> {
        assert_eq!(ReferenceBlock::new(0x00, 1)?.name(), "zeros");
        assert_eq!(ReferenceBlock::new(0xFF, 1)?.name(), "ones");
        assert_eq!(ReferenceBlock::new(0xAA, 1)?.name(), "0xaa");
        Ok(())
    }

    #[test]
    fn test_fill_byte_parsing() {
        assert_eq!(parse_fill_byte("170").unwrap(), 0xAA);
        assert_eq!(parse_fill_byte("0xAA").unwrap(), 0xAA);
        assert_eq!(parse_fill_byte("0X0f").unwrap(), 0x0F);
        assert_eq!(parse_fill_byte("0").unwrap(), 0);
        assert!(parse_fill_byte("256").is_err());
        assert!(parse_fill_byte("-1").is_err());
        assert!(parse_fill_byte("a").is_err());
        assert!(parse_fill_byte("0x").is_err());
        assert!(parse_fill_byte("0x100").is_err());
    }
}
