//! Fingerprints of saved workspace documents

use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 of a serialized document. The persister compares fingerprints
/// to skip writing bytes identical to the last save.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Short hex form used in log lines
    pub fn short(&self) -> String {
        self.0[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_document_same_fingerprint() {
        let saved = br#"{"template":"__BLANK[1]__ = 13;"}"#;
        assert_eq!(ContentHash::from_bytes(saved), ContentHash::from_bytes(saved));
    }

    #[test]
    fn test_renamed_blank_changes_fingerprint() {
        let h1 = ContentHash::from_bytes(b"int __BLANK[1]__;");
        let h2 = ContentHash::from_bytes(b"int __BLANK[2]__;");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_display_is_short_hex() {
        let h = ContentHash::from_bytes(b"");
        // SHA-256 of the empty input
        assert_eq!(h.to_string(), "e3b0c44298fc1c14");
        assert_eq!(format!("{:?}", h), "ContentHash(e3b0c44298fc1c14)");
    }
}
