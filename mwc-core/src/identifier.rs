//! Output identifiers (key derivation paths)

use crate::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Serialized length: one depth byte followed by four big-endian path components
pub const IDENTIFIER_SIZE: usize = 1 + Identifier::MAX_DEPTH * 4;

/// Derivation path of an output key, as stored by the wallet and the signing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    depth: u8,
    paths: [u32; Identifier::MAX_DEPTH],
}

impl Identifier {
    pub const MAX_DEPTH: usize = 4;

    /// Depth used for output identifiers handed out by the wallet
    pub const DEFAULT_DEPTH: u8 = 3;

    pub fn new(depth: u8, paths: [u32; Identifier::MAX_DEPTH]) -> Result<Self> {
        if usize::from(depth) > Self::MAX_DEPTH {
            return Err(CoreError::InvalidIdentifier(format!(
                "depth {} exceeds {}",
                depth,
                Self::MAX_DEPTH
            )));
        }
        Ok(Self { depth, paths })
    }

    /// Parses the 17-byte serialized form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != IDENTIFIER_SIZE {
            return Err(CoreError::InvalidIdentifier(format!(
                "expected {} bytes, got {}",
                IDENTIFIER_SIZE,
                bytes.len()
            )));
        }
        let mut paths = [0u32; Self::MAX_DEPTH];
        for (path, chunk) in paths.iter_mut().zip(bytes[1..].chunks_exact(4)) {
            *path = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self::new(bytes[0], paths)
    }

    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text).map_err(|e| CoreError::hex("identifier", e))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; IDENTIFIER_SIZE] {
        let mut bytes = [0u8; IDENTIFIER_SIZE];
        bytes[0] = self.depth;
        for (chunk, path) in bytes[1..].chunks_exact_mut(4).zip(self.paths) {
            chunk.copy_from_slice(&path.to_be_bytes());
        }
        bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn paths(&self) -> &[u32] {
        &self.paths[..usize::from(self.depth)]
    }

    /// Identifier that follows this one at the same depth
    pub fn next(&self) -> Result<Self> {
        let index = usize::from(self.depth)
            .checked_sub(1)
            .ok_or_else(|| CoreError::InvalidIdentifier("root identifier has no successor".into()))?;
        let mut paths = self.paths;
        paths[index] = paths[index]
            .checked_add(1)
            .ok_or_else(|| CoreError::InvalidIdentifier("path component overflow".into()))?;
        Self::new(self.depth, paths)
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self {
            depth: Self::DEFAULT_DEPTH,
            paths: [0; Self::MAX_DEPTH],
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Identifier::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identifier_hex() {
        assert_eq!(
            Identifier::default().to_hex(),
            "0300000000000000000000000000000000"
        );
    }

    #[test]
    fn test_next_increments_last_component() {
        let identifier = Identifier::new(3, [0, 0, 7, 0]).unwrap();
        let next = identifier.next().unwrap();
        assert_eq!(next.paths(), &[0, 0, 8]);
        assert!(next > identifier);
    }

    #[test]
    fn test_rejects_bad_lengths_and_depths() {
        assert!(Identifier::from_hex("0300").is_err());
        assert!(Identifier::from_hex("0500000000000000000000000000000000").is_err());
        assert!(Identifier::new(0, [0; 4]).unwrap().next().is_err());
    }

    #[test]
    fn test_serde_as_hex() {
        let json = serde_json::to_string(&Identifier::default()).unwrap();
        assert_eq!(json, "\"0300000000000000000000000000000000\"");
        let parsed: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Identifier::default());
    }

    #[test]
    fn test_bytes_round_trip() {
        let identifier = Identifier::new(4, [1, 2, 3, 0xdead_beef]).unwrap();
        assert_eq!(Identifier::from_bytes(&identifier.to_bytes()).unwrap(), identifier);
    }
}
