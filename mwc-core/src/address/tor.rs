//! Tor v3 hidden-service addresses
//!
//! An address is the lowercase base32 encoding of
//! `public_key (32) || checksum (2) || version (1)`, where the checksum is the
//! first two bytes of `SHA3-256(".onion checksum" || public_key || version)`.

use crate::{CoreError, Result};
use data_encoding::BASE32_NOPAD;
use ed25519_dalek::VerifyingKey;
use sha3::{Digest, Sha3_256};

/// Length of a v3 address without the `.onion` suffix
pub const ADDRESS_LENGTH: usize = 56;

/// Suffix of hidden-service host names
pub const ONION_SUFFIX: &str = ".onion";

const VERSION: u8 = 3;
const CHECKSUM_PREFIX: &[u8] = b".onion checksum";
const CHECKSUM_LENGTH: usize = 2;
const DECODED_LENGTH: usize = 32 + CHECKSUM_LENGTH + 1;

/// Whether `host` names a hidden service
pub fn is_onion_host(host: &str) -> bool {
    host.to_ascii_lowercase().ends_with(ONION_SUFFIX)
}

fn checksum(public_key: &[u8; 32]) -> [u8; CHECKSUM_LENGTH] {
    let mut hasher = Sha3_256::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(public_key);
    hasher.update([VERSION]);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Encodes an Ed25519 public key as a v3 address (without the `.onion` suffix)
pub fn public_key_to_tor_address(public_key: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(DECODED_LENGTH);
    raw.extend_from_slice(public_key);
    raw.extend_from_slice(&checksum(public_key));
    raw.push(VERSION);
    BASE32_NOPAD.encode(&raw).to_ascii_lowercase()
}

/// Decodes a v3 address into the Ed25519 public key it names.
///
/// Accepts either case and an optional `.onion` suffix.
pub fn tor_address_to_public_key(address: &str) -> Result<[u8; 32]> {
    let lowercase = address.to_ascii_lowercase();
    let host = lowercase.strip_suffix(ONION_SUFFIX).unwrap_or(&lowercase);

    if host.len() != ADDRESS_LENGTH {
        return Err(CoreError::InvalidTorAddress(format!(
            "expected {} characters, got {}",
            ADDRESS_LENGTH,
            host.len()
        )));
    }

    let raw = BASE32_NOPAD
        .decode(host.to_ascii_uppercase().as_bytes())
        .map_err(|e| CoreError::InvalidTorAddress(e.to_string()))?;
    if raw.len() != DECODED_LENGTH {
        return Err(CoreError::InvalidTorAddress("bad decoded length".into()));
    }

    if raw[DECODED_LENGTH - 1] != VERSION {
        return Err(CoreError::InvalidTorAddress(format!(
            "unsupported version {}",
            raw[DECODED_LENGTH - 1]
        )));
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&raw[..32]);
    if raw[32..32 + CHECKSUM_LENGTH] != checksum(&public_key) {
        return Err(CoreError::InvalidTorAddress("checksum mismatch".into()));
    }

    VerifyingKey::from_bytes(&public_key)
        .map_err(|_| CoreError::InvalidTorAddress("not an Ed25519 public key".into()))?;

    Ok(public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "kw4fmy7fwzlbigxpmq5q5refz4nrqeitpvc47nl4igv3fo3jgdq7u3yd";
    const PUBLIC_KEY: &str = "55b85663e5b656141aef643b0ec485cf1b1811137d45cfb57c41abb2bb6930e1";

    #[test]
    fn test_decodes_known_address() {
        let public_key = tor_address_to_public_key(ADDRESS).unwrap();
        assert_eq!(hex::encode(public_key), PUBLIC_KEY);
    }

    #[test]
    fn test_encodes_known_key() {
        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&hex::decode(PUBLIC_KEY).unwrap());
        assert_eq!(public_key_to_tor_address(&public_key), ADDRESS);
    }

    #[test]
    fn test_suffix_and_case_are_tolerated() {
        let with_suffix = format!("{}.onion", ADDRESS.to_ascii_uppercase());
        assert!(tor_address_to_public_key(&with_suffix).is_ok());
        assert!(is_onion_host("example.ONION"));
        assert!(!is_onion_host("example.com"));
    }

    #[test]
    fn test_rejects_bad_checksum_and_length() {
        let mut tampered = ADDRESS.to_string();
        tampered.replace_range(0..1, "a");
        assert!(tor_address_to_public_key(&tampered).is_err());
        assert!(tor_address_to_public_key(&ADDRESS[1..]).is_err());
        assert!(tor_address_to_public_key("").is_err());
    }

    #[test]
    fn test_rejects_off_curve_key() {
        // checksum is correct, but 02 00..00 does not decompress
        let address = "aiaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaab3did";
        assert!(matches!(
            tor_address_to_public_key(address),
            Err(CoreError::InvalidTorAddress(_))
        ));
    }
}
