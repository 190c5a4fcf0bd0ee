//! Slatepack addresses: bech32-encoded Ed25519 public keys

use crate::{CoreError, Currency, Result};
use bech32::{FromBase32, ToBase32, Variant};
use ed25519_dalek::VerifyingKey;

fn hrp(currency: Currency) -> Result<&'static str> {
    currency.slatepack_hrp().ok_or_else(|| {
        CoreError::InvalidSlatepackAddress(format!("{} does not use Slatepack addresses", currency))
    })
}

/// Encodes `public_key` as a Slatepack address of `currency`
pub fn public_key_to_slatepack_address(currency: Currency, public_key: &[u8; 32]) -> Result<String> {
    bech32::encode(hrp(currency)?, public_key.to_base32(), Variant::Bech32)
        .map_err(|e| CoreError::InvalidSlatepackAddress(e.to_string()))
}

/// Decodes a Slatepack address of `currency` into its Ed25519 public key
pub fn slatepack_address_to_public_key(address: &str, currency: Currency) -> Result<[u8; 32]> {
    let expected_hrp = hrp(currency)?;
    let (found_hrp, data, variant) = bech32::decode(address)
        .map_err(|e| CoreError::InvalidSlatepackAddress(e.to_string()))?;

    if found_hrp != expected_hrp {
        return Err(CoreError::InvalidSlatepackAddress(format!(
            "expected prefix {}, got {}",
            expected_hrp, found_hrp
        )));
    }
    if variant != Variant::Bech32 {
        return Err(CoreError::InvalidSlatepackAddress("bech32m is not supported".into()));
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| CoreError::InvalidSlatepackAddress(e.to_string()))?;
    let public_key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CoreError::InvalidSlatepackAddress("expected a 32-byte key".into()))?;

    VerifyingKey::from_bytes(&public_key)
        .map_err(|_| CoreError::InvalidSlatepackAddress("not an Ed25519 public key".into()))?;

    Ok(public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_KEY: &str = "55b85663e5b656141aef643b0ec485cf1b1811137d45cfb57c41abb2bb6930e1";
    const GRIN_ADDRESS: &str = "grin12ku9vcl9ketpgxh0vsasa3y9eud3sygn04zuldtugx4m9wmfxrssj2ktnr";
    const TGRIN_ADDRESS: &str = "tgrin12ku9vcl9ketpgxh0vsasa3y9eud3sygn04zuldtugx4m9wmfxrssdlmy5w";

    fn key() -> [u8; 32] {
        hex::decode(PUBLIC_KEY).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_encode_per_network() {
        assert_eq!(
            public_key_to_slatepack_address(Currency::Grin, &key()).unwrap(),
            GRIN_ADDRESS
        );
        assert_eq!(
            public_key_to_slatepack_address(Currency::GrinTestnet, &key()).unwrap(),
            TGRIN_ADDRESS
        );
    }

    #[test]
    fn test_decode_checks_network() {
        assert_eq!(
            slatepack_address_to_public_key(GRIN_ADDRESS, Currency::Grin).unwrap(),
            key()
        );
        assert!(slatepack_address_to_public_key(GRIN_ADDRESS, Currency::GrinTestnet).is_err());
        assert!(slatepack_address_to_public_key(TGRIN_ADDRESS, Currency::GrinTestnet).is_ok());
    }

    #[test]
    fn test_tor_currencies_have_no_slatepack() {
        assert!(slatepack_address_to_public_key(GRIN_ADDRESS, Currency::MimbleWimbleCoin).is_err());
        assert!(public_key_to_slatepack_address(Currency::EpicCash, &key()).is_err());
    }

    #[test]
    fn test_rejects_corrupted_address() {
        let corrupted = GRIN_ADDRESS.replace("2ku9", "2ku8");
        assert!(slatepack_address_to_public_key(&corrupted, Currency::Grin).is_err());
        assert!(slatepack_address_to_public_key("grin1", Currency::Grin).is_err());
    }
}
