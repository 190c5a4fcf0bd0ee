//! Helpers shared by the raw (JSON) forms
//!
//! Binary values travel as hex strings and amounts as decimal strings so that
//! no consumer has to round-trip them through a floating point number.

use crate::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parses an unsigned decimal string such as `"1500000000"`
pub fn parse_decimal(field: &'static str, text: &str) -> Result<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::decimal(field, text));
    }
    text.parse().map_err(|_| CoreError::decimal(field, text))
}

pub fn decode_hex(field: &'static str, text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| CoreError::hex(field, e))
}

/// Decodes a hex string that must hold exactly `N` bytes
pub fn decode_hex_array<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    hex::decode_to_slice(text, &mut bytes).map_err(|e| CoreError::hex(field, e))?;
    Ok(bytes)
}

/// `serde(with)` module writing a `u64` as a decimal string
pub mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_decimal("decimal", &text).map_err(serde::de::Error::custom)
    }
}

/// A field that may be absent, explicitly null, or hold a value.
///
/// Absent means "not known yet" and null means "known to be absent"; the two
/// must survive a round trip. Use together with
/// `#[serde(default, skip_serializing_if = "Nullable::is_absent")]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Nullable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Nullable::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Nullable<U> {
        match self {
            Nullable::Absent => Nullable::Absent,
            Nullable::Null => Nullable::Null,
            Nullable::Value(value) => Nullable::Value(f(value)),
        }
    }

    /// Like [`Nullable::map`] for fallible conversions
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> std::result::Result<U, E>) -> std::result::Result<Nullable<U>, E> {
        Ok(match self {
            Nullable::Absent => Nullable::Absent,
            Nullable::Null => Nullable::Null,
            Nullable::Value(value) => Nullable::Value(f(value)?),
        })
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Nullable::Absent
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    /// A known `None` is null, never absent
    fn from(value: Option<T>) -> Self {
        value.map_or(Nullable::Null, Nullable::Value)
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Nullable::Absent | Nullable::Null => serializer.serialize_none(),
            Nullable::Value(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Extra {
        #[serde(default, skip_serializing_if = "Nullable::is_absent")]
        excess: Nullable<String>,
        #[serde(with = "decimal")]
        amount: u64,
    }

    #[test]
    fn test_nullable_three_states() {
        let absent: Extra = serde_json::from_str(r#"{"amount":"5"}"#).unwrap();
        assert!(absent.excess.is_absent());
        assert_eq!(serde_json::to_string(&absent).unwrap(), r#"{"amount":"5"}"#);

        let null: Extra = serde_json::from_str(r#"{"excess":null,"amount":"5"}"#).unwrap();
        assert!(null.excess.is_null());
        assert_eq!(
            serde_json::to_string(&null).unwrap(),
            r#"{"excess":null,"amount":"5"}"#
        );

        let value: Extra = serde_json::from_str(r#"{"excess":"ab","amount":"5"}"#).unwrap();
        assert_eq!(value.excess.value().map(String::as_str), Some("ab"));
    }

    #[test]
    fn test_decimal_strings() {
        assert_eq!(parse_decimal("amount", "18446744073709551615").unwrap(), u64::MAX);
        assert!(parse_decimal("amount", "18446744073709551616").is_err());
        assert!(parse_decimal("amount", "-1").is_err());
        assert!(parse_decimal("amount", "").is_err());
        assert!(parse_decimal("amount", "1.5").is_err());
        assert!(serde_json::from_str::<Extra>(r#"{"amount":5}"#).is_err());
    }

    #[test]
    fn test_hex_arrays() {
        let bytes: [u8; 2] = decode_hex_array("hash", "beef").unwrap();
        assert_eq!(bytes, [0xbe, 0xef]);
        assert!(decode_hex_array::<3>("hash", "beef").is_err());
        assert!(matches!(
            decode_hex("hash", "zz"),
            Err(CoreError::InvalidHex { field: "hash", .. })
        ));
    }
}
