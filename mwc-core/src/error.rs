//! Error types for MimbleWimble core operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Invalid hex in field `{field}`: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error("Invalid decimal in field `{field}`: {value:?}")]
    InvalidDecimal { field: &'static str, value: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid Tor address: {0}")]
    InvalidTorAddress(String),

    #[error("Invalid Slatepack address: {0}")]
    InvalidSlatepackAddress(String),

    #[error("Kernel excess is already set and cannot change")]
    KernelExcessImmutable,
}

impl CoreError {
    /// Wraps a hex decoding failure with the name of the field being decoded
    pub fn hex(field: &'static str, source: hex::FromHexError) -> Self {
        CoreError::InvalidHex { field, source }
    }

    /// Builds a decimal parsing error for `field`
    pub fn decimal(field: &'static str, value: impl Into<String>) -> Self {
        CoreError::InvalidDecimal {
            field,
            value: value.into(),
        }
    }
}
