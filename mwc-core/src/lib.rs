//! MWC Core - consensus rules shared by the MimbleWimble-family wallets
//!
//! This crate provides the pure, synchronous pieces of the transaction
//! family: per-currency consensus parameters, the fee calculator, recipient
//! address classification and the encodings used by the raw forms.

pub mod address;
pub mod codec;
pub mod consensus;
pub mod currency;
pub mod error;
pub mod fee;
pub mod identifier;

pub use address::{classify, AddressScheme, RecipientAddress, CLASSIFIER_ORDER};
pub use codec::Nullable;
pub use consensus::{coinbase_maturity, default_base_fee, maximum_fee, ConsensusParameters};
pub use currency::{AddressFamily, Currency};
pub use error::CoreError;
pub use fee::{minimum_fee, required_fee};
pub use identifier::Identifier;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Family name carried by every raw transaction of these currencies
pub const TRANSACTION_FAMILY: &str = "mimblewimble_coin";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_constant() {
        assert_eq!(TRANSACTION_FAMILY, Currency::MimbleWimbleCoin.id());
    }
}
