//! Transaction fee calculation

use crate::consensus::{self, FeeWeights};
use crate::Currency;

/// Body weight of a transaction with the given element counts, never below one
pub fn transaction_weight(weights: &FeeWeights, inputs: u64, outputs: u64, kernels: u64) -> u128 {
    let weight = u128::from(inputs)
        .saturating_mul(u128::from(weights.input))
        .saturating_add(u128::from(outputs).saturating_mul(u128::from(weights.output)))
        .saturating_add(u128::from(kernels).saturating_mul(u128::from(weights.kernel)));
    weight.max(1)
}

/// Fee required for a transaction with the given numbers of inputs, outputs and kernels.
///
/// `inputs` may be zero for estimates made before input selection. The product is
/// computed in 128 bits and saturates at `u64::MAX`; it never rounds down.
pub fn required_fee(
    currency: Currency,
    inputs: u64,
    outputs: u64,
    kernels: u64,
    base_fee: u64,
) -> u64 {
    let weights = &consensus::parameters(currency).weights;
    let fee = transaction_weight(weights, inputs, outputs, kernels).saturating_mul(u128::from(base_fee));
    u64::try_from(fee).unwrap_or(u64::MAX)
}

/// Smallest fee any transaction of `currency` can carry at `base_fee`
pub fn minimum_fee(currency: Currency, base_fee: u64) -> u64 {
    required_fee(currency, 0, 0, 0, base_fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grin_fee_matches_weight_by_iok() {
        // 1 input, 2 outputs, 1 kernel: 1 + 42 + 3 = 46
        assert_eq!(required_fee(Currency::Grin, 1, 2, 1, 500_000), 23_000_000);
    }

    #[test]
    fn test_mwc_fee() {
        // 2 inputs, 1 output, 1 kernel: 2 + 4 + 1 = 7
        assert_eq!(
            required_fee(Currency::MimbleWimbleCoin, 2, 1, 1, 1_000_000),
            7_000_000
        );
    }

    #[test]
    fn test_zero_inputs_is_legal() {
        let fee = required_fee(Currency::EpicCash, 0, 1, 1, 1_000_000);
        assert_eq!(fee, 5_000_000);
        assert!(fee >= minimum_fee(Currency::EpicCash, 1_000_000));
    }

    #[test]
    fn test_weight_floor() {
        assert_eq!(minimum_fee(Currency::Grin, 500_000), 500_000);
        assert_eq!(required_fee(Currency::Grin, 0, 0, 0, 0), 0);
    }

    #[test]
    fn test_saturates() {
        assert_eq!(
            required_fee(Currency::MimbleWimbleCoin, u64::MAX, u64::MAX, 1, u64::MAX),
            u64::MAX
        );
    }
}
