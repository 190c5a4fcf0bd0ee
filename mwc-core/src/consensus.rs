//! Per-currency consensus constants

use crate::Currency;
use serde::Serialize;

/// Blocks per day at a one minute block time
pub const DAY_HEIGHT: u64 = 60 * 24;

/// Largest fee representable in Grin's 40-bit kernel fee field
pub const GRIN_MAXIMUM_FEE: u64 = (1 << 40) - 1;

/// Weight contributed by each transaction element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeWeights {
    pub input: u64,
    pub output: u64,
    pub kernel: u64,
}

/// Immutable consensus constants of one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsensusParameters {
    /// Confirmations before a coinbase output may be spent
    pub coinbase_maturity: u64,
    /// Base fee applied when the draft does not override it
    pub default_base_fee: u64,
    /// Largest fee a transaction may carry
    pub maximum_fee: u64,
    pub weights: FeeWeights,
}

// MWC and Epic nodes weigh transactions as max(4 * outputs + kernels - inputs, 1).
// Wallets price every element positively instead (inputs count +1), so the
// fee computed here is never below what those nodes require.
const MWC_PARAMETERS: ConsensusParameters = ConsensusParameters {
    coinbase_maturity: DAY_HEIGHT,
    default_base_fee: 1_000_000,
    maximum_fee: u64::MAX,
    weights: FeeWeights {
        input: 1,
        output: 4,
        kernel: 1,
    },
};

const GRIN_PARAMETERS: ConsensusParameters = ConsensusParameters {
    coinbase_maturity: DAY_HEIGHT,
    default_base_fee: 500_000,
    maximum_fee: GRIN_MAXIMUM_FEE,
    weights: FeeWeights {
        input: 1,
        output: 21,
        kernel: 3,
    },
};

const EPIC_PARAMETERS: ConsensusParameters = ConsensusParameters {
    coinbase_maturity: DAY_HEIGHT,
    default_base_fee: 1_000_000,
    maximum_fee: u64::MAX,
    weights: FeeWeights {
        input: 1,
        output: 4,
        kernel: 1,
    },
};

/// Looks up the consensus table entry for `currency`
pub fn parameters(currency: Currency) -> &'static ConsensusParameters {
    match currency {
        Currency::MimbleWimbleCoin | Currency::MimbleWimbleCoinFloonet => &MWC_PARAMETERS,
        Currency::Grin | Currency::GrinTestnet => &GRIN_PARAMETERS,
        Currency::EpicCash | Currency::EpicCashFloonet => &EPIC_PARAMETERS,
    }
}

pub fn coinbase_maturity(currency: Currency) -> u64 {
    parameters(currency).coinbase_maturity
}

pub fn default_base_fee(currency: Currency) -> u64 {
    parameters(currency).default_base_fee
}

pub fn maximum_fee(currency: Currency) -> u64 {
    parameters(currency).maximum_fee
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_fees() {
        assert_eq!(default_base_fee(Currency::MimbleWimbleCoin), 1_000_000);
        assert_eq!(default_base_fee(Currency::EpicCashFloonet), 1_000_000);
        assert_eq!(default_base_fee(Currency::Grin), 500_000);
    }

    #[test]
    fn test_testnets_share_mainnet_parameters() {
        assert_eq!(
            parameters(Currency::GrinTestnet),
            parameters(Currency::Grin)
        );
        assert_eq!(
            parameters(Currency::MimbleWimbleCoinFloonet),
            parameters(Currency::MimbleWimbleCoin)
        );
    }

    #[test]
    fn test_maturity_and_maximum_fee() {
        for currency in Currency::ALL {
            assert_eq!(coinbase_maturity(currency), 1440);
            assert!(maximum_fee(currency) > default_base_fee(currency));
        }
        assert_eq!(maximum_fee(Currency::Grin), 0xff_ffff_ffff);
    }

    #[test]
    fn test_mwc_weights_cover_node_weight() {
        let weights = parameters(Currency::EpicCash).weights;
        for (inputs, outputs, kernels) in [(1u64, 1u64, 1u64), (3, 2, 1), (10, 1, 1)] {
            let wallet = inputs * weights.input + outputs * weights.output + kernels * weights.kernel;
            let node = (4 * outputs + kernels).saturating_sub(inputs).max(1);
            assert!(wallet >= node, "{inputs} {outputs} {kernels}");
        }
        assert_eq!(weights, parameters(Currency::MimbleWimbleCoin).weights);
        assert_eq!(weights.input + weights.output + weights.kernel, 6);
    }
}
