//! Supported MimbleWimble-family currencies and their display units

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies handled by the `mimblewimble_coin` transaction family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "mimblewimble_coin")]
    MimbleWimbleCoin,
    #[serde(rename = "mimblewimble_coin_floonet")]
    MimbleWimbleCoinFloonet,
    #[serde(rename = "grin")]
    Grin,
    #[serde(rename = "grin_testnet")]
    GrinTestnet,
    #[serde(rename = "epic_cash")]
    EpicCash,
    #[serde(rename = "epic_cash_floonet")]
    EpicCashFloonet,
}

/// How a currency's wallets address each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    /// Tor v3 hidden-service addresses (MWC, Epic Cash)
    Tor,
    /// Bech32 Slatepack addresses (Grin)
    Slatepack,
}

impl Currency {
    /// Every supported currency, mainnets first
    pub const ALL: [Currency; 6] = [
        Currency::MimbleWimbleCoin,
        Currency::Grin,
        Currency::EpicCash,
        Currency::MimbleWimbleCoinFloonet,
        Currency::GrinTestnet,
        Currency::EpicCashFloonet,
    ];

    /// Stable identifier used in raw forms
    pub fn id(self) -> &'static str {
        match self {
            Currency::MimbleWimbleCoin => "mimblewimble_coin",
            Currency::MimbleWimbleCoinFloonet => "mimblewimble_coin_floonet",
            Currency::Grin => "grin",
            Currency::GrinTestnet => "grin_testnet",
            Currency::EpicCash => "epic_cash",
            Currency::EpicCashFloonet => "epic_cash_floonet",
        }
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Currency::MimbleWimbleCoin => "MimbleWimble Coin",
            Currency::MimbleWimbleCoinFloonet => "MimbleWimble Coin Floonet",
            Currency::Grin => "Grin",
            Currency::GrinTestnet => "Grin Testnet",
            Currency::EpicCash => "Epic Cash",
            Currency::EpicCashFloonet => "Epic Cash Floonet",
        }
    }

    pub fn ticker(self) -> &'static str {
        match self {
            Currency::MimbleWimbleCoin | Currency::MimbleWimbleCoinFloonet => "MWC",
            Currency::Grin | Currency::GrinTestnet => "GRIN",
            Currency::EpicCash | Currency::EpicCashFloonet => "EPIC",
        }
    }

    /// Number of decimal places of the display unit
    pub fn unit_magnitude(self) -> u32 {
        9
    }

    pub fn address_family(self) -> AddressFamily {
        match self {
            Currency::Grin | Currency::GrinTestnet => AddressFamily::Slatepack,
            _ => AddressFamily::Tor,
        }
    }

    /// Bech32 human readable part of Slatepack addresses, if the currency uses them
    pub fn slatepack_hrp(self) -> Option<&'static str> {
        match self {
            Currency::Grin => Some("grin"),
            Currency::GrinTestnet => Some("tgrin"),
            _ => None,
        }
    }

    pub fn is_testnet(self) -> bool {
        matches!(
            self,
            Currency::MimbleWimbleCoinFloonet | Currency::GrinTestnet | Currency::EpicCashFloonet
        )
    }

    /// Formats an amount in the smallest unit without rounding, e.g. `1.5 MWC`
    pub fn format_amount(self, amount: u64, show_code: bool) -> String {
        let divisor = 10u64.pow(self.unit_magnitude());
        let whole = amount / divisor;
        let fraction = amount % divisor;
        let mut text = whole.to_string();
        if fraction != 0 {
            let digits = format!("{:0width$}", fraction, width = self.unit_magnitude() as usize);
            text.push('.');
            text.push_str(digits.trim_end_matches('0'));
        }
        if show_code {
            text.push(' ');
            text.push_str(self.ticker());
        }
        text
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Currency::ALL
            .into_iter()
            .find(|currency| currency.id() == s)
            .ok_or_else(|| CoreError::UnknownCurrency(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_ids_round_trip() {
        for currency in Currency::ALL {
            assert_eq!(currency.id().parse::<Currency>().unwrap(), currency);
        }
        assert!(matches!(
            "bitcoin".parse::<Currency>(),
            Err(CoreError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_serde_uses_ids() {
        let json = serde_json::to_string(&Currency::GrinTestnet).unwrap();
        assert_eq!(json, "\"grin_testnet\"");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Currency::MimbleWimbleCoin.format_amount(1_500_000_000, true), "1.5 MWC");
        assert_eq!(Currency::Grin.format_amount(1, false), "0.000000001");
        assert_eq!(Currency::EpicCash.format_amount(0, true), "0 EPIC");
    }

    #[test]
    fn test_address_families() {
        assert_eq!(Currency::Grin.address_family(), AddressFamily::Slatepack);
        assert_eq!(Currency::EpicCash.address_family(), AddressFamily::Tor);
        assert_eq!(Currency::MimbleWimbleCoinFloonet.slatepack_hrp(), None);
        assert_eq!(Currency::GrinTestnet.slatepack_hrp(), Some("tgrin"));
    }
}
