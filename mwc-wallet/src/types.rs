//! Account, operation and output types for MWC wallets

use chrono::{DateTime, Utc};
use mwc_core::{CoreError, CoreResult, Currency, Identifier, Nullable};
use serde::{Deserialize, Serialize};

/// A block seen by the account, kept to validate proofs against recent history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentHeight {
    pub height: u64,
    pub hash: Vec<u8>,
}

/// Per-account state owned by the transaction family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountResources {
    /// Root public key exported by the device
    pub root_public_key: Vec<u8>,
    /// Recently observed blocks, newest first
    pub recent_heights: Vec<RecentHeight>,
    /// Identifier handed to the next output the account creates
    pub next_identifier: Identifier,
    /// Sequence number of the next transaction the account creates
    pub next_transaction_sequence_number: u32,
}

impl AccountResources {
    pub fn new(root_public_key: Vec<u8>) -> Self {
        Self {
            root_public_key,
            recent_heights: Vec::new(),
            next_identifier: Identifier::default(),
            next_transaction_sequence_number: 0,
        }
    }

    /// Records a block, replacing any entry at the same height and keeping at
    /// most `capacity` entries ordered newest first
    pub fn record_recent_height(&mut self, recent: RecentHeight, capacity: usize) {
        self.recent_heights.retain(|entry| entry.height != recent.height);
        let position = self
            .recent_heights
            .iter()
            .position(|entry| entry.height < recent.height)
            .unwrap_or(self.recent_heights.len());
        self.recent_heights.insert(position, recent);
        self.recent_heights.truncate(capacity);
    }

    /// Moves `next_identifier` past `used` if it is not already beyond it
    pub fn advance_identifier_past(&mut self, used: &Identifier) -> CoreResult<()> {
        if *used >= self.next_identifier {
            self.next_identifier = used.next()?;
        }
        Ok(())
    }
}

/// Direction of a ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    In,
    Out,
    CoinbaseReward,
}

/// Family-specific metadata of a ledger operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationExtra {
    pub output_commitment: Option<Vec<u8>>,
    pub identifier: Option<Identifier>,
    pub switch_type: Option<u8>,
    pub spent: Option<bool>,
    pub kernel_excess: Nullable<Vec<u8>>,
    pub kernel_offset: Nullable<Vec<u8>>,
    pub recipient_payment_proof_signature: Nullable<Vec<u8>>,
}

impl OperationExtra {
    pub fn is_spent(&self) -> bool {
        self.spent.unwrap_or(false)
    }

    /// Marks the output as consumed; returns whether this call changed it
    pub fn mark_spent(&mut self) -> bool {
        if self.is_spent() {
            return false;
        }
        self.spent = Some(true);
        true
    }

    /// Records the kernel excess. Once a non-null excess is known it may only
    /// be set again to the same value.
    pub fn set_kernel_excess(&mut self, excess: Option<Vec<u8>>) -> CoreResult<()> {
        if let Nullable::Value(current) = &self.kernel_excess {
            return if excess.as_ref() == Some(current) {
                Ok(())
            } else {
                Err(CoreError::KernelExcessImmutable)
            };
        }
        self.kernel_excess = excess.into();
        Ok(())
    }
}

/// A ledger operation of the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: String,
    pub hash: String,
    pub kind: OperationKind,
    pub value: u64,
    pub fee: u64,
    /// Height of the confirming block, `None` while unconfirmed
    pub block_height: Option<u64>,
    pub date: DateTime<Utc>,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
    pub extra: OperationExtra,
}

impl Operation {
    /// Whether the output this operation created can fund a new transaction
    /// when the chain tip is at `tip_height`
    pub fn is_spendable_at(&self, tip_height: u64, coinbase_maturity: u64) -> bool {
        if self.kind == OperationKind::Out || self.extra.is_spent() {
            return false;
        }
        let Some(block_height) = self.block_height else {
            return false;
        };
        match self.kind {
            OperationKind::CoinbaseReward => {
                u128::from(tip_height) + 1 >= u128::from(block_height) + u128::from(coinbase_maturity)
            }
            _ => true,
        }
    }

    pub fn unspent_output(&self) -> UnspentOutput {
        UnspentOutput {
            operation_id: self.id.clone(),
            value: self.value,
            identifier: self.extra.identifier,
            commitment: self.extra.output_commitment.clone(),
            block_height: self.block_height,
            is_coinbase: self.kind == OperationKind::CoinbaseReward,
        }
    }
}

/// An output that can be consumed as a transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    /// Operation that created the output
    pub operation_id: String,
    pub value: u64,
    pub identifier: Option<Identifier>,
    #[serde(with = "optional_hex")]
    pub commitment: Option<Vec<u8>>,
    pub block_height: Option<u64>,
    pub is_coinbase: bool,
}

/// A MimbleWimble-family account snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub currency: Currency,
    /// Current chain tip height as last synced
    pub block_height: u64,
    pub balance: u64,
    pub spendable_balance: u64,
    /// Ledger order: index 0 is the most recent operation
    pub operations: Vec<Operation>,
    pub resources: AccountResources,
}

impl Account {
    pub fn new(id: impl Into<String>, currency: Currency, resources: AccountResources) -> Self {
        Self {
            id: id.into(),
            currency,
            block_height: 0,
            balance: 0,
            spendable_balance: 0,
            operations: Vec::new(),
            resources,
        }
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|operation| operation.id == id)
    }
}

mod optional_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| hex::decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
