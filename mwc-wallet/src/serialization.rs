//! Raw (JSON) forms of drafts, accounts and operations
//!
//! Binary values are hex strings and amounts are decimal strings. Optional
//! fields are omitted when unknown; the nullable operation-extra fields keep
//! an explicit `null` distinct from an omitted key.

use crate::error::{WalletError, WalletResult};
use crate::transaction::Transaction;
use crate::types::{
    Account, AccountResources, Operation, OperationExtra, OperationKind, RecentHeight,
};
use chrono::{DateTime, Utc};
use mwc_core::codec::{decode_hex, parse_decimal};
use mwc_core::{Currency, Identifier, Nullable, TRANSACTION_FAMILY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Wire form of a [`Transaction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRaw {
    pub family: String,
    pub amount: String,
    pub recipient: String,
    pub use_all_amount: bool,
    pub use_default_base_fee: bool,
    pub send_as_file: bool,
    pub base_fee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_nonce_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_response: Option<String>,
    #[serde(default = "empty_object")]
    pub network_info: Value,
}

impl Transaction {
    pub fn to_raw(&self) -> TransactionRaw {
        TransactionRaw {
            family: TRANSACTION_FAMILY.to_string(),
            amount: self.amount.to_string(),
            recipient: self.recipient.clone(),
            use_all_amount: self.use_all_amount,
            use_default_base_fee: self.use_default_base_fee,
            send_as_file: self.send_as_file,
            base_fee: self.base_fee.to_string(),
            height: self.height.map(|height| height.to_string()),
            id: self.id.map(|id| id.to_string()),
            offset: self.offset.as_ref().map(hex::encode),
            proof: self.proof.as_ref().map(hex::encode),
            private_nonce_index: self.private_nonce_index,
            transaction_response: self.transaction_response.clone(),
            network_info: self.network_info.clone(),
        }
    }

    pub fn from_raw(raw: &TransactionRaw) -> WalletResult<Self> {
        if raw.family != TRANSACTION_FAMILY {
            return Err(WalletError::InvalidTransaction(format!(
                "unexpected family {}",
                raw.family
            )));
        }
        let id = raw
            .id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| WalletError::InvalidTransaction(format!("invalid id: {}", e)))?;

        Ok(Self {
            amount: parse_decimal("amount", &raw.amount)?,
            recipient: raw.recipient.clone(),
            use_all_amount: raw.use_all_amount,
            send_as_file: raw.send_as_file,
            use_default_base_fee: raw.use_default_base_fee,
            base_fee: parse_decimal("baseFee", &raw.base_fee)?,
            height: raw
                .height
                .as_deref()
                .map(|height| parse_decimal("height", height))
                .transpose()?,
            id,
            offset: raw
                .offset
                .as_deref()
                .map(|offset| decode_hex("offset", offset))
                .transpose()?,
            proof: raw
                .proof
                .as_deref()
                .map(|proof| decode_hex("proof", proof))
                .transpose()?,
            private_nonce_index: raw.private_nonce_index,
            transaction_response: raw.transaction_response.clone(),
            network_info: raw.network_info.clone(),
        })
    }
}

/// Wire form of a [`RecentHeight`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentHeightRaw {
    pub height: String,
    pub hash: String,
}

/// Wire form of [`AccountResources`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResourcesRaw {
    pub root_public_key: String,
    pub recent_heights: Vec<RecentHeightRaw>,
    pub next_identifier: String,
    pub next_transaction_sequence_number: u32,
}

impl AccountResources {
    pub fn to_raw(&self) -> AccountResourcesRaw {
        AccountResourcesRaw {
            root_public_key: hex::encode(&self.root_public_key),
            recent_heights: self
                .recent_heights
                .iter()
                .map(|recent| RecentHeightRaw {
                    height: recent.height.to_string(),
                    hash: hex::encode(&recent.hash),
                })
                .collect(),
            next_identifier: self.next_identifier.to_hex(),
            next_transaction_sequence_number: self.next_transaction_sequence_number,
        }
    }

    pub fn from_raw(raw: &AccountResourcesRaw) -> WalletResult<Self> {
        let recent_heights = raw
            .recent_heights
            .iter()
            .map(|recent| -> WalletResult<RecentHeight> {
                Ok(RecentHeight {
                    height: parse_decimal("recentHeights.height", &recent.height)?,
                    hash: decode_hex("recentHeights.hash", &recent.hash)?,
                })
            })
            .collect::<WalletResult<Vec<_>>>()?;

        Ok(Self {
            root_public_key: decode_hex("rootPublicKey", &raw.root_public_key)?,
            recent_heights,
            next_identifier: Identifier::from_hex(&raw.next_identifier)?,
            next_transaction_sequence_number: raw.next_transaction_sequence_number,
        })
    }
}

/// Wire form of [`OperationExtra`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationExtraRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_commitment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent: Option<bool>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub kernel_excess: Nullable<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub kernel_offset: Nullable<String>,
    #[serde(default, skip_serializing_if = "Nullable::is_absent")]
    pub recipient_payment_proof_signature: Nullable<String>,
}

fn nullable_hex_to_raw(value: &Nullable<Vec<u8>>) -> Nullable<String> {
    value.clone().map(hex::encode)
}

/// An empty string is read as "known to be absent"
fn nullable_hex_from_raw(field: &'static str, value: &Nullable<String>) -> WalletResult<Nullable<Vec<u8>>> {
    match value {
        Nullable::Value(text) if text.is_empty() => Ok(Nullable::Null),
        other => Ok(other.clone().try_map(|text| decode_hex(field, &text))?),
    }
}

impl OperationExtra {
    pub fn to_raw(&self) -> OperationExtraRaw {
        OperationExtraRaw {
            output_commitment: self.output_commitment.as_ref().map(hex::encode),
            identifier: self.identifier.map(|identifier| identifier.to_hex()),
            switch_type: self.switch_type,
            spent: self.spent,
            kernel_excess: nullable_hex_to_raw(&self.kernel_excess),
            kernel_offset: nullable_hex_to_raw(&self.kernel_offset),
            recipient_payment_proof_signature: nullable_hex_to_raw(
                &self.recipient_payment_proof_signature,
            ),
        }
    }

    pub fn from_raw(raw: &OperationExtraRaw) -> WalletResult<Self> {
        Ok(Self {
            output_commitment: raw
                .output_commitment
                .as_deref()
                .map(|commitment| decode_hex("outputCommitment", commitment))
                .transpose()?,
            identifier: raw
                .identifier
                .as_deref()
                .map(Identifier::from_hex)
                .transpose()?,
            switch_type: raw.switch_type,
            spent: raw.spent,
            kernel_excess: nullable_hex_from_raw("kernelExcess", &raw.kernel_excess)?,
            kernel_offset: nullable_hex_from_raw("kernelOffset", &raw.kernel_offset)?,
            recipient_payment_proof_signature: nullable_hex_from_raw(
                "recipientPaymentProofSignature",
                &raw.recipient_payment_proof_signature,
            )?,
        })
    }
}

/// Wire form of an [`Operation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRaw {
    pub id: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub value: String,
    pub fee: String,
    pub block_height: Option<u64>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub senders: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub extra: OperationExtraRaw,
}

impl Operation {
    pub fn to_raw(&self) -> OperationRaw {
        OperationRaw {
            id: self.id.clone(),
            hash: self.hash.clone(),
            kind: self.kind,
            value: self.value.to_string(),
            fee: self.fee.to_string(),
            block_height: self.block_height,
            date: self.date,
            senders: self.senders.clone(),
            recipients: self.recipients.clone(),
            extra: self.extra.to_raw(),
        }
    }

    pub fn from_raw(raw: &OperationRaw) -> WalletResult<Self> {
        Ok(Self {
            id: raw.id.clone(),
            hash: raw.hash.clone(),
            kind: raw.kind,
            value: parse_decimal("value", &raw.value)?,
            fee: parse_decimal("fee", &raw.fee)?,
            block_height: raw.block_height,
            date: raw.date,
            senders: raw.senders.clone(),
            recipients: raw.recipients.clone(),
            extra: OperationExtra::from_raw(&raw.extra)?,
        })
    }
}

/// Wire form of an [`Account`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRaw {
    pub id: String,
    pub currency_id: String,
    pub block_height: u64,
    pub balance: String,
    pub spendable_balance: String,
    #[serde(default)]
    pub operations: Vec<OperationRaw>,
    pub mimble_wimble_coin_resources: AccountResourcesRaw,
}

impl Account {
    pub fn to_raw(&self) -> AccountRaw {
        AccountRaw {
            id: self.id.clone(),
            currency_id: self.currency.id().to_string(),
            block_height: self.block_height,
            balance: self.balance.to_string(),
            spendable_balance: self.spendable_balance.to_string(),
            operations: self.operations.iter().map(Operation::to_raw).collect(),
            mimble_wimble_coin_resources: self.resources.to_raw(),
        }
    }

    pub fn from_raw(raw: &AccountRaw) -> WalletResult<Self> {
        Ok(Self {
            id: raw.id.clone(),
            currency: raw.currency_id.parse::<Currency>()?,
            block_height: raw.block_height,
            balance: parse_decimal("balance", &raw.balance)?,
            spendable_balance: parse_decimal("spendableBalance", &raw.spendable_balance)?,
            operations: raw
                .operations
                .iter()
                .map(Operation::from_raw)
                .collect::<WalletResult<Vec<_>>>()?,
            resources: AccountResources::from_raw(&raw.mimble_wimble_coin_resources)?,
        })
    }
}
