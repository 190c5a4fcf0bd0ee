//! Draft transactions and their immutable patching

use mwc_core::{consensus, Currency};
use serde_json::Value;
use uuid::Uuid;

/// A send being built by the user, plus the exchange state gathered so far
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Requested amount in the smallest unit; ignored when `use_all_amount`
    pub amount: u64,
    /// Recipient as entered, untrimmed
    pub recipient: String,
    pub use_all_amount: bool,
    /// Exchange the slate as a file instead of contacting the recipient
    pub send_as_file: bool,
    pub use_default_base_fee: bool,
    pub base_fee: u64,
    pub height: Option<u64>,
    pub id: Option<Uuid>,
    pub offset: Option<Vec<u8>>,
    pub proof: Option<Vec<u8>>,
    pub private_nonce_index: Option<u32>,
    pub transaction_response: Option<String>,
    /// Opaque data passed through to the caller
    pub network_info: Value,
}

/// Partial update of a [`Transaction`].
///
/// Exchange fields are doubly optional: `Some(None)` clears the field while
/// `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<u64>,
    pub recipient: Option<String>,
    pub use_all_amount: Option<bool>,
    pub send_as_file: Option<bool>,
    pub use_default_base_fee: Option<bool>,
    pub base_fee: Option<u64>,
    pub height: Option<Option<u64>>,
    pub id: Option<Option<Uuid>>,
    pub offset: Option<Option<Vec<u8>>>,
    pub proof: Option<Option<Vec<u8>>>,
    pub private_nonce_index: Option<Option<u32>>,
    pub transaction_response: Option<Option<String>>,
    pub network_info: Option<Value>,
}

impl TransactionPatch {
    /// Patch clearing every field produced by a slate exchange
    pub fn clear_exchange_state() -> Self {
        Self {
            height: Some(None),
            id: Some(None),
            offset: Some(None),
            proof: Some(None),
            private_nonce_index: Some(None),
            transaction_response: Some(None),
            ..Self::default()
        }
    }
}

impl Transaction {
    /// Empty draft for `currency`
    pub fn new(currency: Currency) -> Self {
        Self {
            amount: 0,
            recipient: String::new(),
            use_all_amount: false,
            send_as_file: false,
            use_default_base_fee: true,
            base_fee: consensus::default_base_fee(currency),
            height: None,
            id: None,
            offset: None,
            proof: None,
            private_nonce_index: None,
            transaction_response: None,
            network_info: Value::Object(serde_json::Map::new()),
        }
    }

    /// Returns a new draft with `patch` applied
    #[must_use]
    pub fn apply(&self, patch: TransactionPatch) -> Self {
        let mut next = self.clone();
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(recipient) = patch.recipient {
            next.recipient = recipient;
        }
        if let Some(use_all_amount) = patch.use_all_amount {
            next.use_all_amount = use_all_amount;
        }
        if let Some(send_as_file) = patch.send_as_file {
            next.send_as_file = send_as_file;
        }
        if let Some(use_default_base_fee) = patch.use_default_base_fee {
            next.use_default_base_fee = use_default_base_fee;
        }
        if let Some(base_fee) = patch.base_fee {
            next.base_fee = base_fee;
        }
        if let Some(height) = patch.height {
            next.height = height;
        }
        if let Some(id) = patch.id {
            next.id = id;
        }
        if let Some(offset) = patch.offset {
            next.offset = offset;
        }
        if let Some(proof) = patch.proof {
            next.proof = proof;
        }
        if let Some(private_nonce_index) = patch.private_nonce_index {
            next.private_nonce_index = private_nonce_index;
        }
        if let Some(transaction_response) = patch.transaction_response {
            next.transaction_response = transaction_response;
        }
        if let Some(network_info) = patch.network_info {
            next.network_info = network_info;
        }
        next
    }

    /// Same draft without any slate exchange state
    #[must_use]
    pub fn cleared_exchange_state(&self) -> Self {
        self.apply(TransactionPatch::clear_exchange_state())
    }

    /// Base fee the transaction will pay per unit of weight
    pub fn effective_base_fee(&self, currency: Currency) -> u64 {
        if self.use_default_base_fee {
            consensus::default_base_fee(currency)
        } else {
            self.base_fee
        }
    }

    /// Whether a slate exchange has produced data for this draft
    pub fn has_exchange_state(&self) -> bool {
        self.height.is_some() || self.id.is_some() || self.offset.is_some()
    }
}

/// One-line summary of a draft, e.g. `SEND 1.5 MWC TO http://localhost`
pub fn format_transaction(transaction: &Transaction, currency: Currency) -> String {
    let recipient = transaction.recipient.trim();
    if transaction.use_all_amount {
        format!("SEND MAX TO {}", recipient)
    } else {
        format!(
            "SEND {} TO {}",
            currency.format_amount(transaction.amount, true),
            recipient
        )
    }
}
