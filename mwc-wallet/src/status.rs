//! Transaction status engine
//!
//! [`compute_status`] is a pure function of an account snapshot, a draft and
//! the runtime profile. It never mutates its inputs and reports problems as
//! values keyed by the field they concern.
//!
//! Input selection walks the account's operations from the oldest to the
//! newest and stops as soon as the accumulated value either pays the amount
//! plus a single-output fee exactly, or exceeds the amount plus a fee that
//! includes a change output. Which inputs end up selected decides the fee, so
//! the stopping rule must not be "improved" into a full scan.

use crate::config::RuntimeProfile;
use crate::transaction::{Transaction, TransactionPatch};
use crate::types::{Account, UnspentOutput};
use mwc_core::codec::{self, decimal};
use mwc_core::{classify, consensus, required_fee, Currency, RecipientAddress};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Draft field a status entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusField {
    Recipient,
    Amount,
    BaseFee,
}

/// Problems that block sending
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum StatusError {
    #[error("A recipient is required")]
    RecipientRequired,

    #[error("This is not a valid {currency_name} address")]
    InvalidAddress { currency_name: String },

    #[error("This recipient can only be paid by sending the transaction as a file")]
    CanOnlySendAsFile,

    #[error("An amount is required")]
    AmountRequired,

    #[error("Not enough balance")]
    NotEnoughBalance,

    #[error("The fee exceeds the maximum fee allowed")]
    MaxFeeExceeded,

    #[error("The base fee must be a positive integer")]
    InvalidBaseFee,
}

/// Conditions worth confirming that do not block sending
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum StatusWarning {
    #[error("The transaction won't have a payment proof since it has no recipient")]
    NoPaymentProofNoRecipient,

    #[error("The transaction won't have a payment proof since the recipient is not a wallet address")]
    NoPaymentProofInapplicableAddress,

    #[error("Sending to this recipient requires Tor")]
    TorRequired,

    #[error("The recipient must return the transaction response through a file or QR code")]
    FileTransport,
}

/// Derived status of a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub errors: BTreeMap<StatusField, StatusError>,
    pub warnings: BTreeMap<StatusField, StatusWarning>,
    #[serde(with = "decimal")]
    pub amount: u64,
    #[serde(with = "decimal")]
    pub estimated_fees: u64,
    #[serde(with = "decimal")]
    pub total_spent: u64,
}

impl TransactionStatus {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outputs chosen to fund a draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSelection {
    pub inputs: Vec<UnspentOutput>,
    pub total: u128,
}

impl InputSelection {
    pub fn count(&self) -> u64 {
        self.inputs.len() as u64
    }
}

fn fee(currency: Currency, inputs: u64, outputs: u64, base_fee: u64) -> u128 {
    u128::from(required_fee(currency, inputs, outputs, 1, base_fee))
}

/// Chooses the outputs that fund `transaction`, oldest first
pub fn select_inputs(account: &Account, transaction: &Transaction) -> InputSelection {
    let currency = account.currency;
    let base_fee = transaction.effective_base_fee(currency);
    let maturity = consensus::coinbase_maturity(currency);
    let amount = u128::from(transaction.amount);

    let mut selection = InputSelection::default();
    for operation in account.operations.iter().rev() {
        if !transaction.use_all_amount {
            let count = selection.count();
            if amount == 0
                || selection.total == amount + fee(currency, count, 1, base_fee)
                || selection.total > amount + fee(currency, count, 2, base_fee)
            {
                break;
            }
        }
        if operation.is_spendable_at(account.block_height, maturity) {
            selection.total += u128::from(operation.value);
            selection.inputs.push(operation.unspent_output());
        }
    }
    selection
}

fn recipient_status(
    currency: Currency,
    transaction: &Transaction,
    runtime: RuntimeProfile,
) -> Result<Option<StatusWarning>, StatusError> {
    match classify(currency, &transaction.recipient) {
        RecipientAddress::Empty if transaction.send_as_file => {
            Ok(Some(StatusWarning::NoPaymentProofNoRecipient))
        }
        RecipientAddress::Empty => Err(StatusError::RecipientRequired),
        RecipientAddress::Http(_) | RecipientAddress::OnionUrl(_) => {
            Ok(Some(StatusWarning::NoPaymentProofInapplicableAddress))
        }
        RecipientAddress::Tor(_) | RecipientAddress::Slatepack(_) => {
            if transaction.send_as_file {
                Ok(Some(StatusWarning::FileTransport))
            } else if runtime.supports_interactive_exchange() {
                Ok(Some(StatusWarning::TorRequired))
            } else {
                Err(StatusError::CanOnlySendAsFile)
            }
        }
        RecipientAddress::Invalid => Err(StatusError::InvalidAddress {
            currency_name: currency.name().to_string(),
        }),
    }
}

/// Computes errors, warnings, amount and fees of `transaction` when sent from `account`
pub fn compute_status(
    account: &Account,
    transaction: &Transaction,
    runtime: RuntimeProfile,
) -> TransactionStatus {
    let currency = account.currency;
    let mut errors = BTreeMap::new();
    let mut warnings = BTreeMap::new();

    match recipient_status(currency, transaction, runtime) {
        Ok(Some(warning)) => {
            warnings.insert(StatusField::Recipient, warning);
        }
        Ok(None) => {}
        Err(error) => {
            errors.insert(StatusField::Recipient, error);
        }
    }

    let base_fee = transaction.effective_base_fee(currency);
    let requested = u128::from(transaction.amount);
    let selection = select_inputs(account, transaction);
    let inputs = selection.count().max(1);
    let single_output_fee = fee(currency, inputs, 1, base_fee);
    let estimated_fees = if transaction.use_all_amount
        || selection.total <= requested + single_output_fee
    {
        single_output_fee
    } else {
        fee(currency, inputs, 2, base_fee)
    };
    debug!(
        inputs = selection.inputs.len(),
        input_total = %selection.total,
        fee = %estimated_fees,
        "selected inputs"
    );

    if estimated_fees > u128::from(consensus::maximum_fee(currency)) {
        errors.insert(StatusField::Amount, StatusError::MaxFeeExceeded);
    }
    if base_fee == 0 {
        errors.insert(StatusField::BaseFee, StatusError::InvalidBaseFee);
    }

    let amount = if transaction.use_all_amount {
        selection.total.saturating_sub(estimated_fees)
    } else {
        requested
    };
    let total_spent = amount + estimated_fees;

    if !transaction.use_all_amount && requested == 0 {
        errors.insert(StatusField::Amount, StatusError::AmountRequired);
    } else if u128::from(account.spendable_balance) < total_spent || amount == 0 {
        errors.insert(StatusField::Amount, StatusError::NotEnoughBalance);
    }

    let nothing_to_send = amount == 0;
    TransactionStatus {
        errors,
        warnings,
        amount: saturate(amount),
        estimated_fees: if nothing_to_send { 0 } else { saturate(estimated_fees) },
        total_spent: saturate(total_spent),
    }
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Largest amount `account` can send with the draft's fee settings
pub fn estimate_max_spendable(
    account: &Account,
    transaction: &Transaction,
    runtime: RuntimeProfile,
) -> u64 {
    let all = transaction.apply(TransactionPatch {
        use_all_amount: Some(true),
        ..TransactionPatch::default()
    });
    compute_status(account, &all, runtime).amount
}

/// Normalizes a draft before its status is shown or it is signed: applies the
/// consensus base fee when the default is in use and resolves "send max" to
/// a concrete amount
pub fn prepare_draft(account: &Account, transaction: &Transaction, runtime: RuntimeProfile) -> Transaction {
    let mut prepared = transaction.clone();
    if prepared.use_default_base_fee {
        prepared.base_fee = consensus::default_base_fee(account.currency);
    }
    if prepared.use_all_amount {
        prepared.amount = estimate_max_spendable(account, &prepared, runtime);
    }
    prepared
}

/// Parses a base fee typed by the user
pub fn validate_base_fee(text: &str) -> Result<u64, StatusError> {
    match codec::parse_decimal("baseFee", text.trim()) {
        Ok(0) | Err(_) => Err(StatusError::InvalidBaseFee),
        Ok(base_fee) => Ok(base_fee),
    }
}
