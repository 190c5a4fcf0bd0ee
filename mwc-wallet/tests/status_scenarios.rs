//! Status engine scenarios through the public API

use chrono::{DateTime, Utc};
use mwc_core::Currency;
use mwc_wallet::{
    compute_status, Account, AccountResources, Operation, OperationExtra, OperationKind,
    RuntimeProfile, StatusError, StatusField, StatusWarning, Transaction, TransactionPatch,
};
use proptest::prelude::*;

const COIN: u64 = 1_000_000_000;
const TOR_RECIPIENT: &str = "kw4fmy7fwzlbigxpmq5q5refz4nrqeitpvc47nl4igv3fo3jgdq7u3yd";

fn received(id: &str, value: u64, block_height: u64) -> Operation {
    Operation {
        id: id.to_string(),
        hash: format!("hash-{}", id),
        kind: OperationKind::In,
        value,
        fee: 0,
        block_height: Some(block_height),
        date: DateTime::<Utc>::default(),
        senders: Vec::new(),
        recipients: Vec::new(),
        extra: OperationExtra::default(),
    }
}

fn account_with(values: &[u64]) -> Account {
    let mut account = Account::new(
        "js:2:mimblewimble_coin:0",
        Currency::MimbleWimbleCoin,
        AccountResources::new(vec![2; 33]),
    );
    account.block_height = 1000;
    account.operations = values
        .iter()
        .enumerate()
        .rev()
        .map(|(index, value)| received(&format!("op-{}", index), *value, 10 + u64::try_from(index).unwrap()))
        .collect();
    account.balance = values.iter().sum();
    account.spendable_balance = account.balance;
    account
}

fn draft(patch: TransactionPatch) -> Transaction {
    Transaction::new(Currency::MimbleWimbleCoin).apply(patch)
}

#[test]
fn zero_amount_requires_an_amount() {
    let status = compute_status(
        &account_with(&[COIN]),
        &draft(TransactionPatch {
            amount: Some(0),
            recipient: Some("http://localhost".to_string()),
            ..TransactionPatch::default()
        }),
        RuntimeProfile::Desktop,
    );
    assert_eq!(status.errors.get(&StatusField::Amount), Some(&StatusError::AmountRequired));
    assert_eq!(
        status.warnings.get(&StatusField::Recipient),
        Some(&StatusWarning::NoPaymentProofInapplicableAddress)
    );
}

#[test]
fn empty_account_has_not_enough_balance() {
    let status = compute_status(
        &account_with(&[]),
        &draft(TransactionPatch {
            amount: Some(1),
            recipient: Some("http://localhost".to_string()),
            ..TransactionPatch::default()
        }),
        RuntimeProfile::Desktop,
    );
    assert_eq!(status.errors.get(&StatusField::Amount), Some(&StatusError::NotEnoughBalance));
}

#[test]
fn file_without_recipient_only_warns() {
    let status = compute_status(
        &account_with(&[COIN]),
        &draft(TransactionPatch {
            amount: Some(COIN / 2),
            send_as_file: Some(true),
            ..TransactionPatch::default()
        }),
        RuntimeProfile::Desktop,
    );
    assert!(!status.errors.contains_key(&StatusField::Recipient));
    assert_eq!(
        status.warnings.get(&StatusField::Recipient),
        Some(&StatusWarning::NoPaymentProofNoRecipient)
    );
    assert!(status.is_valid());
}

#[test]
fn non_http_url_is_invalid() {
    let status = compute_status(
        &account_with(&[COIN]),
        &draft(TransactionPatch {
            amount: Some(COIN / 2),
            recipient: Some("ftp://localhost".to_string()),
            ..TransactionPatch::default()
        }),
        RuntimeProfile::Desktop,
    );
    assert_eq!(
        status.errors.get(&StatusField::Recipient),
        Some(&StatusError::InvalidAddress {
            currency_name: "MimbleWimble Coin".to_string()
        })
    );
}

#[test]
fn tor_recipient_on_embedded_runtime() {
    let account = account_with(&[COIN]);
    let interactive = draft(TransactionPatch {
        amount: Some(COIN / 2),
        recipient: Some(TOR_RECIPIENT.to_string()),
        ..TransactionPatch::default()
    });
    let status = compute_status(&account, &interactive, RuntimeProfile::Embedded);
    assert_eq!(
        status.errors.get(&StatusField::Recipient),
        Some(&StatusError::CanOnlySendAsFile)
    );

    let as_file = interactive.apply(TransactionPatch {
        send_as_file: Some(true),
        ..TransactionPatch::default()
    });
    let status = compute_status(&account, &as_file, RuntimeProfile::Embedded);
    assert!(!status.errors.contains_key(&StatusField::Recipient));
    assert_eq!(
        status.warnings.get(&StatusField::Recipient),
        Some(&StatusWarning::FileTransport)
    );

    let status = compute_status(&account, &interactive, RuntimeProfile::Desktop);
    assert_eq!(
        status.warnings.get(&StatusField::Recipient),
        Some(&StatusWarning::TorRequired)
    );
}

#[test]
fn zero_base_fee_override_is_invalid() {
    for (amount, recipient) in [(0, ""), (COIN / 2, "http://localhost"), (50 * COIN, "ftp://x")] {
        let status = compute_status(
            &account_with(&[COIN]),
            &draft(TransactionPatch {
                amount: Some(amount),
                recipient: Some(recipient.to_string()),
                use_default_base_fee: Some(false),
                base_fee: Some(0),
                ..TransactionPatch::default()
            }),
            RuntimeProfile::Desktop,
        );
        assert_eq!(
            status.errors.get(&StatusField::BaseFee),
            Some(&StatusError::InvalidBaseFee)
        );
    }
}

#[test]
fn serialized_status_is_stable() {
    let account = account_with(&[COIN, 2 * COIN, 3 * COIN]);
    let transaction = draft(TransactionPatch {
        amount: Some(4 * COIN),
        recipient: Some(TOR_RECIPIENT.to_string()),
        send_as_file: Some(true),
        ..TransactionPatch::default()
    });
    let status = compute_status(&account, &transaction, RuntimeProfile::Desktop);
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["amount"], "4000000000");
    assert_eq!(json["warnings"]["recipient"]["name"], "FileTransport");
    assert!(json["errors"].as_object().unwrap().is_empty());
}

proptest! {
    #[test]
    fn status_is_deterministic_and_pure(
        values in prop::collection::vec(1u64..100 * COIN, 0..8),
        amount in 0u64..200 * COIN,
        use_all in any::<bool>(),
        send_as_file in any::<bool>(),
    ) {
        let account = account_with(&values);
        let snapshot = account.clone();
        let transaction = draft(TransactionPatch {
            amount: Some(amount),
            recipient: Some(TOR_RECIPIENT.to_string()),
            use_all_amount: Some(use_all),
            send_as_file: Some(send_as_file),
            ..TransactionPatch::default()
        });
        let draft_snapshot = transaction.clone();

        let first = compute_status(&account, &transaction, RuntimeProfile::Desktop);
        let second = compute_status(&account, &transaction, RuntimeProfile::Desktop);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        prop_assert_eq!(&account, &snapshot);
        prop_assert_eq!(&transaction, &draft_snapshot);
        prop_assert!(first.total_spent >= first.amount);
    }
}
