//! Raw form round trips

use mwc_core::{Currency, Identifier, Nullable};
use mwc_wallet::serialization::OperationExtraRaw;
use mwc_wallet::{OperationExtra, Transaction, TransactionRaw};
use proptest::prelude::*;
use serde_json::json;
use uuid::Uuid;

fn transaction_strategy() -> impl Strategy<Value = Transaction> {
    (
        (any::<u64>(), "[a-z0-9:/.]{0,24}", any::<bool>(), any::<bool>(), any::<bool>(), any::<u64>()),
        (
            proptest::option::of(any::<u64>()),
            proptest::option::of(any::<[u8; 16]>()),
            proptest::option::of(prop::collection::vec(any::<u8>(), 32)),
            proptest::option::of(prop::collection::vec(any::<u8>(), 0..64)),
            proptest::option::of(any::<u32>()),
            proptest::option::of("[ -~]{0,40}"),
            proptest::option::of(any::<i32>()),
        ),
    )
        .prop_map(
            |(
                (amount, recipient, use_all_amount, send_as_file, use_default_base_fee, base_fee),
                (height, id, offset, proof, private_nonce_index, transaction_response, info),
            )| {
                let mut transaction = Transaction::new(Currency::MimbleWimbleCoin);
                transaction.amount = amount;
                transaction.recipient = recipient;
                transaction.use_all_amount = use_all_amount;
                transaction.send_as_file = send_as_file;
                transaction.use_default_base_fee = use_default_base_fee;
                transaction.base_fee = base_fee;
                transaction.height = height;
                transaction.id = id.map(Uuid::from_bytes);
                transaction.offset = offset;
                transaction.proof = proof;
                transaction.private_nonce_index = private_nonce_index;
                transaction.transaction_response = transaction_response;
                if let Some(info) = info {
                    transaction.network_info = json!({ "fees": info });
                }
                transaction
            },
        )
}

fn nullable_bytes() -> impl Strategy<Value = Nullable<Vec<u8>>> {
    prop_oneof![
        Just(Nullable::Absent),
        Just(Nullable::Null),
        prop::collection::vec(any::<u8>(), 1..48).prop_map(Nullable::Value),
    ]
}

fn extra_strategy() -> impl Strategy<Value = OperationExtra> {
    (
        proptest::option::of(prop::collection::vec(any::<u8>(), 33)),
        proptest::option::of(any::<[u32; 4]>()),
        proptest::option::of(0u8..3),
        proptest::option::of(any::<bool>()),
        nullable_bytes(),
        nullable_bytes(),
        nullable_bytes(),
    )
        .prop_map(
            |(output_commitment, paths, switch_type, spent, kernel_excess, kernel_offset, signature)| {
                OperationExtra {
                    output_commitment,
                    identifier: paths.and_then(|paths| Identifier::new(3, paths).ok()),
                    switch_type,
                    spent,
                    kernel_excess,
                    kernel_offset,
                    recipient_payment_proof_signature: signature,
                }
            },
        )
}

proptest! {
    #[test]
    fn transaction_survives_its_wire_form(transaction in transaction_strategy()) {
        let text = serde_json::to_string(&transaction.to_raw()).unwrap();
        let raw: TransactionRaw = serde_json::from_str(&text).unwrap();
        let decoded = Transaction::from_raw(&raw).unwrap();
        prop_assert_eq!(&decoded, &transaction);

        let again = Transaction::from_raw(&decoded.to_raw()).unwrap();
        prop_assert_eq!(again, decoded);
    }

    #[test]
    fn operation_extra_keeps_null_and_absent_apart(extra in extra_strategy()) {
        let text = serde_json::to_string(&extra.to_raw()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        match &extra.kernel_excess {
            Nullable::Absent => prop_assert!(json.get("kernelExcess").is_none()),
            Nullable::Null => prop_assert!(json["kernelExcess"].is_null()),
            Nullable::Value(bytes) => prop_assert_eq!(&json["kernelExcess"], &json!(hex::encode(bytes))),
        }

        let raw: OperationExtraRaw = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(OperationExtra::from_raw(&raw).unwrap(), extra);
    }
}

#[test]
fn raw_transaction_uses_decimal_strings() {
    let mut transaction = Transaction::new(Currency::Grin);
    transaction.amount = u64::MAX;
    transaction.height = Some(7);
    let json = serde_json::to_value(transaction.to_raw()).unwrap();
    assert_eq!(json["family"], "mimblewimble_coin");
    assert_eq!(json["amount"], "18446744073709551615");
    assert_eq!(json["baseFee"], "500000");
    assert_eq!(json["height"], "7");
    assert!(json.get("id").is_none());
    assert_eq!(json["networkInfo"], json!({}));
}

#[test]
fn raw_transaction_from_other_family_is_rejected() {
    let mut raw = Transaction::new(Currency::Grin).to_raw();
    raw.family = "bitcoin".to_string();
    assert!(Transaction::from_raw(&raw).is_err());
}
