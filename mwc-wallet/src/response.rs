//! Validation of the recipient's slate response
//!
//! Responses come back through whatever channel carried the request (file,
//! QR code, clipboard), so they are checked structurally before the device is
//! asked to sign anything.

use crate::transaction::Transaction;
use mwc_core::{AddressFamily, Currency};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

const ARMOR_HEADER: &str = "BEGINSLATEPACK.";
const ARMOR_FOOTER: &str = "ENDSLATEPACK.";

/// Slate state of a recipient's response
const RESPONSE_STATE: &str = "S2";

/// Reasons a response is rejected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum ResponseError {
    #[error("{currency_name} doesn't support this response format")]
    UnsupportedFormat { currency_name: String },

    #[error("The response is empty")]
    Empty,

    #[error("The response is not a valid slate")]
    Malformed,

    #[error("The response is for a different transaction")]
    TransactionMismatch,

    #[error("The response is not a slate returned by the recipient")]
    NotAResponse,
}

/// Response conditions worth confirming
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum ResponseWarning {
    #[error("The response doesn't contain the recipient's payment proof")]
    MissingPaymentProof,
}

/// Outcome of validating a response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseValidation {
    pub error: Option<ResponseError>,
    pub warning: Option<ResponseWarning>,
}

impl ResponseValidation {
    fn error(error: ResponseError) -> Self {
        Self {
            error: Some(error),
            warning: None,
        }
    }

    /// Whether the response can be handed to the device
    pub fn is_acceptable(&self) -> bool {
        self.error.is_none()
    }
}

/// Checks `response` against the draft it answers. An empty response is
/// neither accepted nor rejected.
pub fn validate_transaction_response(
    currency: Currency,
    transaction: &Transaction,
    response: &str,
) -> ResponseValidation {
    let response = response.trim();
    if response.is_empty() {
        return ResponseValidation::default();
    }

    if let Some(body) = armored_body(response) {
        let supported = currency.address_family() == AddressFamily::Slatepack
            && !body.is_empty()
            && bs58::decode(&body).into_vec().is_ok();
        return if supported {
            ResponseValidation::default()
        } else {
            ResponseValidation::error(ResponseError::UnsupportedFormat {
                currency_name: currency.name().to_string(),
            })
        };
    }

    let slate: Value = match serde_json::from_str(response) {
        Ok(value @ Value::Object(_)) => value,
        _ => return ResponseValidation::error(ResponseError::Malformed),
    };

    let id = slate
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| Uuid::parse_str(id).ok());
    let Some(id) = id else {
        return ResponseValidation::error(ResponseError::Malformed);
    };
    if transaction.id != Some(id) {
        return ResponseValidation::error(ResponseError::TransactionMismatch);
    }

    if !is_response_slate(&slate) {
        return ResponseValidation::error(ResponseError::NotAResponse);
    }

    let warning = (transaction.proof.is_some() && !has_payment_proof(&slate))
        .then_some(ResponseWarning::MissingPaymentProof);
    ResponseValidation {
        error: None,
        warning,
    }
}

/// Body of an armored slatepack with whitespace removed
fn armored_body(response: &str) -> Option<String> {
    let inner = response
        .strip_prefix(ARMOR_HEADER)?
        .trim_end()
        .strip_suffix(ARMOR_FOOTER)?
        .trim_end()
        .strip_suffix('.')?;
    Some(inner.chars().filter(|c| !c.is_whitespace()).collect())
}

fn is_response_slate(slate: &Value) -> bool {
    if slate.get("sta").and_then(Value::as_str) == Some(RESPONSE_STATE) {
        return true;
    }
    ["participant_data", "sigs"]
        .iter()
        .filter_map(|key| slate.get(*key).and_then(Value::as_array))
        .any(|participants| participants.len() == 2)
}

fn has_payment_proof(slate: &Value) -> bool {
    let signature = slate
        .pointer("/payment_proof/receiver_signature")
        .or_else(|| slate.pointer("/proof/rsig"));
    matches!(signature, Some(Value::String(text)) if !text.is_empty())
}
