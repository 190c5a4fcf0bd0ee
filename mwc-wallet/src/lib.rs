//! MWC wallet transaction flow
//!
//! This crate builds outgoing MimbleWimble-family transactions for hardware
//! wallets: draft patching, the status engine that selects inputs and
//! estimates fees, the raw wire forms of accounts and drafts, and the slate
//! exchange driven against a signing device.
//!
//! Features:
//! - Pure status computation suitable for recomputing on every keystroke
//! - Tri-state (absent / null / present) preservation in raw operation data
//! - Single-occupancy device sessions with cancellation
//! - Broadcast as the commit point of the account history
//! - Foreign API client for recipients listening over HTTP

pub mod account;
pub mod config;
pub mod error;
pub mod exchange;
pub mod hardware;
pub mod response;
pub mod serialization;
pub mod status;
pub mod transaction;
pub mod types;
pub mod wallet_api;

pub use account::{
    add_sent_transaction_to_account, format_operation_specifics, transaction_explorer_url,
    AccountRepository, AccountUpdater, Broadcaster, InMemoryAccountRepository,
};
pub use config::{RecipientConfig, RuntimeProfile, WalletConfig};
pub use error::{DeviceError, WalletError, WalletErrorCategory, WalletResult};
pub use exchange::{
    exec_and_wait_at_least, Collaborators, ExchangeState, FailureHandler, SessionSlot,
    SlateExchange, SlateRequest,
};
pub use hardware::{DeviceProvider, DeviceSession, PreparedSlate, SignedOperation};
pub use response::{validate_transaction_response, ResponseError, ResponseValidation, ResponseWarning};
pub use serialization::{AccountRaw, TransactionRaw};
pub use status::{
    compute_status, estimate_max_spendable, prepare_draft, select_inputs, validate_base_fee,
    StatusError, StatusField, StatusWarning, TransactionStatus,
};
pub use transaction::{format_transaction, Transaction, TransactionPatch};
pub use types::*;
pub use wallet_api::{RecipientError, WalletApi};
