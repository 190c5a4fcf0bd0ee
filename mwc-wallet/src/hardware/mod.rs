//! Signing device capabilities used by the slate exchange
//!
//! The transport to the device is not implemented here. Integrations provide
//! a [`DeviceProvider`] that opens sessions bound to one physical device, and
//! each [`DeviceSession`] exchanges opaque requests with the currency's
//! application on that device.

use crate::error::DeviceError;
use crate::serialization::{AccountResourcesRaw, TransactionRaw};
use crate::types::{Operation, UnspentOutput};
use async_trait::async_trait;
use futures::stream::BoxStream;
use mwc_core::{Currency, Identifier};
use std::sync::Arc;
use uuid::Uuid;

#[cfg(any(test, feature = "mock-device"))]
pub mod mock;

#[cfg(any(test, feature = "mock-device"))]
pub use mock::{DeviceEvent, MockDevice};

/// Draft handed to the device to build the sender's half of a slate
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareRequest {
    pub currency: Currency,
    pub transaction: TransactionRaw,
    pub inputs: Vec<UnspentOutput>,
    pub resources: AccountResourcesRaw,
}

/// Sender's half of a slate as returned by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSlate {
    /// Serialized slate to hand to the recipient
    pub transaction_data: String,
    pub height: u64,
    pub id: Uuid,
    pub offset: Vec<u8>,
    /// Payment proof placeholder, when the recipient address allows one
    pub proof: Option<Vec<u8>>,
    pub private_nonce_index: u32,
}

/// Draft plus the recipient's response, handed to the device for signing
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeRequest {
    pub currency: Currency,
    pub transaction: TransactionRaw,
    pub inputs: Vec<UnspentOutput>,
    pub resources: AccountResourcesRaw,
}

/// A fully signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOperation {
    /// Outgoing operation; its extra carries the kernel excess, offset and
    /// the recipient's payment proof signature
    pub operation: Operation,
    /// Serialized finalized transaction submitted to the node
    pub signature: String,
    /// Operations whose outputs the transaction consumes
    pub spent_operation_ids: Vec<String>,
    /// Identifier of the change output, if one was created
    pub change_identifier: Option<Identifier>,
}

/// Opens sessions with physical devices
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Open a session with the device identified by `device_id`
    async fn open(&self, device_id: &str) -> Result<Arc<dyn DeviceSession>, DeviceError>;
}

/// A session with one device
#[async_trait]
pub trait DeviceSession: Send + Sync {
    fn device_id(&self) -> &str;

    /// Open (or confirm) the currency application
    async fn open_app(&self, app_name: &str) -> Result<(), DeviceError>;

    /// Subscribe to slate preparation.
    ///
    /// The stream yields the prepared slate once. Transports may emit a
    /// spurious error after the slate; consumers must ignore errors that
    /// arrive after a slate was delivered.
    fn prepare_transaction(
        &self,
        request: PrepareRequest,
    ) -> BoxStream<'static, Result<PreparedSlate, DeviceError>>;

    /// Sign the transaction using the recipient's response
    async fn finalize_transaction(
        &self,
        request: FinalizeRequest,
    ) -> Result<SignedOperation, DeviceError>;

    /// Release the session; closing twice is harmless
    async fn close(&self);
}
