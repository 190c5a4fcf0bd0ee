//! Error types for the MWC wallet

use crate::response::ResponseError;
use crate::wallet_api::RecipientError;
use mwc_core::CoreError;

/// Result type for wallet operations
pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Failures reported by a signing device or its transport
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Action rejected by user on the device")]
    UserRefused,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Device transport error: {0}")]
    Transport(String),

    #[error("Device returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported device operation: {0}")]
    Unsupported(String),
}

impl DeviceError {
    /// Outcomes caused by the user rather than by a fault
    pub fn is_expected(&self) -> bool {
        matches!(self, DeviceError::UserRefused | DeviceError::Disconnected)
    }
}

/// Wallet error types
#[derive(thiserror::Error, Debug)]
pub enum WalletError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid state transition: cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error("Invalid transaction response: {0}")]
    InvalidResponse(ResponseError),

    #[error("Transaction is not valid: {0}")]
    InvalidTransaction(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Recipient error: {0}")]
    Recipient(#[from] RecipientError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("MWC core error: {0}")]
    Core(#[from] CoreError),
}

impl WalletError {
    /// True for "user refused" and "device disconnected", which are never logged as faults
    pub fn is_expected(&self) -> bool {
        match self {
            WalletError::Device(error) => error.is_expected(),
            _ => false,
        }
    }

    /// Check if the flow may be retried from the start
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WalletError::Device(_)
                | WalletError::BroadcastFailed(_)
                | WalletError::Recipient(_)
                | WalletError::Cancelled
        )
    }

    /// Get error category
    pub fn category(&self) -> WalletErrorCategory {
        match self {
            WalletError::Device(DeviceError::UserRefused) => WalletErrorCategory::UserRefused,
            WalletError::Device(DeviceError::Disconnected) => WalletErrorCategory::Disconnected,
            WalletError::Device(_) => WalletErrorCategory::Device,
            WalletError::BroadcastFailed(_) => WalletErrorCategory::Broadcast,
            WalletError::AccountNotFound(_) => WalletErrorCategory::NotFound,
            WalletError::InvalidState { .. } => WalletErrorCategory::Protocol,
            WalletError::InvalidResponse(_) | WalletError::InvalidTransaction(_) => {
                WalletErrorCategory::Validation
            }
            WalletError::Cancelled => WalletErrorCategory::Cancelled,
            WalletError::Recipient(_) | WalletError::HttpError(_) => WalletErrorCategory::Recipient,
            WalletError::Core(_) => WalletErrorCategory::Serialization,
        }
    }
}

/// Wallet error categories for handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletErrorCategory {
    UserRefused,
    Disconnected,
    Device,
    Broadcast,
    NotFound,
    Protocol,
    Validation,
    Cancelled,
    Recipient,
    Serialization,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_device_outcomes() {
        let error = WalletError::from(DeviceError::UserRefused);
        assert_eq!(error.category(), WalletErrorCategory::UserRefused);
        assert!(error.is_expected());

        let error = WalletError::from(DeviceError::Disconnected);
        assert_eq!(error.category(), WalletErrorCategory::Disconnected);
        assert!(error.is_expected());
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_unexpected_errors() {
        let error = WalletError::from(DeviceError::Transport("usb reset".to_string()));
        assert_eq!(error.category(), WalletErrorCategory::Device);
        assert!(!error.is_expected());

        let error = WalletError::BroadcastFailed("node unreachable".to_string());
        assert!(!error.is_expected());
        assert!(error.is_recoverable());

        let error = WalletError::InvalidResponse(ResponseError::TransactionMismatch);
        assert_eq!(error.category(), WalletErrorCategory::Validation);
        assert!(!error.is_recoverable());

        let error = WalletError::from(RecipientError::NoResponse("connection refused".to_string()));
        assert_eq!(error.category(), WalletErrorCategory::Recipient);
        assert!(!error.is_expected());
        assert!(error.is_recoverable());

        assert!(!WalletError::Cancelled.is_expected());
    }
}
