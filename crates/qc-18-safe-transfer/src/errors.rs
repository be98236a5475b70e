//! # Error Types
//!
//! All error types for safe transfers.
//!
//! Every [`TransferError`] aborts the enclosing unit of work. There are no
//! recoverable return codes: callers never see a partially applied operation.

use crate::domain::value_objects::{Address, U256};
use thiserror::Error;

// =============================================================================
// TRANSFER ERRORS
// =============================================================================

/// Failures raised by the safe transfer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Native pull-transfer with attached value different from the amount.
    #[error("invalid native transfer amount: expected {expected}, attached {attached}")]
    InvalidNativeTransferAmount {
        /// Amount the operation asked for.
        expected: U256,
        /// Native value available to it.
        attached: U256,
    },

    /// Contract-path operation targeting an address with no code.
    #[error("invalid token: no code at {0:?}")]
    InvalidToken(Address),

    /// Token `transferFrom` failed.
    #[error("transferFrom failed on token {0:?}")]
    TransferFromFailed(Address),

    /// Token `transfer` failed, or its balance could not be read.
    #[error("transfer failed on token {0:?}")]
    TransferFailed(Address),

    /// Sending native value failed.
    #[error("native transfer of {amount} to {to:?} failed")]
    EthTransferFailed {
        /// Intended recipient.
        to: Address,
        /// Amount not sent.
        amount: U256,
    },

    /// Token `approve` failed (after the reset-and-retry, for the retry variant).
    #[error("approve failed on token {0:?}")]
    ApproveFailed(Address),

    /// Permit invoked against the native asset.
    #[error("permit on native token")]
    PermitOnNativeToken,

    /// Token `permit` failed.
    #[error("permit failed on token {0:?}")]
    PermitFailed(Address),
}

impl TransferError {
    /// Stable error identity, independent of the payload.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidNativeTransferAmount { .. } => "InvalidNativeTransferAmount",
            Self::InvalidToken(_) => "InvalidToken",
            Self::TransferFromFailed(_) => "TransferFromFailed",
            Self::TransferFailed(_) => "TransferFailed",
            Self::EthTransferFailed { .. } => "ETHTransferFailed",
            Self::ApproveFailed(_) => "ApproveFailed",
            Self::PermitOnNativeToken => "PermitOnNativeToken",
            Self::PermitFailed(_) => "PermitFailed",
        }
    }
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the unit-of-work machinery of a host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The caller cannot fund the value attached to the unit of work.
    #[error("insufficient native balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount to move.
        required: U256,
        /// Balance of the payer.
        available: U256,
    },

    /// A unit of work is already open.
    #[error("unit of work already open")]
    AlreadyOpen,

    /// Commit or rollback without an open unit of work.
    #[error("no open unit of work")]
    NotOpen,
}

// =============================================================================
// IPC ERRORS
// =============================================================================

/// Errors related to IPC requests handled by the batch service.
#[derive(Debug, Error, Clone)]
pub enum IpcError {
    /// Message validation failed.
    #[error("message validation failed: {0}")]
    ValidationFailed(String),

    /// Unauthorized sender.
    #[error("unauthorized sender: {sender_id} not in allowed list {allowed:?}")]
    UnauthorizedSender {
        /// Envelope sender.
        sender_id: u8,
        /// Senders accepted by this service.
        allowed: Vec<u8>,
    },

    /// The host could not open or close the unit of work.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = TransferError::InvalidNativeTransferAmount {
            expected: U256::from(5),
            attached: U256::from(4),
        };
        assert_eq!(
            err.to_string(),
            "invalid native transfer amount: expected 5, attached 4"
        );

        assert_eq!(
            TransferError::PermitOnNativeToken.to_string(),
            "permit on native token"
        );
    }

    #[test]
    fn test_transfer_error_kind() {
        let token = Address::new([1u8; 20]);
        assert_eq!(TransferError::InvalidToken(token).kind(), "InvalidToken");
        assert_eq!(
            TransferError::EthTransferFailed {
                to: token,
                amount: U256::one()
            }
            .kind(),
            "ETHTransferFailed"
        );
        assert_eq!(TransferError::ApproveFailed(token).kind(), "ApproveFailed");
    }

    #[test]
    fn test_ledger_error_conversion() {
        let ipc: IpcError = LedgerError::NotOpen.into();
        assert!(matches!(ipc, IpcError::Ledger(LedgerError::NotOpen)));
    }

    #[test]
    fn test_ipc_error_display() {
        let err = IpcError::UnauthorizedSender {
            sender_id: 5,
            allowed: vec![11, 15],
        };
        assert!(err.to_string().contains("unauthorized"));
        assert!(err.to_string().contains('5'));
    }
}
