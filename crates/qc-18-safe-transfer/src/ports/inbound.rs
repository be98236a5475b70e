//! # Driving Ports (API - Inbound)
//!
//! The interfaces exposed by the Safe Transfer subsystem.
//!
//! - `SafeTransferApi`: the synchronous operation set, called from inside a
//!   unit of work
//! - `TransferBatchExecutor`: runs a whole operation sequence as one unit of
//!   work on behalf of another subsystem

use crate::domain::entities::OperationKind;
use crate::domain::value_objects::{Address, PermitSignature, Token, U256};
use crate::errors::{IpcError, TransferError};
use crate::events::{TransferBatchRequestPayload, TransferBatchResponsePayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// SAFE TRANSFER API (Primary Driving Port)
// =============================================================================

/// Uniform transfer operations over the native asset and token contracts.
///
/// Every operation dispatches on [`Token`] first. Zero amounts succeed without
/// reaching the call boundary. Any error aborts the enclosing unit of work.
///
/// ## Usage
///
/// ```ignore
/// let mut transfers = SafeTransfer::new(&mut host, TransferConfig::default());
/// transfers.transfer_from_caller(token, vault, amount)?;
/// let moved = transfers.transfer_all(token, treasury)?;
/// ```
pub trait SafeTransferApi {
    /// Pulls `amount` from the frame's caller to `to`.
    ///
    /// Native: the attached value must equal `amount`; nothing is sent.
    ///
    /// # Errors
    ///
    /// * `InvalidNativeTransferAmount` - Attached value differs from `amount`
    /// * `InvalidToken` - No code at the token address
    /// * `TransferFromFailed` - The token rejected `transferFrom`
    fn transfer_from_caller(
        &mut self,
        token: Token,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError>;

    /// Pushes `amount` from this account to `to`.
    ///
    /// # Errors
    ///
    /// * `EthTransferFailed` - The native send failed
    /// * `InvalidToken` - No code at the token address
    /// * `TransferFailed` - The token rejected `transfer`
    fn transfer_from_self(
        &mut self,
        token: Token,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError>;

    /// Pushes this account's entire current balance to `to`.
    ///
    /// # Returns
    ///
    /// * `U256` - The amount moved (0 if the balance was 0)
    ///
    /// # Errors
    ///
    /// * `EthTransferFailed` - The native send failed
    /// * `InvalidToken` - No code at the token address
    /// * `TransferFailed` - The balance was unreadable or `transfer` failed
    fn transfer_all(&mut self, token: Token, to: Address) -> Result<U256, TransferError>;

    /// Sets `spender`'s allowance to `amount`. No-op for the native asset.
    ///
    /// # Errors
    ///
    /// * `InvalidToken` - No code at the token address
    /// * `ApproveFailed` - The token rejected `approve`
    fn approve(&mut self, token: Token, spender: Address, amount: U256)
        -> Result<(), TransferError>;

    /// Like [`SafeTransferApi::approve`], but on failure resets the allowance
    /// to zero and retries exactly once.
    ///
    /// # Errors
    ///
    /// * `InvalidToken` - No code at the token address
    /// * `ApproveFailed` - The retry failed too
    fn approve_with_retry(
        &mut self,
        token: Token,
        spender: Address,
        amount: U256,
    ) -> Result<(), TransferError>;

    /// Reads `account`'s balance. Never fails: unreadable balances are 0.
    fn balance_of(&self, token: Token, account: Address) -> U256;

    /// Sets an allowance from an EIP-2612 signature.
    ///
    /// # Errors
    ///
    /// * `PermitOnNativeToken` - The native asset has no approvals
    /// * `InvalidToken` - No code at the token address
    /// * `PermitFailed` - The token rejected `permit`
    fn permit(
        &mut self,
        token: Token,
        owner: Address,
        spender: Address,
        amount: U256,
        signature: PermitSignature,
    ) -> Result<(), TransferError>;

    /// Runs one [`TransferOperation`].
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation raises.
    fn apply(&mut self, operation: &TransferOperation) -> Result<OperationResult, TransferError> {
        let kind = operation.kind();
        let value = match *operation {
            TransferOperation::TransferFromCaller { token, to, amount } => {
                self.transfer_from_caller(token, to, amount)?;
                amount
            }
            TransferOperation::TransferFromSelf { token, to, amount } => {
                self.transfer_from_self(token, to, amount)?;
                amount
            }
            TransferOperation::TransferAll { token, to } => self.transfer_all(token, to)?,
            TransferOperation::Approve {
                token,
                spender,
                amount,
            } => {
                self.approve(token, spender, amount)?;
                amount
            }
            TransferOperation::ApproveWithRetry {
                token,
                spender,
                amount,
            } => {
                self.approve_with_retry(token, spender, amount)?;
                amount
            }
            TransferOperation::BalanceOf { token, account } => self.balance_of(token, account),
            TransferOperation::Permit {
                token,
                owner,
                spender,
                amount,
                signature,
            } => {
                self.permit(token, owner, spender, amount, signature)?;
                amount
            }
        };
        Ok(OperationResult { kind, value })
    }
}

// =============================================================================
// TRANSFER OPERATION
// =============================================================================

/// One operation of a batch, as carried over IPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransferOperation {
    /// See [`SafeTransferApi::transfer_from_caller`].
    TransferFromCaller {
        /// Asset pulled.
        token: Token,
        /// Recipient.
        to: Address,
        /// Amount pulled.
        amount: U256,
    },
    /// See [`SafeTransferApi::transfer_from_self`].
    TransferFromSelf {
        /// Asset sent.
        token: Token,
        /// Recipient.
        to: Address,
        /// Amount sent.
        amount: U256,
    },
    /// See [`SafeTransferApi::transfer_all`].
    TransferAll {
        /// Asset swept.
        token: Token,
        /// Recipient.
        to: Address,
    },
    /// See [`SafeTransferApi::approve`].
    Approve {
        /// Token approved.
        token: Token,
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// See [`SafeTransferApi::approve_with_retry`].
    ApproveWithRetry {
        /// Token approved.
        token: Token,
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// See [`SafeTransferApi::balance_of`].
    BalanceOf {
        /// Token queried.
        token: Token,
        /// Account queried.
        account: Address,
    },
    /// See [`SafeTransferApi::permit`].
    Permit {
        /// Token approved.
        token: Token,
        /// Account granting the allowance.
        owner: Address,
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
        /// Deadline and ECDSA signature.
        signature: PermitSignature,
    },
}

impl TransferOperation {
    /// Which public operation this is.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::TransferFromCaller { .. } => OperationKind::TransferFromCaller,
            Self::TransferFromSelf { .. } => OperationKind::TransferFromSelf,
            Self::TransferAll { .. } => OperationKind::TransferAll,
            Self::Approve { .. } => OperationKind::Approve,
            Self::ApproveWithRetry { .. } => OperationKind::ApproveWithRetry,
            Self::BalanceOf { .. } => OperationKind::BalanceOf,
            Self::Permit { .. } => OperationKind::Permit,
        }
    }

    /// Amount this operation takes from the attached native value, if any.
    ///
    /// Only a non-zero native `TransferFromCaller` consumes it.
    #[must_use]
    pub fn native_pull(&self) -> Option<U256> {
        match *self {
            Self::TransferFromCaller { token, amount, .. }
                if token.is_native() && !amount.is_zero() =>
            {
                Some(amount)
            }
            _ => None,
        }
    }
}

/// Result of one applied operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Which operation ran.
    pub kind: OperationKind,
    /// Amount moved or approved, or the balance read.
    pub value: U256,
}

// =============================================================================
// BATCH EXECUTOR
// =============================================================================

/// Executes operation batches for other subsystems.
///
/// Authorized senders are configured in `ServiceConfig::authorized_senders`.
#[async_trait]
pub trait TransferBatchExecutor: Send + Sync {
    /// Execute a batch as one unit of work.
    ///
    /// Operations run in order. The first failure rolls back the whole batch;
    /// the response then names the error instead of carrying results.
    ///
    /// # Errors
    ///
    /// * `IpcError::UnauthorizedSender` - `sender_id` not authorized
    /// * `IpcError::ValidationFailed` - Empty or oversize batch
    /// * `IpcError::Ledger` - The unit of work could not be opened or closed
    async fn execute_batch(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        request: TransferBatchRequestPayload,
    ) -> Result<TransferBatchResponsePayload, IpcError>;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind() {
        let op = TransferOperation::TransferAll {
            token: Token::Native,
            to: Address::new([1u8; 20]),
        };
        assert_eq!(op.kind(), OperationKind::TransferAll);
        assert_eq!(op.kind().name(), "transfer_all");
    }

    #[test]
    fn test_native_pull() {
        let pull = |token, amount: u64| TransferOperation::TransferFromCaller {
            token,
            to: Address::new([1u8; 20]),
            amount: U256::from(amount),
        };

        assert_eq!(pull(Token::Native, 5).native_pull(), Some(U256::from(5)));
        assert_eq!(
            pull(Token::Contract(Address::ZERO), 5).native_pull(),
            Some(U256::from(5))
        );
        assert_eq!(pull(Token::Native, 0).native_pull(), None);
        assert_eq!(
            pull(Token::Contract(Address::new([2u8; 20])), 5).native_pull(),
            None
        );
        let push = TransferOperation::TransferFromSelf {
            token: Token::Native,
            to: Address::new([1u8; 20]),
            amount: U256::from(5),
        };
        assert_eq!(push.native_pull(), None);
    }

    #[test]
    fn test_operation_tagged_serialization() {
        let op = TransferOperation::Approve {
            token: Token::Contract(Address::new([2u8; 20])),
            spender: Address::new([3u8; 20]),
            amount: U256::from(10),
        };

        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"approve\""));

        let back: TransferOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
