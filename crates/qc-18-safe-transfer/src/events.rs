//! # Event Schema
//!
//! IPC message payloads for Safe Transfer batches.
//! These messages are wrapped in an authenticated envelope for transport.
//!
//! - **Envelope-Only Identity:** NO requester fields in payloads
//! - **Correlation IDs:** All request/response pairs use `correlation_id`
//! - **Security Boundaries:** Validated via `envelope.sender_id`
//!
//! ## Authorized Senders
//!
//! | Message Type | Default Authorized Sender(s) |
//! |--------------|------------------------------|
//! | `TransferBatchRequest` | Subsystems 11, 15 |

use crate::domain::entities::CallFrame;
use crate::domain::value_objects::{Address, U256};
use crate::ports::inbound::{OperationResult, TransferOperation};
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND EVENTS (From Other Subsystems)
// =============================================================================

/// Request to run a sequence of transfer operations as one unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBatchRequestPayload {
    /// Account the operations act on behalf of.
    pub this: Address,
    /// Immediate caller of `this`.
    pub caller: Address,
    /// Native value attached by the caller.
    #[serde(default)]
    pub value: U256,
    /// Operations, run in order.
    pub operations: Vec<TransferOperation>,
}

impl TransferBatchRequestPayload {
    /// Call frame the batch runs in.
    #[must_use]
    pub fn frame(&self) -> CallFrame {
        CallFrame::new(self.this, self.caller).with_value(self.value)
    }
}

// =============================================================================
// OUTBOUND EVENTS (To Other Subsystems)
// =============================================================================

/// Response to a [`TransferBatchRequestPayload`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBatchResponsePayload {
    /// True if every operation succeeded and the batch was committed.
    pub success: bool,
    /// One result per operation (empty when aborted).
    pub results: Vec<OperationResult>,
    /// Index of the failing operation.
    pub failed_index: Option<usize>,
    /// Machine-readable error kind (e.g. `TransferFailed`).
    pub error_kind: Option<String>,
    /// Human-readable error.
    pub error: Option<String>,
}

impl TransferBatchResponsePayload {
    /// A committed batch.
    #[must_use]
    pub fn committed(results: Vec<OperationResult>) -> Self {
        Self {
            success: true,
            results,
            failed_index: None,
            error_kind: None,
            error: None,
        }
    }

    /// An aborted batch.
    #[must_use]
    pub fn aborted(failed_index: usize, error_kind: &str, error: String) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            failed_index: Some(failed_index),
            error_kind: Some(error_kind.to_string()),
            error: Some(error),
        }
    }
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Event bus topic names.
pub mod topics {
    /// Batch requests.
    pub const TRANSFER_BATCH_REQUEST: &str = "safe_transfer.batch.request";
    /// Batch responses.
    pub const TRANSFER_BATCH_RESPONSE: &str = "safe_transfer.batch.response";
}

// =============================================================================
// SUBSYSTEM IDS
// =============================================================================

/// Subsystem IDs relevant to Safe Transfer.
pub mod subsystem_ids {
    /// Smart Contracts.
    pub const SMART_CONTRACTS: u8 = 11;
    /// Cross-Chain.
    pub const CROSS_CHAIN: u8 = 15;
    /// Safe Transfer (this subsystem).
    pub const SAFE_TRANSFER: u8 = 18;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OperationKind;
    use crate::domain::value_objects::Token;

    #[test]
    fn test_request_frame() {
        let request = TransferBatchRequestPayload {
            this: Address::new([1u8; 20]),
            caller: Address::new([2u8; 20]),
            value: U256::from(5),
            operations: vec![],
        };

        let frame = request.frame();
        assert_eq!(frame.this, request.this);
        assert_eq!(frame.caller, request.caller);
        assert_eq!(frame.value, U256::from(5));
    }

    #[test]
    fn test_request_value_defaults_to_zero() {
        let request = TransferBatchRequestPayload {
            this: Address::new([1u8; 20]),
            caller: Address::new([2u8; 20]),
            value: U256::zero(),
            operations: vec![TransferOperation::TransferAll {
                token: Token::Native,
                to: Address::new([3u8; 20]),
            }],
        };
        let mut json = serde_json::to_value(&request).unwrap();
        json.as_object_mut().unwrap().remove("value");

        let back: TransferBatchRequestPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_response_constructors() {
        let committed = TransferBatchResponsePayload::committed(vec![OperationResult {
            kind: OperationKind::BalanceOf,
            value: U256::from(7),
        }]);
        assert!(committed.success);
        assert_eq!(committed.results.len(), 1);

        let aborted =
            TransferBatchResponsePayload::aborted(2, "TransferFailed", "transfer failed".into());
        assert!(!aborted.success);
        assert!(aborted.results.is_empty());
        assert_eq!(aborted.failed_index, Some(2));
        assert_eq!(aborted.error_kind.as_deref(), Some("TransferFailed"));
    }

    #[test]
    fn test_subsystem_ids() {
        assert_eq!(subsystem_ids::SAFE_TRANSFER, 18);
        assert_ne!(subsystem_ids::SMART_CONTRACTS, subsystem_ids::CROSS_CHAIN);
    }
}
