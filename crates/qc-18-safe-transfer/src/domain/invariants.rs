//! # Domain Invariants
//!
//! Invariants that MUST hold for every safe transfer operation. They are
//! checked against the call trace a host records while the operation runs.
//!
//! - INVARIANT-1: Sentinel Never Called
//! - INVARIANT-2: Zero Amount Is Call-Free
//! - INVARIANT-3: Bounded Approval Retry
//! - INVARIANT-4: Balance Query Purity
//! - INVARIANT-5: No Partial Effects on Abort

use crate::domain::entities::{CallRecord, OperationKind};
use crate::domain::services::selectors;
use crate::domain::value_objects::U256;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Sentinel Never Called
///
/// The zero address denotes the native asset and is never a contract call
/// target. Native sends to it (burns) are not calls.
#[must_use]
pub fn check_sentinel_invariant(trace: &[CallRecord]) -> bool {
    trace
        .iter()
        .filter(|record| record.is_contract_call())
        .all(|record| !record.target.is_zero())
}

/// INVARIANT-2: Zero Amount Is Call-Free
///
/// Moving or approving zero never reaches the call boundary, so tokens that
/// revert on zero-value calls are never invoked. Native sends count.
#[must_use]
pub fn check_zero_amount_invariant(
    kind: OperationKind,
    amount: U256,
    trace: &[CallRecord],
) -> bool {
    match kind {
        OperationKind::TransferFromCaller
        | OperationKind::TransferFromSelf
        | OperationKind::Approve
        | OperationKind::ApproveWithRetry => !amount.is_zero() || trace.is_empty(),
        _ => true,
    }
}

/// INVARIANT-3: Bounded Approval Retry
///
/// `approve_with_retry` issues at most the original approval, one reset and
/// one retry.
#[must_use]
pub fn check_retry_bound_invariant(kind: OperationKind, trace: &[CallRecord]) -> bool {
    let approvals = trace
        .iter()
        .filter(|record| record.selector == Some(selectors::APPROVE))
        .count();
    match kind {
        OperationKind::ApproveWithRetry => approvals <= limits::MAX_APPROVE_CALLS_WITH_RETRY,
        OperationKind::Approve => approvals <= 1,
        _ => approvals == 0,
    }
}

/// INVARIANT-4: Balance Query Purity
///
/// `balance_of` only ever issues read-only calls.
#[must_use]
pub fn check_read_only_invariant(kind: OperationKind, trace: &[CallRecord]) -> bool {
    !kind.is_read_only() || trace.iter().all(CallRecord::is_static)
}

/// INVARIANT-5: No Partial Effects on Abort
///
/// After an aborted unit of work the observable state equals the state
/// before it began.
#[must_use]
pub fn check_abort_rollback_invariant<S: PartialEq>(before: &S, after_abort: &S) -> bool {
    before == after_abort
}

/// Check all trace invariants of one operation at once.
#[must_use]
pub fn check_all_invariants(
    kind: OperationKind,
    amount: U256,
    trace: &[CallRecord],
) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_sentinel_invariant(trace) {
        violations.push(InvariantViolation::SentinelCalled);
    }

    if !check_zero_amount_invariant(kind, amount, trace) {
        violations.push(InvariantViolation::ZeroAmountCalled {
            operation: kind,
            calls: trace.len(),
        });
    }

    if !check_retry_bound_invariant(kind, trace) {
        violations.push(InvariantViolation::RetryBoundExceeded {
            operation: kind,
            approvals: trace
                .iter()
                .filter(|record| record.selector == Some(selectors::APPROVE))
                .count(),
        });
    }

    if !check_read_only_invariant(kind, trace) {
        violations.push(InvariantViolation::ReadOnlyViolation);
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The native sentinel was used as a call target.
    SentinelCalled,
    /// A zero-amount operation performed external calls.
    ZeroAmountCalled {
        /// Offending operation.
        operation: OperationKind,
        /// Invocations recorded.
        calls: usize,
    },
    /// Too many approve calls for the operation.
    RetryBoundExceeded {
        /// Offending operation.
        operation: OperationKind,
        /// Approve calls recorded.
        approvals: usize,
    },
    /// A read-only operation issued a mutating call.
    ReadOnlyViolation,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SentinelCalled => write!(f, "native sentinel used as call target"),
            Self::ZeroAmountCalled { operation, calls } => write!(
                f,
                "zero-amount {} issued {calls} external calls",
                operation.name()
            ),
            Self::RetryBoundExceeded {
                operation,
                approvals,
            } => write!(
                f,
                "{} issued {approvals} approve calls",
                operation.name()
            ),
            Self::ReadOnlyViolation => write!(f, "read-only operation issued a mutating call"),
        }
    }
}

// =============================================================================
// LIMITS
// =============================================================================

/// Protocol constants.
pub mod limits {
    /// Minimum return size of a readable `balanceOf`.
    pub const BALANCE_RETURN_SIZE: usize = 32;

    /// Original approval + reset to zero + one retry.
    pub const MAX_APPROVE_CALLS_WITH_RETRY: usize = 3;

    /// Default cap on operations in one service batch.
    pub const DEFAULT_MAX_OPERATIONS_PER_BATCH: usize = 64;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CallKind;
    use crate::domain::value_objects::Address;

    fn record(target: Address, selector: [u8; 4], kind: CallKind) -> CallRecord {
        CallRecord {
            target,
            selector: Some(selector),
            kind,
        }
    }

    fn native_send(to: Address) -> CallRecord {
        CallRecord {
            target: to,
            selector: None,
            kind: CallKind::NativeSend,
        }
    }

    fn token() -> Address {
        Address::new([0x70; 20])
    }

    #[test]
    fn test_sentinel_invariant() {
        assert!(check_sentinel_invariant(&[]));
        assert!(check_sentinel_invariant(&[record(
            token(),
            selectors::TRANSFER,
            CallKind::Call
        )]));
        assert!(!check_sentinel_invariant(&[record(
            Address::ZERO,
            selectors::TRANSFER,
            CallKind::Call
        )]));
    }

    #[test]
    fn test_sentinel_invariant_ignores_native_burn() {
        assert!(check_sentinel_invariant(&[native_send(Address::ZERO)]));
        assert!(check_all_invariants(
            OperationKind::TransferFromSelf,
            U256::from(3),
            &[native_send(Address::ZERO)]
        )
        .is_valid());
    }

    #[test]
    fn test_zero_amount_invariant_counts_native_sends() {
        assert!(!check_zero_amount_invariant(
            OperationKind::TransferFromSelf,
            U256::zero(),
            &[native_send(token())]
        ));
    }

    #[test]
    fn test_read_only_invariant_rejects_native_send() {
        assert!(!check_read_only_invariant(
            OperationKind::BalanceOf,
            &[native_send(token())]
        ));
    }

    #[test]
    fn test_zero_amount_invariant() {
        let trace = [record(token(), selectors::TRANSFER, CallKind::Call)];

        assert!(check_zero_amount_invariant(
            OperationKind::TransferFromSelf,
            U256::zero(),
            &[]
        ));
        assert!(!check_zero_amount_invariant(
            OperationKind::TransferFromSelf,
            U256::zero(),
            &trace
        ));
        assert!(check_zero_amount_invariant(
            OperationKind::TransferFromSelf,
            U256::from(1),
            &trace
        ));
    }

    #[test]
    fn test_retry_bound_invariant() {
        let approve = record(token(), selectors::APPROVE, CallKind::Call);

        assert!(check_retry_bound_invariant(
            OperationKind::ApproveWithRetry,
            &[approve.clone(), approve.clone(), approve.clone()]
        ));
        assert!(!check_retry_bound_invariant(
            OperationKind::ApproveWithRetry,
            &[approve.clone(), approve.clone(), approve.clone(), approve.clone()]
        ));
        assert!(!check_retry_bound_invariant(
            OperationKind::Approve,
            &[approve.clone(), approve]
        ));
    }

    #[test]
    fn test_read_only_invariant() {
        assert!(check_read_only_invariant(
            OperationKind::BalanceOf,
            &[record(token(), selectors::BALANCE_OF, CallKind::StaticCall)]
        ));
        assert!(!check_read_only_invariant(
            OperationKind::BalanceOf,
            &[record(token(), selectors::TRANSFER, CallKind::Call)]
        ));
    }

    #[test]
    fn test_abort_rollback_invariant() {
        assert!(check_abort_rollback_invariant(&vec![1, 2], &vec![1, 2]));
        assert!(!check_abort_rollback_invariant(&vec![1, 2], &vec![1]));
    }

    #[test]
    fn test_check_all_invariants_multiple_violations() {
        let trace = [
            record(Address::ZERO, selectors::APPROVE, CallKind::Call),
            record(token(), selectors::APPROVE, CallKind::Call),
        ];

        match check_all_invariants(OperationKind::Approve, U256::zero(), &trace) {
            InvariantCheckResult::Invalid(violations) => {
                assert!(violations.contains(&InvariantViolation::SentinelCalled));
                assert!(violations.len() >= 3);
            }
            InvariantCheckResult::Valid => panic!("Expected violations"),
        }
    }

    #[test]
    fn test_violation_display() {
        let violation = InvariantViolation::ZeroAmountCalled {
            operation: OperationKind::Approve,
            calls: 2,
        };
        assert_eq!(
            violation.to_string(),
            "zero-amount approve issued 2 external calls"
        );
    }
}
