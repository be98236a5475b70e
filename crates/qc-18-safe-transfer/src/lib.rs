//! # QC-18 Safe Transfer - Uniform Asset Movement Subsystem
//!
//! **Subsystem ID:** 18
//!
//! ## Purpose
//!
//! Moves the native asset and arbitrary token contracts through one interface.
//! Token contracts are untrusted: some return `true`, some return nothing,
//! some return garbage, and some refuse to change a non-zero allowance. Every
//! call result is normalized by one rule, and every failure aborts the
//! enclosing unit of work.
//!
//! ## Operations
//!
//! | Operation | Native asset | Token contract |
//! |-----------|--------------|----------------|
//! | `transfer_from_caller` | Check attached value | `transferFrom(caller, to, amount)` |
//! | `transfer_from_self` | Send with configured gas | `transfer(to, amount)` |
//! | `transfer_all` | Send whole balance | `balanceOf(this)` then `transfer` |
//! | `approve` | No-op | `approve(spender, amount)` |
//! | `approve_with_retry` | No-op | `approve`, reset to 0, retry once |
//! | `balance_of` | Account balance | `balanceOf(account)`, 0 if unreadable |
//! | `permit` | Rejected | EIP-2612 `permit` |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Zero address is never called | `domain/invariants.rs` - `check_sentinel_invariant()` |
//! | INVARIANT-2 | Zero amounts make no calls | `domain/invariants.rs` - `check_zero_amount_invariant()` |
//! | INVARIANT-3 | At most three approve calls | `domain/invariants.rs` - `check_retry_bound_invariant()` |
//! | INVARIANT-4 | Balance reads are static | `domain/invariants.rs` - `check_read_only_invariant()` |
//! | INVARIANT-5 | Abort leaves no effects | `domain/invariants.rs` - `check_abort_rollback_invariant()` |
//!
//! ## Security
//!
//! - **Envelope-Only Identity**: Identity derived solely from `sender_id`
//! - **Untrusted Tokens**: Calls to contracts without code are rejected up front
//!
//! ### IPC Authorization Matrix
//!
//! | Message | Authorized Sender(s) | Enforcement |
//! |---------|---------------------|-------------|
//! | `TransferBatchRequest` | Smart Contracts (11), Cross-Chain (15) by default | `service.rs` - `handle_transfer_batch()` |
//!
//! ## Outbound Dependencies
//!
//! | Provider | Trait | Purpose |
//! |----------|-------|---------|
//! | Host ledger | `LedgerHost` | Code size, balances, calls, native sends |
//! | Host ledger | `UnitOfWork` | All-or-nothing batches |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_18_safe_transfer::prelude::*;
//!
//! let mut transfers = SafeTransfer::new(&mut host, TransferConfig::from_env());
//! transfers.transfer_from_caller(Token::from(usdt), vault, amount)?;
//! let swept = transfers.transfer_all(Token::Native, treasury)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;
pub mod transfer;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        CallFrame, CallKind, CallOutcome, CallRecord, OperationKind, TokenCall,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, PermitSignature, Token, U256};

    // Domain services
    pub use crate::domain::services::{
        decode_balance, function_selector, is_successful_bool_call, keccak256, selectors,
    };

    // Invariants
    pub use crate::domain::invariants::{
        check_abort_rollback_invariant, check_all_invariants, check_read_only_invariant,
        check_retry_bound_invariant, check_sentinel_invariant, check_zero_amount_invariant,
        limits, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{
        OperationResult, SafeTransferApi, TransferBatchExecutor, TransferOperation,
    };
    pub use crate::ports::outbound::{
        run_in_unit_of_work, LedgerHost, UnitOfWork, UnitOfWorkError,
    };

    // Events
    pub use crate::events::{
        subsystem_ids, topics, TransferBatchRequestPayload, TransferBatchResponsePayload,
    };

    // Errors
    pub use crate::errors::{IpcError, LedgerError, TransferError};

    // Configuration
    pub use crate::config::{ServiceConfig, TransferConfig};

    // Core
    pub use crate::transfer::SafeTransfer;

    // Adapters
    pub use crate::adapters::{
        BalanceStyle, InMemoryLedger, LedgerSnapshot, MockToken, NativeReceiver, ReturnStyle,
        TokenQuirks,
    };

    // Service
    pub use crate::service::{create_test_service, SafeTransferService, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID for IPC.
pub const SUBSYSTEM_ID: u8 = events::subsystem_ids::SAFE_TRANSFER;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Safe Transfer";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, 18);
    }

    #[test]
    fn test_prelude_exports() {
        // Verify prelude exports compile
        use prelude::*;
        let _ = TransferConfig::default();
        let _ = Token::from(Address::ZERO);
        let _ = InMemoryLedger::new();
    }
}
