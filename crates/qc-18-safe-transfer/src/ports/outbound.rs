//! # Driven Ports (SPI - Outbound)
//!
//! The interfaces the safe transfer layer depends on. The host execution
//! environment implements these to provide:
//! - Code-existence and native-balance queries
//! - Contract calls (mutating and read-only)
//! - Native value sends
//! - The all-or-nothing unit of work operations run inside
//!
//! ## Execution Model
//!
//! All methods are synchronous. A host call runs the callee to completion and
//! returns its raw outcome; a reverting callee leaves no effects of its own.

use crate::domain::entities::{CallFrame, CallOutcome};
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::LedgerError;

// =============================================================================
// LEDGER HOST
// =============================================================================

/// Primitives supplied by the ledger runtime.
///
/// ## Implementation Notes
///
/// Implementations must reproduce ledger semantics exactly, including the
/// ones that make naive transfer code unsafe:
/// 1. A call to an address without code succeeds with empty return data
/// 2. A reverted call reports `success = false` and discards its effects
/// 3. `static_call` never mutates state
pub trait LedgerHost {
    /// The frame the current operation runs in.
    fn frame(&self) -> CallFrame;

    /// Size of the executable code at `address` (0 for accounts without code).
    fn code_size(&self, address: Address) -> usize;

    /// Returns true if `address` holds executable code.
    fn has_code(&self, address: Address) -> bool {
        self.code_size(address) > 0
    }

    /// Native balance recorded for `address`.
    fn native_balance(&self, address: Address) -> U256;

    /// Calls `target` with `calldata`, from `frame().this`, with no value.
    fn call(&mut self, target: Address, calldata: &Bytes) -> CallOutcome;

    /// Read-only call to `target`.
    fn static_call(&self, target: Address, calldata: &Bytes) -> CallOutcome;

    /// Sends `amount` of native value from `frame().this` to `to`.
    ///
    /// `gas_limit` bounds the gas forwarded to the recipient (None forwards
    /// all). Returns false if the recipient rejects, runs out of the forwarded
    /// gas, or the sender cannot cover `amount`.
    fn send_native(&mut self, to: Address, amount: U256, gas_limit: Option<u64>) -> bool;
}

impl<H: LedgerHost + ?Sized> LedgerHost for &mut H {
    fn frame(&self) -> CallFrame {
        (**self).frame()
    }

    fn code_size(&self, address: Address) -> usize {
        (**self).code_size(address)
    }

    fn native_balance(&self, address: Address) -> U256 {
        (**self).native_balance(address)
    }

    fn call(&mut self, target: Address, calldata: &Bytes) -> CallOutcome {
        (**self).call(target, calldata)
    }

    fn static_call(&self, target: Address, calldata: &Bytes) -> CallOutcome {
        (**self).static_call(target, calldata)
    }

    fn send_native(&mut self, to: Address, amount: U256, gas_limit: Option<u64>) -> bool {
        (**self).send_native(to, amount, gas_limit)
    }
}

// =============================================================================
// UNIT OF WORK
// =============================================================================

/// All-or-nothing execution scope.
///
/// On a ledger the runtime provides this for free (a transaction). Hosts
/// embedded elsewhere implement it explicitly so an aborted operation
/// sequence leaves no partial effects.
pub trait UnitOfWork {
    /// Opens a unit of work running in `frame`.
    ///
    /// The value attached to the frame moves from `frame.caller` to
    /// `frame.this` as part of the unit of work.
    ///
    /// # Errors
    ///
    /// * `LedgerError::AlreadyOpen` - Nested units of work are not supported
    /// * `LedgerError::InsufficientBalance` - The caller cannot fund `frame.value`
    fn begin(&mut self, frame: CallFrame) -> Result<(), LedgerError>;

    /// Makes every effect since `begin` permanent.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotOpen` - No unit of work is open
    fn commit(&mut self) -> Result<(), LedgerError>;

    /// Discards every effect since `begin`.
    ///
    /// # Errors
    ///
    /// * `LedgerError::NotOpen` - No unit of work is open
    fn rollback(&mut self) -> Result<(), LedgerError>;
}

/// Outcome of [`run_in_unit_of_work`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOfWorkError<E> {
    /// The unit of work could not be opened or closed.
    Ledger(LedgerError),
    /// The body failed; every effect was rolled back.
    Aborted(E),
}

/// Runs `body` inside a unit of work: commit on `Ok`, roll back on `Err`.
///
/// # Errors
///
/// * `UnitOfWorkError::Aborted` - `body` failed and its effects were discarded
/// * `UnitOfWorkError::Ledger` - The host refused to begin, commit or roll back
pub fn run_in_unit_of_work<H, T, E, F>(
    host: &mut H,
    frame: CallFrame,
    body: F,
) -> Result<T, UnitOfWorkError<E>>
where
    H: UnitOfWork + ?Sized,
    F: FnOnce(&mut H) -> Result<T, E>,
{
    host.begin(frame).map_err(UnitOfWorkError::Ledger)?;
    match body(host) {
        Ok(value) => {
            host.commit().map_err(UnitOfWorkError::Ledger)?;
            Ok(value)
        }
        Err(err) => {
            host.rollback().map_err(UnitOfWorkError::Ledger)?;
            Err(UnitOfWorkError::Aborted(err))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
