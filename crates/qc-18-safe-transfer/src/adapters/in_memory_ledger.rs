//! # In-Memory Ledger
//!
//! Host implementation for testing and off-chain simulation.
//! Production hosts are the surrounding execution environment itself.

use super::mock_token::MockToken;
use crate::domain::entities::{CallFrame, CallKind, CallOutcome, CallRecord};
use crate::domain::value_objects::{Address, Bytes, U256};
use crate::errors::LedgerError;
use crate::ports::outbound::{LedgerHost, UnitOfWork};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Code size reported for addresses holding a token.
pub const MOCK_CODE_SIZE: usize = 1;

/// How an account reacts to receiving the native asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NativeReceiver {
    /// Accepts any send.
    #[default]
    Accepts,
    /// Rejects every send.
    Rejects,
    /// Accepts only sends forwarding at least this much gas.
    RequiresGas(u64),
}

impl NativeReceiver {
    fn accepts(self, gas_limit: Option<u64>) -> bool {
        match self {
            Self::Accepts => true,
            Self::Rejects => false,
            Self::RequiresGas(needed) => gas_limit.map_or(true, |limit| limit >= needed),
        }
    }
}

/// Everything a unit of work can roll back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, MockToken>,
}

/// In-memory ledger with mock token contracts.
///
/// An address is a contract iff a [`MockToken`] is deployed there. Calls to
/// any other address succeed with empty return data.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: LedgerSnapshot,
    receivers: HashMap<Address, NativeReceiver>,
    frame: CallFrame,
    timestamp: u64,
    open: Option<LedgerSnapshot>,
    trace: Mutex<Vec<CallRecord>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frame used outside of a unit of work.
    pub fn set_frame(&mut self, frame: CallFrame) {
        self.frame = frame;
    }

    /// Sets the block timestamp.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Sets the native balance of `address`.
    pub fn set_native_balance(&mut self, address: Address, balance: U256) {
        self.state.native.insert(address, balance);
    }

    /// Sets how `address` reacts to native sends.
    pub fn set_receiver(&mut self, address: Address, receiver: NativeReceiver) {
        self.receivers.insert(address, receiver);
    }

    /// Deploys `token` at `address`, replacing any previous contract.
    pub fn deploy_token(&mut self, address: Address, token: MockToken) {
        self.state.tokens.insert(address, token);
    }

    /// Token deployed at `address`.
    #[must_use]
    pub fn token(&self, address: Address) -> Option<&MockToken> {
        self.state.tokens.get(&address)
    }

    /// Token balance of `account`, 0 if no token is deployed.
    #[must_use]
    pub fn token_balance(&self, token: Address, account: Address) -> U256 {
        self.token(token)
            .map(|t| t.balance(account))
            .unwrap_or_default()
    }

    /// Allowance on `token`, 0 if no token is deployed.
    #[must_use]
    pub fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.token(token)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or_default()
    }

    /// Copy of the rollback-able state.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.clone()
    }

    /// True while a unit of work is open.
    #[must_use]
    pub fn in_unit_of_work(&self) -> bool {
        self.open.is_some()
    }

    /// Calls made so far.
    #[must_use]
    pub fn trace(&self) -> Vec<CallRecord> {
        self.trace_guard().clone()
    }

    /// Returns and clears the calls made so far.
    pub fn take_trace(&self) -> Vec<CallRecord> {
        std::mem::take(&mut *self.trace_guard())
    }

    fn trace_guard(&self) -> std::sync::MutexGuard<'_, Vec<CallRecord>> {
        self.trace.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, target: Address, calldata: &[u8], kind: CallKind) {
        let selector = calldata
            .get(..4)
            .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok());
        self.trace_guard().push(CallRecord {
            target,
            selector,
            kind,
        });
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.state.native.insert(from, available - amount);
        let credited = self.native_balance(to).saturating_add(amount);
        self.state.native.insert(to, credited);
        Ok(())
    }
}

impl LedgerHost for InMemoryLedger {
    fn frame(&self) -> CallFrame {
        self.frame
    }

    fn code_size(&self, address: Address) -> usize {
        if self.state.tokens.contains_key(&address) {
            MOCK_CODE_SIZE
        } else {
            0
        }
    }

    fn native_balance(&self, address: Address) -> U256 {
        self.state.native.get(&address).copied().unwrap_or_default()
    }

    fn call(&mut self, target: Address, calldata: &Bytes) -> CallOutcome {
        self.record(target, calldata.as_slice(), CallKind::Call);
        let sender = self.frame.this;
        let now = self.timestamp;
        match self.state.tokens.get_mut(&target) {
            Some(token) => token.execute(sender, calldata.as_slice(), now),
            None => CallOutcome::empty(),
        }
    }

    fn static_call(&self, target: Address, calldata: &Bytes) -> CallOutcome {
        self.record(target, calldata.as_slice(), CallKind::StaticCall);
        match self.state.tokens.get(&target) {
            Some(token) => token.query(calldata.as_slice()),
            None => CallOutcome::empty(),
        }
    }

    fn send_native(&mut self, to: Address, amount: U256, gas_limit: Option<u64>) -> bool {
        self.record(to, &[], CallKind::NativeSend);
        let receiver = self.receivers.get(&to).copied().unwrap_or_default();
        if !receiver.accepts(gas_limit) {
            return false;
        }
        let from = self.frame.this;
        self.move_native(from, to, amount).is_ok()
    }
}

impl UnitOfWork for InMemoryLedger {
    fn begin(&mut self, frame: CallFrame) -> Result<(), LedgerError> {
        if self.open.is_some() {
            return Err(LedgerError::AlreadyOpen);
        }
        let snapshot = self.state.clone();
        self.move_native(frame.caller, frame.this, frame.value)?;
        self.open = Some(snapshot);
        self.frame = frame;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LedgerError> {
        self.open.take().map(|_| ()).ok_or(LedgerError::NotOpen)
    }

    fn rollback(&mut self) -> Result<(), LedgerError> {
        let snapshot = self.open.take().ok_or(LedgerError::NotOpen)?;
        self.state = snapshot;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
