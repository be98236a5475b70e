//! # Adapters Layer (Outer Hexagon)
//!
//! Adapters implement the driven ports for tests and off-chain simulation.
//!
//! - `InMemoryLedger`: `LedgerHost` + `UnitOfWork` over in-memory balances
//! - `MockToken`: token contract with configurable non-compliant behavior

pub mod in_memory_ledger;
pub mod mock_token;

pub use in_memory_ledger::*;
pub use mock_token::*;
