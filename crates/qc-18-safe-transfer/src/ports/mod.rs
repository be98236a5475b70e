//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for safe transfers.
//! These are the interfaces between the domain and the outside world.
//!
//! - **Driving Ports (Inbound)**: `SafeTransferApi`, `TransferBatchExecutor`
//! - **Driven Ports (Outbound)**: `LedgerHost`, `UnitOfWork`
//! - No concrete host implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
