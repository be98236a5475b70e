//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for safe transfers: token identity, call outcomes,
//! calldata encoding and return-value interpretation.
//! NO I/O, NO async, NO host access.
//!
//! - This is the **inner layer** of the hexagonal architecture.
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod entities;
pub mod invariants;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use services::*;
pub use value_objects::*;
