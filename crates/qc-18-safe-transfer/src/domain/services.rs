//! # Domain Services
//!
//! Pure functions shared by every transfer operation: function selectors and
//! the Call Interpreter that classifies raw call outcomes.
//!
//! - NO I/O operations
//! - NO async code
//! - Pure functions only

use crate::domain::entities::CallOutcome;
use crate::domain::invariants::limits;
use crate::domain::value_objects::U256;
use sha3::{Digest, Keccak256};

// =============================================================================
// KECCAK256 / SELECTORS
// =============================================================================

/// Computes keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Computes the 4-byte selector of a canonical function signature.
///
/// `function_selector("transfer(address,uint256)") == [0xa9, 0x05, 0x9c, 0xbb]`
#[must_use]
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selectors of the token methods this layer invokes.
pub mod selectors {
    /// `transferFrom(address,address,uint256)`
    pub const TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

    /// `transfer(address,uint256)`
    pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

    /// `approve(address,uint256)`
    pub const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

    /// `balanceOf(address)`
    pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

    /// `allowance(address,address)`
    pub const ALLOWANCE: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

    /// `permit(address,address,uint256,uint256,uint8,bytes32,bytes32)` (EIP-2612)
    pub const PERMIT: [u8; 4] = [0xd5, 0x05, 0xac, 0xcf];
}

// =============================================================================
// CALL INTERPRETER
// =============================================================================

/// Classifies a call to a method that is expected to report boolean success.
///
/// Success iff the call did not revert AND it either returned nothing or its
/// first returned word is exactly `1`. Empty return data is accepted because
/// widely-deployed tokens return nothing from `transfer`/`approve`.
/// Anything else (revert, a partial word, a first word other than 1) fails.
#[must_use]
pub fn is_successful_bool_call(outcome: &CallOutcome) -> bool {
    if !outcome.success {
        return false;
    }
    if outcome.returned_len() == 0 {
        return true;
    }
    outcome.returned_word() == Some(U256::one())
}

/// Decodes a `balanceOf` result.
///
/// None if the call reverted or returned fewer than 32 bytes.
#[must_use]
pub fn decode_balance(outcome: &CallOutcome) -> Option<U256> {
    if !outcome.success || outcome.returned_len() < limits::BALANCE_RETURN_SIZE {
        return None;
    }
    outcome.returned_word()
}

// =============================================================================
// TESTS
// =============================================================================
