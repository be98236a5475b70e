//! # Value Objects
//!
//! Immutable domain primitives for safe transfers.
//! These types represent concepts that are defined by their value, not identity.

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::U256;

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte Ethereum-style address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    ///
    /// Reserved as the native-asset sentinel; see [`Token::from`].
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Decodes an address from a left-padded ABI word.
    ///
    /// Returns None if any of the 12 padding bytes is non-zero.
    #[must_use]
    pub fn from_word(word: &[u8; WORD_SIZE]) -> Option<Self> {
        if word[..12].iter().any(|&b| b != 0) {
            return None;
        }
        Self::from_slice(&word[12..])
    }

    /// Encodes the address as a left-padded ABI word.
    #[must_use]
    pub fn to_word(&self) -> [u8; WORD_SIZE] {
        let mut word = [0u8; WORD_SIZE];
        word[12..].copy_from_slice(&self.0);
        word
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[18..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// TOKEN
// =============================================================================

/// What an operation moves: the ledger's native asset or an external token.
///
/// Raw addresses convert with the zero address as the native sentinel, so
/// callers integrating against address-shaped identifiers keep working:
///
/// ```
/// use qc_18_safe_transfer::prelude::*;
///
/// assert_eq!(Token::from(Address::ZERO), Token::Native);
/// assert_eq!(
///     Token::from(Address::new([7u8; 20])),
///     Token::Contract(Address::new([7u8; 20]))
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Token {
    /// The ledger's intrinsic asset.
    Native,
    /// A fungible token contract at the given address.
    Contract(Address),
}

impl Token {
    /// Collapses `Contract(ZERO)` onto `Native`.
    ///
    /// The sentinel is never a callable contract.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Contract(addr) if addr.is_zero() => Self::Native,
            other => other,
        }
    }

    /// Returns true for the native asset (including the zero-address sentinel).
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self.normalized(), Self::Native)
    }

    /// Returns the address-shaped identifier (zero address for native).
    #[must_use]
    pub fn address(&self) -> Address {
        match self.normalized() {
            Self::Native => Address::ZERO,
            Self::Contract(addr) => addr,
        }
    }
}

impl From<Address> for Token {
    fn from(addr: Address) -> Self {
        Self::Contract(addr).normalized()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalized() {
            Self::Native => write!(f, "native"),
            Self::Contract(addr) => write!(f, "{addr}"),
        }
    }
}

// =============================================================================
// BYTES (variable length)
// =============================================================================

/// Variable-length byte vector for calldata and return data.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Bytes from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the `index`-th 32-byte word, if fully present.
    #[must_use]
    pub fn word(&self, index: usize) -> Option<[u8; WORD_SIZE]> {
        let start = index.checked_mul(WORD_SIZE)?;
        let end = start.checked_add(WORD_SIZE)?;
        let slice = self.0.get(start..end)?;
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(slice);
        Some(word)
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        if self.0.len() <= 8 {
            for byte in &self.0 {
                write!(f, "{byte:02x}")?;
            }
        } else {
            for byte in &self.0[..4] {
                write!(f, "{byte:02x}")?;
            }
            write!(f, "..({} bytes)", self.0.len())?;
        }
        Ok(())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// PERMIT SIGNATURE
// =============================================================================

/// Off-chain approval signature (EIP-2612) forwarded to a token's `permit`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PermitSignature {
    /// Unix timestamp after which the signature is void.
    pub deadline: U256,
    /// Recovery id (27 or 28).
    pub v: u8,
    /// r component (32 bytes).
    pub r: [u8; 32],
    /// s component (32 bytes).
    pub s: [u8; 32],
}

impl PermitSignature {
    /// Creates a new permit signature.
    #[must_use]
    pub const fn new(deadline: U256, v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { deadline, v, r, s }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_address_word_padding() {
        let addr = Address::new([0xAB; 20]);
        let word = addr.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(Address::from_word(&word), Some(addr));

        let mut dirty = word;
        dirty[0] = 1;
        assert_eq!(Address::from_word(&dirty), None);
    }

    #[test]
    fn test_token_sentinel_conversion() {
        assert_eq!(Token::from(Address::ZERO), Token::Native);
        assert!(Token::Contract(Address::ZERO).is_native());
        assert_eq!(Token::Contract(Address::ZERO).normalized(), Token::Native);

        let token = Token::from(Address::new([3u8; 20]));
        assert!(!token.is_native());
        assert_eq!(token.address(), Address::new([3u8; 20]));
        assert_eq!(Token::Native.address(), Address::ZERO);
    }

    #[test]
    fn test_bytes_word_access() {
        let mut data = vec![0u8; 40];
        data[31] = 1;
        let bytes = Bytes::from(data);

        let first = bytes.word(0).unwrap();
        assert_eq!(first[31], 1);
        // Second word is only 8 bytes long
        assert!(bytes.word(1).is_none());
        assert!(Bytes::new().word(0).is_none());
    }
}
