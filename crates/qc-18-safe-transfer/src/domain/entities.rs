//! # Core Domain Entities
//!
//! The frame an operation runs in, the token methods it can invoke, and the
//! raw outcome of invoking them.

use crate::domain::services::selectors;
use crate::domain::value_objects::{Address, Bytes, PermitSignature, U256, WORD_SIZE};
use serde::{Deserialize, Serialize};

// =============================================================================
// CALL FRAME
// =============================================================================

/// The execution frame a transfer operation runs in.
///
/// Mirrors what a contract sees of its own call: its address, the immediate
/// caller, and the native value attached to the call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    /// Address of the account executing the operation (`address(this)`).
    pub this: Address,
    /// Immediate caller (`msg.sender`).
    pub caller: Address,
    /// Native value attached to the call (`msg.value`).
    pub value: U256,
}

impl CallFrame {
    /// Creates a frame with no attached value.
    #[must_use]
    pub fn new(this: Address, caller: Address) -> Self {
        Self {
            this,
            caller,
            value: U256::zero(),
        }
    }

    /// Returns the frame with `value` attached.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

// =============================================================================
// CALL OUTCOME
// =============================================================================

/// Raw result of invoking an external target.
///
/// Produced and consumed within a single operation; never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOutcome {
    /// False if the call reverted or aborted.
    pub success: bool,
    /// Bytes returned by the target (revert data on failure).
    pub return_data: Bytes,
}

impl CallOutcome {
    /// A call that completed and returned `data`.
    #[must_use]
    pub fn returned(data: impl Into<Bytes>) -> Self {
        Self {
            success: true,
            return_data: data.into(),
        }
    }

    /// A call that completed without return data.
    #[must_use]
    pub fn empty() -> Self {
        Self::returned(Bytes::new())
    }

    /// A call that completed and returned a single ABI word.
    #[must_use]
    pub fn word(value: U256) -> Self {
        let mut word = [0u8; WORD_SIZE];
        value.to_big_endian(&mut word);
        Self::returned(word.to_vec())
    }

    /// A call that reverted.
    #[must_use]
    pub fn reverted() -> Self {
        Self {
            success: false,
            return_data: Bytes::new(),
        }
    }

    /// Number of bytes returned.
    #[must_use]
    pub fn returned_len(&self) -> usize {
        self.return_data.len()
    }

    /// First returned 256-bit word, if a full word was returned.
    #[must_use]
    pub fn returned_word(&self) -> Option<U256> {
        self.return_data
            .word(0)
            .map(|word| U256::from_big_endian(&word))
    }
}

// =============================================================================
// TOKEN CALL
// =============================================================================

/// A token method invocation, before ABI encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenCall {
    /// `transferFrom(address,address,uint256)`
    TransferFrom {
        /// Account debited.
        from: Address,
        /// Account credited.
        to: Address,
        /// Amount moved.
        amount: U256,
    },
    /// `transfer(address,uint256)`
    Transfer {
        /// Account credited.
        to: Address,
        /// Amount moved.
        amount: U256,
    },
    /// `approve(address,uint256)`
    Approve {
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// `balanceOf(address)`
    BalanceOf {
        /// Account queried.
        account: Address,
    },
    /// `allowance(address,address)`
    Allowance {
        /// Token holder.
        owner: Address,
        /// Account allowed to spend.
        spender: Address,
    },
    /// `permit(address,address,uint256,uint256,uint8,bytes32,bytes32)`
    Permit {
        /// Token holder who signed.
        owner: Address,
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
        /// Deadline and ECDSA signature.
        signature: PermitSignature,
    },
}

impl TokenCall {
    /// Returns the 4-byte function selector.
    #[must_use]
    pub fn selector(&self) -> [u8; 4] {
        match self {
            Self::TransferFrom { .. } => selectors::TRANSFER_FROM,
            Self::Transfer { .. } => selectors::TRANSFER,
            Self::Approve { .. } => selectors::APPROVE,
            Self::BalanceOf { .. } => selectors::BALANCE_OF,
            Self::Allowance { .. } => selectors::ALLOWANCE,
            Self::Permit { .. } => selectors::PERMIT,
        }
    }

    /// ABI-encodes the call: selector followed by one word per argument.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let words: Vec<[u8; WORD_SIZE]> = match self {
            Self::TransferFrom { from, to, amount } => {
                vec![from.to_word(), to.to_word(), u256_word(*amount)]
            }
            Self::Transfer { to, amount } => vec![to.to_word(), u256_word(*amount)],
            Self::Approve { spender, amount } => vec![spender.to_word(), u256_word(*amount)],
            Self::BalanceOf { account } => vec![account.to_word()],
            Self::Allowance { owner, spender } => vec![owner.to_word(), spender.to_word()],
            Self::Permit {
                owner,
                spender,
                amount,
                signature,
            } => vec![
                owner.to_word(),
                spender.to_word(),
                u256_word(*amount),
                u256_word(signature.deadline),
                u256_word(U256::from(signature.v)),
                signature.r,
                signature.s,
            ],
        };

        let mut data = Vec::with_capacity(4 + words.len() * WORD_SIZE);
        data.extend_from_slice(&self.selector());
        for word in &words {
            data.extend_from_slice(word);
        }
        Bytes::from(data)
    }

    /// Decodes calldata produced by [`TokenCall::encode`].
    ///
    /// Returns None for unknown selectors, short calldata, or dirty address
    /// padding.
    #[must_use]
    pub fn decode(calldata: &[u8]) -> Option<Self> {
        if calldata.len() < 4 {
            return None;
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);
        let args = Bytes::from_slice(&calldata[4..]);
        let address = |i: usize| args.word(i).as_ref().and_then(Address::from_word);
        let uint = |i: usize| args.word(i).map(|w| U256::from_big_endian(&w));

        match selector {
            selectors::TRANSFER_FROM => Some(Self::TransferFrom {
                from: address(0)?,
                to: address(1)?,
                amount: uint(2)?,
            }),
            selectors::TRANSFER => Some(Self::Transfer {
                to: address(0)?,
                amount: uint(1)?,
            }),
            selectors::APPROVE => Some(Self::Approve {
                spender: address(0)?,
                amount: uint(1)?,
            }),
            selectors::BALANCE_OF => Some(Self::BalanceOf {
                account: address(0)?,
            }),
            selectors::ALLOWANCE => Some(Self::Allowance {
                owner: address(0)?,
                spender: address(1)?,
            }),
            selectors::PERMIT => {
                let v = uint(4)?;
                if v > U256::from(u8::MAX) {
                    return None;
                }
                Some(Self::Permit {
                    owner: address(0)?,
                    spender: address(1)?,
                    amount: uint(2)?,
                    signature: PermitSignature {
                        deadline: uint(3)?,
                        v: v.low_u32() as u8,
                        r: args.word(5)?,
                        s: args.word(6)?,
                    },
                })
            }
            _ => None,
        }
    }
}

fn u256_word(value: U256) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

// =============================================================================
// OPERATION KIND
// =============================================================================

/// The public operations of the safe transfer layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Pull `amount` from the caller.
    TransferFromCaller,
    /// Push `amount` from this account.
    TransferFromSelf,
    /// Push this account's whole balance.
    TransferAll,
    /// Set an allowance.
    Approve,
    /// Set an allowance, resetting to zero once on failure.
    ApproveWithRetry,
    /// Read a balance.
    BalanceOf,
    /// Set an allowance from an off-chain signature.
    Permit,
}

impl OperationKind {
    /// Stable operation name used in logs and responses.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TransferFromCaller => "transfer_from_caller",
            Self::TransferFromSelf => "transfer_from_self",
            Self::TransferAll => "transfer_all",
            Self::Approve => "approve",
            Self::ApproveWithRetry => "approve_with_retry",
            Self::BalanceOf => "balance_of",
            Self::Permit => "permit",
        }
    }

    /// Returns true for operations that never mutate state.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::BalanceOf)
    }
}

// =============================================================================
// CALL RECORD
// =============================================================================

/// How a host reached an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Mutating contract call.
    Call,
    /// Read-only contract call.
    StaticCall,
    /// Plain native value send.
    NativeSend,
}

/// One external invocation observed by a host adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    /// Called address.
    pub target: Address,
    /// Function selector (None for calldata shorter than 4 bytes).
    pub selector: Option<[u8; 4]>,
    /// Call, static call or native send.
    pub kind: CallKind,
}

impl CallRecord {
    /// True for read-only calls.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == CallKind::StaticCall
    }

    /// True for calls into contract code (not native sends).
    #[must_use]
    pub fn is_contract_call(&self) -> bool {
        self.kind != CallKind::NativeSend
    }
}

// =============================================================================
// TESTS
// =============================================================================
