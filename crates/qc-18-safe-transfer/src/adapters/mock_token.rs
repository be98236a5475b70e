//! # Mock Token Contract
//!
//! ERC-20 style token driven by raw ABI calldata, for testing.
//! Quirks reproduce the deployed non-compliant behaviors the safe transfer
//! layer has to tolerate.

use crate::domain::entities::{CallOutcome, TokenCall};
use crate::domain::value_objects::{Address, U256};
use std::collections::HashMap;

/// What a mutating method returns when it succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnStyle {
    /// Compliant: `true` on success, `false` on failure.
    #[default]
    Bool,
    /// Non-compliant: nothing on success, revert on failure.
    NoData,
    /// Always returns `false` without effect.
    AlwaysFalse,
    /// Applies the effect but returns the word `2`.
    Garbage,
    /// Applies the effect but returns a single `0x01` byte.
    ShortData,
    /// Always reverts.
    Revert,
}

/// How `balanceOf` answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BalanceStyle {
    /// One ABI word.
    #[default]
    Word,
    /// Reverts.
    Reverts,
    /// 16 bytes instead of 32.
    Short,
}

/// Behavioral quirks of a [`MockToken`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenQuirks {
    /// Return convention of `transfer`, `transferFrom`, `approve`, `permit`.
    pub return_style: ReturnStyle,
    /// Answer convention of `balanceOf`.
    pub balance_style: BalanceStyle,
    /// Zero-value transfers and approvals fail.
    pub revert_on_zero_value: bool,
    /// Changing a non-zero allowance to another non-zero value fails.
    pub approve_requires_zero_first: bool,
    /// The first N approve calls fail regardless of arguments.
    pub fail_first_approvals: u32,
    /// Every non-zero approval fails; resets to zero succeed.
    pub reject_nonzero_approvals: bool,
    /// `permit` is implemented.
    pub supports_permit: bool,
}

/// In-memory ERC-20 style token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockToken {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    quirks: TokenQuirks,
    approve_attempts: u32,
}

impl MockToken {
    /// A compliant token with no balances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token with the given quirks.
    #[must_use]
    pub fn with_quirks(quirks: TokenQuirks) -> Self {
        Self {
            quirks,
            ..Self::default()
        }
    }

    /// Credits `amount` to `account`.
    #[must_use]
    pub fn mint(mut self, account: Address, amount: U256) -> Self {
        let balance = self.balance(account).saturating_add(amount);
        self.balances.insert(account, balance);
        self
    }

    /// Sets an allowance directly.
    #[must_use]
    pub fn with_allowance(mut self, owner: Address, spender: Address, amount: U256) -> Self {
        self.allowances.insert((owner, spender), amount);
        self
    }

    /// Balance of `account`.
    #[must_use]
    pub fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Allowance granted by `owner` to `spender`.
    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Quirks in effect.
    #[must_use]
    pub fn quirks(&self) -> TokenQuirks {
        self.quirks
    }

    /// Executes a mutating call from `sender` at time `now`.
    pub fn execute(&mut self, sender: Address, calldata: &[u8], now: u64) -> CallOutcome {
        let Some(call) = TokenCall::decode(calldata) else {
            return CallOutcome::reverted();
        };
        match self.quirks.return_style {
            ReturnStyle::Revert => return CallOutcome::reverted(),
            ReturnStyle::AlwaysFalse => return CallOutcome::word(U256::zero()),
            _ => {}
        }

        match call {
            TokenCall::Transfer { to, amount } => match self.move_tokens(sender, to, amount) {
                Ok(()) => self.succeeded(),
                Err(failure) => failure,
            },
            TokenCall::TransferFrom { from, to, amount } => {
                let allowance = self.allowance(from, sender);
                if allowance < amount {
                    return self.failed();
                }
                match self.move_tokens(from, to, amount) {
                    Ok(()) => {
                        self.allowances.insert((from, sender), allowance - amount);
                        self.succeeded()
                    }
                    Err(failure) => failure,
                }
            }
            TokenCall::Approve { spender, amount } => self.approve(sender, spender, amount),
            TokenCall::Permit {
                owner,
                spender,
                amount,
                signature,
            } => {
                let valid_v = signature.v == 27 || signature.v == 28;
                if !self.quirks.supports_permit
                    || !valid_v
                    || signature.deadline < U256::from(now)
                {
                    return CallOutcome::reverted();
                }
                self.allowances.insert((owner, spender), amount);
                self.succeeded()
            }
            TokenCall::BalanceOf { .. } | TokenCall::Allowance { .. } => self.query(calldata),
        }
    }

    /// Executes a read-only call.
    #[must_use]
    pub fn query(&self, calldata: &[u8]) -> CallOutcome {
        match TokenCall::decode(calldata) {
            Some(TokenCall::BalanceOf { account }) => match self.quirks.balance_style {
                BalanceStyle::Word => CallOutcome::word(self.balance(account)),
                BalanceStyle::Reverts => CallOutcome::reverted(),
                BalanceStyle::Short => CallOutcome::returned(vec![0u8; 16]),
            },
            Some(TokenCall::Allowance { owner, spender }) => {
                CallOutcome::word(self.allowance(owner, spender))
            }
            // Mutating methods cannot run in a read-only context
            _ => CallOutcome::reverted(),
        }
    }

    /// Moves balance; on failure returns the outcome to report.
    fn move_tokens(&mut self, from: Address, to: Address, amount: U256) -> Result<(), CallOutcome> {
        if amount.is_zero() && self.quirks.revert_on_zero_value {
            return Err(CallOutcome::reverted());
        }
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(self.failed());
        }
        self.balances.insert(from, from_balance - amount);
        let to_balance = self.balance(to).saturating_add(amount);
        self.balances.insert(to, to_balance);
        Ok(())
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> CallOutcome {
        if amount.is_zero() && self.quirks.revert_on_zero_value {
            return CallOutcome::reverted();
        }
        // Reverted calls are not counted
        self.approve_attempts = self.approve_attempts.saturating_add(1);
        if self.approve_attempts <= self.quirks.fail_first_approvals {
            return self.failed();
        }
        if self.quirks.reject_nonzero_approvals && !amount.is_zero() {
            return self.failed();
        }
        if self.quirks.approve_requires_zero_first
            && !amount.is_zero()
            && !self.allowance(owner, spender).is_zero()
        {
            return self.failed();
        }
        self.allowances.insert((owner, spender), amount);
        self.succeeded()
    }

    fn succeeded(&self) -> CallOutcome {
        match self.quirks.return_style {
            ReturnStyle::Bool => CallOutcome::word(U256::one()),
            ReturnStyle::NoData => CallOutcome::empty(),
            ReturnStyle::AlwaysFalse => CallOutcome::word(U256::zero()),
            ReturnStyle::Garbage => CallOutcome::word(U256::from(2)),
            ReturnStyle::ShortData => CallOutcome::returned(vec![1u8]),
            ReturnStyle::Revert => CallOutcome::reverted(),
        }
    }

    fn failed(&self) -> CallOutcome {
        match self.quirks.return_style {
            ReturnStyle::NoData | ReturnStyle::Revert => CallOutcome::reverted(),
            _ => CallOutcome::word(U256::zero()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new([0xA1; 20])
    }

    fn bob() -> Address {
        Address::new([0xB0; 20])
    }

    fn transfer(to: Address, amount: u64) -> Vec<u8> {
        TokenCall::Transfer {
            to,
            amount: U256::from(amount),
        }
        .encode()
        .0
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut token = MockToken::new().mint(alice(), U256::from(100));

        let outcome = token.execute(alice(), &transfer(bob(), 40), 0);

        assert_eq!(outcome, CallOutcome::word(U256::one()));
        assert_eq!(token.balance(alice()), U256::from(60));
        assert_eq!(token.balance(bob()), U256::from(40));
    }

    #[test]
    fn test_insufficient_balance_leaves_state() {
        let mut token = MockToken::new().mint(alice(), U256::from(10));
        let before = token.clone();

        let outcome = token.execute(alice(), &transfer(bob(), 40), 0);

        assert_eq!(outcome, CallOutcome::word(U256::zero()));
        assert_eq!(token, before);
    }

    #[test]
    fn test_no_data_style() {
        let mut token = MockToken::with_quirks(TokenQuirks {
            return_style: ReturnStyle::NoData,
            ..TokenQuirks::default()
        })
        .mint(alice(), U256::from(10));

        assert_eq!(
            token.execute(alice(), &transfer(bob(), 5), 0),
            CallOutcome::empty()
        );
        // Failure reverts instead of returning false
        assert_eq!(
            token.execute(alice(), &transfer(bob(), 50), 0),
            CallOutcome::reverted()
        );
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let spender = Address::new([0x5E; 20]);
        let mut token = MockToken::new()
            .mint(alice(), U256::from(100))
            .with_allowance(alice(), spender, U256::from(30));

        let call = TokenCall::TransferFrom {
            from: alice(),
            to: bob(),
            amount: U256::from(20),
        }
        .encode();
        assert_eq!(
            token.execute(spender, call.as_slice(), 0),
            CallOutcome::word(U256::one())
        );
        assert_eq!(token.allowance(alice(), spender), U256::from(10));
        assert_eq!(token.balance(bob()), U256::from(20));

        // Exceeds remaining allowance
        assert_eq!(
            token.execute(spender, call.as_slice(), 0),
            CallOutcome::word(U256::zero())
        );
    }

    #[test]
    fn test_approve_requires_zero_first() {
        let spender = Address::new([0x5E; 20]);
        let mut token = MockToken::with_quirks(TokenQuirks {
            approve_requires_zero_first: true,
            ..TokenQuirks::default()
        })
        .with_allowance(alice(), spender, U256::from(5));

        let approve = |amount: u64| {
            TokenCall::Approve {
                spender,
                amount: U256::from(amount),
            }
            .encode()
            .0
        };

        assert_eq!(
            token.execute(alice(), &approve(9), 0),
            CallOutcome::word(U256::zero())
        );
        assert_eq!(
            token.execute(alice(), &approve(0), 0),
            CallOutcome::word(U256::one())
        );
        assert_eq!(
            token.execute(alice(), &approve(9), 0),
            CallOutcome::word(U256::one())
        );
        assert_eq!(token.allowance(alice(), spender), U256::from(9));
    }

    #[test]
    fn test_reverted_approve_is_not_counted() {
        let spender = Address::new([0x5E; 20]);
        let mut token = MockToken::with_quirks(TokenQuirks {
            revert_on_zero_value: true,
            fail_first_approvals: 1,
            ..TokenQuirks::default()
        });
        let before = token.clone();
        let approve = |amount: u64| {
            TokenCall::Approve {
                spender,
                amount: U256::from(amount),
            }
            .encode()
            .0
        };

        assert_eq!(token.execute(alice(), &approve(0), 0), CallOutcome::reverted());
        assert_eq!(token, before);

        // The first counted attempt still fails
        assert_eq!(
            token.execute(alice(), &approve(3), 0),
            CallOutcome::word(U256::zero())
        );
        assert_eq!(
            token.execute(alice(), &approve(3), 0),
            CallOutcome::word(U256::one())
        );
    }

    #[test]
    fn test_query_rejects_mutation() {
        let token = MockToken::new().mint(alice(), U256::from(1));
        assert_eq!(token.query(&transfer(bob(), 1)), CallOutcome::reverted());
        assert_eq!(
            token.query(TokenCall::BalanceOf { account: alice() }.encode().as_slice()),
            CallOutcome::word(U256::one())
        );
    }

    #[test]
    fn test_permit_deadline() {
        let spender = Address::new([0x5E; 20]);
        let mut token = MockToken::with_quirks(TokenQuirks {
            supports_permit: true,
            ..TokenQuirks::default()
        });
        let permit = |deadline: u64| {
            TokenCall::Permit {
                owner: alice(),
                spender,
                amount: U256::from(7),
                signature: crate::domain::value_objects::PermitSignature::new(
                    U256::from(deadline),
                    27,
                    [1u8; 32],
                    [2u8; 32],
                ),
            }
            .encode()
            .0
        };

        assert_eq!(
            token.execute(spender, &permit(99), 100),
            CallOutcome::reverted()
        );
        assert_eq!(
            token.execute(spender, &permit(100), 100),
            CallOutcome::word(U256::one())
        );
        assert_eq!(token.allowance(alice(), spender), U256::from(7));
    }
}
