//! optvault Token Contract
//!
//! Account-based fungible token ledger. One instance backs the option token
//! of a series (minted and burned only by its vault manager); another can
//! stand in for the collateral asset.
//!
//! Transfers, approvals and `transfer_from` follow the usual allowance
//! semantics. Only the authorized minter can mint or burn.

use std::collections::BTreeMap;
use std::vec::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::{EventLog, OptionsEvent},
    token_ops::{check_balance, validate_amount, verify_conservation, TokenLedger},
    types::{Address, CallContext, TokenAction},
};

// ============ Token State ============

/// Persistent ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenState {
    /// Authorized minter (the series' vault manager)
    pub authorized_minter: Address,
    /// Total supply tracking
    pub total_supply: u64,
    /// Balance per account, zero balances are pruned
    pub balances: BTreeMap<Address, u64>,
    /// Allowance per (owner, spender)
    pub allowances: BTreeMap<(Address, Address), u64>,
}

// NOTE: Default is not implemented so every ledger names its minter.

impl TokenState {
    /// Create empty token state with an authorized minter
    pub fn new(authorized_minter: Address) -> Self {
        Self {
            authorized_minter,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }
}

// ============ Token Contract ============

/// Token ledger plus the events it has emitted
#[derive(Debug, Clone)]
pub struct OptionToken {
    pub state: TokenState,
    pub events: EventLog,
}

impl OptionToken {
    /// Create a ledger minted and burned by `authorized_minter`
    pub fn new(authorized_minter: Address) -> Self {
        Self {
            state: TokenState::new(authorized_minter),
            events: EventLog::new(),
        }
    }

    /// Current minter
    pub fn authorized_minter(&self) -> Address {
        self.state.authorized_minter
    }

    /// Allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.state
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> Vec<Address> {
        self.state.balances.keys().copied().collect()
    }

    /// Whether balances sum to the total supply
    pub fn is_conserved(&self) -> bool {
        verify_conservation(self.state.balances.values(), self.state.total_supply)
    }

    /// Main entry point for caller-initiated token actions
    pub fn execute(&mut self, ctx: &CallContext, action: &TokenAction) -> OptionsResult<()> {
        match action {
            TokenAction::Transfer { to, amount } => {
                self.transfer_tokens(ctx.caller, *to, *amount, ctx.timestamp)
            }
            TokenAction::Approve { spender, amount } => {
                self.approve(ctx.caller, *spender, *amount, ctx.timestamp)
            }
            TokenAction::TransferFrom { from, to, amount } => {
                self.transfer_from(ctx.caller, *from, *to, *amount, ctx.timestamp)
            }
            TokenAction::Mint { to, amount } => {
                self.mint_tokens(ctx.caller, *to, *amount, ctx.timestamp)
            }
            TokenAction::Burn { from, amount } => {
                self.burn_tokens(ctx.caller, *from, *amount, ctx.timestamp)
            }
        }
    }

    /// Move tokens from `from` to `to`
    pub fn transfer_tokens(
        &mut self,
        from: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        // 1. Amount must be positive
        validate_amount(amount)?;

        // 2. Sender must have enough balance
        check_balance(self.balance(&from), amount)?;

        // 3. Move balances
        self.debit(from, amount)?;
        self.credit(to, amount)?;

        // 4. Emit transfer event
        self.events.emit(OptionsEvent::TokenTransfer {
            from,
            to,
            amount,
            timestamp,
        });

        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s tokens
    ///
    /// A zero amount revokes the allowance.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        if amount == 0 {
            self.state.allowances.remove(&(owner, spender));
        } else {
            self.state.allowances.insert((owner, spender), amount);
        }

        self.events.emit(OptionsEvent::TokenApproval {
            owner,
            spender,
            amount,
            timestamp,
        });

        Ok(())
    }

    /// Move tokens on behalf of `from`, consuming `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        // 1. Amount must be positive
        validate_amount(amount)?;

        // 2. Allowance must cover it, unless the holder acts directly
        if spender != from {
            let allowance = self.allowance(&from, &spender);
            if allowance < amount {
                return Err(OptionsError::InsufficientAllowance {
                    allowance,
                    requested: amount,
                });
            }
        }

        // 3. Holder must have enough balance
        check_balance(self.balance(&from), amount)?;

        if spender != from {
            self.spend_allowance(from, spender, amount)?;
        }
        self.transfer_tokens(from, to, amount, timestamp)
    }

    /// Create tokens (authorized minter only)
    pub fn mint_tokens(
        &mut self,
        minter: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        // 1. Caller must be authorized minter
        if minter != self.state.authorized_minter {
            return Err(OptionsError::MintUnauthorized { caller: minter });
        }

        // 2. Amount must be positive
        validate_amount(amount)?;

        // 3. Update total supply
        let new_supply = self
            .state
            .total_supply
            .checked_add(amount)
            .ok_or(OptionsError::Overflow)?;

        self.credit(to, amount)?;
        self.state.total_supply = new_supply;

        // 4. Emit mint event
        self.events.emit(OptionsEvent::TokenMint {
            to,
            amount,
            new_total_supply: new_supply,
            timestamp,
        });

        Ok(())
    }

    /// Destroy tokens held by `from` (authorized minter only)
    pub fn burn_tokens(
        &mut self,
        minter: Address,
        from: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        // 1. Caller must be authorized
        if minter != self.state.authorized_minter {
            return Err(OptionsError::BurnUnauthorized { caller: minter });
        }

        // 2. Amount must be positive
        validate_amount(amount)?;

        // 3. Burner must hold the tokens
        check_balance(self.balance(&from), amount)?;

        // 4. Update total supply
        let new_supply = self
            .state
            .total_supply
            .checked_sub(amount)
            .ok_or(OptionsError::Underflow)?;

        self.debit(from, amount)?;
        self.state.total_supply = new_supply;

        // 5. Emit burn event
        self.events.emit(OptionsEvent::TokenBurn {
            from,
            amount,
            new_total_supply: new_supply,
            timestamp,
        });

        Ok(())
    }

    /// Burn on behalf of `spender`, consuming allowance when it is not the holder
    pub fn burn_from(
        &mut self,
        minter: Address,
        spender: Address,
        from: Address,
        amount: u64,
        timestamp: u64,
    ) -> OptionsResult<()> {
        if minter != self.state.authorized_minter {
            return Err(OptionsError::BurnUnauthorized { caller: minter });
        }
        validate_amount(amount)?;

        if spender != from {
            let allowance = self.allowance(&from, &spender);
            if allowance < amount {
                return Err(OptionsError::InsufficientAllowance {
                    allowance,
                    requested: amount,
                });
            }
        }
        check_balance(self.balance(&from), amount)?;

        if spender != from {
            self.spend_allowance(from, spender, amount)?;
        }
        self.burn_tokens(minter, from, amount, timestamp)
    }

    // ============ Helpers ============

    fn balance(&self, account: &Address) -> u64 {
        self.state.balances.get(account).copied().unwrap_or(0)
    }

    fn credit(&mut self, account: Address, amount: u64) -> OptionsResult<()> {
        let balance = self.state.balances.entry(account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(OptionsError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, account: Address, amount: u64) -> OptionsResult<()> {
        let current = self.balance(&account);
        let remaining = current.checked_sub(amount).ok_or(OptionsError::InsufficientBalance {
            available: current,
            requested: amount,
        })?;
        if remaining == 0 {
            self.state.balances.remove(&account);
        } else {
            self.state.balances.insert(account, remaining);
        }
        Ok(())
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: u64) -> OptionsResult<()> {
        let remaining = self
            .allowance(&owner, &spender)
            .checked_sub(amount)
            .ok_or(OptionsError::Underflow)?;
        if remaining == 0 {
            self.state.allowances.remove(&(owner, spender));
        } else {
            self.state.allowances.insert((owner, spender), remaining);
        }
        Ok(())
    }
}

impl TokenLedger for OptionToken {
    fn balance_of(&self, account: &Address) -> u64 {
        self.balance(account)
    }

    fn total_supply(&self) -> u64 {
        self.state.total_supply
    }

    fn is_minter(&self, account: &Address) -> bool {
        *account == self.state.authorized_minter
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
        self.transfer_tokens(from, to, amount, timestamp)
    }

    fn mint(&mut self, minter: Address, to: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
        self.mint_tokens(minter, to, amount, timestamp)
    }

    fn burn(&mut self, minter: Address, from: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
        self.burn_tokens(minter, from, amount, timestamp)
    }
}

// ============ Tests ============
