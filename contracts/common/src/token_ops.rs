//! Token Operations Module
//!
//! The seam between the options contract and the fungible ledgers it drives:
//! the option token (minted and burned in lockstep with vault debt) and the
//! collateral asset (held in custody under the contract's address).
//!
//! ## Key Features
//!
//! - **Mint Authorization**: Only the authorized minter can mint or burn
//! - **Pre-checks**: Balances can be read before any state is touched
//! - **Conservation**: Sum of balances always equals total supply

use crate::errors::{AmountErrorReason, OptionsError, OptionsResult};
use crate::types::Address;

/// A fungible token ledger as seen by the options contract
pub trait TokenLedger {
    /// Balance held by `account`
    fn balance_of(&self, account: &Address) -> u64;

    /// Total tokens in circulation
    fn total_supply(&self) -> u64;

    /// Whether `account` may mint and burn
    fn is_minter(&self, account: &Address) -> bool;

    /// Move tokens from `from` to `to`
    fn transfer(&mut self, from: Address, to: Address, amount: u64, timestamp: u64)
        -> OptionsResult<()>;

    /// Create tokens for `to` (minter only)
    fn mint(&mut self, minter: Address, to: Address, amount: u64, timestamp: u64)
        -> OptionsResult<()>;

    /// Destroy tokens held by `from` (minter only)
    fn burn(&mut self, minter: Address, from: Address, amount: u64, timestamp: u64)
        -> OptionsResult<()>;
}

/// Reject zero amounts
pub fn validate_amount(amount: u64) -> OptionsResult<()> {
    if amount == 0 {
        return Err(OptionsError::InvalidAmount {
            amount,
            reason: AmountErrorReason::Zero,
        });
    }
    Ok(())
}

/// Ensure `available` covers `requested`
pub fn check_balance(available: u64, requested: u64) -> OptionsResult<()> {
    if available < requested {
        return Err(OptionsError::InsufficientBalance { available, requested });
    }
    Ok(())
}

/// Ensure a ledger will accept a mint from `minter`
pub fn check_minter<L: TokenLedger + ?Sized>(ledger: &L, minter: &Address) -> OptionsResult<()> {
    if !ledger.is_minter(minter) {
        return Err(OptionsError::MintUnauthorized { caller: *minter });
    }
    Ok(())
}

/// Ensure a ledger will accept a burn from `burner`
pub fn check_burner<L: TokenLedger + ?Sized>(ledger: &L, burner: &Address) -> OptionsResult<()> {
    if !ledger.is_minter(burner) {
        return Err(OptionsError::BurnUnauthorized { caller: *burner });
    }
    Ok(())
}

/// Verify that balances sum to the recorded supply
pub fn verify_conservation<'a, I>(balances: I, total_supply: u64) -> bool
where
    I: IntoIterator<Item = &'a u64>,
{
    let sum: u128 = balances.into_iter().map(|b| *b as u128).sum();
    sum == total_supply as u128
}
