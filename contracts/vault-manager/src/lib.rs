//! Vault Manager - Options Contract for optvault
//!
//! One `OptionsContract` governs one option series. Owners open vaults,
//! lock collateral in them and mint option tokens against it; anyone may
//! liquidate a vault that falls below the collateralization ratio.
//!
//! ## Core Operations
//!
//! - **OpenVault**: Create an empty vault owned by the caller
//! - **DepositCollateral**: Credit collateral to any vault
//! - **WithdrawCollateral**: Release surplus collateral to the owner
//! - **IssueDebt**: Mint option tokens against a vault's collateral
//! - **RedeemDebt**: Burn option tokens to reduce a vault's debt
//! - **CheckUnsafe**: Evaluate and record a vault's safety
//! - **Liquidate**: Repay part of an unsafe vault's debt for its collateral
//!
//! ## Atomicity
//!
//! Every operation takes `&mut self` and runs checks, then effects, then
//! external ledger calls. Ledger balances and minter rights are checked
//! before any vault field changes, so a rejected call leaves all state
//! untouched and emits nothing.

use std::collections::BTreeMap;
use std::vec::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::EventLog,
    math::{safe_add, Ratio},
    oracle::{collateral_to_strike_rate, PriceOracle},
    token_ops::TokenLedger,
    types::{Address, CallContext, OptionSeries, OptionsAction, ProtocolParams, Vault, VaultIndex},
};

pub mod ledger;
pub mod issuance;
pub mod redemption;
pub mod liquidation;


// ============ Contract State ============

/// Persistent state of one option series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OptionsContractState {
    /// Immutable series parameters
    pub series: OptionSeries,
    /// Risk parameters
    pub params: ProtocolParams,
    /// Address that custodies collateral and mints option tokens
    pub address: Address,
    /// All vaults, indexed by `VaultIndex`; never removed
    pub vaults: Vec<Vault>,
    /// Vault indices per owner in opening order
    pub owner_index: BTreeMap<Address, Vec<VaultIndex>>,
}

/// Result of a dispatched action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A vault was opened at this index
    Opened(VaultIndex),
    /// Result of a safety evaluation
    Evaluated { is_unsafe: bool },
    /// Collateral released to the liquidator
    Liquidated { collateral_payout: u64 },
    /// Any other successful action
    Done,
}

// ============ Options Contract ============

/// Vault ledger with issuance, redemption and liquidation engines
///
/// `O` is the series' option token, `C` the collateral asset ledger.
#[derive(Debug, Clone)]
pub struct OptionsContract<O: TokenLedger, C: TokenLedger> {
    pub(crate) state: OptionsContractState,
    pub(crate) option_token: O,
    pub(crate) collateral: C,
    pub(crate) events: EventLog,
}

impl<O: TokenLedger, C: TokenLedger> OptionsContract<O, C> {
    /// Deploy a contract for `series`
    ///
    /// # Errors
    /// - `InvalidParameter` if the series or params are out of bounds, or if
    ///   `address` is not the option token's minter
    pub fn new(
        series: OptionSeries,
        params: ProtocolParams,
        address: Address,
        option_token: O,
        collateral: C,
    ) -> OptionsResult<Self> {
        series.validate()?;
        params.validate()?;

        if !option_token.is_minter(&address) {
            return Err(OptionsError::InvalidParameter {
                param: "option_token",
                reason: "contract is not the authorized minter",
            });
        }
        if option_token.total_supply() != 0 {
            return Err(OptionsError::InvalidParameter {
                param: "option_token",
                reason: "supply must start at zero",
            });
        }

        Ok(Self {
            state: OptionsContractState {
                series,
                params,
                address,
                vaults: Vec::new(),
                owner_index: BTreeMap::new(),
            },
            option_token,
            collateral,
            events: EventLog::new(),
        })
    }

    // ============ Accessors ============

    pub fn state(&self) -> &OptionsContractState {
        &self.state
    }

    pub fn series(&self) -> &OptionSeries {
        &self.state.series
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.state.params
    }

    pub fn address(&self) -> Address {
        self.state.address
    }

    pub fn option_token(&self) -> &O {
        &self.option_token
    }

    pub fn collateral_ledger(&self) -> &C {
        &self.collateral
    }

    /// Mutable collateral ledger, for funding accounts outside the contract
    pub fn collateral_ledger_mut(&mut self) -> &mut C {
        &mut self.collateral
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Move option tokens between holders on the caller's behalf
    pub fn transfer_options(&mut self, ctx: &CallContext, to: Address, amount: u64) -> OptionsResult<()> {
        self.option_token.transfer(ctx.caller, to, amount, ctx.timestamp)
    }

    // ============ Dispatch ============

    /// Main entry point
    pub fn execute<P: PriceOracle + ?Sized>(
        &mut self,
        ctx: &CallContext,
        action: &OptionsAction,
        oracle: &P,
    ) -> OptionsResult<ActionOutcome> {
        match action {
            OptionsAction::OpenVault => self.open_vault(ctx).map(ActionOutcome::Opened),
            OptionsAction::DepositCollateral { index, amount } => {
                self.deposit_collateral(ctx, *index, *amount)?;
                Ok(ActionOutcome::Done)
            }
            OptionsAction::WithdrawCollateral { index, amount } => {
                self.withdraw_collateral(ctx, *index, *amount, oracle)?;
                Ok(ActionOutcome::Done)
            }
            OptionsAction::IssueDebt { index, amount } => {
                self.issue_debt(ctx, *index, *amount, oracle)?;
                Ok(ActionOutcome::Done)
            }
            OptionsAction::RedeemDebt { index, amount } => {
                self.redeem_debt(ctx, *index, *amount)?;
                Ok(ActionOutcome::Done)
            }
            OptionsAction::CheckUnsafe { index } => {
                let is_unsafe = self.is_unsafe(ctx, *index, oracle)?;
                Ok(ActionOutcome::Evaluated { is_unsafe })
            }
            OptionsAction::Liquidate { index, repay_amount } => {
                let collateral_payout = self.liquidate(ctx, *index, *repay_amount, oracle)?;
                Ok(ActionOutcome::Liquidated { collateral_payout })
            }
        }
    }

    // ============ Debt Invariant ============

    /// Sum of `issued_debt` over all vaults
    pub fn total_issued_debt(&self) -> OptionsResult<u64> {
        self.state
            .vaults
            .iter()
            .try_fold(0u64, |acc, v| safe_add(acc, v.issued_debt))
    }

    /// Verify that summed vault debt equals option token supply
    pub fn check_debt_invariant(&self) -> OptionsResult<()> {
        let total_debt = self.total_issued_debt()?;
        let total_supply = self.option_token.total_supply();
        if total_debt != total_supply {
            return Err(OptionsError::InvariantViolated { total_debt, total_supply });
        }
        Ok(())
    }

    // ============ Internal Helpers ============

    /// Fresh collateral-to-strike rate from the oracle
    pub(crate) fn current_rate<P: PriceOracle + ?Sized>(&self, oracle: &P, now: u64) -> OptionsResult<Ratio> {
        collateral_to_strike_rate(&self.state.series, &self.state.params, oracle, now)
    }

    /// Reject calls at or after expiry
    pub(crate) fn ensure_not_expired(&self, now: u64) -> OptionsResult<()> {
        if self.state.series.is_expired(now) {
            return Err(OptionsError::Expired {
                expiry: self.state.series.expiry,
                now,
            });
        }
        Ok(())
    }

    /// Reject callers other than the vault owner
    pub(crate) fn ensure_owner(vault: &Vault, caller: &Address) -> OptionsResult<()> {
        if vault.owner != *caller {
            return Err(OptionsError::Unauthorized {
                expected: vault.owner,
                actual: *caller,
            });
        }
        Ok(())
    }

    /// Put a vault back after a ledger call failed past the pre-checks
    pub(crate) fn restore_vault(&mut self, index: VaultIndex, snapshot: Vault) {
        if let Some(slot) = self.state.vaults.get_mut(index as usize) {
            *slot = snapshot;
        }
    }
}

// ============ Tests ============
