//! Liquidation Math
//!
//! Pure functions behind the liquidation engine. Nothing here touches
//! ledgers or vault storage; the vault manager applies the results.
//!
//! ## Liquidation Flow
//!
//! ```text
//! collateral * rate < debt * CR ?
//!         │
//!    no ──┴── yes
//!    │         │
//! VaultSafe    ▼
//!      payout = floor(repay / rate * (1 + incentive))
//!              │
//!              ▼
//!      payout <= floor(collateral * factor) ?
//!              │
//!         no ──┴── yes
//!         │         │
//!  ExceedsCap       ▼
//!         repay <= debt, payout <= collateral
//! ```
//!
//! The cap is recomputed from the vault's current collateral on every
//! call, so repeated partial liquidations each see a smaller bound.

use crate::errors::{OptionsError, OptionsResult};
use crate::math::{is_collateralized, to_amount, Ratio};
use crate::types::{ProtocolParams, Vault, VaultIndex};

/// Outcome of evaluating a liquidation without applying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationQuote {
    /// Whether the vault is below the collateralization ratio
    pub is_unsafe: bool,
    /// Collateral the repay amount would release
    pub collateral_payout: u64,
    /// Largest payout a single call may release
    pub collateral_cap: u64,
    /// Largest repay amount whose payout fits in the cap and the debt
    pub max_repay: u64,
}

impl LiquidationQuote {
    /// Whether a liquidation of `repay` against `vault` would pass every check
    pub fn would_succeed(&self, vault: &Vault, repay: u64) -> bool {
        self.is_unsafe
            && repay > 0
            && self.collateral_payout <= self.collateral_cap
            && repay <= vault.issued_debt
            && self.collateral_payout <= vault.collateral
    }
}

/// Check if a vault can be liquidated at `rate`
///
/// A vault without debt is always safe.
pub fn can_liquidate(vault: &Vault, rate: Ratio, params: &ProtocolParams) -> OptionsResult<bool> {
    if !vault.has_debt() {
        return Ok(false);
    }
    let safe = is_collateralized(
        vault.collateral,
        vault.issued_debt,
        rate,
        params.collateralization()?,
    )?;
    Ok(!safe)
}

/// Collateral released for repaying `repay` option tokens
///
/// payout = floor(repay * rate^-1 * (1 + incentive))
pub fn collateral_payout(repay: u64, rate: Ratio, params: &ProtocolParams) -> OptionsResult<u64> {
    let per_token = rate.inverse()?.mul(params.incentive_multiplier()?)?;
    to_amount(per_token.apply_floor(repay as u128)?)
}

/// Per-call payout bound: floor(collateral * liquidation_factor)
pub fn max_collateral_liquidatable(collateral: u64, params: &ProtocolParams) -> OptionsResult<u64> {
    to_amount(params.factor()?.apply_floor(collateral as u128)?)
}

/// Largest repay amount whose payout stays within `cap`
///
/// Solves `floor(r * p) <= cap` for the largest integer `r`, where `p` is
/// collateral paid per option token.
pub fn max_repay_for_cap(cap: u64, rate: Ratio, params: &ProtocolParams) -> OptionsResult<u64> {
    let per_token = rate.inverse()?.mul(params.incentive_multiplier()?)?;
    if per_token.num == 0 {
        return Ok(u64::MAX);
    }
    let bound = (cap as u128 + 1)
        .checked_mul(per_token.den)
        .ok_or(OptionsError::Overflow)?;
    let max_repay = (bound - 1) / per_token.num;
    Ok(u64::try_from(max_repay).unwrap_or(u64::MAX))
}

/// Evaluate a liquidation of `repay` without enforcing any check
pub fn quote_liquidation(
    vault: &Vault,
    repay: u64,
    rate: Ratio,
    params: &ProtocolParams,
) -> OptionsResult<LiquidationQuote> {
    let collateral_cap = max_collateral_liquidatable(vault.collateral, params)?;
    let max_repay = max_repay_for_cap(collateral_cap, rate, params)?.min(vault.issued_debt);

    Ok(LiquidationQuote {
        is_unsafe: can_liquidate(vault, rate, params)?,
        collateral_payout: collateral_payout(repay, rate, params)?,
        collateral_cap,
        max_repay,
    })
}

/// Validate the vault-side preconditions of a liquidation
///
/// Checks, in order: the vault is unsafe, the payout fits the per-call cap,
/// and the repay amount does not exceed the outstanding debt. The token
/// balance of the liquidator is checked by the caller, followed by
/// [`ensure_payout_covered`].
pub fn validate_liquidation(
    index: VaultIndex,
    vault: &Vault,
    repay: u64,
    rate: Ratio,
    params: &ProtocolParams,
) -> OptionsResult<LiquidationQuote> {
    let quote = quote_liquidation(vault, repay, rate, params)?;

    // 1. Vault must be unsafe
    if !quote.is_unsafe {
        return Err(OptionsError::VaultSafe { index });
    }

    // 2. Payout must fit the per-call cap
    if quote.collateral_payout > quote.collateral_cap {
        return Err(OptionsError::ExceedsLiquidationCap {
            payout: quote.collateral_payout,
            cap: quote.collateral_cap,
            max_repay: quote.max_repay,
        });
    }

    // 3. Cannot repay more than is owed
    if repay > vault.issued_debt {
        return Err(OptionsError::InsufficientDebt {
            outstanding: vault.issued_debt,
            requested: repay,
        });
    }

    Ok(quote)
}

/// Reject payouts larger than the vault's collateral
pub fn ensure_payout_covered(vault: &Vault, payout: u64) -> OptionsResult<()> {
    if payout > vault.collateral {
        return Err(OptionsError::InsufficientCollateral {
            available: vault.collateral,
            required: payout,
        });
    }
    Ok(())
}
