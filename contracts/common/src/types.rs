//! Core Types for optvault
//!
//! This module defines the fundamental data structures shared by the
//! option token, price oracle and vault manager contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{limits::MAX_EXPONENT, liquidation, oracle, ratios};
use crate::errors::{OptionsError, OptionsResult};
use crate::math::Ratio;

/// Type alias for account addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for asset identifiers
pub type AssetId = [u8; 32];

/// Type alias for series identifiers
pub type SeriesId = [u8; 32];

/// Stable handle of a vault within a series
pub type VaultIndex = u64;

/// Derive a deterministic asset identifier from a ticker symbol
pub fn asset_id(symbol: &str) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(b"optvault:asset:");
    hasher.update(symbol.as_bytes());
    let mut id = [0u8; 32];
    id.copy_from_slice(&hasher.finalize());
    id
}

// ============ Fixed-Point ============

/// Decimal fixed-point number: `value * 10^exponent`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Fixed {
    pub value: u64,
    pub exponent: i32,
}

impl Fixed {
    pub const fn new(value: u64, exponent: i32) -> Self {
        Self { value, exponent }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }
}

// ============ Series Types ============

/// Immutable parameters of one option series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OptionSeries {
    /// Asset the option is written on
    pub underlying: AssetId,
    /// One option-token unit is `10^underlying_exponent` of the underlying
    pub underlying_exponent: i32,
    /// Asset the strike is denominated in
    pub strike_asset: AssetId,
    /// Strike-asset amount per whole unit of underlying
    pub strike_price: Fixed,
    /// Asset locked in vaults
    pub collateral: AssetId,
    /// One collateral unit is `10^collateral_exponent` of the collateral asset
    pub collateral_exponent: i32,
    /// Unix timestamp at which the series becomes inert
    pub expiry: u64,
    /// Unix timestamp at which the liquidation window opens
    pub window_start: u64,
}

impl OptionSeries {
    /// Validate series parameters
    pub fn validate(&self) -> OptionsResult<()> {
        if self.strike_price.is_zero() {
            return Err(OptionsError::InvalidParameter {
                param: "strike_price",
                reason: "must be non-zero",
            });
        }

        let exponents = [
            self.underlying_exponent,
            self.collateral_exponent,
            self.strike_price.exponent,
        ];
        if exponents.iter().any(|e| !(-MAX_EXPONENT..=MAX_EXPONENT).contains(e)) {
            return Err(OptionsError::InvalidParameter {
                param: "exponent",
                reason: "outside [-38, 38]",
            });
        }

        if self.window_start > self.expiry {
            return Err(OptionsError::InvalidParameter {
                param: "window_start",
                reason: "after expiry",
            });
        }

        Ok(())
    }

    /// Deterministic identifier for this series
    pub fn series_id(&self) -> SeriesId {
        let mut hasher = Sha256::new();
        hasher.update(b"optvault:series:");
        hasher.update(borsh::to_vec(self).unwrap_or_default());
        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        id
    }

    /// True once `now` has reached expiry
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiry
    }

    /// True between window start (inclusive) and expiry (exclusive)
    pub fn in_liquidation_window(&self, now: u64) -> bool {
        now >= self.window_start && now < self.expiry
    }
}

// ============ Protocol Parameters ============

/// Risk parameters applied to every vault in a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ProtocolParams {
    /// Minimum collateral value / debt value (must be > 1)
    pub collateralization_ratio: Fixed,
    /// Liquidator premium on top of the nominal rate (must be > 0)
    pub liquidation_incentive: Fixed,
    /// Share of collateral one liquidation may pay out (0 < f < 1)
    pub liquidation_factor: Fixed,
    /// Maximum quote age in seconds, 0 disables the check
    pub oracle_max_age: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            collateralization_ratio: ratios::MIN_COLLATERALIZATION,
            liquidation_incentive: liquidation::INCENTIVE,
            liquidation_factor: liquidation::FACTOR,
            oracle_max_age: oracle::MAX_PRICE_AGE_SECS,
        }
    }
}

impl ProtocolParams {
    /// Validate parameter bounds
    pub fn validate(&self) -> OptionsResult<()> {
        let cr = Ratio::from_fixed(self.collateralization_ratio)?;
        if cr.num <= cr.den {
            return Err(OptionsError::InvalidParameter {
                param: "collateralization_ratio",
                reason: "must be greater than 1",
            });
        }

        if self.liquidation_incentive.is_zero() {
            return Err(OptionsError::InvalidParameter {
                param: "liquidation_incentive",
                reason: "must be greater than 0",
            });
        }
        Ratio::from_fixed(self.liquidation_incentive)?;

        let factor = Ratio::from_fixed(self.liquidation_factor)?;
        if factor.num == 0 || factor.num >= factor.den {
            return Err(OptionsError::InvalidParameter {
                param: "liquidation_factor",
                reason: "must be in (0, 1)",
            });
        }

        Ok(())
    }

    /// Collateralization ratio as an exact ratio
    pub fn collateralization(&self) -> OptionsResult<Ratio> {
        Ratio::from_fixed(self.collateralization_ratio)
    }

    /// `1 + liquidation_incentive`
    pub fn incentive_multiplier(&self) -> OptionsResult<Ratio> {
        Ratio::from_fixed(self.liquidation_incentive)?.one_plus()
    }

    /// Liquidation factor as an exact ratio
    pub fn factor(&self) -> OptionsResult<Ratio> {
        Ratio::from_fixed(self.liquidation_factor)
    }
}

// ============ Vault Types ============

/// Individual vault state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Vault {
    /// Account that opened the vault
    pub owner: Address,
    /// Collateral in collateral-asset smallest units
    pub collateral: u64,
    /// Outstanding option tokens minted against this vault
    pub issued_debt: u64,
    /// Timestamp of the open call
    pub opened_at: u64,
}

impl Vault {
    /// Creates an empty vault
    pub fn new(owner: Address, opened_at: u64) -> Self {
        Self {
            owner,
            collateral: 0,
            issued_debt: 0,
            opened_at,
        }
    }

    /// Returns true if the vault carries option-token debt
    pub fn has_debt(&self) -> bool {
        self.issued_debt > 0
    }

    /// Returns true if both balances are zero
    pub fn is_empty(&self) -> bool {
        self.collateral == 0 && self.issued_debt == 0
    }
}

// ============ Oracle Types ============

/// A point price: `value * 10^scale` units of the quote currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PriceQuote {
    pub value: u64,
    pub scale: i32,
    /// Timestamp of the last update
    pub updated_at: u64,
}

impl PriceQuote {
    pub fn new(value: u64, scale: i32, updated_at: u64) -> Self {
        Self { value, scale, updated_at }
    }

    pub fn as_fixed(&self) -> Fixed {
        Fixed::new(self.value, self.scale)
    }
}

// ============ Execution Context ============

/// Who is calling and when
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller
    pub caller: Address,
    /// Current unix timestamp
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

// ============ Actions ============

/// Actions on the options contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OptionsAction {
    /// Open an empty vault owned by the caller
    OpenVault,
    /// Add collateral to any vault
    DepositCollateral { index: VaultIndex, amount: u64 },
    /// Withdraw surplus collateral (owner only)
    WithdrawCollateral { index: VaultIndex, amount: u64 },
    /// Mint option tokens against a vault (owner only)
    IssueDebt { index: VaultIndex, amount: u64 },
    /// Burn option tokens to reduce a vault's debt (owner only)
    RedeemDebt { index: VaultIndex, amount: u64 },
    /// Evaluate and record whether a vault is unsafe
    CheckUnsafe { index: VaultIndex },
    /// Repay part of an unsafe vault's debt for its collateral
    Liquidate { index: VaultIndex, repay_amount: u64 },
}

/// Actions on a token ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TokenAction {
    /// Move tokens from the caller
    Transfer { to: Address, amount: u64 },
    /// Set the allowance of a spender over the caller's tokens
    Approve { spender: Address, amount: u64 },
    /// Move tokens on behalf of `from`, consuming allowance
    TransferFrom { from: Address, to: Address, amount: u64 },
    /// Create tokens (authorized minter only)
    Mint { to: Address, amount: u64 },
    /// Destroy tokens (authorized minter only)
    Burn { from: Address, amount: u64 },
}

/// Actions on the price oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OracleAction {
    /// Publish a new quote for an asset (operator only)
    UpdatePrice { asset: AssetId, value: u64, scale: i32 },
    /// Replace the operator (admin only)
    SetOperator { operator: Address },
    /// Enable or disable the feed (admin only)
    SetActive { active: bool },
}
