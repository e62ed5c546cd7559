//! Error Types for optvault
//!
//! Every rejected operation surfaces one of these typed errors. Rejections
//! are final: nothing is retried internally and no state is changed.

use crate::types::{Address, AssetId, VaultIndex};

/// Result type alias for optvault operations
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Main error enum for all optvault errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    // ============ Vault Errors ============
    /// No vault exists at the given index
    NotFound { index: VaultIndex },

    /// Caller is not the owner of the vault (or not the expected party)
    Unauthorized { expected: Address, actual: Address },

    /// The option series has expired
    Expired { expiry: u64, now: u64 },

    // ============ Amount Errors ============
    /// Invalid amount provided
    InvalidAmount { amount: u64, reason: AmountErrorReason },

    /// Collateral cannot cover the requested issuance, withdrawal or payout
    InsufficientCollateral { available: u64, required: u64 },

    /// Redeem or liquidation amount exceeds the vault's outstanding debt
    InsufficientDebt { outstanding: u64, requested: u64 },

    /// Account lacks the tokens for a burn or transfer
    InsufficientBalance { available: u64, requested: u64 },

    /// Spender allowance is below the requested amount
    InsufficientAllowance { allowance: u64, requested: u64 },

    // ============ Liquidation Errors ============
    /// Vault satisfies the collateralization ratio and cannot be liquidated
    VaultSafe { index: VaultIndex },

    /// Liquidation payout exceeds the per-call cap; `max_repay` is the
    /// largest repay amount the current cap admits
    ExceedsLiquidationCap { payout: u64, cap: u64, max_repay: u64 },

    // ============ Oracle Errors ============
    /// Price could not be read or was rejected by the adapter
    OracleUnavailable { asset: AssetId },

    // ============ Token Errors ============
    /// Mint not authorized
    MintUnauthorized { caller: Address },

    /// Burn not authorized
    BurnUnauthorized { caller: Address },

    /// Only the admin can perform this action
    AdminOnly,

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    // ============ Configuration Errors ============
    /// Invalid series or protocol parameter
    InvalidParameter { param: &'static str, reason: &'static str },

    /// Summed vault debt no longer matches option token supply
    InvariantViolated { total_debt: u64, total_supply: u64 },
}

/// Reasons for amount-related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Amount is zero when non-zero required
    Zero,
}

impl OptionsError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E001_NOT_FOUND",
            Self::Unauthorized { .. } => "E002_UNAUTHORIZED",
            Self::Expired { .. } => "E003_EXPIRED",
            Self::InvalidAmount { .. } => "E010_INVALID_AMOUNT",
            Self::InsufficientCollateral { .. } => "E011_INSUFFICIENT_COLL",
            Self::InsufficientDebt { .. } => "E012_INSUFFICIENT_DEBT",
            Self::InsufficientBalance { .. } => "E013_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E014_INSUFFICIENT_ALLOWANCE",
            Self::VaultSafe { .. } => "E020_VAULT_SAFE",
            Self::ExceedsLiquidationCap { .. } => "E021_EXCEEDS_LIQ_CAP",
            Self::OracleUnavailable { .. } => "E030_ORACLE_UNAVAILABLE",
            Self::MintUnauthorized { .. } => "E040_MINT_UNAUTH",
            Self::BurnUnauthorized { .. } => "E041_BURN_UNAUTH",
            Self::AdminOnly => "E042_ADMIN_ONLY",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidParameter { .. } => "E090_INVALID_PARAM",
            Self::InvariantViolated { .. } => "E100_INVARIANT",
        }
    }

    /// Returns true if the caller can fix the condition and resubmit
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientCollateral { .. } => true, // Deposit more collateral
            Self::InsufficientBalance { .. } => true,    // Acquire more tokens
            Self::InsufficientAllowance { .. } => true,  // Approve more
            Self::ExceedsLiquidationCap { .. } => true,  // Retry with a smaller amount
            Self::OracleUnavailable { .. } => true,      // Wait for a fresh quote
            _ => false,
        }
    }
}
