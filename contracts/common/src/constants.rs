//! Protocol Constants
//!
//! Default risk parameters for optvault option series.
//! All ratios are expressed as `Fixed { value, exponent }` pairs so they can
//! be combined with strike prices and oracle quotes without losing precision.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (oracle staleness enforced)
//! - Default (no feature) - Testnet values (staleness check disabled)
//!
//! ```toml
//! # For mainnet deployment:
//! optvault-common = { path = "...", features = ["mainnet"] }
//! ```

use crate::types::Fixed;

/// Collateralization Ratios
pub mod ratios {
    use super::Fixed;

    /// Minimum Collateralization Ratio (160%)
    /// Issuance must keep the vault at or above this, and a vault below it
    /// is open to liquidation.
    pub const MIN_COLLATERALIZATION: Fixed = Fixed::new(16, -1);
}

/// Liquidation Configuration
pub mod liquidation {
    use super::Fixed;

    /// Premium paid to liquidators on top of the nominal exchange rate (1%)
    pub const INCENTIVE: Fixed = Fixed::new(1, -2);

    /// Share of a vault's collateral a single liquidation may pay out (50%)
    pub const FACTOR: Fixed = Fixed::new(500, -3);
}

/// Oracle Configuration
pub mod oracle {
    /// Maximum quote age in seconds before the adapter fails closed.
    /// - Mainnet: 1 hour
    /// - Testnet: 0 (disabled, fixtures use frozen quotes)
    #[cfg(feature = "mainnet")]
    pub const MAX_PRICE_AGE_SECS: u64 = 3_600;
    #[cfg(not(feature = "mainnet"))]
    pub const MAX_PRICE_AGE_SECS: u64 = 0;
}

/// Limits
pub mod limits {
    /// Largest decimal exponent accepted for prices, quotes and unit scales.
    /// 10^38 is the largest power of ten that fits in a u128.
    pub const MAX_EXPONENT: i32 = 38;
}

/// Precision constants
pub mod precision {
    /// Decimal base used by every exponent in the protocol
    pub const DECIMAL_BASE: u128 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ratios_are_sane() {
        // 160% > 100%
        assert!(ratios::MIN_COLLATERALIZATION.value > 10);
        assert_eq!(ratios::MIN_COLLATERALIZATION.exponent, -1);

        // 50% < 100%
        assert!(liquidation::FACTOR.value < 1_000);
        assert!(liquidation::INCENTIVE.value > 0);
    }

    #[cfg(not(feature = "mainnet"))]
    #[test]
    fn test_testnet_disables_staleness() {
        assert_eq!(oracle::MAX_PRICE_AGE_SECS, 0);
    }
}
