//! Oracle Adapter
//!
//! Turns raw asset quotes into the collateral-to-strike exchange rate used
//! by issuance and liquidation.
//!
//! ## Failure Mode
//!
//! The adapter fails closed. Any quote that cannot be trusted surfaces as
//! `OracleUnavailable` and the dependent operation is rejected:
//!
//! - the feed returned an error
//! - the quote value is zero
//! - the quote scale is outside `[-38, 38]`
//! - the quote is older than `oracle_max_age` (when non-zero)
//! - the quote is timestamped in the future
//!
//! Quotes are read fresh on every call; nothing here caches a price.

use crate::constants::limits::MAX_EXPONENT;
use crate::errors::{OptionsError, OptionsResult};
use crate::math::Ratio;
use crate::types::{AssetId, OptionSeries, PriceQuote, ProtocolParams};

/// Source of asset prices in a common quote currency
pub trait PriceOracle {
    /// Latest quote for `asset`
    fn price(&self, asset: &AssetId) -> OptionsResult<PriceQuote>;
}

impl<T: PriceOracle + ?Sized> PriceOracle for &T {
    fn price(&self, asset: &AssetId) -> OptionsResult<PriceQuote> {
        (**self).price(asset)
    }
}

/// Read and validate a quote, mapping every failure to `OracleUnavailable`
pub fn fetch_quote<O: PriceOracle + ?Sized>(
    oracle: &O,
    asset: &AssetId,
    max_age: u64,
    now: u64,
) -> OptionsResult<PriceQuote> {
    let unavailable = || OptionsError::OracleUnavailable { asset: *asset };

    let quote = oracle.price(asset).map_err(|_| unavailable())?;

    if quote.value == 0 {
        return Err(unavailable());
    }
    if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&quote.scale) {
        return Err(unavailable());
    }
    if quote.updated_at > now {
        return Err(unavailable());
    }
    if max_age > 0 && now - quote.updated_at > max_age {
        return Err(unavailable());
    }

    Ok(quote)
}

/// Option-token units coverable by one collateral unit at current prices
///
/// ```text
///            Pc * 10^(ce + sc)
/// rate = --------------------------------
///         Ps * 10^ss * K * 10^(ue + ke)
/// ```
///
/// `Pc, sc` is the collateral quote, `Ps, ss` the strike-asset quote,
/// `K, ke` the strike price, `ce` and `ue` the collateral and underlying
/// unit exponents.
pub fn collateral_to_strike_rate<O: PriceOracle + ?Sized>(
    series: &OptionSeries,
    params: &ProtocolParams,
    oracle: &O,
    now: u64,
) -> OptionsResult<Ratio> {
    let collateral = fetch_quote(oracle, &series.collateral, params.oracle_max_age, now)?;
    let strike = fetch_quote(oracle, &series.strike_asset, params.oracle_max_age, now)?;

    let den = (strike.value as u128)
        .checked_mul(series.strike_price.value as u128)
        .ok_or(OptionsError::Overflow)?;

    // Net power of ten, folded into numerator or denominator
    let exponent = series
        .collateral_exponent
        .checked_add(collateral.scale)
        .and_then(|e| e.checked_sub(strike.scale))
        .and_then(|e| e.checked_sub(series.underlying_exponent))
        .and_then(|e| e.checked_sub(series.strike_price.exponent))
        .ok_or(OptionsError::Overflow)?;

    Ratio::new(collateral.value as u128, den)?.scale_pow10(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{asset_id, Fixed};
    use std::collections::BTreeMap;

    struct MockOracle {
        quotes: BTreeMap<AssetId, PriceQuote>,
    }

    impl MockOracle {
        fn new() -> Self {
            Self { quotes: BTreeMap::new() }
        }

        fn with(mut self, symbol: &str, value: u64, scale: i32, at: u64) -> Self {
            self.quotes.insert(asset_id(symbol), PriceQuote::new(value, scale, at));
            self
        }
    }

    impl PriceOracle for MockOracle {
        fn price(&self, asset: &AssetId) -> OptionsResult<PriceQuote> {
            self.quotes
                .get(asset)
                .copied()
                .ok_or(OptionsError::OracleUnavailable { asset: *asset })
        }
    }

    fn series() -> OptionSeries {
        OptionSeries {
            underlying: asset_id("DAI"),
            underlying_exponent: -17,
            strike_asset: asset_id("USDC"),
            strike_price: Fixed::new(90, -1),
            collateral: asset_id("ETH"),
            collateral_exponent: -18,
            expiry: 2_000,
            window_start: 1_000,
        }
    }

    #[test]
    fn test_golden_rate() {
        let oracle = MockOracle::new().with("ETH", 200, 0, 10).with("USDC", 1, 0, 10);
        let rate = collateral_to_strike_rate(&series(), &ProtocolParams::default(), &oracle, 10)
            .unwrap();
        assert_eq!(rate, Ratio { num: 20, den: 9 });

        let oracle = MockOracle::new().with("ETH", 100, 0, 10).with("USDC", 1, 0, 10);
        let rate = collateral_to_strike_rate(&series(), &ProtocolParams::default(), &oracle, 10)
            .unwrap();
        assert_eq!(rate, Ratio { num: 10, den: 9 });
    }

    #[test]
    fn test_rate_is_scale_invariant() {
        // Same prices quoted with eight decimals
        let oracle = MockOracle::new()
            .with("ETH", 200_0000_0000, -8, 10)
            .with("USDC", 1_0000_0000, -8, 10);
        let rate = collateral_to_strike_rate(&series(), &ProtocolParams::default(), &oracle, 10)
            .unwrap();
        assert_eq!(rate, Ratio { num: 20, den: 9 });
    }

    #[test]
    fn test_missing_quote_fails_closed() {
        let oracle = MockOracle::new().with("ETH", 200, 0, 10);
        let err = collateral_to_strike_rate(&series(), &ProtocolParams::default(), &oracle, 10)
            .unwrap_err();
        assert_eq!(err, OptionsError::OracleUnavailable { asset: asset_id("USDC") });
    }

    #[test]
    fn test_zero_and_bad_scale_rejected() {
        let eth = asset_id("ETH");
        let zero = MockOracle::new().with("ETH", 0, 0, 10);
        assert!(matches!(
            fetch_quote(&zero, &eth, 0, 10),
            Err(OptionsError::OracleUnavailable { .. })
        ));

        let huge = MockOracle::new().with("ETH", 1, 40, 10);
        assert!(fetch_quote(&huge, &eth, 0, 10).is_err());
    }

    #[test]
    fn test_staleness() {
        let eth = asset_id("ETH");
        let oracle = MockOracle::new().with("ETH", 200, 0, 100);

        // Disabled when max_age is zero
        assert!(fetch_quote(&oracle, &eth, 0, 1_000_000).is_ok());

        assert!(fetch_quote(&oracle, &eth, 60, 160).is_ok());
        assert!(fetch_quote(&oracle, &eth, 60, 161).is_err());

        // Quote from the future
        assert!(fetch_quote(&oracle, &eth, 60, 99).is_err());
    }
}
