//! Price Oracle Contract
//!
//! Multi-asset price feed for optvault series. Uses a trusted operator
//! model: the operator publishes `value * 10^scale` quotes per asset, the
//! admin rotates the operator and can switch the feed off.
//!
//! The feed implements `PriceOracle`, so the vault manager reads it through
//! the fail-closed adapter in `optvault_common::oracle`. Staleness is judged
//! there against the series' configured maximum age.

use std::collections::BTreeMap;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use optvault_common::{
    constants::limits::MAX_EXPONENT,
    errors::{AmountErrorReason, OptionsError, OptionsResult},
    events::{EventLog, OptionsEvent},
    oracle::PriceOracle,
    types::{Address, AssetId, CallContext, OracleAction, PriceQuote},
};

// ============ Oracle State ============

/// Oracle contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PriceFeedState {
    /// Latest quote per asset
    pub quotes: BTreeMap<AssetId, PriceQuote>,
    /// Authorized operator (can update prices)
    pub operator: Address,
    /// Admin (can change operator and toggle the feed)
    pub admin: Address,
    /// Whether oracle is active
    pub is_active: bool,
}

impl PriceFeedState {
    /// Create new oracle state with no quotes
    pub fn new(admin: Address, operator: Address) -> Self {
        Self {
            quotes: BTreeMap::new(),
            operator,
            admin,
            is_active: true,
        }
    }
}

// ============ Oracle Contract ============

/// Price feed plus the events it has emitted
#[derive(Debug, Clone)]
pub struct PriceFeed {
    pub state: PriceFeedState,
    pub events: EventLog,
}

impl PriceFeed {
    pub fn new(admin: Address, operator: Address) -> Self {
        Self {
            state: PriceFeedState::new(admin, operator),
            events: EventLog::new(),
        }
    }

    /// Main entry point
    pub fn execute(&mut self, ctx: &CallContext, action: &OracleAction) -> OptionsResult<()> {
        match action {
            OracleAction::UpdatePrice { asset, value, scale } => {
                self.update_price(ctx, *asset, *value, *scale)
            }
            OracleAction::SetOperator { operator } => self.set_operator(ctx, *operator),
            OracleAction::SetActive { active } => self.set_active(ctx, *active),
        }
    }

    /// Publish a quote for `asset`
    pub fn update_price(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        value: u64,
        scale: i32,
    ) -> OptionsResult<()> {
        // 1. Only operator can update price
        if ctx.caller != self.state.operator {
            return Err(OptionsError::Unauthorized {
                expected: self.state.operator,
                actual: ctx.caller,
            });
        }

        // 2. Oracle must be active
        if !self.state.is_active {
            return Err(OptionsError::OracleUnavailable { asset });
        }

        // 3. Price must be positive
        if value == 0 {
            return Err(OptionsError::InvalidAmount {
                amount: value,
                reason: AmountErrorReason::Zero,
            });
        }

        // 4. Scale must be representable
        if !validate_scale(scale) {
            return Err(OptionsError::InvalidParameter {
                param: "scale",
                reason: "outside [-38, 38]",
            });
        }

        // 5. Store the quote
        let old_value = self.state.quotes.get(&asset).map(|q| q.value).unwrap_or(0);
        self.state
            .quotes
            .insert(asset, PriceQuote::new(value, scale, ctx.timestamp));

        // 6. Emit event
        self.events.emit(OptionsEvent::PriceUpdated {
            asset,
            old_value,
            new_value: value,
            scale,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    /// Replace the operator (admin only)
    pub fn set_operator(&mut self, ctx: &CallContext, new_operator: Address) -> OptionsResult<()> {
        // 1. Only admin can change operator
        if ctx.caller != self.state.admin {
            return Err(OptionsError::AdminOnly);
        }

        // 2. New operator must be different
        if new_operator == self.state.operator {
            return Err(OptionsError::InvalidParameter {
                param: "operator",
                reason: "same as current",
            });
        }

        let old_operator = self.state.operator;
        self.state.operator = new_operator;

        // 3. Emit event
        self.events.emit(OptionsEvent::OracleOperatorChanged {
            old_operator,
            new_operator,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    /// Enable or disable the feed (admin only)
    pub fn set_active(&mut self, ctx: &CallContext, active: bool) -> OptionsResult<()> {
        if ctx.caller != self.state.admin {
            return Err(OptionsError::AdminOnly);
        }
        self.state.is_active = active;
        Ok(())
    }

    // ============ Query Functions ============

    /// Latest quote for `asset`, regardless of age
    ///
    /// For display only. Transactions go through the fail-closed adapter.
    pub fn get_price_for_display(&self, asset: &AssetId) -> Option<PriceQuote> {
        self.state.quotes.get(asset).copied()
    }

    /// Check if the quote for `asset` is no older than `max_age` seconds
    pub fn is_price_fresh(&self, asset: &AssetId, now: u64, max_age: u64) -> bool {
        match self.state.quotes.get(asset) {
            Some(quote) if self.state.is_active => {
                quote.updated_at <= now && now - quote.updated_at <= max_age
            }
            _ => false,
        }
    }
}

impl PriceOracle for PriceFeed {
    /// Returns `OracleUnavailable` when the feed is off or the asset unknown
    fn price(&self, asset: &AssetId) -> OptionsResult<PriceQuote> {
        if !self.state.is_active {
            return Err(OptionsError::OracleUnavailable { asset: *asset });
        }
        self.state
            .quotes
            .get(asset)
            .copied()
            .ok_or(OptionsError::OracleUnavailable { asset: *asset })
    }
}

// ============ Helper Functions ============

/// Whether a quote scale is within the supported exponent range
pub fn validate_scale(scale: i32) -> bool {
    (-MAX_EXPONENT..=MAX_EXPONENT).contains(&scale)
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use optvault_common::types::asset_id;

    const ADMIN: Address = [0u8; 32];
    const OPERATOR: Address = [1u8; 32];

    fn create_test_feed() -> PriceFeed {
        let mut feed = PriceFeed::new(ADMIN, OPERATOR);
        feed.update_price(&CallContext::new(OPERATOR, 100), asset_id("ETH"), 200, 0)
            .unwrap();
        feed
    }

    #[test]
    fn test_update_price_success() {
        let mut feed = create_test_feed();
        let eth = asset_id("ETH");

        // Large moves are accepted: the feed has no deviation guard
        let action = OracleAction::UpdatePrice { asset: eth, value: 100, scale: 0 };
        let result = feed.execute(&CallContext::new(OPERATOR, 101), &action);

        assert!(result.is_ok(), "Should succeed: {:?}", result);
        assert_eq!(feed.events.len(), 2);
        assert_eq!(feed.price(&eth).unwrap(), PriceQuote::new(100, 0, 101));
    }

    #[test]
    fn test_update_price_unauthorized() {
        let mut feed = create_test_feed();
        let action = OracleAction::UpdatePrice { asset: asset_id("ETH"), value: 1, scale: 0 };
        let result = feed.execute(&CallContext::new([99u8; 32], 101), &action);

        assert!(matches!(result, Err(OptionsError::Unauthorized { .. })));
    }

    #[test]
    fn test_update_price_rejects_bad_input() {
        let mut feed = create_test_feed();
        let ctx = CallContext::new(OPERATOR, 101);
        let eth = asset_id("ETH");

        assert!(matches!(
            feed.update_price(&ctx, eth, 0, 0),
            Err(OptionsError::InvalidAmount { .. })
        ));
        assert!(matches!(
            feed.update_price(&ctx, eth, 1, 39),
            Err(OptionsError::InvalidParameter { param: "scale", .. })
        ));
    }

    #[test]
    fn test_unknown_asset_unavailable() {
        let feed = create_test_feed();
        let usdc = asset_id("USDC");
        assert_eq!(feed.price(&usdc), Err(OptionsError::OracleUnavailable { asset: usdc }));
    }

    #[test]
    fn test_inactive_feed_fails_closed() {
        let mut feed = create_test_feed();
        let eth = asset_id("ETH");

        assert_eq!(
            feed.set_active(&CallContext::new(OPERATOR, 101), false),
            Err(OptionsError::AdminOnly)
        );
        feed.set_active(&CallContext::new(ADMIN, 101), false).unwrap();

        assert!(feed.price(&eth).is_err());
        assert!(!feed.is_price_fresh(&eth, 101, 3_600));
        // Display reads still see the last quote
        assert!(feed.get_price_for_display(&eth).is_some());
    }

    #[test]
    fn test_price_freshness() {
        let feed = create_test_feed();
        let eth = asset_id("ETH");

        assert!(feed.is_price_fresh(&eth, 103, 10));
        assert!(!feed.is_price_fresh(&eth, 111, 10));
    }

    #[test]
    fn test_set_operator() {
        let mut feed = create_test_feed();
        let new_operator = [2u8; 32];

        let action = OracleAction::SetOperator { operator: new_operator };
        assert!(feed.execute(&CallContext::new(ADMIN, 101), &action).is_ok());
        assert_eq!(feed.state.operator, new_operator);

        // Old operator can no longer publish
        let result = feed.update_price(&CallContext::new(OPERATOR, 102), asset_id("ETH"), 1, 0);
        assert!(result.is_err());

        // Same operator again is rejected
        assert!(feed.execute(&CallContext::new(ADMIN, 103), &action).is_err());
    }
}
