//! Liquidation Engine
//!
//! Safety evaluation and partial liquidation of unsafe vaults. Each call
//! re-reads the oracle and recomputes the cap from the vault's current
//! state, so repeated calls unwind a position step by step.

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::OptionsEvent,
    liquidation::{self as liq, LiquidationQuote},
    math::safe_sub,
    oracle::PriceOracle,
    token_ops::{check_balance, check_burner, validate_amount, TokenLedger},
    types::{CallContext, VaultIndex},
};

use crate::OptionsContract;

impl<O: TokenLedger, C: TokenLedger> OptionsContract<O, C> {
    /// Evaluate whether vault `index` is below the collateralization ratio
    ///
    /// Records the result as an `UnsafeEvaluated` event; vault state is
    /// not touched.
    pub fn is_unsafe<P: PriceOracle + ?Sized>(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        oracle: &P,
    ) -> OptionsResult<bool> {
        let is_unsafe = self.check_unsafe(index, oracle, ctx.timestamp)?;

        self.events.emit(OptionsEvent::UnsafeEvaluated {
            index,
            is_unsafe,
            timestamp: ctx.timestamp,
        });

        Ok(is_unsafe)
    }

    /// Read-only safety check; debt-free vaults skip the oracle
    pub fn check_unsafe<P: PriceOracle + ?Sized>(
        &self,
        index: VaultIndex,
        oracle: &P,
        now: u64,
    ) -> OptionsResult<bool> {
        let vault = self.get_vault(index)?;
        if !vault.has_debt() {
            return Ok(false);
        }
        let rate = self.current_rate(oracle, now)?;
        liq::can_liquidate(vault, rate, &self.state.params)
    }

    /// Repay `repay_amount` of an unsafe vault's debt for its collateral
    ///
    /// Returns the collateral paid out to the caller. Remains available
    /// after expiry. A failed payout transfer restores the vault and the
    /// liquidator's option balance.
    pub fn liquidate<P: PriceOracle + ?Sized>(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        repay_amount: u64,
        oracle: &P,
    ) -> OptionsResult<u64> {
        // 1. Vault must exist
        let vault = self.get_vault(index)?.clone();

        // 2. Amount must be positive
        validate_amount(repay_amount)?;

        // 3. A vault without debt is always safe
        if !vault.has_debt() {
            return Err(OptionsError::VaultSafe { index });
        }

        // 4. Unsafe, within cap, within debt
        let rate = self.current_rate(oracle, ctx.timestamp)?;
        let quote = liq::validate_liquidation(index, &vault, repay_amount, rate, &self.state.params)?;
        let payout = quote.collateral_payout;

        // 5. Liquidator must hold the tokens
        check_balance(self.option_token.balance_of(&ctx.caller), repay_amount)?;
        check_burner(&self.option_token, &self.state.address)?;

        // 6. Vault must hold the payout
        liq::ensure_payout_covered(&vault, payout)?;
        check_balance(self.collateral.balance_of(&self.state.address), payout)?;

        // 7. Apply to vault
        let new_debt = safe_sub(vault.issued_debt, repay_amount)?;
        let new_collateral = safe_sub(vault.collateral, payout)?;
        {
            let slot = self.vault_mut(index)?;
            slot.issued_debt = new_debt;
            slot.collateral = new_collateral;
        }

        // 8. Burn repaid tokens
        if let Err(e) = self
            .option_token
            .burn(self.state.address, ctx.caller, repay_amount, ctx.timestamp)
        {
            self.restore_vault(index, vault);
            return Err(e);
        }

        // 9. Pay out collateral; on failure re-mint the burned tokens
        if payout > 0 {
            if let Err(e) = self
                .collateral
                .transfer(self.state.address, ctx.caller, payout, ctx.timestamp)
            {
                self.restore_vault(index, vault);
                self.option_token
                    .mint(self.state.address, ctx.caller, repay_amount, ctx.timestamp)?;
                return Err(e);
            }
        }

        // 10. Emit event
        self.events.emit(OptionsEvent::VaultLiquidated {
            index,
            liquidator: ctx.caller,
            repay_amount,
            collateral_payout: payout,
            new_debt,
            new_collateral,
            timestamp: ctx.timestamp,
        });

        Ok(payout)
    }

    /// Largest payout one liquidation of vault `index` may release now
    pub fn max_collateral_liquidatable(&self, index: VaultIndex) -> OptionsResult<u64> {
        let vault = self.get_vault(index)?;
        liq::max_collateral_liquidatable(vault.collateral, &self.state.params)
    }

    /// Evaluate a liquidation without applying it
    pub fn preview_liquidation<P: PriceOracle + ?Sized>(
        &self,
        index: VaultIndex,
        repay_amount: u64,
        oracle: &P,
        now: u64,
    ) -> OptionsResult<LiquidationQuote> {
        let vault = self.get_vault(index)?;
        let rate = self.current_rate(oracle, now)?;
        liq::quote_liquidation(vault, repay_amount, rate, &self.state.params)
    }
}

#[cfg(test)]
mod tests {
    use crate::OptionsContract;
    use optvault_common::{
        errors::{OptionsError, OptionsResult},
        events::EventType,
        token_ops::TokenLedger,
        types::{asset_id, Address, CallContext, Fixed, OptionSeries, ProtocolParams},
    };
    use optvault_price_oracle::PriceFeed;
    use optvault_token::OptionToken;

    const CONTRACT: Address = [10u8; 32];
    const FAUCET: Address = [11u8; 32];
    const OPERATOR: Address = [12u8; 32];
    const OWNER: Address = [1u8; 32];
    const LIQUIDATOR: Address = [3u8; 32];
    const EXPIRY: u64 = 10_000;

    type Contract = OptionsContract<OptionToken, OptionToken>;

    fn create_feed(eth: u64) -> PriceFeed {
        let mut feed = PriceFeed::new([0u8; 32], OPERATOR);
        let ctx = CallContext::new(OPERATOR, 1);
        feed.update_price(&ctx, asset_id("ETH"), eth, 0).unwrap();
        feed.update_price(&ctx, asset_id("USDC"), 1, 0).unwrap();
        feed
    }

    /// Collateral ledger that never releases the contract's custody
    #[derive(Debug, Clone)]
    struct LockedCustody(OptionToken);

    impl TokenLedger for LockedCustody {
        fn balance_of(&self, account: &Address) -> u64 {
            self.0.balance_of(account)
        }

        fn total_supply(&self) -> u64 {
            self.0.total_supply()
        }

        fn is_minter(&self, account: &Address) -> bool {
            self.0.is_minter(account)
        }

        fn transfer(&mut self, from: Address, to: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
            if from == CONTRACT {
                return Err(OptionsError::AdminOnly);
            }
            self.0.transfer(from, to, amount, timestamp)
        }

        fn mint(&mut self, minter: Address, to: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
            self.0.mint(minter, to, amount, timestamp)
        }

        fn burn(&mut self, minter: Address, from: Address, amount: u64, timestamp: u64) -> OptionsResult<()> {
            self.0.burn(minter, from, amount, timestamp)
        }
    }

    fn test_series() -> OptionSeries {
        OptionSeries {
            underlying: asset_id("DAI"),
            underlying_exponent: -17,
            strike_asset: asset_id("USDC"),
            strike_price: Fixed::new(90, -1),
            collateral: asset_id("ETH"),
            collateral_exponent: -18,
            expiry: EXPIRY,
            window_start: 9_000,
        }
    }

    /// Vault 0: 20,000,000 collateral, 27,777,767 debt; LIQUIDATOR holds 15,000,000 tokens
    fn load<C: TokenLedger>(collateral: C) -> OptionsContract<OptionToken, C> {
        let mut contract = OptionsContract::new(
            test_series(),
            ProtocolParams::default(),
            CONTRACT,
            OptionToken::new(CONTRACT),
            collateral,
        )
        .unwrap();
        let ctx = CallContext::new(OWNER, 10);
        contract.open_vault(&ctx).unwrap();
        contract.deposit_collateral(&ctx, 0, 20_000_000).unwrap();
        contract.issue_debt(&ctx, 0, 27_777_767, &create_feed(200)).unwrap();
        contract.transfer_options(&ctx, LIQUIDATOR, 15_000_000).unwrap();
        contract
    }

    fn loaded_contract() -> Contract {
        let mut collateral = OptionToken::new(FAUCET);
        collateral.mint_tokens(FAUCET, OWNER, 20_000_000, 0).unwrap();
        load(collateral)
    }

    #[test]
    fn test_safe_vault_cannot_be_liquidated() {
        let mut contract = loaded_contract();
        let feed = create_feed(200);
        let before = contract.state().clone();

        let result = contract.liquidate(&CallContext::new(LIQUIDATOR, 20), 0, 1_000, &feed);
        assert_eq!(result, Err(OptionsError::VaultSafe { index: 0 }));
        assert_eq!(contract.state(), &before);
        assert_eq!(contract.events().filter_by_type(EventType::VaultLiquidated).len(), 0);
    }

    #[test]
    fn test_is_unsafe_emits_signal() {
        let mut contract = loaded_contract();
        let ctx = CallContext::new(LIQUIDATOR, 20);

        assert!(!contract.is_unsafe(&ctx, 0, &create_feed(200)).unwrap());
        assert!(contract.is_unsafe(&ctx, 0, &create_feed(100)).unwrap());
        assert_eq!(contract.events().filter_by_type(EventType::UnsafeEvaluated).len(), 2);
    }

    #[test]
    fn test_liquidation_pays_collateral() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);
        let ctx = CallContext::new(LIQUIDATOR, 20);

        let payout = contract.liquidate(&ctx, 0, 11_001_100, &feed).unwrap();
        assert_eq!(payout, 9_999_999);

        let vault = contract.get_vault(0).unwrap();
        assert_eq!(vault.collateral, 10_000_001);
        assert_eq!(vault.issued_debt, 16_776_667);
        assert_eq!(contract.collateral_ledger().balance_of(&LIQUIDATOR), 9_999_999);
        assert_eq!(contract.option_token().balance_of(&LIQUIDATOR), 3_998_900);
        assert!(contract.check_debt_invariant().is_ok());
    }

    #[test]
    fn test_cap_rejection_leaves_state() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);
        let before = contract.state().clone();

        let result = contract.liquidate(&CallContext::new(LIQUIDATOR, 20), 0, 11_001_105, &feed);
        assert_eq!(
            result,
            Err(OptionsError::ExceedsLiquidationCap {
                payout: 10_000_004,
                cap: 10_000_000,
                max_repay: 11_001_101,
            })
        );
        assert_eq!(contract.state(), &before);
        assert_eq!(contract.option_token().balance_of(&LIQUIDATOR), 15_000_000);
    }

    #[test]
    fn test_failed_payout_restores_vault_and_tokens() {
        let mut custody = OptionToken::new(FAUCET);
        custody.mint_tokens(FAUCET, OWNER, 20_000_000, 0).unwrap();
        let mut contract = load(LockedCustody(custody));
        let feed = create_feed(100);
        let before = contract.state().clone();

        let result = contract.liquidate(&CallContext::new(LIQUIDATOR, 20), 0, 11_001_100, &feed);
        assert_eq!(result, Err(OptionsError::AdminOnly));
        assert_eq!(contract.state(), &before);
        assert_eq!(contract.option_token().balance_of(&LIQUIDATOR), 15_000_000);
        assert_eq!(contract.option_token().total_supply(), 27_777_767);
        assert_eq!(contract.collateral_ledger().balance_of(&CONTRACT), 20_000_000);
        assert!(contract.check_debt_invariant().is_ok());
        assert_eq!(contract.events().filter_by_type(EventType::VaultLiquidated).len(), 0);
    }

    #[test]
    fn test_burn_rights_reported_as_burn() {
        let mut contract = loaded_contract();
        contract.option_token.state.authorized_minter = FAUCET;

        let result = contract.liquidate(&CallContext::new(LIQUIDATOR, 20), 0, 1_000, &create_feed(100));
        assert_eq!(result, Err(OptionsError::BurnUnauthorized { caller: CONTRACT }));
        assert_eq!(contract.get_vault(0).unwrap().issued_debt, 27_777_767);
    }

    #[test]
    fn test_liquidator_needs_tokens() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);
        let stranger = [4u8; 32];

        let result = contract.liquidate(&CallContext::new(stranger, 20), 0, 1_000, &feed);
        assert_eq!(result, Err(OptionsError::InsufficientBalance { available: 0, requested: 1_000 }));
    }

    #[test]
    fn test_liquidation_after_expiry() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);
        let payout = contract
            .liquidate(&CallContext::new(LIQUIDATOR, EXPIRY + 5), 0, 1_000, &feed)
            .unwrap();
        assert_eq!(payout, 909);
    }

    #[test]
    fn test_zero_repay_and_debt_free_vault() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);
        let ctx = CallContext::new(LIQUIDATOR, 20);

        assert!(matches!(
            contract.liquidate(&ctx, 0, 0, &feed),
            Err(OptionsError::InvalidAmount { .. })
        ));

        contract.open_vault(&CallContext::new(OWNER, 21)).unwrap();
        assert_eq!(contract.liquidate(&ctx, 1, 1, &feed), Err(OptionsError::VaultSafe { index: 1 }));
        assert_eq!(contract.liquidate(&ctx, 9, 1, &feed), Err(OptionsError::NotFound { index: 9 }));
    }

    #[test]
    fn test_preview_matches_execution() {
        let mut contract = loaded_contract();
        let feed = create_feed(100);

        assert_eq!(contract.max_collateral_liquidatable(0).unwrap(), 10_000_000);
        let quote = contract.preview_liquidation(0, 11_001_100, &feed, 20).unwrap();
        assert!(quote.is_unsafe);
        assert_eq!(quote.collateral_payout, 9_999_999);
        assert_eq!(quote.max_repay, 11_001_101);

        let vault = contract.get_vault(0).unwrap().clone();
        assert!(quote.would_succeed(&vault, 11_001_100));

        let payout = contract
            .liquidate(&CallContext::new(LIQUIDATOR, 20), 0, 11_001_100, &feed)
            .unwrap();
        assert_eq!(payout, quote.collateral_payout);
    }
}
