//! Redemption Engine
//!
//! Burns option tokens to reduce a vault's debt. Collateral stays in the
//! vault; the owner withdraws any surplus separately.

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::OptionsEvent,
    token_ops::{check_balance, check_burner, validate_amount, TokenLedger},
    types::{CallContext, VaultIndex},
};

use crate::OptionsContract;

impl<O: TokenLedger, C: TokenLedger> OptionsContract<O, C> {
    /// Burn `amount` of the owner's option tokens against vault `index`
    pub fn redeem_debt(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        amount: u64,
    ) -> OptionsResult<()> {
        // 1. Vault must exist
        let vault = self.get_vault(index)?.clone();

        // 2. Only owner can redeem
        Self::ensure_owner(&vault, &ctx.caller)?;

        // 3. Series must not be expired
        self.ensure_not_expired(ctx.timestamp)?;

        // 4. Amount must be positive
        validate_amount(amount)?;

        // 5. Cannot redeem more than is owed
        let new_debt = vault
            .issued_debt
            .checked_sub(amount)
            .ok_or(OptionsError::InsufficientDebt {
                outstanding: vault.issued_debt,
                requested: amount,
            })?;

        // 6. Caller must hold the tokens
        check_balance(self.option_token.balance_of(&ctx.caller), amount)?;
        check_burner(&self.option_token, &self.state.address)?;

        // 7. Reduce debt
        self.vault_mut(index)?.issued_debt = new_debt;

        // 8. Burn from the caller
        if let Err(e) = self
            .option_token
            .burn(self.state.address, ctx.caller, amount, ctx.timestamp)
        {
            self.restore_vault(index, vault);
            return Err(e);
        }

        // 9. Emit event
        self.events.emit(OptionsEvent::DebtRedeemed {
            index,
            amount,
            new_debt,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::OptionsContract;
    use optvault_common::{
        errors::OptionsError,
        token_ops::TokenLedger,
        types::{asset_id, Address, CallContext, Fixed, OptionSeries, ProtocolParams},
    };
    use optvault_price_oracle::PriceFeed;
    use optvault_token::OptionToken;

    const CONTRACT: Address = [10u8; 32];
    const FAUCET: Address = [11u8; 32];
    const OPERATOR: Address = [12u8; 32];
    const OWNER: Address = [1u8; 32];
    const HOLDER: Address = [2u8; 32];
    const EXPIRY: u64 = 10_000;

    type Contract = OptionsContract<OptionToken, OptionToken>;

    /// Vault 0 with 20,000,000 collateral and 1,000,000 debt, all held by OWNER
    fn indebted_contract() -> Contract {
        let series = OptionSeries {
            underlying: asset_id("DAI"),
            underlying_exponent: -17,
            strike_asset: asset_id("USDC"),
            strike_price: Fixed::new(90, -1),
            collateral: asset_id("ETH"),
            collateral_exponent: -18,
            expiry: EXPIRY,
            window_start: 9_000,
        };
        let mut collateral = OptionToken::new(FAUCET);
        collateral.mint_tokens(FAUCET, OWNER, 20_000_000, 0).unwrap();

        let mut feed = PriceFeed::new([0u8; 32], OPERATOR);
        let op = CallContext::new(OPERATOR, 1);
        feed.update_price(&op, asset_id("ETH"), 200, 0).unwrap();
        feed.update_price(&op, asset_id("USDC"), 1, 0).unwrap();

        let mut contract = OptionsContract::new(
            series,
            ProtocolParams::default(),
            CONTRACT,
            OptionToken::new(CONTRACT),
            collateral,
        )
        .unwrap();
        let ctx = CallContext::new(OWNER, 10);
        contract.open_vault(&ctx).unwrap();
        contract.deposit_collateral(&ctx, 0, 20_000_000).unwrap();
        contract.issue_debt(&ctx, 0, 1_000_000, &feed).unwrap();
        contract
    }

    #[test]
    fn test_redeem_reduces_debt_only() {
        let mut contract = indebted_contract();
        contract.redeem_debt(&CallContext::new(OWNER, 20), 0, 400_000).unwrap();

        let vault = contract.get_vault(0).unwrap();
        assert_eq!(vault.issued_debt, 600_000);
        assert_eq!(vault.collateral, 20_000_000);
        assert_eq!(contract.option_token().balance_of(&OWNER), 600_000);
        assert!(contract.check_debt_invariant().is_ok());
    }

    #[test]
    fn test_redeem_more_than_debt() {
        let mut contract = indebted_contract();
        let result = contract.redeem_debt(&CallContext::new(OWNER, 20), 0, 1_000_001);
        assert_eq!(
            result,
            Err(OptionsError::InsufficientDebt { outstanding: 1_000_000, requested: 1_000_001 })
        );
    }

    #[test]
    fn test_redeem_needs_tokens() {
        let mut contract = indebted_contract();
        contract
            .transfer_options(&CallContext::new(OWNER, 15), HOLDER, 999_000)
            .unwrap();

        let result = contract.redeem_debt(&CallContext::new(OWNER, 20), 0, 1_001);
        assert_eq!(
            result,
            Err(OptionsError::InsufficientBalance { available: 1_000, requested: 1_001 })
        );
        assert_eq!(contract.get_vault(0).unwrap().issued_debt, 1_000_000);
    }

    #[test]
    fn test_redeem_owner_only_and_not_after_expiry() {
        let mut contract = indebted_contract();
        assert!(matches!(
            contract.redeem_debt(&CallContext::new(HOLDER, 20), 0, 1),
            Err(OptionsError::Unauthorized { .. })
        ));
        assert!(matches!(
            contract.redeem_debt(&CallContext::new(OWNER, EXPIRY), 0, 1),
            Err(OptionsError::Expired { .. })
        ));
        assert!(matches!(
            contract.redeem_debt(&CallContext::new(OWNER, 20), 0, 0),
            Err(OptionsError::InvalidAmount { .. })
        ));
    }
}
