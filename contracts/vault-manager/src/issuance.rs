//! Issuance Engine
//!
//! Mints option tokens against a vault's collateral. The ceiling is
//! evaluated at the oracle price of the current call:
//!
//! ```text
//! max_issuable = floor(collateral * rate / collateralization_ratio)
//! ```

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::OptionsEvent,
    math::{max_debt_for_collateral, min_collateral_for_debt, safe_add},
    oracle::PriceOracle,
    token_ops::{check_minter, validate_amount, TokenLedger},
    types::{CallContext, VaultIndex},
};

use crate::OptionsContract;

impl<O: TokenLedger, C: TokenLedger> OptionsContract<O, C> {
    /// Mint `amount` option tokens to the owner against vault `index`
    pub fn issue_debt<P: PriceOracle + ?Sized>(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        amount: u64,
        oracle: &P,
    ) -> OptionsResult<()> {
        // 1. Vault must exist
        let vault = self.get_vault(index)?.clone();

        // 2. Only owner can issue
        Self::ensure_owner(&vault, &ctx.caller)?;

        // 3. Series must not be expired
        self.ensure_not_expired(ctx.timestamp)?;

        // 4. Amount must be positive
        validate_amount(amount)?;

        // 5. New debt must stay under the ceiling at the current price
        let new_debt = safe_add(vault.issued_debt, amount)?;
        let rate = self.current_rate(oracle, ctx.timestamp)?;
        let cr = self.state.params.collateralization()?;
        let max_issuable = max_debt_for_collateral(vault.collateral, rate, cr)?;

        if new_debt as u128 > max_issuable {
            let required = min_collateral_for_debt(new_debt, rate, cr)?;
            return Err(OptionsError::InsufficientCollateral {
                available: vault.collateral,
                required: u64::try_from(required).unwrap_or(u64::MAX),
            });
        }

        // 6. Contract must be able to mint
        check_minter(&self.option_token, &self.state.address)?;

        // 7. Record debt
        self.vault_mut(index)?.issued_debt = new_debt;

        // 8. Mint to the caller
        if let Err(e) = self
            .option_token
            .mint(self.state.address, ctx.caller, amount, ctx.timestamp)
        {
            self.restore_vault(index, vault);
            return Err(e);
        }

        // 9. Emit event
        self.events.emit(OptionsEvent::DebtIssued {
            index,
            recipient: ctx.caller,
            amount,
            new_debt,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    /// Total debt vault `index` could carry at the current price
    pub fn max_issuable<P: PriceOracle + ?Sized>(
        &self,
        index: VaultIndex,
        oracle: &P,
        now: u64,
    ) -> OptionsResult<u64> {
        let vault = self.get_vault(index)?;
        let rate = self.current_rate(oracle, now)?;
        let max = max_debt_for_collateral(vault.collateral, rate, self.state.params.collateralization()?)?;
        Ok(u64::try_from(max).unwrap_or(u64::MAX))
    }
}
