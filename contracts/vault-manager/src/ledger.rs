//! Vault Ledger
//!
//! Arena of vaults keyed by a stable integer handle plus an append-only
//! owner index. Vaults are never removed; an emptied vault keeps its index.

use std::vec::Vec;

use optvault_common::{
    errors::{OptionsError, OptionsResult},
    events::OptionsEvent,
    math::{is_collateralized, min_collateral_for_debt, safe_add, safe_sub},
    oracle::PriceOracle,
    token_ops::{check_balance, validate_amount, TokenLedger},
    types::{Address, CallContext, Vault, VaultIndex},
};

use crate::OptionsContract;

impl<O: TokenLedger, C: TokenLedger> OptionsContract<O, C> {
    /// Open an empty vault owned by the caller
    pub fn open_vault(&mut self, ctx: &CallContext) -> OptionsResult<VaultIndex> {
        // 1. Series must not be expired
        self.ensure_not_expired(ctx.timestamp)?;

        // 2. Append vault and index it under the owner
        let index = self.state.vaults.len() as VaultIndex;
        self.state.vaults.push(Vault::new(ctx.caller, ctx.timestamp));
        self.state
            .owner_index
            .entry(ctx.caller)
            .or_insert_with(Vec::new)
            .push(index);

        // 3. Emit event
        self.events.emit(OptionsEvent::VaultOpened {
            index,
            owner: ctx.caller,
            timestamp: ctx.timestamp,
        });

        Ok(index)
    }

    /// Get a vault by index
    pub fn get_vault(&self, index: VaultIndex) -> OptionsResult<&Vault> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.state.vaults.get(i))
            .ok_or(OptionsError::NotFound { index })
    }

    /// Indices of the vaults `owner` opened, oldest first
    pub fn vaults_by_owner(&self, owner: &Address) -> &[VaultIndex] {
        self.state
            .owner_index
            .get(owner)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of vaults ever opened
    pub fn vault_count(&self) -> u64 {
        self.state.vaults.len() as u64
    }

    /// All vaults in index order
    pub fn vaults(&self) -> &[Vault] {
        &self.state.vaults
    }

    /// Credit collateral to a vault, pulled from the caller
    ///
    /// Anyone may deposit into any vault.
    pub fn deposit_collateral(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        amount: u64,
    ) -> OptionsResult<()> {
        // 1. Vault must exist
        let vault = self.get_vault(index)?;

        // 2. Series must not be expired
        self.ensure_not_expired(ctx.timestamp)?;

        // 3. Amount must be positive
        validate_amount(amount)?;

        // 4. Depositor must hold the collateral
        check_balance(self.collateral.balance_of(&ctx.caller), amount)?;

        // 5. Credit vault
        let snapshot = vault.clone();
        let new_collateral = safe_add(vault.collateral, amount)?;
        self.vault_mut(index)?.collateral = new_collateral;

        // 6. Pull collateral into custody
        if let Err(e) = self
            .collateral
            .transfer(ctx.caller, self.state.address, amount, ctx.timestamp)
        {
            self.restore_vault(index, snapshot);
            return Err(e);
        }

        // 7. Emit event
        self.events.emit(OptionsEvent::CollateralDeposited {
            index,
            depositor: ctx.caller,
            amount,
            new_collateral,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    /// Release surplus collateral to the vault owner
    ///
    /// Allowed after expiry. The oracle is only read when the vault carries
    /// debt.
    pub fn withdraw_collateral<P: PriceOracle + ?Sized>(
        &mut self,
        ctx: &CallContext,
        index: VaultIndex,
        amount: u64,
        oracle: &P,
    ) -> OptionsResult<()> {
        // 1. Vault must exist
        let vault = self.get_vault(index)?.clone();

        // 2. Only owner can withdraw
        Self::ensure_owner(&vault, &ctx.caller)?;

        // 3. Amount must be positive
        validate_amount(amount)?;

        // 4. Cannot withdraw more than available
        let new_collateral = safe_sub(vault.collateral, amount).map_err(|_| {
            OptionsError::InsufficientCollateral {
                available: vault.collateral,
                required: amount,
            }
        })?;

        // 5. Remaining collateral must still back the debt
        if vault.has_debt() {
            let rate = self.current_rate(oracle, ctx.timestamp)?;
            let cr = self.state.params.collateralization()?;
            if !is_collateralized(new_collateral, vault.issued_debt, rate, cr)? {
                let required = min_collateral_for_debt(vault.issued_debt, rate, cr)?;
                return Err(OptionsError::InsufficientCollateral {
                    available: new_collateral,
                    required: u64::try_from(required).unwrap_or(u64::MAX),
                });
            }
        }

        // 6. Custody must hold it
        check_balance(self.collateral.balance_of(&self.state.address), amount)?;

        // 7. Debit vault
        self.vault_mut(index)?.collateral = new_collateral;

        // 8. Return collateral to owner
        if let Err(e) = self
            .collateral
            .transfer(self.state.address, ctx.caller, amount, ctx.timestamp)
        {
            self.restore_vault(index, vault);
            return Err(e);
        }

        // 9. Emit event
        self.events.emit(OptionsEvent::CollateralWithdrawn {
            index,
            amount,
            new_collateral,
            timestamp: ctx.timestamp,
        });

        Ok(())
    }

    pub(crate) fn vault_mut(&mut self, index: VaultIndex) -> OptionsResult<&mut Vault> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.state.vaults.get_mut(i))
            .ok_or(OptionsError::NotFound { index })
    }
}
