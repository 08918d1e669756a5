//! Vault state machine.
//!
//! Every transition returns the proposed post-state without touching storage;
//! the engine persists it only after all checks pass.
//!
//! - deposit/burn only move a vault towards safety and need no price
//! - mint/redeem are rejected when the post-state health factor drops below
//!   [`MIN_HEALTH_FACTOR`]
//! - liquidation requires a health factor at or below the threshold and empties
//!   the vault, splitting its collateral between liquidator and owner

use odra::prelude::*;
use crate::errors::{ZkUsdError, ZkUsdResult};
use crate::math::{health_factor, liquidation_collateral, narrow, MIN_HEALTH_FACTOR};
use crate::types::LiquidationOutcome;

/// Per-owner collateral/debt position
#[odra::odra_type]
pub struct VaultState {
    /// Owner address
    pub owner: Address,
    /// Locked collateral (1e9 = one unit)
    pub collateral_amount: u64,
    /// Outstanding zkUSD debt (1e9 = $1)
    pub debt_amount: u64,
}

impl VaultState {
    /// Fresh vault with no collateral and no debt.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            collateral_amount: 0,
            debt_amount: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collateral_amount == 0 && self.debt_amount == 0
    }

    pub fn health_factor(&self, price: u64) -> ZkUsdResult<u64> {
        health_factor(self.collateral_amount, self.debt_amount, price)
    }

    pub fn deposit(&self, amount: u64) -> ZkUsdResult<Self> {
        require_non_zero(amount)?;
        let collateral_amount = self
            .collateral_amount
            .checked_add(amount)
            .ok_or(ZkUsdError::Overflow)?;
        Ok(Self {
            collateral_amount,
            ..self.clone()
        })
    }

    pub fn mint(&self, amount: u64, price: u64) -> ZkUsdResult<Self> {
        require_non_zero(amount)?;
        let debt_amount = self
            .debt_amount
            .checked_add(amount)
            .ok_or(ZkUsdError::Overflow)?;
        let next = Self {
            debt_amount,
            ..self.clone()
        };
        next.require_healthy(price)?;
        Ok(next)
    }

    pub fn redeem(&self, amount: u64, price: u64) -> ZkUsdResult<Self> {
        require_non_zero(amount)?;
        if amount > self.collateral_amount {
            return Err(ZkUsdError::InsufficientCollateral);
        }
        let next = Self {
            collateral_amount: self.collateral_amount - amount,
            ..self.clone()
        };
        next.require_healthy(price)?;
        Ok(next)
    }

    pub fn burn(&self, amount: u64) -> ZkUsdResult<Self> {
        require_non_zero(amount)?;
        if amount > self.debt_amount {
            return Err(ZkUsdError::AmountExceedsDebt);
        }
        Ok(Self {
            debt_amount: self.debt_amount - amount,
            ..self.clone()
        })
    }

    /// Split the vault's collateral for a liquidation at `price`.
    ///
    /// The liquidator is owed the repaid debt's value plus the bonus, capped
    /// at the vault's collateral; the owner keeps the rest.
    pub fn liquidate(&self, price: u64) -> ZkUsdResult<LiquidationOutcome> {
        if self.health_factor(price)? > MIN_HEALTH_FACTOR {
            return Err(ZkUsdError::HealthFactorTooHigh);
        }

        let owed = liquidation_collateral(self.debt_amount, price)?;
        let liquidator_collateral = narrow(owed.min(self.collateral_amount as u128))?;
        let owner_collateral = self.collateral_amount - liquidator_collateral;

        Ok(LiquidationOutcome {
            vault_owner: self.owner,
            debt_repaid: self.debt_amount,
            liquidator_collateral,
            owner_collateral,
            price,
        })
    }

    /// State after a liquidation: same owner, nothing locked, nothing owed.
    pub fn liquidated(&self) -> Self {
        Self::new(self.owner)
    }

    fn require_healthy(&self, price: u64) -> ZkUsdResult<()> {
        if self.health_factor(price)? < MIN_HEALTH_FACTOR {
            return Err(ZkUsdError::HealthFactorTooLow);
        }
        Ok(())
    }
}

fn require_non_zero(amount: u64) -> ZkUsdResult<()> {
    if amount == 0 {
        return Err(ZkUsdError::AmountZero);
    }
    Ok(())
}
