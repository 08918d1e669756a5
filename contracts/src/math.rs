//! Fixed-point arithmetic for USD values and health factors.
//!
//! All amounts are unsigned integers scaled by [`UNIT_PRECISION`] (1e9 = $1 or
//! one whole collateral unit). Intermediate products are widened to `u128`.
//!
//! Divisions go through [`integer_divide`], which computes the quotient and
//! remainder and then re-checks `q * d + r == n` and `r < d` before returning.

use crate::errors::{ZkUsdError, ZkUsdResult};

/// Fixed-point scale (1e9)
pub const UNIT_PRECISION: u64 = 1_000_000_000;

/// Minimum collateralization ratio in percent (150%)
pub const COLLATERAL_RATIO_PERCENT: u64 = 150;

/// Health factor scale: 100 == exactly at the collateralization ratio
pub const HEALTH_FACTOR_SCALE: u64 = 100;

/// Health factor below which mint/redeem are rejected
pub const MIN_HEALTH_FACTOR: u64 = 100;

/// Liquidator payout as a percentage of the repaid debt value (10% bonus)
pub const LIQUIDATION_BONUS_RATIO: u64 = 110;

/// Integer division with a verified witness.
///
/// Fails with `DivisionByZero` when `denominator == 0`.
pub fn integer_divide(numerator: u128, denominator: u128) -> ZkUsdResult<u128> {
    if denominator == 0 {
        return Err(ZkUsdError::DivisionByZero);
    }

    let quotient = numerator / denominator;
    let remainder = numerator % denominator;

    let reconstructed = quotient
        .checked_mul(denominator)
        .and_then(|v| v.checked_add(remainder))
        .ok_or(ZkUsdError::DivisionInvariant)?;

    if reconstructed != numerator || remainder >= denominator {
        return Err(ZkUsdError::DivisionInvariant);
    }

    Ok(quotient)
}

/// Like [`integer_divide`] but yields `u64::MAX` for a zero denominator.
pub fn safe_divide(numerator: u128, denominator: u128) -> ZkUsdResult<u128> {
    if denominator == 0 {
        return Ok(u64::MAX as u128);
    }
    integer_divide(numerator, denominator)
}

/// Narrow a `u128` intermediate back to a 64-bit amount.
pub fn narrow(value: u128) -> ZkUsdResult<u64> {
    u64::try_from(value).map_err(|_| ZkUsdError::Overflow)
}

/// USD value (1e9 scale) of `collateral` at `price`.
pub fn collateral_value_usd(collateral: u64, price: u64) -> ZkUsdResult<u128> {
    integer_divide(
        collateral as u128 * price as u128,
        UNIT_PRECISION as u128,
    )
}

/// Calculate the health factor of a position.
///
/// `floor(floor(collateral * price / UNIT) * 100 / 150) * 100 / debt`
///
/// Returns `u64::MAX` when `debt == 0`; larger results saturate at `u64::MAX`.
pub fn health_factor(collateral: u64, debt: u64, price: u64) -> ZkUsdResult<u64> {
    let value = collateral_value_usd(collateral, price)?;
    let max_allowed_debt = integer_divide(
        value * HEALTH_FACTOR_SCALE as u128,
        COLLATERAL_RATIO_PERCENT as u128,
    )?;
    let factor = safe_divide(max_allowed_debt * HEALTH_FACTOR_SCALE as u128, debt as u128)?;
    Ok(u64::try_from(factor).unwrap_or(u64::MAX))
}

/// Collateral owed to a liquidator repaying `debt` at `price`, before capping.
pub fn liquidation_collateral(debt: u64, price: u64) -> ZkUsdResult<u128> {
    let debt_in_collateral = integer_divide(
        debt as u128 * UNIT_PRECISION as u128,
        price as u128,
    )?;
    integer_divide(
        debt_in_collateral * LIQUIDATION_BONUS_RATIO as u128,
        HEALTH_FACTOR_SCALE as u128,
    )
}
