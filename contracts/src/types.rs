//! Common types used across the zkUSD protocol.

use odra::prelude::*;

/// Block parity used to double-buffer published prices and trackers
#[odra::odra_type]
#[derive(Copy)]
pub enum Parity {
    /// Even block number
    Even,
    /// Odd block number
    Odd,
}

impl Parity {
    pub fn of(block: u32) -> Self {
        if block % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

/// One of the two published price cells
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct PublishedPrice {
    /// Median price (1e9 = $1)
    pub price: u64,
    /// Block in which the settlement that wrote this cell ran
    pub settled_block: u32,
    /// Number of settlements written into this cell
    pub epoch: u64,
}

/// Admin-controlled protocol parameters
#[odra::odra_type]
pub struct ProtocolData {
    /// Admin account
    pub admin: Address,
    /// Flat fee paid to an oracle per submission (native token motes)
    pub oracle_flat_fee: u64,
    /// Global circuit breaker
    pub emergency_stop: bool,
}

/// Entry in the append-only price action log
#[odra::odra_type]
pub struct PriceAction {
    /// Oracle that submitted the price
    pub submitter: Address,
    /// Submitted price (1e9 = $1)
    pub price: u64,
    /// Block of submission
    pub block: u32,
    /// Whitelist commitment the submission was accepted under
    pub whitelist_hash: [u8; 32],
}

/// Collateral split produced by a liquidation
#[odra::odra_type]
pub struct LiquidationOutcome {
    /// Owner of the liquidated vault
    pub vault_owner: Address,
    /// Debt burned from the liquidator
    pub debt_repaid: u64,
    /// Collateral paid to the liquidator (debt value plus bonus, capped)
    pub liquidator_collateral: u64,
    /// Collateral returned to the vault owner
    pub owner_collateral: u64,
    /// Price the liquidation executed at
    pub price: u64,
}
