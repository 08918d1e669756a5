//! Engine events.

use odra::prelude::*;

#[odra::event]
pub struct PriceSubmitted {
    pub oracle: Address,
    pub price: u64,
    pub block: u32,
    pub action_index: u64,
}

#[odra::event]
pub struct PriceSettled {
    pub price: u64,
    pub settled_block: u32,
    pub published_for_even: bool,
    pub actions_processed: u64,
    pub action_state: [u8; 32],
}

#[odra::event]
pub struct VaultCreated {
    pub owner: Address,
}

#[odra::event]
pub struct CollateralDeposited {
    pub owner: Address,
    pub amount: u64,
    pub new_collateral: u64,
}

#[odra::event]
pub struct ZkUsdMinted {
    pub owner: Address,
    pub amount: u64,
    pub new_debt: u64,
}

#[odra::event]
pub struct CollateralRedeemed {
    pub owner: Address,
    pub amount: u64,
    pub new_collateral: u64,
}

#[odra::event]
pub struct ZkUsdBurned {
    pub owner: Address,
    pub amount: u64,
    pub new_debt: u64,
}

#[odra::event]
pub struct VaultLiquidated {
    pub owner: Address,
    pub liquidator: Address,
    pub debt_repaid: u64,
    pub liquidator_collateral: u64,
    pub owner_collateral: u64,
    pub price: u64,
}

#[odra::event]
pub struct ProtocolStopped {
    pub by: Address,
}

#[odra::event]
pub struct ProtocolResumed {
    pub by: Address,
}

#[odra::event]
pub struct WhitelistUpdated {
    pub whitelist_hash: [u8; 32],
    pub oracle_count: u32,
}

#[odra::event]
pub struct OracleFeeUpdated {
    pub fee: u64,
}

#[odra::event]
pub struct FallbackPriceUpdated {
    pub price: u64,
}

#[odra::event]
pub struct AdminTransferred {
    pub previous_admin: Address,
    pub new_admin: Address,
}

#[odra::event]
pub struct FeePoolFunded {
    pub funder: Address,
    pub amount: u64,
    pub new_balance: u64,
}
