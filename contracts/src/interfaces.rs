//! External contract interfaces consumed by the engine.

use odra::prelude::*;
use odra::casper_types::U256;

/// Fungible-token ledger for zkUSD.
///
/// The engine must be an authorised minter; `burn` fails with
/// `InsufficientBalance` when the holder cannot cover the amount.
#[odra::external_contract]
pub trait TokenLedger {
    /// Mint `amount` to `recipient`
    fn mint(&mut self, recipient: Address, amount: U256);
    /// Burn `amount` from `holder`
    fn burn(&mut self, holder: Address, amount: U256);
    /// Transfer `amount` from the caller to `recipient`
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    /// Balance of `owner`
    fn balance_of(&self, owner: Address) -> U256;
}
