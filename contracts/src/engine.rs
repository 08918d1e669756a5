//! zkUSD Engine
//!
//! Main entry point of the protocol. Owns:
//! - the oracle action log and its settlement into the published prices
//! - the two parity trackers fed by `submit_price`
//! - the even/odd published price cells read by vault operations
//! - every user vault
//!
//! Price flow: oracles submit during block `n`; a settlement in block `n`
//! publishes into the cell of the opposite parity, which vault operations
//! start reading in block `n + 1`. Vault operations in block `n` keep reading
//! the cell of `n`'s own parity, so a settlement never changes the price used
//! inside the block it runs in.

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::{U256, U512};
use odra::casper_types::bytesrepr::ToBytes;
use crate::access_control::ProtocolControls;
use crate::errors::{ZkUsdError, ZkUsdResult};
use crate::events::*;
use crate::interfaces::TokenLedgerContractRef;
use crate::median::reduce_prices;
use crate::price_tracker::PriceTracker;
use crate::submission::PriceSubmission;
use crate::types::{LiquidationOutcome, Parity, PriceAction, ProtocolData, PublishedPrice};
use crate::vault::VaultState;

/// zkUSD protocol engine
#[odra::module(events = [
    PriceSubmitted,
    PriceSettled,
    VaultCreated,
    CollateralDeposited,
    ZkUsdMinted,
    CollateralRedeemed,
    ZkUsdBurned,
    VaultLiquidated,
    ProtocolStopped,
    ProtocolResumed,
    WhitelistUpdated,
    OracleFeeUpdated,
    FallbackPriceUpdated,
    AdminTransferred,
    FeePoolFunded
])]
pub struct ZkUsdEngine {
    /// Admin key, oracle fee, emergency stop, whitelist, fallback price
    controls: SubModule<ProtocolControls>,
    /// Tracker written during even blocks
    even_tracker: SubModule<PriceTracker>,
    /// Tracker written during odd blocks
    odd_tracker: SubModule<PriceTracker>,
    /// Published price read during even blocks
    even_price: Var<PublishedPrice>,
    /// Published price read during odd blocks
    odd_price: Var<PublishedPrice>,
    /// zkUSD token ledger
    token: Var<Address>,
    /// Milliseconds per protocol block
    block_duration: Var<u64>,
    /// Native tokens reserved for oracle fees
    fee_pool: Var<u64>,
    /// Append-only price action log
    actions: Mapping<u64, PriceAction>,
    /// Number of appended actions
    action_count: Var<u64>,
    /// Index of the first unsettled action
    action_cursor: Var<u64>,
    /// Running hash over every appended action
    latest_action_hash: Var<[u8; 32]>,
    /// Running hash at the cursor
    action_state: Var<[u8; 32]>,
    /// Median produced by the last non-empty settlement
    last_settled_price: Var<Option<u64>>,
    /// Latest action index per oracle
    last_action_of: Mapping<Address, u64>,
    /// Vaults by owner
    vaults: Mapping<Address, VaultState>,
}

#[odra::module]
impl ZkUsdEngine {
    /// Initialize the engine
    ///
    /// # Arguments
    /// * `admin` - Protocol admin
    /// * `token` - zkUSD ledger; the engine must be registered as its minter
    /// * `oracles` - Initial ordered oracle whitelist (at most 8)
    /// * `oracle_flat_fee` - Fee paid per submission, in motes
    /// * `fallback_price` - Price used for missing oracle slots (1e9 = $1)
    /// * `block_duration` - Milliseconds per protocol block
    pub fn init(
        &mut self,
        admin: Address,
        token: Address,
        oracles: Vec<Address>,
        oracle_flat_fee: u64,
        fallback_price: u64,
        block_duration: u64,
    ) {
        if block_duration == 0 {
            self.env().revert(ZkUsdError::InvalidConfig);
        }
        self.controls.init(admin, oracle_flat_fee, fallback_price);
        self.controls.commit_whitelist(oracles);

        self.token.set(token);
        self.block_duration.set(block_duration);
        self.fee_pool.set(0);
        self.action_count.set(0);
        self.action_cursor.set(0);
        self.latest_action_hash.set([0u8; 32]);
        self.action_state.set([0u8; 32]);
        self.last_settled_price.set(None);

        let initial = PublishedPrice {
            price: fallback_price,
            settled_block: 0,
            epoch: 0,
        };
        self.even_price.set(initial);
        self.odd_price.set(initial);
    }

    // ========== Oracle Functions ==========

    /// Submit a price for the current block.
    ///
    /// `whitelist` must be the full ordered oracle list matching the stored
    /// commitment. The caller is paid the flat oracle fee from the fee pool.
    pub fn submit_price(&mut self, price: u64, whitelist: Vec<Address>) {
        self.controls.require_not_halted();
        let slot = self.controls.require_whitelisted_caller(whitelist);
        if price == 0 {
            self.env().revert(ZkUsdError::AmountZero);
        }

        let caller = self.env().caller();
        if self.has_pending_action(caller) {
            self.env().revert(ZkUsdError::PendingActionExists);
        }

        let fee = self.controls.oracle_flat_fee();
        if fee > 0 {
            let pool = self.fee_pool();
            if pool < fee {
                self.env().revert(ZkUsdError::FeePoolInsufficient);
            }
            self.fee_pool.set(pool - fee);
            self.env().transfer_tokens(&caller, &U512::from(fee));
        }

        let block = self.current_block();
        let action = PriceAction {
            submitter: caller,
            price,
            block,
            whitelist_hash: self.controls.whitelist_hash(),
        };
        let action_index = self.append_action(action);

        let submission = PriceSubmission::new(price, block);
        match Parity::of(block) {
            Parity::Even => self.even_tracker.record(slot, submission),
            Parity::Odd => self.odd_tracker.record(slot, submission),
        }

        self.env().emit_event(PriceSubmitted {
            oracle: caller,
            price,
            block,
            action_index,
        });
    }

    /// Settle every pending action into the published price of the opposite
    /// parity. Returns the published median.
    pub fn settle_price_update(&mut self) -> u64 {
        self.controls.require_not_halted();

        let cursor = self.action_cursor.get_or_default();
        let count = self.action_count.get_or_default();
        let fallback = self.controls.fallback_price();

        // Actions submitted under a replaced whitelist are dropped
        let whitelist_hash = self.controls.whitelist_hash();
        let prices: Vec<u64> = (cursor..count)
            .map(|index| self.action(index))
            .filter(|action| action.whitelist_hash == whitelist_hash)
            .map(|action| action.price)
            .collect();

        let price = if prices.is_empty() {
            self.last_settled_price.get().flatten().unwrap_or(fallback)
        } else {
            let median = reduce_prices(prices, fallback);
            self.last_settled_price.set(Some(median));
            median
        };

        self.finish_settlement(price, cursor, count)
    }

    /// Publish the median of the tracker written in the previous block into
    /// the opposite-parity cell.
    ///
    /// The pending action log is consumed as well, so oracles can submit again
    /// in the block this settlement runs in.
    pub fn settle_tracked_price(&mut self) -> u64 {
        self.controls.require_not_halted();

        let cursor = self.action_cursor.get_or_default();
        let count = self.action_count.get_or_default();

        let price = self.tracker_median_price();
        self.last_settled_price.set(Some(price));

        self.finish_settlement(price, cursor, count)
    }

    // ========== Vault Functions ==========

    /// Open an empty vault for the caller
    pub fn create_vault(&mut self) {
        self.controls.require_not_halted();
        let caller = self.env().caller();
        if self.vaults.get(&caller).is_some() {
            self.env().revert(ZkUsdError::VaultAlreadyExists);
        }
        self.vaults.set(&caller, VaultState::new(caller));
        self.env().emit_event(VaultCreated { owner: caller });
    }

    /// Lock the attached native tokens as collateral in the caller's vault
    #[odra(payable)]
    pub fn deposit_collateral(&mut self) {
        self.controls.require_not_halted();
        let caller = self.env().caller();
        let amount = self.attached_amount();
        let vault = self.vault_of(caller);

        let next = self.unwrap_or_revert(vault.deposit(amount));
        self.vaults.set(&caller, next.clone());

        self.env().emit_event(CollateralDeposited {
            owner: caller,
            amount,
            new_collateral: next.collateral_amount,
        });
    }

    /// Mint zkUSD against the caller's collateral
    pub fn mint_zkusd(&mut self, amount: u64) {
        self.controls.require_not_halted();
        let caller = self.env().caller();
        let vault = self.vault_of(caller);
        let price = self.get_price();

        let next = self.unwrap_or_revert(vault.mint(amount, price));
        self.vaults.set(&caller, next.clone());
        self.token_ledger().mint(caller, U256::from(amount));

        self.env().emit_event(ZkUsdMinted {
            owner: caller,
            amount,
            new_debt: next.debt_amount,
        });
    }

    /// Withdraw collateral from the caller's vault
    pub fn redeem_collateral(&mut self, amount: u64) {
        self.controls.require_not_halted();
        let caller = self.env().caller();
        let vault = self.vault_of(caller);
        let price = self.get_price();

        let next = self.unwrap_or_revert(vault.redeem(amount, price));
        self.vaults.set(&caller, next.clone());
        self.env().transfer_tokens(&caller, &U512::from(amount));

        self.env().emit_event(CollateralRedeemed {
            owner: caller,
            amount,
            new_collateral: next.collateral_amount,
        });
    }

    /// Repay debt by burning the caller's zkUSD
    pub fn burn_zkusd(&mut self, amount: u64) {
        self.controls.require_not_halted();
        let caller = self.env().caller();
        let vault = self.vault_of(caller);

        let next = self.unwrap_or_revert(vault.burn(amount));
        self.vaults.set(&caller, next.clone());
        self.token_ledger().burn(caller, U256::from(amount));

        self.env().emit_event(ZkUsdBurned {
            owner: caller,
            amount,
            new_debt: next.debt_amount,
        });
    }

    /// Liquidate an unhealthy vault.
    ///
    /// The caller repays the vault's full debt from their own zkUSD and
    /// receives its value plus the liquidation bonus in collateral, capped at
    /// what the vault holds. The remainder goes back to the vault owner.
    pub fn liquidate(&mut self, vault_owner: Address) -> LiquidationOutcome {
        self.controls.require_not_halted();
        let liquidator = self.env().caller();
        let vault = self.vault_of(vault_owner);
        let price = self.get_price();

        let outcome = self.unwrap_or_revert(vault.liquidate(price));
        self.vaults.set(&vault_owner, vault.liquidated());

        if outcome.debt_repaid > 0 {
            self.token_ledger()
                .burn(liquidator, U256::from(outcome.debt_repaid));
        }
        if outcome.liquidator_collateral > 0 {
            self.env()
                .transfer_tokens(&liquidator, &U512::from(outcome.liquidator_collateral));
        }
        if outcome.owner_collateral > 0 {
            self.env()
                .transfer_tokens(&vault_owner, &U512::from(outcome.owner_collateral));
        }

        self.env().emit_event(VaultLiquidated {
            owner: vault_owner,
            liquidator,
            debt_repaid: outcome.debt_repaid,
            liquidator_collateral: outcome.liquidator_collateral,
            owner_collateral: outcome.owner_collateral,
            price,
        });
        outcome
    }

    // ========== Admin Functions ==========

    /// Engage the emergency stop (admin only)
    pub fn stop_protocol(&mut self) {
        self.controls.set_emergency_stop(true);
        self.env().emit_event(ProtocolStopped {
            by: self.env().caller(),
        });
    }

    /// Release the emergency stop (admin only)
    pub fn resume_protocol(&mut self) {
        self.controls.set_emergency_stop(false);
        self.env().emit_event(ProtocolResumed {
            by: self.env().caller(),
        });
    }

    /// Replace the oracle whitelist (admin only)
    pub fn update_whitelist(&mut self, oracles: Vec<Address>) {
        self.controls.require_admin();
        let oracle_count = oracles.len() as u32;
        let whitelist_hash = self.controls.commit_whitelist(oracles);
        // Slot indices belong to the old ordering
        self.even_tracker.clear();
        self.odd_tracker.clear();
        self.env().emit_event(WhitelistUpdated {
            whitelist_hash,
            oracle_count,
        });
    }

    /// Set the flat oracle fee (admin only)
    pub fn update_oracle_fee(&mut self, fee: u64) {
        self.controls.set_oracle_flat_fee(fee);
        self.env().emit_event(OracleFeeUpdated { fee });
    }

    /// Set the fallback price (admin only)
    pub fn update_fallback_price(&mut self, price: u64) {
        self.controls.set_fallback_price(price);
        self.env().emit_event(FallbackPriceUpdated { price });
    }

    /// Hand the admin role to `new_admin` (admin only)
    pub fn transfer_admin(&mut self, new_admin: Address) {
        let previous_admin = self.controls.protocol_data().admin;
        self.controls.set_admin(new_admin);
        self.env().emit_event(AdminTransferred {
            previous_admin,
            new_admin,
        });
    }

    /// Add the attached native tokens to the oracle fee pool
    #[odra(payable)]
    pub fn fund_fee_pool(&mut self) {
        let amount = self.attached_amount();
        if amount == 0 {
            self.env().revert(ZkUsdError::AmountZero);
        }
        let new_balance = match self.fee_pool().checked_add(amount) {
            Some(balance) => balance,
            None => self.env().revert(ZkUsdError::Overflow),
        };
        self.fee_pool.set(new_balance);
        self.env().emit_event(FeePoolFunded {
            funder: self.env().caller(),
            amount,
            new_balance,
        });
    }

    // ========== Queries ==========

    /// Protocol block derived from the block clock
    pub fn current_block(&self) -> u32 {
        let duration = self.block_duration.get().unwrap_or(1).max(1);
        let block = self.env().get_block_time() / duration;
        block.min(u32::MAX as u64) as u32
    }

    /// Parity of the current block
    pub fn current_parity(&self) -> Parity {
        Parity::of(self.current_block())
    }

    /// Price used by vault operations in the current block
    pub fn get_price(&self) -> u64 {
        self.published_price(self.current_parity()).price
    }

    /// Published price cell for `parity`
    pub fn published_price(&self, parity: Parity) -> PublishedPrice {
        match parity {
            Parity::Even => self.even_price.get_or_default(),
            Parity::Odd => self.odd_price.get_or_default(),
        }
    }

    /// Median of the tracker written in the previous block
    pub fn tracker_median_price(&self) -> u64 {
        let block = self.current_block();
        let fallback = self.controls.fallback_price();
        match Parity::of(block).opposite() {
            Parity::Even => self.even_tracker.calculate_median_price(block, fallback),
            Parity::Odd => self.odd_tracker.calculate_median_price(block, fallback),
        }
    }

    /// Running action hash at the settlement cursor
    pub fn action_state(&self) -> [u8; 32] {
        self.action_state.get_or_default()
    }

    /// Running hash over every appended action
    pub fn latest_action_hash(&self) -> [u8; 32] {
        self.latest_action_hash.get_or_default()
    }

    /// Number of appended but unsettled actions
    pub fn pending_action_count(&self) -> u64 {
        self.action_count.get_or_default() - self.action_cursor.get_or_default()
    }

    /// Whether `oracle` has an action awaiting settlement
    pub fn has_pending_action(&self, oracle: Address) -> bool {
        match self.last_action_of.get(&oracle) {
            Some(index) => index >= self.action_cursor.get_or_default(),
            None => false,
        }
    }

    pub fn protocol_data(&self) -> ProtocolData {
        self.controls.protocol_data()
    }

    pub fn whitelist_hash(&self) -> [u8; 32] {
        self.controls.whitelist_hash()
    }

    pub fn fee_pool(&self) -> u64 {
        self.fee_pool.get_or_default()
    }

    pub fn fallback_price(&self) -> u64 {
        self.controls.fallback_price()
    }

    pub fn token(&self) -> Option<Address> {
        self.token.get()
    }

    /// Vault of `owner`, if one was created
    pub fn get_vault(&self, owner: Address) -> Option<VaultState> {
        self.vaults.get(&owner)
    }

    /// Health factor of `owner`'s vault at the current price
    pub fn health_factor_of(&self, owner: Address) -> u64 {
        let vault = self.vault_of(owner);
        self.unwrap_or_revert(vault.health_factor(self.get_price()))
    }

    // ========== Internal Functions ==========

    fn append_action(&mut self, action: PriceAction) -> u64 {
        let index = self.action_count.get_or_default();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.latest_action_hash.get_or_default());
        match action.submitter.to_bytes() {
            Ok(encoded) => bytes.extend_from_slice(&encoded),
            Err(_) => self.env().revert(ZkUsdError::MalformedSubmission),
        }
        bytes.extend_from_slice(&action.price.to_le_bytes());
        bytes.extend_from_slice(&action.block.to_le_bytes());
        bytes.extend_from_slice(&action.whitelist_hash);
        self.latest_action_hash.set(self.env().hash(bytes));

        self.last_action_of.set(&action.submitter, index);
        self.actions.set(&index, action);
        self.action_count.set(index + 1);
        index
    }

    /// Move the cursor to `count`, publish `price` and log the settlement
    fn finish_settlement(&mut self, price: u64, cursor: u64, count: u64) -> u64 {
        let state = self.latest_action_hash.get_or_default();
        self.action_cursor.set(count);
        self.action_state.set(state);

        let (settled_block, target) = self.publish(price);
        self.env().emit_event(PriceSettled {
            price,
            settled_block,
            published_for_even: target == Parity::Even,
            actions_processed: count - cursor,
            action_state: state,
        });
        price
    }

    fn action(&self, index: u64) -> PriceAction {
        match self.actions.get(&index) {
            Some(action) => action,
            None => self.env().revert(ZkUsdError::MalformedSubmission),
        }
    }

    /// Write `price` into the cell of the parity opposite to the current block
    fn publish(&mut self, price: u64) -> (u32, Parity) {
        let block = self.current_block();
        let target = Parity::of(block).opposite();
        let epoch = self.published_price(target).epoch + 1;
        let cell = PublishedPrice {
            price,
            settled_block: block,
            epoch,
        };
        match target {
            Parity::Even => self.even_price.set(cell),
            Parity::Odd => self.odd_price.set(cell),
        }
        (block, target)
    }

    fn vault_of(&self, owner: Address) -> VaultState {
        match self.vaults.get(&owner) {
            Some(vault) => vault,
            None => self.env().revert(ZkUsdError::VaultNotFound),
        }
    }

    fn token_ledger(&self) -> TokenLedgerContractRef {
        match self.token.get() {
            Some(address) => TokenLedgerContractRef::new(self.env(), address),
            None => self.env().revert(ZkUsdError::InvalidConfig),
        }
    }

    fn attached_amount(&self) -> u64 {
        let attached = self.env().attached_value();
        if attached > U512::from(u64::MAX) {
            self.env().revert(ZkUsdError::Overflow);
        }
        attached.as_u64()
    }

    fn unwrap_or_revert<T>(&self, result: ZkUsdResult<T>) -> T {
        match result {
            Ok(value) => value,
            Err(error) => self.env().revert(error),
        }
    }
}
