//! zkUSD Integration Tests
//!
//! Scenarios for the engine and token running together on the Odra VM.

#[cfg(test)]
mod fixture {
    use odra::casper_types::U512;
    use odra::host::{Deployer, HostEnv, HostRef};
    use odra::prelude::*;
    use zkusd_contracts::engine::{ZkUsdEngine, ZkUsdEngineHostRef, ZkUsdEngineInitArgs};
    use zkusd_contracts::stablecoin::{ZkUsdToken, ZkUsdTokenHostRef, ZkUsdTokenInitArgs};

    pub const UNIT: u64 = 1_000_000_000;
    pub const BLOCK_DURATION: u64 = 10_000;

    pub struct Protocol {
        pub env: HostEnv,
        pub engine: ZkUsdEngineHostRef,
        pub token: ZkUsdTokenHostRef,
        pub admin: Address,
        pub oracles: Vec<Address>,
    }

    impl Protocol {
        pub fn account(&self, index: usize) -> Address {
            self.env.get_account(index)
        }

        /// Move to the next protocol block
        pub fn next_block(&self) {
            self.env.advance_block_time(BLOCK_DURATION);
        }

        /// Every oracle submits `prices[i]` in the current block
        pub fn submit_all(&mut self, prices: &[u64]) {
            for (oracle, price) in self.oracles.clone().iter().zip(prices) {
                self.env.set_caller(*oracle);
                self.engine.submit_price(*price, self.oracles.clone());
            }
        }

        /// Open a vault for `owner` and lock `collateral` motes in it
        pub fn open_vault(&mut self, owner: Address, collateral: u64) {
            self.env.set_caller(owner);
            self.engine.create_vault();
            self.engine
                .with_tokens(U512::from(collateral))
                .deposit_collateral();
        }
    }

    /// Accounts: 0 admin, 1..=3 oracles, 4.. users
    pub fn setup_with_fee(oracle_flat_fee: u64) -> Protocol {
        let env = odra_test::env();
        let admin = env.get_account(0);
        let oracles = vec![env.get_account(1), env.get_account(2), env.get_account(3)];

        env.set_caller(admin);
        let mut token = ZkUsdToken::deploy(&env, ZkUsdTokenInitArgs { admin });
        let engine = ZkUsdEngine::deploy(
            &env,
            ZkUsdEngineInitArgs {
                admin,
                token: token.address().clone(),
                oracles: oracles.clone(),
                oracle_flat_fee,
                fallback_price: UNIT,
                block_duration: BLOCK_DURATION,
            },
        );
        token.add_minter(engine.address().clone());

        Protocol {
            env,
            engine,
            token,
            admin,
            oracles,
        }
    }

    pub fn setup() -> Protocol {
        setup_with_fee(0)
    }
}

#[cfg(test)]
mod vault_tests {
    use super::fixture::*;
    use odra::casper_types::{U256, U512};
    use odra::host::HostRef;
    use odra::prelude::Addressable;
    use pretty_assertions::assert_eq;
    use zkusd_contracts::errors::ZkUsdError;

    #[test]
    fn test_mint_reports_health_factor() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 100 * UNIT);

        p.engine.mint_zkusd(5 * UNIT);

        assert_eq!(p.engine.health_factor_of(owner), 1333);
        assert_eq!(p.token.balance_of(owner), U256::from(5 * UNIT));
        let vault = p.engine.get_vault(owner).unwrap();
        assert_eq!(vault.collateral_amount, 100 * UNIT);
        assert_eq!(vault.debt_amount, 5 * UNIT);
    }

    #[test]
    fn test_mint_rejected_below_threshold() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 150 * UNIT);

        assert_eq!(
            p.engine.try_mint_zkusd(101 * UNIT),
            Err(ZkUsdError::HealthFactorTooLow.into())
        );
        p.engine.mint_zkusd(100 * UNIT);
        assert_eq!(p.engine.health_factor_of(owner), 100);
    }

    #[test]
    fn test_redeem_rules() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 100 * UNIT);
        p.engine.mint_zkusd(60 * UNIT);

        assert_eq!(
            p.engine.try_redeem_collateral(20 * UNIT),
            Err(ZkUsdError::HealthFactorTooLow.into())
        );
        assert_eq!(
            p.engine.try_redeem_collateral(101 * UNIT),
            Err(ZkUsdError::InsufficientCollateral.into())
        );
        assert_eq!(
            p.engine.try_redeem_collateral(0),
            Err(ZkUsdError::AmountZero.into())
        );

        let before = p.env.balance_of(&p.engine.address());
        p.engine.redeem_collateral(5 * UNIT);
        let after = p.env.balance_of(&p.engine.address());
        assert_eq!(before - after, U512::from(5 * UNIT));
        assert_eq!(p.engine.get_vault(owner).unwrap().collateral_amount, 95 * UNIT);
    }

    #[test]
    fn test_burn_rules() {
        let mut p = setup();
        let owner = p.account(4);
        let other = p.account(5);
        p.open_vault(owner, 100 * UNIT);
        p.engine.mint_zkusd(10 * UNIT);

        assert_eq!(
            p.engine.try_burn_zkusd(11 * UNIT),
            Err(ZkUsdError::AmountExceedsDebt.into())
        );

        p.token.transfer(other, U256::from(6 * UNIT));
        assert_eq!(
            p.engine.try_burn_zkusd(5 * UNIT),
            Err(ZkUsdError::InsufficientBalance.into())
        );

        p.engine.burn_zkusd(4 * UNIT);
        assert_eq!(p.engine.get_vault(owner).unwrap().debt_amount, 6 * UNIT);
        assert_eq!(p.token.balance_of(owner), U256::zero());
        assert_eq!(p.token.total_supply(), U256::from(6 * UNIT));
    }

    #[test]
    fn test_vault_lifecycle_errors() {
        let mut p = setup();
        let owner = p.account(4);

        p.env.set_caller(owner);
        assert_eq!(
            p.engine.try_mint_zkusd(UNIT),
            Err(ZkUsdError::VaultNotFound.into())
        );
        p.engine.create_vault();
        assert_eq!(
            p.engine.try_create_vault(),
            Err(ZkUsdError::VaultAlreadyExists.into())
        );
        assert_eq!(
            p.engine.with_tokens(U512::zero()).try_deposit_collateral(),
            Err(ZkUsdError::AmountZero.into())
        );
    }

    #[test]
    fn test_healthy_vault_cannot_be_liquidated() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 100 * UNIT);
        p.engine.mint_zkusd(5 * UNIT);

        p.env.set_caller(p.account(5));
        assert_eq!(
            p.engine.try_liquidate(owner),
            Err(ZkUsdError::HealthFactorTooHigh.into())
        );
    }

    #[test]
    fn test_price_drop_liquidation_flow() {
        let mut p = setup();
        let owner = p.account(4);
        let liquidator = p.account(5);

        p.open_vault(owner, 100 * UNIT);
        p.engine.mint_zkusd(5 * UNIT);
        assert_eq!(p.engine.health_factor_of(owner), 1333);
        p.engine.mint_zkusd(55 * UNIT);
        assert_eq!(p.engine.health_factor_of(owner), 111);

        // Owner hands the debt tokens to the liquidator
        p.token.transfer(liquidator, U256::from(60 * UNIT));

        // Oracles report $0.85; it becomes visible in the next block
        p.submit_all(&[850_000_000, 850_000_000, 850_000_000]);
        assert_eq!(p.engine.settle_price_update(), 850_000_000);
        assert_eq!(p.engine.get_price(), UNIT);
        p.next_block();
        assert_eq!(p.engine.get_price(), 850_000_000);
        assert_eq!(p.engine.health_factor_of(owner), 94);

        let balance_before = p.env.balance_of(&p.engine.address());
        p.env.set_caller(liquidator);
        let outcome = p.engine.liquidate(owner);

        assert_eq!(outcome.debt_repaid, 60 * UNIT);
        assert_eq!(outcome.liquidator_collateral, 77_647_058_823);
        assert_eq!(outcome.owner_collateral, 22_352_941_177);
        assert_eq!(
            outcome.liquidator_collateral + outcome.owner_collateral,
            100 * UNIT
        );

        let balance_after = p.env.balance_of(&p.engine.address());
        assert_eq!(balance_before - balance_after, U512::from(100 * UNIT));

        let vault = p.engine.get_vault(owner).unwrap();
        assert_eq!(vault.collateral_amount, 0);
        assert_eq!(vault.debt_amount, 0);
        assert_eq!(p.token.balance_of(liquidator), U256::zero());
        assert_eq!(p.token.total_supply(), U256::zero());
    }

    #[test]
    fn test_liquidator_without_zkusd_fails() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 100 * UNIT);
        p.engine.mint_zkusd(60 * UNIT);

        p.submit_all(&[850_000_000, 850_000_000, 850_000_000]);
        p.engine.settle_price_update();
        p.next_block();

        p.env.set_caller(p.account(5));
        assert_eq!(
            p.engine.try_liquidate(owner),
            Err(ZkUsdError::InsufficientBalance.into())
        );
        assert_eq!(p.engine.get_vault(owner).unwrap().debt_amount, 60 * UNIT);
    }
}

#[cfg(test)]
mod oracle_tests {
    use super::fixture::*;
    use odra::casper_types::U512;
    use odra::host::HostRef;
    use odra::prelude::Addressable;
    use pretty_assertions::assert_eq;
    use zkusd_contracts::errors::ZkUsdError;

    #[test]
    fn test_second_submission_before_settlement_rejected() {
        let mut p = setup();
        let oracle = p.oracles[0];
        let whitelist = p.oracles.clone();

        p.env.set_caller(oracle);
        p.engine.submit_price(UNIT, whitelist.clone());
        assert!(p.engine.has_pending_action(oracle));
        assert_eq!(
            p.engine.try_submit_price(UNIT, whitelist.clone()),
            Err(ZkUsdError::PendingActionExists.into())
        );

        p.engine.settle_price_update();
        assert!(!p.engine.has_pending_action(oracle));

        // Same block, after settlement: belongs to the next epoch
        p.env.set_caller(oracle);
        p.engine.submit_price(UNIT, whitelist);
        assert!(p.engine.has_pending_action(oracle));
        assert_eq!(p.engine.pending_action_count(), 1);
    }

    #[test]
    fn test_non_whitelisted_sender_rejected() {
        let mut p = setup();
        let whitelist = p.oracles.clone();

        p.env.set_caller(p.account(7));
        assert_eq!(
            p.engine.try_submit_price(UNIT, whitelist.clone()),
            Err(ZkUsdError::SenderNotWhitelisted.into())
        );
        // Whitelist membership is checked before price validity
        assert_eq!(
            p.engine.try_submit_price(0, whitelist),
            Err(ZkUsdError::SenderNotWhitelisted.into())
        );
    }

    #[test]
    fn test_whitelist_must_match_commitment() {
        let mut p = setup();
        let mut reordered = p.oracles.clone();
        reordered.reverse();

        p.env.set_caller(p.oracles[0]);
        assert_eq!(
            p.engine.try_submit_price(UNIT, reordered),
            Err(ZkUsdError::InvalidWhitelist.into())
        );
        assert_eq!(
            p.engine.try_submit_price(0, p.oracles.clone()),
            Err(ZkUsdError::AmountZero.into())
        );
    }

    #[test]
    fn test_settlement_writes_only_opposite_parity() {
        let mut p = setup();
        let parity = p.engine.current_parity();
        let same = p.engine.published_price(parity);

        p.submit_all(&[900_000_000, 950_000_000, 1_100_000_000]);
        assert_eq!(p.engine.settle_price_update(), 950_000_000);

        assert_eq!(p.engine.published_price(parity), same);
        let written = p.engine.published_price(parity.opposite());
        assert_eq!(written.price, 950_000_000);
        assert_eq!(written.settled_block, p.engine.current_block());
        assert_eq!(written.epoch, 1);
        assert_eq!(p.engine.pending_action_count(), 0);
        assert_eq!(p.engine.action_state(), p.engine.latest_action_hash());
    }

    #[test]
    fn test_empty_settlement_is_idempotent() {
        let mut p = setup();

        // Nothing settled yet: fallback
        assert_eq!(p.engine.settle_price_update(), UNIT);

        p.submit_all(&[800_000_000, 820_000_000, 840_000_000]);
        let state_before = p.engine.action_state();
        assert_eq!(p.engine.settle_price_update(), 820_000_000);
        let state_after = p.engine.action_state();
        assert_ne!(state_before, state_after);

        assert_eq!(p.engine.settle_price_update(), 820_000_000);
        assert_eq!(p.engine.action_state(), state_after);

        p.next_block();
        assert_eq!(p.engine.settle_price_update(), 820_000_000);
    }

    #[test]
    fn test_two_submissions_use_fallback_floor() {
        let mut p = setup();
        let whitelist = p.oracles.clone();

        p.env.set_caller(p.oracles[0]);
        p.engine.submit_price(480_000_000, whitelist.clone());
        p.env.set_caller(p.oracles[1]);
        p.engine.submit_price(520_000_000, whitelist);

        // {0.48, 0.52, fallback 1.0}
        assert_eq!(p.engine.settle_price_update(), 520_000_000);
    }

    #[test]
    fn test_tracker_settlement_reads_previous_block() {
        let mut p = setup();

        p.submit_all(&[700_000_000, 710_000_000, 720_000_000]);
        // Same block: nothing is fresh yet
        assert_eq!(p.engine.tracker_median_price(), UNIT);

        p.next_block();
        let parity = p.engine.current_parity();
        // 3 fresh slots and 5 fallback slots
        assert_eq!(p.engine.settle_tracked_price(), 1_000_000_000);
        assert_eq!(p.engine.published_price(parity.opposite()).price, UNIT);
        // The pending actions are consumed too
        assert_eq!(p.engine.pending_action_count(), 0);
        assert_eq!(p.engine.action_state(), p.engine.latest_action_hash());

        p.next_block();
        assert_eq!(p.engine.tracker_median_price(), UNIT);
    }

    #[test]
    fn test_tracker_median_with_majority_fresh() {
        let mut p = setup();
        let oracles: Vec<_> = (1..=6).map(|i| p.account(i)).collect();
        p.env.set_caller(p.admin);
        p.engine.update_whitelist(oracles.clone());
        p.oracles = oracles;

        p.submit_all(&[
            600_000_000,
            610_000_000,
            620_000_000,
            630_000_000,
            640_000_000,
            650_000_000,
        ]);
        p.next_block();

        // Sorted: 0.60 0.61 0.62 0.63 0.64 0.65 1.0 1.0
        assert_eq!(p.engine.tracker_median_price(), 635_000_000);
        assert_eq!(p.engine.settle_tracked_price(), 635_000_000);
        p.next_block();
        assert_eq!(p.engine.get_price(), 635_000_000);
    }

    #[test]
    fn test_fee_pool_must_cover_fee() {
        let mut p = setup_with_fee(UNIT);
        let oracle = p.oracles[0];
        let whitelist = p.oracles.clone();

        p.env.set_caller(oracle);
        assert_eq!(
            p.engine.try_submit_price(UNIT, whitelist.clone()),
            Err(ZkUsdError::FeePoolInsufficient.into())
        );

        p.env.set_caller(p.account(9));
        p.engine.with_tokens(U512::from(2 * UNIT)).fund_fee_pool();
        assert_eq!(p.engine.fee_pool(), 2 * UNIT);

        let before = p.env.balance_of(&p.engine.address());
        p.env.set_caller(oracle);
        p.engine.submit_price(UNIT, whitelist);
        assert_eq!(p.engine.fee_pool(), UNIT);
        let after = p.env.balance_of(&p.engine.address());
        assert_eq!(before - after, U512::from(UNIT));
    }

    #[test]
    fn test_tracker_settlement_alone_keeps_oracles_submitting() {
        let mut p = setup();
        let oracle = p.oracles[0];

        p.submit_all(&[700_000_000, 710_000_000, 720_000_000]);
        p.next_block();
        p.engine.settle_tracked_price();
        assert!(!p.engine.has_pending_action(oracle));

        p.env.set_caller(oracle);
        assert_eq!(
            p.engine.try_submit_price(730_000_000, p.oracles.clone()),
            Ok(())
        );
        assert!(p.engine.has_pending_action(oracle));
        assert_eq!(p.engine.pending_action_count(), 1);
    }

    #[test]
    fn test_replaced_whitelist_drops_old_actions() {
        let mut p = setup();
        p.submit_all(&[500_000_000, 500_000_000, 500_000_000]);

        let replacement: Vec<_> = (6..=8).map(|i| p.account(i)).collect();
        p.env.set_caller(p.admin);
        p.engine.update_whitelist(replacement.clone());
        p.oracles = replacement;
        p.submit_all(&[700_000_000, 700_000_000, 700_000_000]);

        // Only the three submissions under the current whitelist count
        assert_eq!(p.engine.settle_price_update(), 700_000_000);
        assert_eq!(p.engine.pending_action_count(), 0);
    }

    #[test]
    fn test_replaced_whitelist_clears_tracker_slots() {
        let mut p = setup();
        let oracles: Vec<_> = (1..=6).map(|i| p.account(i)).collect();
        p.env.set_caller(p.admin);
        p.engine.update_whitelist(oracles.clone());
        p.oracles = oracles;
        p.submit_all(&[500_000_000; 6]);

        let replacement = vec![p.account(7)];
        p.env.set_caller(p.admin);
        p.engine.update_whitelist(replacement);
        p.next_block();

        // Without clearing, six fresh 0.50 slots would give 0.50
        assert_eq!(p.engine.tracker_median_price(), UNIT);
    }
}

#[cfg(test)]
mod admin_tests {
    use super::fixture::*;
    use odra::casper_types::U512;
    use odra::host::HostRef;
    use odra::prelude::*;
    use pretty_assertions::assert_eq;
    use zkusd_contracts::errors::ZkUsdError;

    #[test]
    fn test_emergency_stop_blocks_operations() {
        let mut p = setup();
        let owner = p.account(4);
        p.open_vault(owner, 100 * UNIT);
        let whitelist = p.oracles.clone();

        p.env.set_caller(p.admin);
        p.engine.stop_protocol();
        assert!(p.engine.protocol_data().emergency_stop);

        let halted: Result<(), OdraError> = Err(ZkUsdError::EmergencyHalt.into());
        p.env.set_caller(p.oracles[0]);
        assert_eq!(p.engine.try_submit_price(UNIT, whitelist), halted);
        assert_eq!(p.engine.try_settle_price_update().map(|_| ()), halted);
        assert_eq!(p.engine.try_settle_tracked_price().map(|_| ()), halted);

        p.env.set_caller(owner);
        assert_eq!(
            p.engine.with_tokens(U512::from(UNIT)).try_deposit_collateral(),
            halted
        );
        assert_eq!(p.engine.try_mint_zkusd(UNIT), halted);
        assert_eq!(p.engine.try_redeem_collateral(UNIT), halted);
        assert_eq!(p.engine.try_burn_zkusd(UNIT), halted);
        assert_eq!(p.engine.try_liquidate(owner).map(|_| ()), halted);

        p.env.set_caller(p.account(5));
        assert_eq!(p.engine.try_create_vault(), halted);

        p.env.set_caller(p.admin);
        p.engine.resume_protocol();
        p.env.set_caller(owner);
        p.engine.mint_zkusd(UNIT);
    }

    #[test]
    fn test_admin_entry_points_require_admin() {
        let mut p = setup();
        let stranger = p.account(8);
        let unauthorized: Result<(), OdraError> = Err(ZkUsdError::Unauthorized.into());

        p.env.set_caller(stranger);
        assert_eq!(p.engine.try_stop_protocol(), unauthorized);
        assert_eq!(p.engine.try_resume_protocol(), unauthorized);
        assert_eq!(p.engine.try_update_whitelist(vec![stranger]), unauthorized);
        assert_eq!(p.engine.try_update_oracle_fee(1), unauthorized);
        assert_eq!(p.engine.try_update_fallback_price(1), unauthorized);
        assert_eq!(p.engine.try_transfer_admin(stranger), unauthorized);
    }

    #[test]
    fn test_admin_updates() {
        let mut p = setup();
        let new_admin = p.account(8);

        p.env.set_caller(p.admin);
        p.engine.update_oracle_fee(42);
        assert_eq!(p.engine.protocol_data().oracle_flat_fee, 42);

        assert_eq!(
            p.engine.try_update_fallback_price(0),
            Err(ZkUsdError::InvalidConfig.into())
        );
        p.engine.update_fallback_price(2 * UNIT);
        assert_eq!(p.engine.fallback_price(), 2 * UNIT);

        let hash_before = p.engine.whitelist_hash();
        let duplicate = vec![p.oracles[0], p.oracles[0]];
        assert_eq!(
            p.engine.try_update_whitelist(duplicate),
            Err(ZkUsdError::InvalidWhitelist.into())
        );
        let too_many: Vec<_> = (1..=9).map(|i| p.account(i)).collect();
        assert_eq!(
            p.engine.try_update_whitelist(too_many),
            Err(ZkUsdError::InvalidWhitelist.into())
        );
        p.engine.update_whitelist(vec![p.oracles[0]]);
        assert_ne!(p.engine.whitelist_hash(), hash_before);

        p.engine.transfer_admin(new_admin);
        assert_eq!(p.engine.protocol_data().admin, new_admin);
        assert_eq!(
            p.engine.try_stop_protocol(),
            Err(ZkUsdError::Unauthorized.into())
        );
        p.env.set_caller(new_admin);
        p.engine.stop_protocol();
    }

    #[test]
    fn test_token_mint_restricted_to_minters() {
        let mut p = setup();
        let stranger = p.account(8);

        p.env.set_caller(stranger);
        assert_eq!(
            p.token.try_mint(stranger, 1u64.into()),
            Err(ZkUsdError::UnauthorizedMinter.into())
        );
        assert_eq!(
            p.token.try_add_minter(stranger),
            Err(ZkUsdError::Unauthorized.into())
        );
        assert!(!p.token.is_minter(stranger));
    }
}
