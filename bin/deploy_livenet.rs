//! Deploy the zkUSD contracts to Casper livenet/testnet using the Odra livenet
//! environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!
//! Optional protocol parameters:
//!   ZKUSD_ORACLE_FEE=10000000          (motes per submission)
//!   ZKUSD_FALLBACK_PRICE=1000000000    (1e9 = $1)
//!   ZKUSD_BLOCK_DURATION=32768         (milliseconds per protocol block)

use odra::host::{Deployer, HostRef};
use odra::prelude::*;

use zkusd_contracts::engine::{ZkUsdEngine, ZkUsdEngineInitArgs};
use zkusd_contracts::stablecoin::{ZkUsdToken, ZkUsdTokenInitArgs};

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== zkUSD Livenet Deployment ===");
    println!();

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount = env_u64("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT", 200_000_000_000);
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // Protocol parameters
    let oracle_flat_fee = env_u64("ZKUSD_ORACLE_FEE", 10_000_000);
    let fallback_price = env_u64("ZKUSD_FALLBACK_PRICE", 1_000_000_000);
    let block_duration = env_u64("ZKUSD_BLOCK_DURATION", 32_768);
    println!("Oracle fee:      {} motes", oracle_flat_fee);
    println!("Fallback price:  {}", fallback_price);
    println!("Block duration:  {} ms", block_duration);
    println!();

    // 1. Token
    println!("Deploying ZkUsdToken...");
    let mut token = ZkUsdToken::deploy(&env, ZkUsdTokenInitArgs { admin: deployer });
    let token_addr = token.address().clone();
    println!("ZkUsdToken deployed at: {:?}", token_addr);

    // 2. Engine, with the deployer as the only oracle until the admin
    //    publishes the real whitelist
    println!("Deploying ZkUsdEngine...");
    let engine = ZkUsdEngine::deploy(
        &env,
        ZkUsdEngineInitArgs {
            admin: deployer,
            token: token_addr,
            oracles: vec![deployer],
            oracle_flat_fee,
            fallback_price,
            block_duration,
        },
    );
    let engine_addr = engine.address().clone();
    println!("ZkUsdEngine deployed at: {:?}", engine_addr);
    println!();

    // 3. Wiring
    println!("Registering ZkUsdEngine as token minter...");
    token.add_minter(engine_addr);
    println!("Done.");

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  ZkUsdToken:   {:?}", token_addr);
    println!("  ZkUsdEngine:  {:?}", engine_addr);
}
