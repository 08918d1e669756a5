//! zkUSD Contracts
//!
//! Casper-native collateralized stablecoin with a decentralized oracle.
//!
//! ## Architecture
//!
//! - **ZkUsdEngine**: Price submission, settlement and vault lifecycle
//! - **ZkUsdToken (zkUSD)**: Protocol stablecoin with mint/burn access control
//! - **ProtocolControls**: Admin key, oracle fee, whitelist and emergency stop
//! - **PriceTracker**: Per-parity oracle slots read by the tracker median
//!
//! ## Price Double Buffer
//!
//! Settlement in block `n` writes the published price of the opposite parity,
//! so vault operations inside block `n` always see the price settled in an
//! earlier block.
//!
//! ## Emergency Stop
//!
//! While engaged, submissions, settlements and every vault operation revert
//! with `EmergencyHalt`. Admin entry points stay available.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Pure protocol core
pub mod types;
pub mod errors;
pub mod math;
pub mod submission;
pub mod median;
pub mod vault;

// Contract modules
pub mod events;
pub mod interfaces;
pub mod access_control;
pub mod price_tracker;
pub mod stablecoin;
pub mod engine;
