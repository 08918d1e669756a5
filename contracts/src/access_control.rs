//! Protocol Controls
//!
//! Single source of truth for admin-gated protocol state:
//! - `ProtocolData` (admin key, flat oracle fee, emergency stop flag)
//! - the oracle whitelist commitment
//! - the admin-set fallback price
//!
//! The emergency stop is checked here for every price and vault operation,
//! so no other module keeps its own pause flag.

use odra::prelude::*;
use odra::casper_types::bytesrepr::ToBytes;
use crate::errors::ZkUsdError;
use crate::median::MAX_ORACLES;
use crate::types::ProtocolData;

/// Admin-gated protocol parameters
#[odra::module]
pub struct ProtocolControls {
    /// Admin, oracle fee and emergency stop
    protocol_data: Var<ProtocolData>,
    /// Hash commitment of the ordered oracle whitelist
    whitelist_hash: Var<[u8; 32]>,
    /// Price used for missing oracle slots
    fallback_price: Var<u64>,
}

#[odra::module]
impl ProtocolControls {
    /// Initialize protocol parameters
    pub fn init(&mut self, admin: Address, oracle_flat_fee: u64, fallback_price: u64) {
        if fallback_price == 0 {
            self.env().revert(ZkUsdError::InvalidConfig);
        }
        self.protocol_data.set(ProtocolData {
            admin,
            oracle_flat_fee,
            emergency_stop: false,
        });
        self.fallback_price.set(fallback_price);
    }

    // ========== Queries ==========

    /// Current protocol data
    pub fn protocol_data(&self) -> ProtocolData {
        match self.protocol_data.get() {
            Some(data) => data,
            None => self.env().revert(ZkUsdError::InvalidConfig),
        }
    }

    /// Whitelist commitment
    pub fn whitelist_hash(&self) -> [u8; 32] {
        self.whitelist_hash.get_or_default()
    }

    /// Fallback price
    pub fn fallback_price(&self) -> u64 {
        self.fallback_price.get_or_default()
    }

    /// Flat oracle fee
    pub fn oracle_flat_fee(&self) -> u64 {
        self.protocol_data().oracle_flat_fee
    }

    /// Whether the emergency stop is engaged
    pub fn is_stopped(&self) -> bool {
        self.protocol_data().emergency_stop
    }

    // ========== Guards ==========

    /// Revert if the emergency stop is engaged
    pub fn require_not_halted(&self) {
        if self.is_stopped() {
            self.env().revert(ZkUsdError::EmergencyHalt);
        }
    }

    /// Revert if caller is not the admin
    pub fn require_admin(&self) {
        if self.env().caller() != self.protocol_data().admin {
            self.env().revert(ZkUsdError::Unauthorized);
        }
    }

    // ========== Admin Functions ==========

    /// Engage or release the emergency stop (admin only)
    pub fn set_emergency_stop(&mut self, stopped: bool) {
        self.require_admin();
        let mut data = self.protocol_data();
        data.emergency_stop = stopped;
        self.protocol_data.set(data);
    }

    /// Set the flat oracle fee (admin only)
    pub fn set_oracle_flat_fee(&mut self, fee: u64) {
        self.require_admin();
        let mut data = self.protocol_data();
        data.oracle_flat_fee = fee;
        self.protocol_data.set(data);
    }

    /// Set the fallback price (admin only)
    pub fn set_fallback_price(&mut self, price: u64) {
        self.require_admin();
        if price == 0 {
            self.env().revert(ZkUsdError::InvalidConfig);
        }
        self.fallback_price.set(price);
    }

    /// Rotate the admin key (admin only)
    pub fn set_admin(&mut self, new_admin: Address) {
        self.require_admin();
        let mut data = self.protocol_data();
        data.admin = new_admin;
        self.protocol_data.set(data);
    }

    /// Commit to a new oracle whitelist. Caller must check admin rights first
    /// when this is not the initial commitment.
    pub fn commit_whitelist(&mut self, oracles: Vec<Address>) -> [u8; 32] {
        if oracles.len() > MAX_ORACLES {
            self.env().revert(ZkUsdError::InvalidWhitelist);
        }
        for (i, oracle) in oracles.iter().enumerate() {
            if oracles[i + 1..].contains(oracle) {
                self.env().revert(ZkUsdError::InvalidWhitelist);
            }
        }
        let hash = self.hash_whitelist(&oracles);
        self.whitelist_hash.set(hash);
        hash
    }

    /// Slot index of the caller in `oracles`.
    ///
    /// Reverts with `InvalidWhitelist` if `oracles` does not match the
    /// commitment and with `SenderNotWhitelisted` if the caller is absent.
    pub fn require_whitelisted_caller(&self, oracles: Vec<Address>) -> u8 {
        if self.hash_whitelist(&oracles) != self.whitelist_hash() {
            self.env().revert(ZkUsdError::InvalidWhitelist);
        }
        let caller = self.env().caller();
        match oracles.iter().position(|oracle| *oracle == caller) {
            Some(index) => index as u8,
            None => self.env().revert(ZkUsdError::SenderNotWhitelisted),
        }
    }

    // ========== Internal Functions ==========

    fn hash_whitelist(&self, oracles: &[Address]) -> [u8; 32] {
        let mut bytes = Vec::new();
        for oracle in oracles {
            match oracle.to_bytes() {
                Ok(encoded) => bytes.extend_from_slice(&encoded),
                Err(_) => self.env().revert(ZkUsdError::InvalidWhitelist),
            }
        }
        self.env().hash(bytes)
    }
}
