//! Price Tracker
//!
//! Fixed-capacity slot array holding the latest packed submission of each
//! whitelisted oracle. The engine owns two trackers, one written on even
//! blocks and one on odd blocks, so submissions in the current block never
//! touch the slots a median is being read from.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ZkUsdError;
use crate::median::{tracker_median, MAX_ORACLES};
use crate::submission::PriceSubmission;

/// Per-parity oracle slot array
#[odra::module]
pub struct PriceTracker {
    /// Packed submissions keyed by oracle index
    slots: Mapping<u8, U256>,
}

#[odra::module]
impl PriceTracker {
    /// Overwrite the slot of oracle `slot`.
    pub fn record(&mut self, slot: u8, submission: PriceSubmission) {
        if slot as usize >= MAX_ORACLES {
            self.env().revert(ZkUsdError::SenderNotWhitelisted);
        }
        self.slots.set(&slot, submission.pack());
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        for slot in 0..MAX_ORACLES as u8 {
            self.slots.set(&slot, U256::zero());
        }
    }

    /// Unpacked submission in `slot` (zeroed if never written).
    pub fn submission_at(&self, slot: u8) -> PriceSubmission {
        let word = self.slots.get(&slot).unwrap_or_default();
        match PriceSubmission::unpack(word) {
            Ok(submission) => submission,
            Err(error) => self.env().revert(error),
        }
    }

    /// Median over all slots as seen from `current_block`.
    ///
    /// Only slots written in `current_block - 1` with a non-zero price count;
    /// every other slot contributes `fallback_price`.
    pub fn calculate_median_price(&self, current_block: u32, fallback_price: u64) -> u64 {
        let mut slots = [PriceSubmission::default(); MAX_ORACLES];
        for (index, slot) in slots.iter_mut().enumerate() {
            *slot = self.submission_at(index as u8);
        }
        tracker_median(&slots, current_block, fallback_price)
    }
}
