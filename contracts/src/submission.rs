//! Compact storage encoding for oracle price submissions.
//!
//! A submission packs into one storage word: `price << 32 | origin_block`.

use odra::casper_types::U256;
use crate::errors::{ZkUsdError, ZkUsdResult};

/// Width of the origin block field in bits
const BLOCK_BITS: u32 = 32;

/// A single oracle price observation
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct PriceSubmission {
    /// Price in 1e9 fixed point (1e9 = $1)
    pub price: u64,
    /// Block the price was submitted in
    pub origin_block: u32,
}

impl PriceSubmission {
    pub fn new(price: u64, origin_block: u32) -> Self {
        Self { price, origin_block }
    }

    /// Pack into a single word.
    pub fn pack(&self) -> U256 {
        U256::from(self.price) * block_radix() + U256::from(self.origin_block)
    }

    /// Inverse of [`PriceSubmission::pack`].
    pub fn unpack(word: U256) -> ZkUsdResult<Self> {
        if word > max_packed() {
            return Err(ZkUsdError::MalformedSubmission);
        }
        let radix = block_radix();
        Ok(Self {
            price: (word / radix).low_u64(),
            origin_block: (word % radix).low_u32(),
        })
    }

    /// Whether this submission counts for a median taken in `current_block`.
    ///
    /// Only prices from exactly the previous block qualify.
    pub fn is_fresh_for(&self, current_block: u32) -> bool {
        match current_block.checked_sub(1) {
            Some(previous) => self.origin_block == previous && self.price > 0,
            None => false,
        }
    }
}

fn block_radix() -> U256 {
    U256::from(1u64 << BLOCK_BITS)
}

fn max_packed() -> U256 {
    U256::from(u64::MAX) * block_radix() + U256::from(u32::MAX)
}
