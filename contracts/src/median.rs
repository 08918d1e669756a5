//! Median aggregation over oracle price slots.
//!
//! Both aggregation paths end here: the fixed-slot tracker median and the
//! action-log reducer used by settlement.

use crate::submission::PriceSubmission;

/// Oracle slots per tracker and participants per settlement
pub const MAX_ORACLES: usize = 8;

/// Settlement always takes the median over at least this many slots
pub const MIN_EFFECTIVE_COUNT: usize = 3;

/// Ascending bubble sort. N is small and fixed, so the cost stays predictable.
pub fn sort_prices(prices: &mut [u64]) {
    let len = prices.len();
    for pass in 0..len {
        let mut swapped = false;
        for i in 0..len - 1 - pass {
            if prices[i] > prices[i + 1] {
                prices.swap(i, i + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Returns the sorted middle, or the floored average of the two middle items
/// if the slice has an even number of elements.
pub fn median(prices: &mut [u64]) -> Option<u64> {
    if prices.is_empty() {
        return None;
    }
    sort_prices(prices);
    let middle_index = prices.len() / 2;
    if prices.len() % 2 == 0 {
        let lower = prices[middle_index - 1];
        let upper = prices[middle_index];
        // floor((a + b) / 2) without overflowing u64
        Some(lower / 2 + upper / 2 + (lower % 2 + upper % 2) / 2)
    } else {
        Some(prices[middle_index])
    }
}

/// Median over every tracker slot, substituting `fallback_price` for slots
/// that were not filled in the block before `current_block`.
pub fn tracker_median(
    slots: &[PriceSubmission; MAX_ORACLES],
    current_block: u32,
    fallback_price: u64,
) -> u64 {
    let mut prices = [fallback_price; MAX_ORACLES];
    for (price, slot) in prices.iter_mut().zip(slots.iter()) {
        if slot.is_fresh_for(current_block) {
            *price = slot.price;
        }
    }
    median(&mut prices).unwrap_or(fallback_price)
}

/// Folds pending price actions into a fixed-size price array.
///
/// Slots start at the fallback price and are filled in submission order.
/// Once every slot is filled, further prices are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceReducer {
    prices: [u64; MAX_ORACLES],
    filled: usize,
}

impl PriceReducer {
    pub fn new(fallback_price: u64) -> Self {
        Self {
            prices: [fallback_price; MAX_ORACLES],
            filled: 0,
        }
    }

    /// Place `price` in the next unfilled slot.
    pub fn apply(&mut self, price: u64) {
        if self.filled < MAX_ORACLES {
            self.prices[self.filled] = price;
            self.filled += 1;
        }
    }

    /// Number of real submissions placed.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Median over `max(filled, MIN_EFFECTIVE_COUNT)` slots.
    pub fn median(&self) -> u64 {
        let effective = self.filled.max(MIN_EFFECTIVE_COUNT).min(MAX_ORACLES);
        let mut window = self.prices;
        median(&mut window[..effective]).unwrap_or(self.prices[0])
    }
}

/// Reduce a batch of submitted prices to a settlement median.
pub fn reduce_prices<I: IntoIterator<Item = u64>>(prices: I, fallback_price: u64) -> u64 {
    let mut reducer = PriceReducer::new(fallback_price);
    for price in prices {
        reducer.apply(price);
    }
    reducer.median()
}
