//! Fixed keno payout table, pick count 1-10

use crate::errors::{KenoResult, ValidationError};
use crate::games::types::{Multiplier, MAX_PICK};

/// (hits, multiplier in hundredths) per pick count; absent hits pay nothing
const PAYOUTS: [&[(u8, u32)]; MAX_PICK] = [
    &[(1, 390)],
    &[(1, 150), (2, 1_200)],
    &[(1, 100), (2, 300), (3, 4_500)],
    &[(2, 150), (3, 500), (4, 12_000)],
    &[(2, 100), (3, 300), (4, 1_500), (5, 80_000)],
    &[(3, 200), (4, 700), (5, 5_000), (6, 160_000)],
    &[(3, 100), (4, 300), (5, 2_000), (6, 30_000), (7, 500_000)],
    &[(4, 200), (5, 600), (6, 10_000), (7, 150_000), (8, 1_000_000)],
    &[(4, 100), (5, 300), (6, 3_000), (7, 40_000), (8, 400_000), (9, 1_000_000)],
    &[(5, 200), (6, 1_000), (7, 10_000), (8, 200_000), (9, 600_000), (10, 1_000_000)],
];

/// Static multiplier lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoutTable;

impl PayoutTable {
    pub fn new() -> Self {
        Self
    }

    /// Multiplier for `hits` matches on a `pick`-number ticket
    pub fn get_multiplier(&self, pick: usize, hits: usize) -> KenoResult<Multiplier> {
        let row = Self::row(pick)?;
        if hits > pick {
            return Err(ValidationError::OutOfRange(format!(
                "hits {} must be between 0 and {}",
                hits, pick
            ))
            .into());
        }

        Ok(row
            .iter()
            .find(|(h, _)| *h as usize == hits)
            .map(|(_, m)| Multiplier(*m))
            .unwrap_or(Multiplier::ZERO))
    }

    pub fn is_winning(&self, pick: usize, hits: usize) -> KenoResult<bool> {
        Ok(!self.get_multiplier(pick, hits)?.is_zero())
    }

    /// Every hit count 0..=pick with its multiplier, for display
    pub fn table_for_pick(&self, pick: usize) -> KenoResult<Vec<(usize, Multiplier)>> {
        Self::row(pick)?;
        (0..=pick)
            .map(|hits| Ok((hits, self.get_multiplier(pick, hits)?)))
            .collect()
    }

    pub fn max_multiplier(&self, pick: usize) -> KenoResult<Multiplier> {
        let row = Self::row(pick)?;
        Ok(row
            .iter()
            .map(|(_, m)| Multiplier(*m))
            .max()
            .unwrap_or(Multiplier::ZERO))
    }

    fn row(pick: usize) -> KenoResult<&'static [(u8, u32)]> {
        if !(1..=MAX_PICK).contains(&pick) {
            return Err(ValidationError::OutOfRange(format!(
                "pick count {} must be 1-{}",
                pick, MAX_PICK
            ))
            .into());
        }
        Ok(PAYOUTS[pick - 1])
    }
}
