//! Payout calculation: table lookup followed by the operator's win cap

use crate::errors::KenoResult;
use crate::games::{
    max_win::MaxWinLimiter,
    payout_table::PayoutTable,
    types::{Amount, Multiplier},
};
use serde::{Deserialize, Serialize};

/// Result of pricing one ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutResult {
    pub hits: usize,
    pub multiplier: Multiplier,
    /// Before the win cap
    pub base_win_amount: Amount,
    /// After the win cap
    pub win_amount: Amount,
    pub max_win_cap_applied: bool,
    pub is_win: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayoutCalculator {
    table: PayoutTable,
    limiter: MaxWinLimiter,
}

impl PayoutCalculator {
    pub fn new(table: PayoutTable, limiter: MaxWinLimiter) -> Self {
        Self { table, limiter }
    }

    pub fn table(&self) -> &PayoutTable {
        &self.table
    }

    pub fn limiter(&self) -> &MaxWinLimiter {
        &self.limiter
    }

    pub fn calculate_payout(
        &self,
        pick: usize,
        hits: usize,
        stake: Amount,
        max_win_limit: Option<Amount>,
    ) -> KenoResult<PayoutResult> {
        let multiplier = self.table.get_multiplier(pick, hits)?;
        let base_win_amount = stake.times(multiplier);
        let (win_amount, max_win_cap_applied) = self.limiter.apply(base_win_amount, max_win_limit);

        Ok(PayoutResult {
            hits,
            multiplier,
            base_win_amount,
            win_amount,
            max_win_cap_applied,
            is_win: !multiplier.is_zero(),
        })
    }

    /// Capped win amount for every possible hit count, for display before betting
    pub fn potential_payouts(
        &self,
        pick: usize,
        stake: Amount,
        max_win_limit: Option<Amount>,
    ) -> KenoResult<Vec<(usize, Amount)>> {
        self.table
            .table_for_pick(pick)?
            .into_iter()
            .map(|(hits, multiplier)| {
                let (amount, _) = self.limiter.apply(stake.times(multiplier), max_win_limit);
                Ok((hits, amount))
            })
            .collect()
    }
}
