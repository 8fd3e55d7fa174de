use crate::games::types::{Amount, Multiplier};

/// Applies an operator's per-wager win cap
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxWinLimiter;

impl MaxWinLimiter {
    pub fn new() -> Self {
        Self
    }

    /// Returns the capped amount and whether the cap was hit
    pub fn apply(&self, win_amount: Amount, limit: Option<Amount>) -> (Amount, bool) {
        match Self::effective(limit) {
            Some(cap) if win_amount > cap => (cap, true),
            _ => (win_amount, false),
        }
    }

    pub fn would_exceed_limit(&self, stake: Amount, multiplier: Multiplier, limit: Option<Amount>) -> bool {
        match Self::effective(limit) {
            Some(cap) => stake.times(multiplier) > cap,
            None => false,
        }
    }

    /// Multiplier actually paid once the cap is taken into account
    pub fn effective_multiplier(&self, stake: Amount, multiplier: Multiplier, limit: Option<Amount>) -> Multiplier {
        match Self::effective(limit) {
            Some(cap) if !stake.is_zero() && stake.times(multiplier) > cap => {
                let scaled = cap.minor() as u128 * Multiplier::SCALE as u128 / stake.minor() as u128;
                Multiplier(u32::try_from(scaled).unwrap_or(u32::MAX))
            }
            _ => multiplier,
        }
    }

    // A zero limit is an unset limit
    fn effective(limit: Option<Amount>) -> Option<Amount> {
        limit.filter(|cap| !cap.is_zero())
    }
}
