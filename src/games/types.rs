use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest number on the board
pub const MIN_NUMBER: u8 = 1;
/// Highest number on the board
pub const MAX_NUMBER: u8 = 80;
/// Numbers drawn per round
pub const DRAW_COUNT: usize = 20;
/// Largest pick a player may make
pub const MAX_PICK: usize = 10;

/// Round lifecycle states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundStatus {
    Open,
    Closing,
    Drawing,
    Settling,
    Payout,
    Archived,
    Cancelled,
}

impl RoundStatus {
    pub const ALL: [RoundStatus; 7] = [
        RoundStatus::Open,
        RoundStatus::Closing,
        RoundStatus::Drawing,
        RoundStatus::Settling,
        RoundStatus::Payout,
        RoundStatus::Archived,
        RoundStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Open => "OPEN",
            RoundStatus::Closing => "CLOSING",
            RoundStatus::Drawing => "DRAWING",
            RoundStatus::Settling => "SETTLING",
            RoundStatus::Payout => "PAYOUT",
            RoundStatus::Archived => "ARCHIVED",
            RoundStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Money in minor currency units (1/100 of the display unit)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Whole display units, e.g. `Amount::units(10)` is 10.00
    pub const fn units(units: u64) -> Self {
        Amount(units * 100)
    }

    pub const fn minor(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Scale by a multiplier, truncating to the minor unit
    pub fn times(self, multiplier: Multiplier) -> Amount {
        let scaled = (self.0 as u128 * multiplier.0 as u128) / Multiplier::SCALE as u128;
        Amount(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Payout multiplier in hundredths, so 3.9x is `Multiplier(390)`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Multiplier(pub u32);

impl Multiplier {
    pub const SCALE: u32 = 100;
    pub const ZERO: Multiplier = Multiplier(0);

    pub const fn whole(x: u32) -> Self {
        Multiplier(x * Self::SCALE)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            write!(f, "{}x", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}x", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}x", whole, frac)
        }
    }
}

/// One timed cycle of betting, drawing and settlement.
///
/// `server_seed` is the round secret. Use [`Round::view`] for anything that
/// leaves the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Round {
    pub round_id: String,
    pub status: RoundStatus,
    pub scheduled_time: DateTime<Utc>,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub draw_time: Option<DateTime<Utc>>,
    /// `None` only for legacy rounds created before commit-reveal
    pub server_seed: Option<String>,
    pub server_seed_hash: Option<String>,
    pub client_seed: Option<String>,
    pub nonce: u64,
    pub numbers_drawn: Vec<u8>,
    pub total_staked: Amount,
    pub total_paid: Amount,
    pub result_published: bool,
}

impl Round {
    /// Seeds are revealed once betting has closed
    pub fn seed_revealed(&self) -> bool {
        self.status != RoundStatus::Open
    }

    pub fn is_drawn(&self) -> bool {
        !self.numbers_drawn.is_empty()
    }

    pub fn view(&self) -> RoundView {
        RoundView {
            round_id: self.round_id.clone(),
            status: self.status,
            scheduled_time: self.scheduled_time,
            open_time: self.open_time,
            close_time: self.close_time,
            draw_time: self.draw_time,
            server_seed: if self.seed_revealed() {
                self.server_seed.clone()
            } else {
                None
            },
            server_seed_hash: self.server_seed_hash.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            numbers_drawn: self.numbers_drawn.clone(),
            total_staked: self.total_staked,
            total_paid: self.total_paid,
            result_published: self.result_published,
        }
    }
}

/// Boundary representation of a round, safe to hand to the delivery layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round_id: String,
    pub status: RoundStatus,
    pub scheduled_time: DateTime<Utc>,
    pub open_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_seed_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_seed: Option<String>,
    pub nonce: u64,
    pub numbers_drawn: Vec<u8>,
    pub total_staked: Amount,
    pub total_paid: Amount,
    pub result_published: bool,
}

/// A single player's stake plus number selection for a round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wager {
    pub wager_id: String,
    pub round_id: String,
    pub operator_id: String,
    pub player_id: String,
    pub currency: String,
    pub stake: Amount,
    /// Sorted ascending, 1-10 distinct numbers in [1, 80]
    pub selections: Vec<u8>,
    pub hits: Option<u8>,
    pub multiplier: Option<Multiplier>,
    pub win_amount: Option<Amount>,
    pub max_win_cap_applied: bool,
    pub credited: bool,
    pub placed_at: DateTime<Utc>,
}

impl Wager {
    pub fn pick_count(&self) -> usize {
        self.selections.len()
    }

    pub fn is_settled(&self) -> bool {
        self.hits.is_some()
    }

    /// Reference id used for the win credit, doubling as the ledger idempotency key
    pub fn win_reference(&self) -> String {
        format!("WIN-{}", self.wager_id)
    }
}

/// Operator betting limits, read-only to the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatorLimits {
    pub min_stake: Amount,
    pub max_stake: Amount,
    /// Zero means uncapped
    pub max_win_per_wager: Amount,
    pub enabled: bool,
}

impl OperatorLimits {
    pub fn max_win_limit(&self) -> Option<Amount> {
        if self.max_win_per_wager.is_zero() {
            None
        } else {
            Some(self.max_win_per_wager)
        }
    }
}

/// Request to place a wager on the current round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceWagerRequest {
    /// Target round; the current open round when absent
    #[serde(default)]
    pub round_id: Option<String>,
    pub operator_id: String,
    pub player_id: String,
    pub currency: String,
    pub stake: Amount,
    pub selections: Vec<u8>,
}

/// Everything needed to independently re-derive a round's draw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FairnessProof {
    pub round_id: String,
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub numbers: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_round(status: RoundStatus) -> Round {
        let now = Utc::now();
        Round {
            round_id: "20260101-000000-ABCD".to_string(),
            status,
            scheduled_time: now,
            open_time: now,
            close_time: None,
            draw_time: None,
            server_seed: Some("secret".to_string()),
            server_seed_hash: Some("hash".to_string()),
            client_seed: Some("client".to_string()),
            nonce: 1,
            numbers_drawn: vec![],
            total_staked: Amount::ZERO,
            total_paid: Amount::ZERO,
            result_published: false,
        }
    }

    #[test]
    fn test_amount_display_and_scaling() {
        assert_eq!(Amount::units(10).to_string(), "10.00");
        assert_eq!(Amount(1234).to_string(), "12.34");
        assert_eq!(Amount::units(10).times(Multiplier(390)), Amount::units(39));
        // 0.01 * 1.5 truncates to zero minor units
        assert_eq!(Amount(1).times(Multiplier(150)), Amount::ZERO);
    }

    #[test]
    fn test_multiplier_display() {
        assert_eq!(Multiplier(390).to_string(), "3.9x");
        assert_eq!(Multiplier::whole(800).to_string(), "800x");
        assert_eq!(Multiplier(125).to_string(), "1.25x");
    }

    #[test]
    fn test_status_serde_uses_uppercase() {
        let json = serde_json::to_string(&RoundStatus::Settling).unwrap();
        assert_eq!(json, "\"SETTLING\"");
        let back: RoundStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, RoundStatus::Cancelled);
    }

    #[test]
    fn test_view_hides_seed_while_open() {
        let open = sample_round(RoundStatus::Open).view();
        assert!(open.server_seed.is_none());
        assert_eq!(open.server_seed_hash.as_deref(), Some("hash"));

        let closing = sample_round(RoundStatus::Closing).view();
        assert_eq!(closing.server_seed.as_deref(), Some("secret"));
    }

    #[test]
    fn test_zero_max_win_means_uncapped() {
        let limits = OperatorLimits {
            min_stake: Amount::units(1),
            max_stake: Amount::units(100),
            max_win_per_wager: Amount::ZERO,
            enabled: true,
        };
        assert_eq!(limits.max_win_limit(), None);
    }
}
