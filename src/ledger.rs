//! In-memory wallet with reference-id deduplication

use crate::common::traits::{Ledger, LedgerReceipt};
use crate::errors::{KenoResult, LedgerError};
use crate::games::types::Amount;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Balances keyed by (player, currency). A successful call is remembered by
/// reference id and replayed on repeat; rejected calls are not remembered.
pub struct MemoryLedger {
    balances: DashMap<(String, String), u64>,
    processed: DashMap<String, LedgerReceipt>,
    reject_credits: AtomicBool,
    available: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            processed: DashMap::new(),
            reject_credits: AtomicBool::new(false),
            available: AtomicBool::new(true),
        }
    }

    /// Seed a player's balance
    pub fn deposit(&self, player_id: &str, currency: &str, amount: Amount) {
        *self
            .balances
            .entry((player_id.to_string(), currency.to_string()))
            .or_insert(0) += amount.minor();
    }

    /// Make every credit come back rejected, for exercising settlement failures
    pub fn set_reject_credits(&self, reject: bool) {
        self.reject_credits.store(reject, Ordering::SeqCst);
    }

    /// Simulate the wallet being unreachable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn was_processed(&self, reference_id: &str) -> bool {
        self.processed.contains_key(reference_id)
    }

    pub fn balance_of(&self, player_id: &str, currency: &str) -> Amount {
        Amount(
            self.balances
                .get(&(player_id.to_string(), currency.to_string()))
                .map(|b| *b)
                .unwrap_or(0),
        )
    }

    fn ensure_available(&self) -> KenoResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable("wallet offline".to_string()).into())
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn debit(
        &self,
        player_id: &str,
        amount: Amount,
        currency: &str,
        reference_id: &str,
    ) -> KenoResult<LedgerReceipt> {
        self.ensure_available()?;

        let entry = self.processed.entry(reference_id.to_string());
        if let dashmap::mapref::entry::Entry::Occupied(seen) = &entry {
            return Ok(seen.get().clone());
        }

        let mut balance = self
            .balances
            .entry((player_id.to_string(), currency.to_string()))
            .or_insert(0);
        if *balance < amount.minor() {
            return Ok(LedgerReceipt::rejected(format!(
                "insufficient funds: balance {} below {}",
                Amount(*balance),
                amount
            )));
        }
        *balance -= amount.minor();

        let receipt = LedgerReceipt::ok(Amount(*balance));
        drop(balance);
        entry.or_insert(receipt.clone());
        Ok(receipt)
    }

    async fn credit(
        &self,
        player_id: &str,
        amount: Amount,
        currency: &str,
        reference_id: &str,
    ) -> KenoResult<LedgerReceipt> {
        self.ensure_available()?;

        let entry = self.processed.entry(reference_id.to_string());
        if let dashmap::mapref::entry::Entry::Occupied(seen) = &entry {
            return Ok(seen.get().clone());
        }
        if self.reject_credits.load(Ordering::SeqCst) {
            return Ok(LedgerReceipt::rejected("credits disabled"));
        }

        let mut balance = self
            .balances
            .entry((player_id.to_string(), currency.to_string()))
            .or_insert(0);
        *balance = balance.saturating_add(amount.minor());

        let receipt = LedgerReceipt::ok(Amount(*balance));
        drop(balance);
        entry.or_insert(receipt.clone());
        Ok(receipt)
    }

    async fn get_balance(&self, player_id: &str, currency: &str) -> KenoResult<Amount> {
        self.ensure_available()?;
        Ok(self.balance_of(player_id, currency))
    }
}
