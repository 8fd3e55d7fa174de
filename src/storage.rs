//! In-memory round and wager stores
//!
//! Reference implementations of the repository traits. Entries live in
//! `DashMap`s; the OPEN-round insert is serialized by a mutex so only one
//! OPEN round can ever be stored.

use crate::common::traits::{RoundRepository, WagerRepository};
use crate::errors::{KenoError, KenoResult, NotFoundError, StateError, StorageError};
use crate::games::types::{Amount, Round, RoundStatus, Wager};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub struct MemoryRoundStore {
    rounds: DashMap<String, Round>,
    open_guard: Mutex<()>,
    nonce: AtomicU64,
}

impl MemoryRoundStore {
    pub fn new() -> Self {
        Self {
            rounds: DashMap::new(),
            open_guard: Mutex::new(()),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// All rounds in a given status
    pub fn with_status(&self, status: RoundStatus) -> Vec<Round> {
        self.rounds
            .iter()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn open_round(&self) -> Option<Round> {
        self.rounds
            .iter()
            .find(|entry| entry.status == RoundStatus::Open)
            .map(|entry| entry.value().clone())
    }
}

impl Default for MemoryRoundStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoundRepository for MemoryRoundStore {
    async fn get(&self, round_id: &str) -> KenoResult<Option<Round>> {
        Ok(self.rounds.get(round_id).map(|r| r.value().clone()))
    }

    async fn find_open(&self) -> KenoResult<Option<Round>> {
        Ok(self.open_round())
    }

    async fn insert_open(&self, round: Round) -> KenoResult<Round> {
        let _guard = self.open_guard.lock().await;

        if let Some(existing) = self.open_round() {
            return Err(StateError::OpenRoundExists(existing.round_id).into());
        }
        if round.status != RoundStatus::Open {
            return Err(StorageError::WriteFailed(format!(
                "round {} inserted with status {}",
                round.round_id, round.status
            ))
            .into());
        }
        if self.rounds.contains_key(&round.round_id) {
            return Err(StorageError::WriteFailed(format!("duplicate round id {}", round.round_id)).into());
        }

        self.rounds.insert(round.round_id.clone(), round.clone());
        Ok(round)
    }

    async fn save(&self, round: &Round) -> KenoResult<()> {
        let mut stored = self
            .rounds
            .get_mut(&round.round_id)
            .ok_or_else(|| NotFoundError::Round(round.round_id.clone()))?;

        stored.status = round.status;
        stored.close_time = round.close_time;
        stored.draw_time = round.draw_time;
        stored.server_seed = round.server_seed.clone();
        stored.server_seed_hash = round.server_seed_hash.clone();
        stored.client_seed = round.client_seed.clone();
        stored.numbers_drawn = round.numbers_drawn.clone();
        stored.result_published = round.result_published;
        Ok(())
    }

    async fn admit_stake(&self, round_id: &str, stake: Amount) -> KenoResult<Round> {
        let mut stored = self
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| NotFoundError::Round(round_id.to_string()))?;

        if stored.status != RoundStatus::Open {
            return Err(StateError::RoundNotOpen {
                round_id: round_id.to_string(),
                status: stored.status,
            }
            .into());
        }
        stored.total_staked = stored
            .total_staked
            .checked_add(stake)
            .ok_or_else(|| StorageError::Overflow(round_id.to_string()))?;
        Ok(stored.value().clone())
    }

    async fn increment_totals(&self, round_id: &str, staked: Amount, paid: Amount) -> KenoResult<Round> {
        let mut stored = self
            .rounds
            .get_mut(round_id)
            .ok_or_else(|| NotFoundError::Round(round_id.to_string()))?;

        let total_staked = stored
            .total_staked
            .checked_add(staked)
            .ok_or_else(|| StorageError::Overflow(round_id.to_string()))?;
        let total_paid = stored
            .total_paid
            .checked_add(paid)
            .ok_or_else(|| StorageError::Overflow(round_id.to_string()))?;

        stored.total_staked = total_staked;
        stored.total_paid = total_paid;
        Ok(stored.value().clone())
    }

    async fn next_nonce(&self) -> KenoResult<u64> {
        Ok(self.nonce.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub struct MemoryWagerStore {
    wagers: DashMap<String, Wager>,
    by_round: DashMap<String, Vec<String>>,
    operations: AtomicU64,
}

impl MemoryWagerStore {
    pub fn new() -> Self {
        Self {
            wagers: DashMap::new(),
            by_round: DashMap::new(),
            operations: AtomicU64::new(0),
        }
    }

    /// Number of repository calls served, reads and writes alike
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.wagers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wagers.is_empty()
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    /// Wagers are written before their index entry and unindexed before
    /// removal, so an indexed id without a wager is corruption
    fn round_wagers(&self, round_id: &str) -> KenoResult<Vec<Wager>> {
        let ids = self
            .by_round
            .get(round_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        ids.iter()
            .map(|id| {
                self.wagers.get(id).map(|w| w.value().clone()).ok_or_else(|| {
                    KenoError::from(StorageError::ReadFailed(format!(
                        "round {} indexes missing wager {}",
                        round_id, id
                    )))
                })
            })
            .collect()
    }
}

impl Default for MemoryWagerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WagerRepository for MemoryWagerStore {
    async fn insert(&self, wager: Wager) -> KenoResult<()> {
        self.touch();
        if self.wagers.contains_key(&wager.wager_id) {
            return Err(StorageError::WriteFailed(format!("duplicate wager id {}", wager.wager_id)).into());
        }

        let (wager_id, round_id) = (wager.wager_id.clone(), wager.round_id.clone());
        self.wagers.insert(wager_id.clone(), wager);
        self.by_round.entry(round_id).or_default().push(wager_id);
        Ok(())
    }

    async fn get(&self, wager_id: &str) -> KenoResult<Option<Wager>> {
        self.touch();
        Ok(self.wagers.get(wager_id).map(|w| w.value().clone()))
    }

    async fn pending_for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>> {
        self.touch();
        Ok(self
            .round_wagers(round_id)?
            .into_iter()
            .filter(|w| !w.credited)
            .collect())
    }

    async fn save(&self, wager: &Wager) -> KenoResult<()> {
        self.touch();
        let mut stored = self
            .wagers
            .get_mut(&wager.wager_id)
            .ok_or_else(|| NotFoundError::Wager(wager.wager_id.clone()))?;

        if stored.credited {
            return Err(StorageError::WriteFailed(format!(
                "wager {} is credited and immutable",
                wager.wager_id
            ))
            .into());
        }
        *stored = wager.clone();
        Ok(())
    }

    async fn remove(&self, wager_id: &str) -> KenoResult<()> {
        self.touch();
        let (round_id, settled) = match self.wagers.get(wager_id) {
            Some(w) => (w.round_id.clone(), w.is_settled() || w.credited),
            None => return Err(NotFoundError::Wager(wager_id.to_string()).into()),
        };
        if settled {
            return Err(StorageError::WriteFailed(format!("wager {} is settled and cannot be removed", wager_id)).into());
        }

        if let Some(mut ids) = self.by_round.get_mut(&round_id) {
            ids.retain(|id| id != wager_id);
        }
        self.wagers.remove(wager_id);
        Ok(())
    }

    async fn for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>> {
        self.touch();
        self.round_wagers(round_id)
    }
}


#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::AtomicBool;

    /// Wager store whose next pending-wager read fails
    #[derive(Default)]
    pub(crate) struct FlakyWagerStore {
        pub(crate) inner: MemoryWagerStore,
        fail_next_read: AtomicBool,
    }

    impl FlakyWagerStore {
        pub(crate) fn fail_next_read(&self) {
            self.fail_next_read.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl WagerRepository for FlakyWagerStore {
        async fn insert(&self, wager: Wager) -> KenoResult<()> {
            self.inner.insert(wager).await
        }

        async fn get(&self, wager_id: &str) -> KenoResult<Option<Wager>> {
            self.inner.get(wager_id).await
        }

        async fn pending_for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>> {
            if self.fail_next_read.swap(false, Ordering::SeqCst) {
                return Err(StorageError::ReadFailed(format!("wagers of round {} unavailable", round_id)).into());
            }
            self.inner.pending_for_round(round_id).await
        }

        async fn save(&self, wager: &Wager) -> KenoResult<()> {
            self.inner.save(wager).await
        }

        async fn remove(&self, wager_id: &str) -> KenoResult<()> {
            self.inner.remove(wager_id).await
        }

        async fn for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>> {
            self.inner.for_round(round_id).await
        }
    }
}
