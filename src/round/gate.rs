//! Betting gate shared by admission and the lifecycle
//!
//! Admissions hold the read side from their OPEN check until the stake is
//! booked. Leaving OPEN takes the write side, so it waits for admissions in
//! flight and every later admission sees the new status.

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct BettingGate {
    lock: Arc<RwLock<()>>,
}

impl BettingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held by one admission while it checks the round and books the wager
    pub async fn admit(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    /// Held by a transition out of OPEN
    pub async fn close(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_close_waits_for_admissions() {
        let gate = BettingGate::new();
        let admitting = gate.admit().await;

        let closer = gate.clone();
        let close = tokio::spawn(async move {
            let _closed = closer.close().await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!close.is_finished());

        drop(admitting);
        close.await.unwrap();
    }

    #[tokio::test]
    async fn test_admissions_share_the_gate() {
        let gate = BettingGate::new();
        let _first = gate.admit().await;
        let second = tokio::time::timeout(Duration::from_millis(50), gate.admit()).await;
        assert!(second.is_ok());
    }
}
