//! Round notifications for the delivery layer
//!
//! Every lifecycle transition is published on a broadcast channel. Sending
//! never blocks the engine; slow subscribers lag and drop events.

use crate::games::types::{Amount, RoundStatus, RoundView};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    StateChanged {
        round_id: String,
        from: Option<RoundStatus>,
        to: RoundStatus,
        round: RoundView,
    },
    DrawResult {
        round_id: String,
        numbers: Vec<u8>,
        server_seed_hash: Option<String>,
    },
    Settled {
        round_id: String,
        settled: usize,
        credited: usize,
        failed: usize,
        total_paid: Amount,
    },
}

impl RoundEvent {
    pub fn round_id(&self) -> &str {
        match self {
            RoundEvent::StateChanged { round_id, .. }
            | RoundEvent::DrawResult { round_id, .. }
            | RoundEvent::Settled { round_id, .. } => round_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoundEvents {
    sender: broadcast::Sender<RoundEvent>,
}

impl RoundEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: RoundEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscribers for round event");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for RoundEvents {
    fn default() -> Self {
        Self::new(1024)
    }
}
