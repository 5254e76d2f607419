//! Domain events emitted after every ledger mutation and cost computation.
//!
//! Delivery is best-effort over a bounded channel: mutations use
//! [`EventSender::send_or_log`] so a lagging consumer never blocks or fails
//! ledger writes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Costing
    RecipeCostComputed {
        recipe_id: Uuid,
        cost_per_yield: Decimal,
    },
    RecipeComponentAdded {
        recipe_id: Uuid,
        component_id: Uuid,
    },

    // Ledger
    CountSessionCreated {
        count_id: Uuid,
        location_id: Uuid,
    },
    CountLineRecorded {
        count_id: Uuid,
        item_id: Uuid,
        base_units: Decimal,
    },
    CountLineCorrected {
        line_id: Uuid,
        old_base_units: Decimal,
        new_base_units: Decimal,
    },
    CountSessionDeleted {
        count_id: Uuid,
        location_id: Uuid,
    },
    InventoryReceived {
        item_id: Uuid,
        location_id: Uuid,
        base_units: Decimal,
    },
    InventoryTransferred {
        item_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        base_units: Decimal,
    },
    InventoryWasted {
        item_id: Uuid,
        location_id: Uuid,
        base_units: Decimal,
        reason_code: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed
    /// or full. Used on mutation paths where event delivery must never veto
    /// an already-persisted write.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!(error = %e, "event channel closed; dropping event");
        }
    }
}

/// Builds an event channel with the given buffer capacity.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}
