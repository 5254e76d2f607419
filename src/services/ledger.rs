use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    entities::{
        InventoryCount, InventoryCountLine, InventoryLevel, ReceiptLine, TransferLog, WasteLog,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::units::UnitRegistryService,
    store::RecordStore,
};

type LevelKey = (Uuid, Uuid);

/// Append-only record of stock-affecting events per `(item, location)`,
/// maintaining the running on-hand total.
///
/// On-hand mutation is read-modify-write, so concurrent writers to the same
/// key are serialized through a per-key async mutex; writes to different keys
/// proceed in parallel. Operations touching two keys (transfers) take both
/// locks in a stable order.
#[derive(Clone)]
pub struct InventoryLedgerService {
    store: Arc<dyn RecordStore>,
    units: Arc<UnitRegistryService>,
    event_sender: Arc<EventSender>,
    level_locks: Arc<DashMap<LevelKey, Arc<Mutex<()>>>>,
    cost_scale: u32,
}

impl InventoryLedgerService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        units: Arc<UnitRegistryService>,
        event_sender: Arc<EventSender>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            units,
            event_sender,
            level_locks: Arc::new(DashMap::new()),
            cost_scale: config.cost_scale,
        }
    }

    fn lock_for(&self, key: LevelKey) -> Arc<Mutex<()>> {
        self.level_locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current on-hand in base units; zero when the pair has no level row.
    pub async fn on_hand(&self, item_id: Uuid, location_id: Uuid) -> Result<Decimal, ServiceError> {
        Ok(self
            .store
            .get_level(item_id, location_id)
            .await?
            .map(|level| level.on_hand_base_units)
            .unwrap_or(Decimal::ZERO))
    }

    /// Opens a count session at a location. Lines are added with
    /// [`apply_count`](Self::apply_count).
    #[instrument(skip(self))]
    pub async fn create_count(
        &self,
        location_id: Uuid,
        counted_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid, ServiceError> {
        let count = InventoryCount {
            id: Uuid::new_v4(),
            location_id,
            counted_at: counted_at.unwrap_or_else(Utc::now),
        };
        let count_id = count.id;
        self.store.insert_count(count).await?;

        self.event_sender
            .send_or_log(Event::CountSessionCreated {
                count_id,
                location_id,
            })
            .await;

        Ok(count_id)
    }

    /// Records a counted quantity. A count is an authoritative snapshot: the
    /// pair's on-hand is **set** to the counted value, not adjusted by it.
    /// The line stores the item's cost per base unit in effect right now, so
    /// later cost changes never revalue this count.
    #[instrument(skip(self))]
    pub async fn apply_count(
        &self,
        count_id: Uuid,
        item_id: Uuid,
        qty: Decimal,
        unit_id: Uuid,
    ) -> Result<Uuid, ServiceError> {
        if qty < Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "counted quantity cannot be negative, got {}",
                qty
            )));
        }
        let count = self
            .store
            .get_count(count_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory count", count_id))?;
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
        let derived_base_units = self.units.convert_to_base(qty, unit_id).await?;

        let lock = self.lock_for((item_id, count.location_id));
        let _guard = lock.lock().await;

        self.store
            .upsert_level(InventoryLevel {
                item_id,
                location_id: count.location_id,
                on_hand_base_units: derived_base_units,
            })
            .await?;

        let line = InventoryCountLine {
            id: Uuid::new_v4(),
            count_id,
            item_id,
            qty,
            unit_id,
            derived_base_units,
            unit_cost_snapshot: item.last_cost,
        };
        let line_id = line.id;
        self.store.insert_count_line(line).await?;

        info!(%count_id, %item_id, %derived_base_units, "count line recorded");
        self.event_sender
            .send_or_log(Event::CountLineRecorded {
                count_id,
                item_id,
                base_units: derived_base_units,
            })
            .await;

        Ok(line_id)
    }

    /// Records a received delivery line: adds to on-hand and moves the item's
    /// `last_cost` to `price_each / derived_base_units` (moving last-cost,
    /// not weighted average). A zero-quantity line leaves cost untouched.
    #[instrument(skip(self))]
    pub async fn apply_receipt(
        &self,
        receipt_id: Uuid,
        item_id: Uuid,
        location_id: Uuid,
        qty: Decimal,
        unit_id: Uuid,
        price_each: Decimal,
        received_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid, ServiceError> {
        if qty <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "received quantity must be positive, got {}",
                qty
            )));
        }
        if price_each < Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "price cannot be negative, got {}",
                price_each
            )));
        }
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
        let derived_base_units = self.units.convert_to_base(qty, unit_id).await?;

        let lock = self.lock_for((item_id, location_id));
        let _guard = lock.lock().await;

        let on_hand = self.on_hand(item_id, location_id).await?;
        self.store
            .upsert_level(InventoryLevel {
                item_id,
                location_id,
                on_hand_base_units: on_hand + derived_base_units,
            })
            .await?;

        if !derived_base_units.is_zero() {
            item.last_cost = (price_each / derived_base_units).round_dp(self.cost_scale);
            self.store.update_item(item).await?;
        }

        let line = ReceiptLine {
            id: Uuid::new_v4(),
            receipt_id,
            item_id,
            location_id,
            qty,
            unit_id,
            derived_base_units,
            price_each,
            received_at: received_at.unwrap_or_else(Utc::now),
        };
        let line_id = line.id;
        self.store.insert_receipt_line(line).await?;

        info!(%receipt_id, %item_id, %location_id, %derived_base_units, "receipt applied");
        self.event_sender
            .send_or_log(Event::InventoryReceived {
                item_id,
                location_id,
                base_units: derived_base_units,
            })
            .await;

        Ok(line_id)
    }

    /// Moves stock between two locations. Rejected with
    /// `InsufficientInventory` when the source holds less than the transfer
    /// quantity, leaving both sides untouched; otherwise both adjustments
    /// happen under both keys' locks so a half-applied transfer is never
    /// observable.
    #[instrument(skip(self))]
    pub async fn apply_transfer(
        &self,
        item_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        qty: Decimal,
        unit_id: Uuid,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid, ServiceError> {
        if from_location_id == to_location_id {
            return Err(ServiceError::validation(
                "transfer source and destination must differ",
            ));
        }
        if qty <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "transfer quantity must be positive, got {}",
                qty
            )));
        }
        self.store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
        let derived_base_units = self.units.convert_to_base(qty, unit_id).await?;

        // Stable lock order prevents two opposite transfers from deadlocking.
        let mut keys = [
            (item_id, from_location_id),
            (item_id, to_location_id),
        ];
        keys.sort();
        let first = self.lock_for(keys[0]);
        let second = self.lock_for(keys[1]);
        let _first_guard = first.lock().await;
        let _second_guard = second.lock().await;

        let source_on_hand = self.on_hand(item_id, from_location_id).await?;
        if source_on_hand < derived_base_units {
            return Err(ServiceError::InsufficientInventory(format!(
                "item {} at {}: on hand {}, transfer requested {}",
                item_id, from_location_id, source_on_hand, derived_base_units
            )));
        }
        let dest_on_hand = self.on_hand(item_id, to_location_id).await?;

        self.store
            .upsert_level(InventoryLevel {
                item_id,
                location_id: from_location_id,
                on_hand_base_units: source_on_hand - derived_base_units,
            })
            .await?;
        self.store
            .upsert_level(InventoryLevel {
                item_id,
                location_id: to_location_id,
                on_hand_base_units: dest_on_hand + derived_base_units,
            })
            .await?;

        let transfer = TransferLog {
            id: Uuid::new_v4(),
            item_id,
            from_location_id,
            to_location_id,
            derived_base_units,
            occurred_at: occurred_at.unwrap_or_else(Utc::now),
        };
        let transfer_id = transfer.id;
        self.store.insert_transfer(transfer).await?;

        info!(%item_id, %from_location_id, %to_location_id, %derived_base_units, "transfer applied");
        self.event_sender
            .send_or_log(Event::InventoryTransferred {
                item_id,
                from_location_id,
                to_location_id,
                base_units: derived_base_units,
            })
            .await;

        Ok(transfer_id)
    }

    /// Records a waste event. Rejected with `InsufficientInventory` when
    /// on-hand is below the wasted quantity.
    #[instrument(skip(self))]
    pub async fn apply_waste(
        &self,
        item_id: Uuid,
        location_id: Uuid,
        qty: Decimal,
        unit_id: Uuid,
        reason_code: &str,
        occurred_at: Option<DateTime<Utc>>,
    ) -> Result<Uuid, ServiceError> {
        if qty <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "waste quantity must be positive, got {}",
                qty
            )));
        }
        self.store
            .get_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
        let derived_base_units = self.units.convert_to_base(qty, unit_id).await?;
        let reason_code = reason_code.to_string();

        let lock = self.lock_for((item_id, location_id));
        let _guard = lock.lock().await;

        let on_hand = self.on_hand(item_id, location_id).await?;
        if on_hand < derived_base_units {
            return Err(ServiceError::InsufficientInventory(format!(
                "item {} at {}: on hand {}, waste requested {}",
                item_id, location_id, on_hand, derived_base_units
            )));
        }

        self.store
            .upsert_level(InventoryLevel {
                item_id,
                location_id,
                on_hand_base_units: on_hand - derived_base_units,
            })
            .await?;

        let waste = WasteLog {
            id: Uuid::new_v4(),
            item_id,
            location_id,
            derived_base_units,
            reason_code: reason_code.clone(),
            occurred_at: occurred_at.unwrap_or_else(Utc::now),
        };
        let waste_id = waste.id;
        self.store.insert_waste(waste).await?;

        info!(%item_id, %location_id, %derived_base_units, %reason_code, "waste recorded");
        self.event_sender
            .send_or_log(Event::InventoryWasted {
                item_id,
                location_id,
                base_units: derived_base_units,
                reason_code,
            })
            .await;

        Ok(waste_id)
    }

    /// Corrects a count line's quantity by reversing the old derived
    /// contribution before applying the new one:
    /// `on_hand = on_hand - old + new`. The line's effect was a "set", so its
    /// replacement must preserve set semantics relative to whatever happened
    /// since; the cost snapshot is left untouched.
    #[instrument(skip(self))]
    pub async fn correct_count_line(
        &self,
        line_id: Uuid,
        new_qty: Decimal,
    ) -> Result<(), ServiceError> {
        if new_qty < Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "counted quantity cannot be negative, got {}",
                new_qty
            )));
        }
        let mut line = self
            .store
            .get_count_line(line_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Count line", line_id))?;
        let count = self
            .store
            .get_count(line.count_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory count", line.count_id))?;
        let new_derived = self.units.convert_to_base(new_qty, line.unit_id).await?;
        let old_derived = line.derived_base_units;

        let lock = self.lock_for((line.item_id, count.location_id));
        let _guard = lock.lock().await;

        let on_hand = self.on_hand(line.item_id, count.location_id).await?;
        self.store
            .upsert_level(InventoryLevel {
                item_id: line.item_id,
                location_id: count.location_id,
                on_hand_base_units: on_hand - old_derived + new_derived,
            })
            .await?;

        line.qty = new_qty;
        line.derived_base_units = new_derived;
        self.store.update_count_line(line).await?;

        self.event_sender
            .send_or_log(Event::CountLineCorrected {
                line_id,
                old_base_units: old_derived,
                new_base_units: new_derived,
            })
            .await;

        Ok(())
    }

    /// Deletes a count session: every line's derived contribution is
    /// reversed out of current on-hand, then the lines and the session go.
    #[instrument(skip(self))]
    pub async fn delete_count_session(&self, count_id: Uuid) -> Result<(), ServiceError> {
        let count = self
            .store
            .get_count(count_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory count", count_id))?;
        let lines = self.store.lines_for_count(count_id).await?;

        for line in &lines {
            let lock = self.lock_for((line.item_id, count.location_id));
            let _guard = lock.lock().await;

            let on_hand = self.on_hand(line.item_id, count.location_id).await?;
            self.store
                .upsert_level(InventoryLevel {
                    item_id: line.item_id,
                    location_id: count.location_id,
                    on_hand_base_units: on_hand - line.derived_base_units,
                })
                .await?;
        }

        self.store.delete_lines_for_count(count_id).await?;
        self.store.delete_count(count_id).await?;

        info!(%count_id, lines = lines.len(), "count session deleted");
        self.event_sender
            .send_or_log(Event::CountSessionDeleted {
                count_id,
                location_id: count.location_id,
            })
            .await;

        Ok(())
    }
}
