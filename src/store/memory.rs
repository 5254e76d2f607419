//! In-memory [`RecordStore`] used by tests and embedding callers.
//!
//! Each collection is a [`DashMap`]; every trait method touches at most one
//! row, so the single-row atomicity contract holds without extra locking.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;

use crate::entities::{
    InventoryCount, InventoryCountLine, InventoryItem, InventoryLevel, MenuItem, ReceiptLine,
    Recipe, RecipeComponent, Sale, SaleLine, TransferLog, Unit, WasteLog,
};

use super::{RecordStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    units: DashMap<Uuid, Unit>,
    items: DashMap<Uuid, InventoryItem>,
    recipes: DashMap<Uuid, Recipe>,
    components: DashMap<Uuid, RecipeComponent>,
    menu_items: DashMap<Uuid, MenuItem>,
    sales: DashMap<Uuid, Sale>,
    sale_lines: DashMap<Uuid, SaleLine>,
    levels: DashMap<(Uuid, Uuid), InventoryLevel>,
    counts: DashMap<Uuid, InventoryCount>,
    count_lines: DashMap<Uuid, InventoryCountLine>,
    receipt_lines: DashMap<Uuid, ReceiptLine>,
    transfers: DashMap<Uuid, TransferLog>,
    waste: DashMap<Uuid, WasteLog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_range(at: DateTime<Utc>, after: DateTime<Utc>, until: Option<DateTime<Utc>>) -> bool {
    at > after && until.map_or(true, |u| at <= u)
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn insert_unit(&self, unit: Unit) -> Result<(), StoreError> {
        self.units.insert(unit.id, unit);
        Ok(())
    }

    async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>, StoreError> {
        Ok(self.units.get(&id).map(|u| u.clone()))
    }

    async fn insert_item(&self, item: InventoryItem) -> Result<(), StoreError> {
        self.items.insert(item.id, item);
        Ok(())
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self.items.get(&id).map(|i| i.clone()))
    }

    async fn update_item(&self, item: InventoryItem) -> Result<(), StoreError> {
        self.items.insert(item.id, item);
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let mut items: Vec<_> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn insert_recipe(&self, recipe: Recipe) -> Result<(), StoreError> {
        self.recipes.insert(recipe.id, recipe);
        Ok(())
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, StoreError> {
        Ok(self.recipes.get(&id).map(|r| r.clone()))
    }

    async fn update_recipe(&self, recipe: Recipe) -> Result<(), StoreError> {
        self.recipes.insert(recipe.id, recipe);
        Ok(())
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes: Vec<_> = self.recipes.iter().map(|e| e.value().clone()).collect();
        recipes.sort_by_key(|r| r.id);
        Ok(recipes)
    }

    async fn insert_component(&self, component: RecipeComponent) -> Result<(), StoreError> {
        self.components.insert(component.id, component);
        Ok(())
    }

    async fn components_for_recipe(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeComponent>, StoreError> {
        let mut components: Vec<_> = self
            .components
            .iter()
            .filter(|e| e.value().recipe_id == recipe_id)
            .map(|e| e.value().clone())
            .collect();
        components.sort_by_key(|c| (c.sort_order, c.id));
        Ok(components)
    }

    async fn insert_menu_item(&self, menu_item: MenuItem) -> Result<(), StoreError> {
        self.menu_items.insert(menu_item.id, menu_item);
        Ok(())
    }

    async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.menu_items.get(&id).map(|m| m.clone()))
    }

    async fn insert_sale(&self, sale: Sale) -> Result<(), StoreError> {
        self.sales.insert(sale.id, sale);
        Ok(())
    }

    async fn insert_sale_line(&self, line: SaleLine) -> Result<(), StoreError> {
        self.sale_lines.insert(line.id, line);
        Ok(())
    }

    async fn sales_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Sale>, StoreError> {
        let mut sales: Vec<_> = self
            .sales
            .iter()
            .filter(|e| {
                e.value().location_id == location_id && in_range(e.value().sold_at, after, until)
            })
            .map(|e| e.value().clone())
            .collect();
        sales.sort_by_key(|s| (s.sold_at, s.id));
        Ok(sales)
    }

    async fn lines_for_sale(&self, sale_id: Uuid) -> Result<Vec<SaleLine>, StoreError> {
        let mut lines: Vec<_> = self
            .sale_lines
            .iter()
            .filter(|e| e.value().sale_id == sale_id)
            .map(|e| e.value().clone())
            .collect();
        lines.sort_by_key(|l| l.id);
        Ok(lines)
    }

    async fn get_level(
        &self,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<InventoryLevel>, StoreError> {
        Ok(self
            .levels
            .get(&(item_id, location_id))
            .map(|l| l.clone()))
    }

    async fn upsert_level(&self, level: InventoryLevel) -> Result<(), StoreError> {
        self.levels
            .insert((level.item_id, level.location_id), level);
        Ok(())
    }

    async fn levels_for_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<InventoryLevel>, StoreError> {
        let mut levels: Vec<_> = self
            .levels
            .iter()
            .filter(|e| e.value().location_id == location_id)
            .map(|e| e.value().clone())
            .collect();
        levels.sort_by_key(|l| l.item_id);
        Ok(levels)
    }

    async fn insert_count(&self, count: InventoryCount) -> Result<(), StoreError> {
        self.counts.insert(count.id, count);
        Ok(())
    }

    async fn get_count(&self, id: Uuid) -> Result<Option<InventoryCount>, StoreError> {
        Ok(self.counts.get(&id).map(|c| c.clone()))
    }

    async fn delete_count(&self, id: Uuid) -> Result<(), StoreError> {
        self.counts.remove(&id);
        Ok(())
    }

    async fn insert_count_line(&self, line: InventoryCountLine) -> Result<(), StoreError> {
        self.count_lines.insert(line.id, line);
        Ok(())
    }

    async fn get_count_line(
        &self,
        id: Uuid,
    ) -> Result<Option<InventoryCountLine>, StoreError> {
        Ok(self.count_lines.get(&id).map(|l| l.clone()))
    }

    async fn update_count_line(&self, line: InventoryCountLine) -> Result<(), StoreError> {
        self.count_lines.insert(line.id, line);
        Ok(())
    }

    async fn lines_for_count(
        &self,
        count_id: Uuid,
    ) -> Result<Vec<InventoryCountLine>, StoreError> {
        let mut lines: Vec<_> = self
            .count_lines
            .iter()
            .filter(|e| e.value().count_id == count_id)
            .map(|e| e.value().clone())
            .collect();
        lines.sort_by_key(|l| l.id);
        Ok(lines)
    }

    async fn delete_lines_for_count(&self, count_id: Uuid) -> Result<(), StoreError> {
        self.count_lines.retain(|_, line| line.count_id != count_id);
        Ok(())
    }

    async fn counts_in_range(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InventoryCount>, StoreError> {
        let mut counts: Vec<_> = self
            .counts
            .iter()
            .filter(|e| {
                let c = e.value();
                c.location_id == location_id && c.counted_at >= start && c.counted_at <= end
            })
            .map(|e| e.value().clone())
            .collect();
        counts.sort_by_key(|c| (c.counted_at, c.id));
        Ok(counts)
    }

    async fn latest_count_line(
        &self,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<(InventoryCount, InventoryCountLine)>, StoreError> {
        let mut latest: Option<(InventoryCount, InventoryCountLine)> = None;
        for entry in self.count_lines.iter() {
            let line = entry.value();
            if line.item_id != item_id {
                continue;
            }
            let Some(count) = self.counts.get(&line.count_id).map(|c| c.clone()) else {
                continue;
            };
            if count.location_id != location_id {
                continue;
            }
            let newer = match &latest {
                Some((current, _)) => {
                    (count.counted_at, count.id) > (current.counted_at, current.id)
                }
                None => true,
            };
            if newer {
                latest = Some((count, line.clone()));
            }
        }
        Ok(latest)
    }

    async fn insert_receipt_line(&self, line: ReceiptLine) -> Result<(), StoreError> {
        self.receipt_lines.insert(line.id, line);
        Ok(())
    }

    async fn receipt_lines_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReceiptLine>, StoreError> {
        let mut lines: Vec<_> = self
            .receipt_lines
            .iter()
            .filter(|e| {
                let l = e.value();
                l.location_id == location_id && in_range(l.received_at, after, until)
            })
            .map(|e| e.value().clone())
            .collect();
        lines.sort_by_key(|l| (l.received_at, l.id));
        Ok(lines)
    }

    async fn insert_transfer(&self, transfer: TransferLog) -> Result<(), StoreError> {
        self.transfers.insert(transfer.id, transfer);
        Ok(())
    }

    async fn transfers_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<TransferLog>, StoreError> {
        let mut transfers: Vec<_> = self
            .transfers
            .iter()
            .filter(|e| {
                let t = e.value();
                (t.from_location_id == location_id || t.to_location_id == location_id)
                    && in_range(t.occurred_at, after, until)
            })
            .map(|e| e.value().clone())
            .collect();
        transfers.sort_by_key(|t| (t.occurred_at, t.id));
        Ok(transfers)
    }

    async fn insert_waste(&self, waste: WasteLog) -> Result<(), StoreError> {
        self.waste.insert(waste.id, waste);
        Ok(())
    }

    async fn waste_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<WasteLog>, StoreError> {
        let mut waste: Vec<_> = self
            .waste
            .iter()
            .filter(|e| {
                let w = e.value();
                w.location_id == location_id && in_range(w.occurred_at, after, until)
            })
            .map(|e| e.value().clone())
            .collect();
        waste.sort_by_key(|w| (w.occurred_at, w.id));
        Ok(waste)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn latest_count_line_prefers_most_recent_session() {
        let store = InMemoryStore::new();
        let (item_id, location_id) = (Uuid::new_v4(), Uuid::new_v4());

        for (day, qty) in [(1, dec!(10)), (3, dec!(7))] {
            let count = InventoryCount {
                id: Uuid::new_v4(),
                location_id,
                counted_at: Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap(),
            };
            store.insert_count(count.clone()).await.unwrap();
            store
                .insert_count_line(InventoryCountLine {
                    id: Uuid::new_v4(),
                    count_id: count.id,
                    item_id,
                    qty,
                    unit_id: Uuid::new_v4(),
                    derived_base_units: qty,
                    unit_cost_snapshot: dec!(0.25),
                })
                .await
                .unwrap();
        }

        let (count, line) = store
            .latest_count_line(item_id, location_id)
            .await
            .unwrap()
            .expect("line expected");
        assert_eq!(count.counted_at.day(), 3);
        assert_eq!(line.derived_base_units, dec!(7));
    }

    #[tokio::test]
    async fn range_queries_are_strictly_after_start() {
        let store = InMemoryStore::new();
        let location_id = Uuid::new_v4();
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        for offset in [0i64, 1, 2] {
            store
                .insert_waste(WasteLog {
                    id: Uuid::new_v4(),
                    item_id: Uuid::new_v4(),
                    location_id,
                    derived_base_units: dec!(1),
                    reason_code: "spoilage".to_string(),
                    occurred_at: t0 + chrono::Duration::hours(offset),
                })
                .await
                .unwrap();
        }

        let rows = store.waste_in_range(location_id, t0, None).await.unwrap();
        assert_eq!(rows.len(), 2, "event at exactly t0 must be excluded");
    }
}
