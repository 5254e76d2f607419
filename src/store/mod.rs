//! The record-store collaborator boundary.
//!
//! The engine fetches and writes entities through [`RecordStore`], assuming
//! nothing beyond single-row atomicity. Multi-row updates (a transfer touches
//! two levels, a receipt touches a level plus the item's last cost) are
//! sequenced by the services themselves under per-key locks.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{
    InventoryCount, InventoryCountLine, InventoryItem, InventoryLevel, MenuItem, ReceiptLine,
    Recipe, RecipeComponent, Sale, SaleLine, TransferLog, Unit, WasteLog,
};

pub use memory::InMemoryStore;

/// Infrastructure failure inside a store backend. Row absence is modeled as
/// `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Typed get/create/update/delete access to the engine's entities, keyed by
/// opaque ids.
///
/// Time-ranged queries use `(after, until]` semantics: strictly after
/// `after`, up to and including `until`; `None` leaves the range open-ended.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // -- units -------------------------------------------------------------
    async fn insert_unit(&self, unit: Unit) -> Result<(), StoreError>;
    async fn get_unit(&self, id: Uuid) -> Result<Option<Unit>, StoreError>;

    // -- inventory items ---------------------------------------------------
    async fn insert_item(&self, item: InventoryItem) -> Result<(), StoreError>;
    async fn get_item(&self, id: Uuid) -> Result<Option<InventoryItem>, StoreError>;
    async fn update_item(&self, item: InventoryItem) -> Result<(), StoreError>;
    async fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError>;

    // -- recipes and components --------------------------------------------
    async fn insert_recipe(&self, recipe: Recipe) -> Result<(), StoreError>;
    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, StoreError>;
    async fn update_recipe(&self, recipe: Recipe) -> Result<(), StoreError>;
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;
    async fn insert_component(&self, component: RecipeComponent) -> Result<(), StoreError>;
    /// Components of a recipe, ordered by `sort_order`.
    async fn components_for_recipe(
        &self,
        recipe_id: Uuid,
    ) -> Result<Vec<RecipeComponent>, StoreError>;

    // -- menu items and sales ----------------------------------------------
    async fn insert_menu_item(&self, menu_item: MenuItem) -> Result<(), StoreError>;
    async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError>;
    async fn insert_sale(&self, sale: Sale) -> Result<(), StoreError>;
    async fn insert_sale_line(&self, line: SaleLine) -> Result<(), StoreError>;
    /// Sales at a location with `after < sold_at <= until`, ascending.
    async fn sales_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Sale>, StoreError>;
    async fn lines_for_sale(&self, sale_id: Uuid) -> Result<Vec<SaleLine>, StoreError>;

    // -- inventory levels ---------------------------------------------------
    async fn get_level(
        &self,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<InventoryLevel>, StoreError>;
    async fn upsert_level(&self, level: InventoryLevel) -> Result<(), StoreError>;
    async fn levels_for_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<InventoryLevel>, StoreError>;

    // -- counts -------------------------------------------------------------
    async fn insert_count(&self, count: InventoryCount) -> Result<(), StoreError>;
    async fn get_count(&self, id: Uuid) -> Result<Option<InventoryCount>, StoreError>;
    async fn delete_count(&self, id: Uuid) -> Result<(), StoreError>;
    async fn insert_count_line(&self, line: InventoryCountLine) -> Result<(), StoreError>;
    async fn get_count_line(&self, id: Uuid)
        -> Result<Option<InventoryCountLine>, StoreError>;
    async fn update_count_line(&self, line: InventoryCountLine) -> Result<(), StoreError>;
    async fn lines_for_count(
        &self,
        count_id: Uuid,
    ) -> Result<Vec<InventoryCountLine>, StoreError>;
    async fn delete_lines_for_count(&self, count_id: Uuid) -> Result<(), StoreError>;
    /// Count sessions at a location with `counted_at` inside the inclusive
    /// range, ascending by `counted_at`.
    async fn counts_in_range(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InventoryCount>, StoreError>;
    /// Most recent count line for an item at a location, with its session.
    async fn latest_count_line(
        &self,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<(InventoryCount, InventoryCountLine)>, StoreError>;

    // -- receipts, transfers, waste ----------------------------------------
    async fn insert_receipt_line(&self, line: ReceiptLine) -> Result<(), StoreError>;
    async fn receipt_lines_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReceiptLine>, StoreError>;
    async fn insert_transfer(&self, transfer: TransferLog) -> Result<(), StoreError>;
    /// Transfers touching a location on either side, in the `(after, until]`
    /// range, ascending.
    async fn transfers_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<TransferLog>, StoreError>;
    async fn insert_waste(&self, waste: WasteLog) -> Result<(), StoreError>;
    async fn waste_in_range(
        &self,
        location_id: Uuid,
        after: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<WasteLog>, StoreError>;
}
