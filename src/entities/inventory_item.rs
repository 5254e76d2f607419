use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable stock item (product).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    /// Unit the item is counted and purchased in.
    pub unit_id: Uuid,
    /// Purchase units per case.
    pub case_size: Decimal,
    /// Cost per base unit, moving last-cost: overwritten by the most recent
    /// receipt price rather than averaged.
    pub last_cost: Decimal,
    /// Usable fraction after trim and preparation loss, in (0, 100].
    /// Zero is tolerated on read and treated as 100.
    pub yield_percent: Decimal,
    pub par_level: Option<Decimal>,
    pub reorder_level: Option<Decimal>,
    pub storage_location_ids: Vec<Uuid>,
}

impl InventoryItem {
    /// Cost per base unit after yield-loss inflation:
    /// `last_cost / (yield_percent / 100)`.
    ///
    /// A missing or zero yield percent is treated as 100, not an error.
    pub fn effective_cost_per_base_unit(&self) -> Decimal {
        let yield_percent = if self.yield_percent <= Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            self.yield_percent
        };
        self.last_cost / (yield_percent / Decimal::ONE_HUNDRED)
    }
}
