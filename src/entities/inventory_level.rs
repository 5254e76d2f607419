use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running on-hand total for one `(item, location)` pair.
///
/// Derived state, not a source of truth: reconstructable by replaying ledger
/// events from the most recent authoritative count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub on_hand_base_units: Decimal,
}
