use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical count session: the reconciliation checkpoint grouping count
/// lines under one `(location, counted_at)` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCount {
    pub id: Uuid,
    pub location_id: Uuid,
    pub counted_at: DateTime<Utc>,
}

/// One counted item within a session. A count line is an authoritative
/// snapshot: applying it sets on-hand rather than adjusting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCountLine {
    pub id: Uuid,
    pub count_id: Uuid,
    pub item_id: Uuid,
    pub qty: Decimal,
    pub unit_id: Uuid,
    /// Quantity expressed in base units at the time the line was recorded.
    pub derived_base_units: Decimal,
    /// The item's cost per base unit at record time. Valuation of a
    /// historical count never changes when current item cost changes later.
    pub unit_cost_snapshot: Decimal,
}
