use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One received line of a vendor delivery. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub id: Uuid,
    /// Groups lines under one delivery; callers own the grouping.
    pub receipt_id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub qty: Decimal,
    pub unit_id: Uuid,
    pub derived_base_units: Decimal,
    pub price_each: Decimal,
    pub received_at: DateTime<Utc>,
}
