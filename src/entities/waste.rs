use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded waste event (spoilage, breakage, comped food). Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteLog {
    pub id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub derived_base_units: Decimal,
    pub reason_code: String,
    pub occurred_at: DateTime<Utc>,
}
