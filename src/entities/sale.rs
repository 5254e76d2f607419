use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded POS sale. Consumed read-only for theoretical usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub location_id: Uuid,
    pub sold_at: DateTime<Utc>,
}

/// One sold menu item on a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: Decimal,
}
