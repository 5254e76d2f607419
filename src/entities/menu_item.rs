use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable menu item. Selling one consumes one expansion of the linked
/// recipe's component list; items without a recipe (bottled drinks, fees)
/// drive no theoretical usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub recipe_id: Option<Uuid>,
    pub price: Decimal,
}
