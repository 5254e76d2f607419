use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recipe producing `yield_qty` of `yield_unit_id` per batch. Cost is
/// distributed over that yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub yield_qty: Decimal,
    pub yield_unit_id: Uuid,
    /// Batch-level loss multiplier applied to total ingredient cost.
    /// Non-negative; zero means no adjustment.
    pub waste_percent: Decimal,
    /// Whether this recipe may appear as a component of other recipes.
    pub can_be_ingredient: bool,
    /// Cached output of the cost resolver. Purely an optimization: resolution
    /// always recomputes, and this value is never read for correctness.
    pub computed_cost: Option<Decimal>,
}

/// What a recipe component points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ComponentRef {
    InventoryItem(Uuid),
    Recipe(Uuid),
}

/// One line of a recipe. Components form a directed graph (recipe ->
/// component -> possibly another recipe) which must stay acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeComponent {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub component: ComponentRef,
    pub qty: Decimal,
    pub unit_id: Uuid,
    pub sort_order: i32,
}
