use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_recursion::async_recursion;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    entities::{ComponentRef, Recipe, RecipeComponent},
    errors::ServiceError,
    events::{Event, EventSender},
    services::units::UnitRegistryService,
    store::RecordStore,
};

/// How much of a target item one full yield of a recipe consumes, and what
/// that consumption costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentImpact {
    pub uses_item: bool,
    pub base_qty_consumed: Decimal,
    pub cost_contribution: Decimal,
}

/// One row of the "what recipes use item X" report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUsageReport {
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub base_qty_consumed: Decimal,
    pub cost_contribution: Decimal,
}

/// Input payload for adding a component line to a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddComponentInput {
    pub component: ComponentRef,
    pub qty: Decimal,
    pub unit_id: Uuid,
    pub sort_order: i32,
}

/// Recursive recipe costing with cycle protection.
///
/// Resolution is read-only except for the `computed_cost` cache write at the
/// end, which is an idempotent overwrite and is never read back for
/// correctness, so no locking is needed here.
#[derive(Clone)]
pub struct RecipeCostService {
    store: Arc<dyn RecordStore>,
    units: Arc<UnitRegistryService>,
    event_sender: Arc<EventSender>,
    cost_scale: u32,
    enforce_component_policy: bool,
}

impl RecipeCostService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        units: Arc<UnitRegistryService>,
        event_sender: Arc<EventSender>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            units,
            event_sender,
            cost_scale: config.cost_scale,
            enforce_component_policy: config.enforce_component_policy,
        }
    }

    /// Computes the fully-loaded cost of one full yield of a recipe:
    /// ingredient costs (yield-adjusted), nested sub-recipes (distributed
    /// over their own yields), and the recipe's waste multiplier.
    ///
    /// Fails with `CyclicRecipe` when the component graph loops; a partial
    /// cost is never returned.
    #[instrument(skip(self))]
    pub async fn resolve_recipe_cost(&self, recipe_id: Uuid) -> Result<Decimal, ServiceError> {
        let mut visited = HashSet::new();
        let total = self.cost_per_yield(recipe_id, &mut visited).await?;
        let cost = total.round_dp(self.cost_scale);

        // Refresh the cache. Failure here only loses the optimization.
        match self.store.get_recipe(recipe_id).await {
            Ok(Some(mut recipe)) => {
                recipe.computed_cost = Some(cost);
                if let Err(e) = self.store.update_recipe(recipe).await {
                    warn!(%recipe_id, error = %e, "failed to cache computed cost");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(%recipe_id, error = %e, "failed to cache computed cost"),
        }

        self.event_sender
            .send_or_log(Event::RecipeCostComputed {
                recipe_id,
                cost_per_yield: cost,
            })
            .await;

        Ok(cost)
    }

    /// Depth-first scan reporting whether (and how much) a recipe transitively
    /// consumes a target item, per full yield of the recipe.
    #[instrument(skip(self))]
    pub async fn resolve_component_impact(
        &self,
        recipe_id: Uuid,
        target_item_id: Uuid,
    ) -> Result<ComponentImpact, ServiceError> {
        let mut visited = HashSet::new();
        self.component_impact(recipe_id, target_item_id, &mut visited)
            .await
    }

    /// Scans every recipe for direct or nested use of an item. Used for
    /// price-sensitivity reporting.
    #[instrument(skip(self))]
    pub async fn recipes_using_item(
        &self,
        target_item_id: Uuid,
    ) -> Result<Vec<ItemUsageReport>, ServiceError> {
        let mut reports = Vec::new();
        for recipe in self.store.list_recipes().await? {
            let impact = self.resolve_component_impact(recipe.id, target_item_id).await?;
            if impact.uses_item {
                reports.push(ItemUsageReport {
                    recipe_id: recipe.id,
                    recipe_name: recipe.name,
                    base_qty_consumed: impact.base_qty_consumed,
                    cost_contribution: impact.cost_contribution,
                });
            }
        }
        Ok(reports)
    }

    /// Accumulates the per-ingredient base-unit consumption of `multiplier`
    /// yields of a recipe into `usage`. The same traversal as costing, reused
    /// for quantities; the waste multiplier does not apply.
    pub async fn expand_theoretical_usage(
        &self,
        recipe_id: Uuid,
        multiplier: Decimal,
        usage: &mut HashMap<Uuid, Decimal>,
    ) -> Result<(), ServiceError> {
        let mut visited = HashSet::new();
        self.accumulate_usage(recipe_id, multiplier, &mut visited, usage)
            .await
    }

    /// Adds a component line after checking the target exists, the
    /// `can_be_ingredient` policy, and that the insertion cannot close a
    /// cycle. The parent's cached cost is recomputed eagerly.
    #[instrument(skip(self, input))]
    pub async fn add_component(
        &self,
        recipe_id: Uuid,
        input: AddComponentInput,
    ) -> Result<Uuid, ServiceError> {
        self.fetch_recipe(recipe_id).await?;
        if input.qty <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "component quantity must be positive, got {}",
                input.qty
            )));
        }
        self.units.get_unit(input.unit_id).await?;

        match input.component {
            ComponentRef::InventoryItem(item_id) => {
                self.store
                    .get_item(item_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
            }
            ComponentRef::Recipe(sub_recipe_id) => {
                let sub = self.fetch_recipe(sub_recipe_id).await?;
                if self.enforce_component_policy && !sub.can_be_ingredient {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Recipe {} cannot be used as an ingredient",
                        sub_recipe_id
                    )));
                }
                let mut probed = HashSet::new();
                if sub_recipe_id == recipe_id
                    || self.reaches_recipe(sub_recipe_id, recipe_id, &mut probed).await?
                {
                    return Err(ServiceError::CyclicRecipe(recipe_id));
                }
            }
        }

        let component = RecipeComponent {
            id: Uuid::new_v4(),
            recipe_id,
            component: input.component,
            qty: input.qty,
            unit_id: input.unit_id,
            sort_order: input.sort_order,
        };
        let component_id = component.id;
        self.store.insert_component(component).await?;

        self.event_sender
            .send_or_log(Event::RecipeComponentAdded {
                recipe_id,
                component_id,
            })
            .await;

        // Write-time cache refresh keeps the parent's cached cost current.
        self.resolve_recipe_cost(recipe_id).await?;

        Ok(component_id)
    }

    async fn fetch_recipe(&self, recipe_id: Uuid) -> Result<Recipe, ServiceError> {
        self.store
            .get_recipe(recipe_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recipe", recipe_id))
    }

    /// Yield of a recipe expressed in base units. Zero is tolerated; callers
    /// treat it as "contributes nothing" rather than dividing by it.
    async fn yield_base_qty(&self, recipe: &Recipe) -> Result<Decimal, ServiceError> {
        let yield_unit = self.units.get_unit(recipe.yield_unit_id).await?;
        Ok(yield_unit.to_base(recipe.yield_qty))
    }

    #[async_recursion]
    async fn cost_per_yield(
        &self,
        recipe_id: Uuid,
        visited: &mut HashSet<Uuid>,
    ) -> Result<Decimal, ServiceError> {
        if !visited.insert(recipe_id) {
            return Err(ServiceError::CyclicRecipe(recipe_id));
        }

        let recipe = self.fetch_recipe(recipe_id).await?;
        let components = self.store.components_for_recipe(recipe_id).await?;

        let mut total = Decimal::ZERO;
        for component in &components {
            let base_qty = self
                .units
                .convert_to_base(component.qty, component.unit_id)
                .await?;

            match component.component {
                ComponentRef::InventoryItem(item_id) => {
                    let item = self
                        .store
                        .get_item(item_id)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
                    total += base_qty * item.effective_cost_per_base_unit();
                }
                ComponentRef::Recipe(sub_recipe_id) => {
                    let sub_cost = self.cost_per_yield(sub_recipe_id, visited).await?;
                    let sub = self.fetch_recipe(sub_recipe_id).await?;
                    let sub_yield_base = self.yield_base_qty(&sub).await?;
                    if !sub_yield_base.is_zero() {
                        total += base_qty * (sub_cost / sub_yield_base);
                    }
                }
            }
        }

        visited.remove(&recipe_id);

        let waste_percent = recipe.waste_percent.max(Decimal::ZERO);
        Ok(total * (Decimal::ONE + waste_percent / Decimal::ONE_HUNDRED))
    }

    #[async_recursion]
    async fn component_impact(
        &self,
        recipe_id: Uuid,
        target_item_id: Uuid,
        visited: &mut HashSet<Uuid>,
    ) -> Result<ComponentImpact, ServiceError> {
        if !visited.insert(recipe_id) {
            return Err(ServiceError::CyclicRecipe(recipe_id));
        }

        self.fetch_recipe(recipe_id).await?;
        let components = self.store.components_for_recipe(recipe_id).await?;

        let mut uses_item = false;
        let mut base_qty_consumed = Decimal::ZERO;
        let mut cost_contribution = Decimal::ZERO;

        for component in &components {
            let base_qty = self
                .units
                .convert_to_base(component.qty, component.unit_id)
                .await?;

            match component.component {
                ComponentRef::InventoryItem(item_id) if item_id == target_item_id => {
                    let item = self
                        .store
                        .get_item(item_id)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;
                    uses_item = true;
                    base_qty_consumed += base_qty;
                    cost_contribution += base_qty * item.effective_cost_per_base_unit();
                }
                ComponentRef::InventoryItem(_) => {}
                ComponentRef::Recipe(sub_recipe_id) => {
                    let sub_impact = self
                        .component_impact(sub_recipe_id, target_item_id, visited)
                        .await?;
                    if sub_impact.uses_item {
                        uses_item = true;
                        let sub = self.fetch_recipe(sub_recipe_id).await?;
                        let sub_yield_base = self.yield_base_qty(&sub).await?;
                        if !sub_yield_base.is_zero() {
                            let scale = base_qty / sub_yield_base;
                            base_qty_consumed += sub_impact.base_qty_consumed * scale;
                            cost_contribution += sub_impact.cost_contribution * scale;
                        }
                    }
                }
            }
        }

        visited.remove(&recipe_id);

        Ok(ComponentImpact {
            uses_item,
            base_qty_consumed,
            cost_contribution,
        })
    }

    #[async_recursion]
    async fn accumulate_usage(
        &self,
        recipe_id: Uuid,
        multiplier: Decimal,
        visited: &mut HashSet<Uuid>,
        usage: &mut HashMap<Uuid, Decimal>,
    ) -> Result<(), ServiceError> {
        if !visited.insert(recipe_id) {
            return Err(ServiceError::CyclicRecipe(recipe_id));
        }

        self.fetch_recipe(recipe_id).await?;
        let components = self.store.components_for_recipe(recipe_id).await?;

        for component in &components {
            let base_qty = self
                .units
                .convert_to_base(component.qty, component.unit_id)
                .await?;

            match component.component {
                ComponentRef::InventoryItem(item_id) => {
                    *usage.entry(item_id).or_insert(Decimal::ZERO) += base_qty * multiplier;
                }
                ComponentRef::Recipe(sub_recipe_id) => {
                    let sub = self.fetch_recipe(sub_recipe_id).await?;
                    let sub_yield_base = self.yield_base_qty(&sub).await?;
                    if sub_yield_base.is_zero() {
                        continue;
                    }
                    self.accumulate_usage(
                        sub_recipe_id,
                        multiplier * (base_qty / sub_yield_base),
                        visited,
                        usage,
                    )
                    .await?;
                }
            }
        }

        visited.remove(&recipe_id);
        Ok(())
    }

    /// Cycle probe used before inserting a recipe-typed component: does the
    /// graph rooted at `start` reach `needle`? Revisits are skipped, not
    /// errors, so a probe over already-corrupt data still terminates.
    #[async_recursion]
    async fn reaches_recipe(
        &self,
        start: Uuid,
        needle: Uuid,
        visited: &mut HashSet<Uuid>,
    ) -> Result<bool, ServiceError> {
        if !visited.insert(start) {
            return Ok(false);
        }
        for component in self.store.components_for_recipe(start).await? {
            if let ComponentRef::Recipe(sub_recipe_id) = component.component {
                if sub_recipe_id == needle
                    || self.reaches_recipe(sub_recipe_id, needle, visited).await?
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
