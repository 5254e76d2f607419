use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    errors::ServiceError,
    services::costing::RecipeCostService,
    store::RecordStore,
};

/// Per-item variance between what sales say should have been used and what
/// the counts say actually left the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageVariance {
    pub item_id: Uuid,
    pub item_name: String,
    pub theoretical_base_units: Decimal,
    pub actual_base_units: Decimal,
    /// `actual - theoretical`. Positive signals shrinkage or over-portioning;
    /// negative signals under-portioning or data error.
    pub variance_base_units: Decimal,
    pub variance_cost: Decimal,
    pub variance_percent: Decimal,
}

/// Derives theoretical usage (recipe fan-out over recorded sales) and actual
/// usage (ledger deltas between two bracketing counts), and their variance.
///
/// Every operation takes an explicit location; the engine carries no ambient
/// selected-store state.
#[derive(Clone)]
pub struct UsageReconciliationService {
    store: Arc<dyn RecordStore>,
    costing: Arc<RecipeCostService>,
    cost_scale: u32,
}

impl UsageReconciliationService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        costing: Arc<RecipeCostService>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            costing,
            cost_scale: config.cost_scale,
        }
    }

    /// Ingredient consumption implied by recorded sales in `(start, end]`:
    /// each sale line's menu-item recipe is recursively expanded to base
    /// units and scaled by quantity sold. Menu items without a recipe
    /// contribute nothing.
    #[instrument(skip(self))]
    pub async fn theoretical_usage(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let sales = self
            .store
            .sales_in_range(location_id, start, Some(end))
            .await?;

        let mut usage = HashMap::new();
        for sale in &sales {
            for line in self.store.lines_for_sale(sale.id).await? {
                let menu_item = self
                    .store
                    .get_menu_item(line.menu_item_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Menu item", line.menu_item_id))?;
                if let Some(recipe_id) = menu_item.recipe_id {
                    self.costing
                        .expand_theoretical_usage(recipe_id, line.quantity, &mut usage)
                        .await?;
                }
            }
        }
        Ok(usage)
    }

    /// Ingredient consumption implied by the change in physical counts:
    /// `actual = starting + receipts_between - ending`, per item, between the
    /// earliest and latest count in range at the location.
    ///
    /// Fewer than two counts in range returns an empty map, not an error;
    /// variance cannot be computed without two anchor points.
    #[instrument(skip(self))]
    pub async fn actual_usage(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let counts = self.store.counts_in_range(location_id, start, end).await?;
        if counts.len() < 2 {
            return Ok(HashMap::new());
        }
        let opening = &counts[0];
        let closing = &counts[counts.len() - 1];

        let opening_by_item = self.count_totals(opening.id).await?;
        let closing_by_item = self.count_totals(closing.id).await?;

        let mut receipts_by_item: HashMap<Uuid, Decimal> = HashMap::new();
        for line in self
            .store
            .receipt_lines_in_range(location_id, opening.counted_at, Some(closing.counted_at))
            .await?
        {
            *receipts_by_item.entry(line.item_id).or_insert(Decimal::ZERO) +=
                line.derived_base_units;
        }

        // Only items anchored by at least one bracketing count; a zero
        // on-hand for an uncounted item would be fabricated, not observed.
        let mut item_ids: HashSet<Uuid> = opening_by_item.keys().copied().collect();
        item_ids.extend(closing_by_item.keys().copied());

        let mut actual = HashMap::new();
        for item_id in item_ids {
            let starting = opening_by_item.get(&item_id).copied().unwrap_or(Decimal::ZERO);
            let ending = closing_by_item.get(&item_id).copied().unwrap_or(Decimal::ZERO);
            let received = receipts_by_item.get(&item_id).copied().unwrap_or(Decimal::ZERO);
            actual.insert(item_id, starting + received - ending);
        }
        Ok(actual)
    }

    /// Variance rows for every item with theoretical or actual usage in the
    /// period, sorted by descending absolute variance cost. Empty when actual
    /// usage has no bracketing counts.
    #[instrument(skip(self))]
    pub async fn usage_variance(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageVariance>, ServiceError> {
        let actual = self.actual_usage(location_id, start, end).await?;
        if actual.is_empty() {
            return Ok(Vec::new());
        }
        let theoretical = self.theoretical_usage(location_id, start, end).await?;

        let mut item_ids: HashSet<Uuid> = actual.keys().copied().collect();
        item_ids.extend(theoretical.keys().copied());

        let mut rows = Vec::with_capacity(item_ids.len());
        for item_id in item_ids {
            let item = self
                .store
                .get_item(item_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Inventory item", item_id))?;

            let theoretical_qty = theoretical.get(&item_id).copied().unwrap_or(Decimal::ZERO);
            let actual_qty = actual.get(&item_id).copied().unwrap_or(Decimal::ZERO);
            let variance = actual_qty - theoretical_qty;
            let variance_percent = if theoretical_qty > Decimal::ZERO {
                variance / theoretical_qty * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };

            rows.push(UsageVariance {
                item_id,
                item_name: item.name,
                theoretical_base_units: theoretical_qty,
                actual_base_units: actual_qty,
                variance_base_units: variance,
                variance_cost: (variance * item.last_cost).round_dp(self.cost_scale),
                variance_percent,
            });
        }

        rows.sort_by(|a, b| {
            b.variance_cost
                .abs()
                .cmp(&a.variance_cost.abs())
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Ok(rows)
    }

    async fn count_totals(
        &self,
        count_id: Uuid,
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let mut totals = HashMap::new();
        for line in self.store.lines_for_count(count_id).await? {
            *totals.entry(line.item_id).or_insert(Decimal::ZERO) += line.derived_base_units;
        }
        Ok(totals)
    }
}
