use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::costing::RecipeCostService,
    store::RecordStore,
};

/// Activity type in an on-hand projection breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    Receipt,
    Waste,
    TransferOut,
    SaleUsage,
}

/// One ledger or sales event contributing to the estimate, for audit display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHandActivity {
    pub kind: ActivityKind,
    pub occurred_at: DateTime<Utc>,
    pub base_qty: Decimal,
    /// Id of the originating receipt line, waste log, transfer, or sale.
    pub reference_id: Uuid,
}

/// Point-in-time on-hand estimate: the last physical count plus everything
/// that happened since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnHandEstimate {
    pub item_id: Uuid,
    pub store_id: Uuid,
    /// Timestamp of the baseline count.
    pub counted_at: DateTime<Utc>,
    pub last_count_qty: Decimal,
    pub received_qty: Decimal,
    pub waste_qty: Decimal,
    pub theoretical_usage_qty: Decimal,
    pub transferred_out_qty: Decimal,
    /// `last_count + received - waste - theoretical_usage - transferred_out`.
    pub estimated_on_hand: Decimal,
    /// Itemized contributions, ascending by time.
    pub activity: Vec<OnHandActivity>,
}

/// Projects estimated on-hand for an item at a store from the most recent
/// count and all activity strictly after it.
#[derive(Clone)]
pub struct OnHandProjectionService {
    store: Arc<dyn RecordStore>,
    costing: Arc<RecipeCostService>,
}

impl OnHandProjectionService {
    pub fn new(store: Arc<dyn RecordStore>, costing: Arc<RecipeCostService>) -> Self {
        Self { store, costing }
    }

    /// Returns `None` when the item has never been counted at the store:
    /// reporting "no baseline" beats fabricating a zero one.
    #[instrument(skip(self))]
    pub async fn estimate(
        &self,
        item_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<OnHandEstimate>, ServiceError> {
        let Some((count, baseline_line)) =
            self.store.latest_count_line(item_id, store_id).await?
        else {
            return Ok(None);
        };
        let since = count.counted_at;

        let mut activity = Vec::new();
        let mut received_qty = Decimal::ZERO;
        let mut waste_qty = Decimal::ZERO;
        let mut transferred_out_qty = Decimal::ZERO;
        let mut theoretical_usage_qty = Decimal::ZERO;

        for line in self
            .store
            .receipt_lines_in_range(store_id, since, None)
            .await?
        {
            if line.item_id != item_id {
                continue;
            }
            received_qty += line.derived_base_units;
            activity.push(OnHandActivity {
                kind: ActivityKind::Receipt,
                occurred_at: line.received_at,
                base_qty: line.derived_base_units,
                reference_id: line.id,
            });
        }

        for waste in self.store.waste_in_range(store_id, since, None).await? {
            if waste.item_id != item_id {
                continue;
            }
            waste_qty += waste.derived_base_units;
            activity.push(OnHandActivity {
                kind: ActivityKind::Waste,
                occurred_at: waste.occurred_at,
                base_qty: waste.derived_base_units,
                reference_id: waste.id,
            });
        }

        for transfer in self.store.transfers_in_range(store_id, since, None).await? {
            if transfer.item_id != item_id || transfer.from_location_id != store_id {
                continue;
            }
            transferred_out_qty += transfer.derived_base_units;
            activity.push(OnHandActivity {
                kind: ActivityKind::TransferOut,
                occurred_at: transfer.occurred_at,
                base_qty: transfer.derived_base_units,
                reference_id: transfer.id,
            });
        }

        for sale in self.store.sales_in_range(store_id, since, None).await? {
            let mut sale_usage: HashMap<Uuid, Decimal> = HashMap::new();
            for line in self.store.lines_for_sale(sale.id).await? {
                let menu_item = self
                    .store
                    .get_menu_item(line.menu_item_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Menu item", line.menu_item_id))?;
                if let Some(recipe_id) = menu_item.recipe_id {
                    self.costing
                        .expand_theoretical_usage(recipe_id, line.quantity, &mut sale_usage)
                        .await?;
                }
            }
            if let Some(consumed) = sale_usage.get(&item_id) {
                if !consumed.is_zero() {
                    theoretical_usage_qty += *consumed;
                    activity.push(OnHandActivity {
                        kind: ActivityKind::SaleUsage,
                        occurred_at: sale.sold_at,
                        base_qty: *consumed,
                        reference_id: sale.id,
                    });
                }
            }
        }

        activity.sort_by_key(|a| (a.occurred_at, a.reference_id));

        let last_count_qty = baseline_line.derived_base_units;
        let estimated_on_hand = last_count_qty + received_qty
            - waste_qty
            - theoretical_usage_qty
            - transferred_out_qty;

        Ok(Some(OnHandEstimate {
            item_id,
            store_id,
            counted_at: since,
            last_count_qty,
            received_qty,
            waste_qty,
            theoretical_usage_qty,
            transferred_out_qty,
            estimated_on_hand,
            activity,
        }))
    }
}
