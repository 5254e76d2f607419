use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    errors::ServiceError,
    store::RecordStore,
};

/// An item at or below its reorder level at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderAlert {
    pub item_id: Uuid,
    pub item_name: String,
    pub location_id: Uuid,
    pub on_hand_base_units: Decimal,
    pub reorder_level: Decimal,
    pub par_level: Option<Decimal>,
    /// Top-up to par, when a par level is set.
    pub suggested_order_base_units: Option<Decimal>,
}

/// Per-line valuation of a count session at its historical cost snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountLineValuation {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub derived_base_units: Decimal,
    pub unit_cost_snapshot: Decimal,
    pub extended_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountValuation {
    pub count_id: Uuid,
    pub location_id: Uuid,
    pub counted_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub lines: Vec<CountLineValuation>,
}

/// Waste in a period grouped by reason code, costed at current last cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteSummaryRow {
    pub reason_code: String,
    pub base_units: Decimal,
    pub cost: Decimal,
}

/// Back-office reports derived from ledger data: reorder alerts, count
/// valuation, and waste summaries.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn RecordStore>,
    cost_scale: u32,
}

impl ReportService {
    pub fn new(store: Arc<dyn RecordStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            cost_scale: config.cost_scale,
        }
    }

    /// Items at a location sitting at or below their reorder level.
    #[instrument(skip(self))]
    pub async fn reorder_alerts(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<ReorderAlert>, ServiceError> {
        let mut alerts = Vec::new();
        for level in self.store.levels_for_location(location_id).await? {
            let item = self
                .store
                .get_item(level.item_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Inventory item", level.item_id))?;
            let Some(reorder_level) = item.reorder_level else {
                continue;
            };
            if level.on_hand_base_units > reorder_level {
                continue;
            }
            let suggested = item
                .par_level
                .map(|par| (par - level.on_hand_base_units).max(Decimal::ZERO));
            alerts.push(ReorderAlert {
                item_id: item.id,
                item_name: item.name,
                location_id,
                on_hand_base_units: level.on_hand_base_units,
                reorder_level,
                par_level: item.par_level,
                suggested_order_base_units: suggested,
            });
        }
        Ok(alerts)
    }

    /// Values a count session line by line at the cost snapshots captured
    /// when the count was taken. Later price changes never revalue it.
    #[instrument(skip(self))]
    pub async fn count_valuation(&self, count_id: Uuid) -> Result<CountValuation, ServiceError> {
        let count = self
            .store
            .get_count(count_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory count", count_id))?;

        let mut lines = Vec::new();
        let mut total_value = Decimal::ZERO;
        for line in self.store.lines_for_count(count_id).await? {
            let extended_value =
                (line.derived_base_units * line.unit_cost_snapshot).round_dp(self.cost_scale);
            total_value += extended_value;
            lines.push(CountLineValuation {
                line_id: line.id,
                item_id: line.item_id,
                derived_base_units: line.derived_base_units,
                unit_cost_snapshot: line.unit_cost_snapshot,
                extended_value,
            });
        }

        Ok(CountValuation {
            count_id,
            location_id: count.location_id,
            counted_at: count.counted_at,
            total_value,
            lines,
        })
    }

    /// Waste in `(start, end]` grouped by reason code, costed at the items'
    /// current last cost.
    #[instrument(skip(self))]
    pub async fn waste_summary(
        &self,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WasteSummaryRow>, ServiceError> {
        let mut by_reason: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        for waste in self
            .store
            .waste_in_range(location_id, start, Some(end))
            .await?
        {
            let item = self
                .store
                .get_item(waste.item_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Inventory item", waste.item_id))?;
            let cost = waste.derived_base_units * item.last_cost;
            let entry = by_reason
                .entry(waste.reason_code.clone())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += waste.derived_base_units;
            entry.1 += cost;
        }

        Ok(by_reason
            .into_iter()
            .map(|(reason_code, (base_units, cost))| WasteSummaryRow {
                reason_code,
                base_units,
                cost: cost.round_dp(self.cost_scale),
            })
            .collect())
    }
}
