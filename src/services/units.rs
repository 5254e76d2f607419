use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{Unit, UnitKind, UnitSystem},
    errors::ServiceError,
    store::RecordStore,
};

/// Input payload for registering a unit of measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUnitInput {
    pub name: String,
    pub kind: UnitKind,
    pub to_base_ratio: Decimal,
    pub system: UnitSystem,
}

/// Canonical units of measure and conversion to/from each kind's base unit.
///
/// The registry does not validate kind compatibility across a conversion;
/// matching kinds is the caller's responsibility.
#[derive(Clone)]
pub struct UnitRegistryService {
    store: Arc<dyn RecordStore>,
}

impl UnitRegistryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Registers a unit after checking its ratio is strictly positive.
    #[instrument(skip(self, input))]
    pub async fn register_unit(&self, input: RegisterUnitInput) -> Result<Uuid, ServiceError> {
        if input.to_base_ratio <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "unit {} must have a positive base ratio, got {}",
                input.name, input.to_base_ratio
            )));
        }

        let unit = Unit {
            id: Uuid::new_v4(),
            name: input.name,
            kind: input.kind,
            to_base_ratio: input.to_base_ratio,
            system: input.system,
        };
        let id = unit.id;
        self.store.insert_unit(unit).await?;
        Ok(id)
    }

    pub async fn get_unit(&self, unit_id: Uuid) -> Result<Unit, ServiceError> {
        self.store
            .get_unit(unit_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Unit", unit_id))
    }

    /// `qty * to_base_ratio`. Unknown unit ids fail with `NotFound`.
    #[instrument(skip(self))]
    pub async fn convert_to_base(
        &self,
        qty: Decimal,
        unit_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let unit = self.get_unit(unit_id).await?;
        Ok(unit.to_base(qty))
    }

    /// `base_qty / to_base_ratio`. Unknown unit ids fail with `NotFound`.
    #[instrument(skip(self))]
    pub async fn convert_from_base(
        &self,
        base_qty: Decimal,
        unit_id: Uuid,
    ) -> Result<Decimal, ServiceError> {
        let unit = self.get_unit(unit_id).await?;
        if unit.to_base_ratio <= Decimal::ZERO {
            return Err(ServiceError::validation(format!(
                "unit {} has a non-positive base ratio",
                unit_id
            )));
        }
        Ok(unit.from_base(base_qty))
    }
}
