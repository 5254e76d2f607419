use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Measurement kind. Units only ever convert within a single kind; each kind
/// has one base unit that every ratio is expressed against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitKind {
    Mass,
    Volume,
    Count,
}

/// Measurement system a unit belongs to. Informational only; conversion goes
/// through `to_base_ratio` regardless of system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitSystem {
    Us,
    Metric,
}

/// A unit of measure. Reference data: created at setup, rarely mutated,
/// never deleted while referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub kind: UnitKind,
    /// Multiplicative factor from one of this unit to one base unit of its
    /// kind. Invariant: strictly positive.
    pub to_base_ratio: Decimal,
    pub system: UnitSystem,
}

impl Unit {
    /// Expresses `qty` of this unit in base units.
    pub fn to_base(&self, qty: Decimal) -> Decimal {
        qty * self.to_base_ratio
    }

    /// Expresses `base_qty` base units in this unit.
    pub fn from_base(&self, base_qty: Decimal) -> Decimal {
        base_qty / self.to_base_ratio
    }
}
