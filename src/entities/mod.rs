//! Plain data model for the engine.
//!
//! Every entity is addressed by an opaque [`uuid::Uuid`] and carries
//! quantities and monetary amounts as [`rust_decimal::Decimal`]. The engine
//! does not own persistence; these types are what crosses the
//! [`RecordStore`](crate::store::RecordStore) boundary.

pub mod count;
pub mod inventory_item;
pub mod inventory_level;
pub mod menu_item;
pub mod receipt;
pub mod recipe;
pub mod sale;
pub mod transfer;
pub mod unit;
pub mod waste;

pub use count::{InventoryCount, InventoryCountLine};
pub use inventory_item::InventoryItem;
pub use inventory_level::InventoryLevel;
pub use menu_item::MenuItem;
pub use receipt::ReceiptLine;
pub use recipe::{ComponentRef, Recipe, RecipeComponent};
pub use sale::{Sale, SaleLine};
pub use transfer::TransferLog;
pub use unit::{Unit, UnitKind, UnitSystem};
pub use waste::WasteLog;
