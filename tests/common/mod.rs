//! Shared harness for integration tests: an engine over a fresh in-memory
//! store, plus seed helpers for master data and sales fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;
use uuid::Uuid;

use backline_engine::{
    config::EngineConfig,
    entities::{
        ComponentRef, InventoryItem, MenuItem, Recipe, RecipeComponent, Sale, SaleLine, UnitKind,
        UnitSystem,
    },
    events::{self, Event},
    services::units::RegisterUnitInput,
    Engine,
};

pub struct TestEngine {
    pub engine: Engine,
    /// Kept alive so `send_or_log` on mutation paths never backs up.
    pub events: mpsc::Receiver<Event>,
}

impl TestEngine {
    pub fn new() -> Self {
        backline_engine::logging::init_tracing("warn");
        let config = EngineConfig::default();
        let (event_sender, events) = events::channel(config.event_buffer_size);
        let engine = Engine::new(
            Arc::new(backline_engine::store::InMemoryStore::new()),
            event_sender,
            config,
        );
        Self { engine, events }
    }
}

/// Noon UTC on a fixed June day, for deterministic period math.
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, d, 12, 0, 0).unwrap()
}

pub async fn create_unit(
    engine: &Engine,
    name: &str,
    kind: UnitKind,
    to_base_ratio: Decimal,
) -> Uuid {
    engine
        .units
        .register_unit(RegisterUnitInput {
            name: name.to_string(),
            kind,
            to_base_ratio,
            system: UnitSystem::Us,
        })
        .await
        .expect("failed to register unit")
}

/// An ounce-style unit: ratio 1 to its base.
pub async fn create_base_unit(engine: &Engine, name: &str) -> Uuid {
    create_unit(engine, name, UnitKind::Mass, dec!(1)).await
}

pub async fn create_item(
    engine: &Engine,
    name: &str,
    unit_id: Uuid,
    last_cost: Decimal,
    yield_percent: Decimal,
) -> Uuid {
    let item = InventoryItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        unit_id,
        case_size: dec!(1),
        last_cost,
        yield_percent,
        par_level: None,
        reorder_level: None,
        storage_location_ids: Vec::new(),
    };
    let id = item.id;
    engine.store.insert_item(item).await.expect("insert item");
    id
}

pub async fn create_recipe(
    engine: &Engine,
    name: &str,
    yield_qty: Decimal,
    yield_unit_id: Uuid,
    waste_percent: Decimal,
) -> Uuid {
    let recipe = Recipe {
        id: Uuid::new_v4(),
        name: name.to_string(),
        yield_qty,
        yield_unit_id,
        waste_percent,
        can_be_ingredient: true,
        computed_cost: None,
    };
    let id = recipe.id;
    engine
        .store
        .insert_recipe(recipe)
        .await
        .expect("insert recipe");
    id
}

/// Inserts a component row directly, bypassing the service's policy and
/// cycle checks. Fixtures use this to build graphs the service would refuse.
pub async fn attach_component(
    engine: &Engine,
    recipe_id: Uuid,
    component: ComponentRef,
    qty: Decimal,
    unit_id: Uuid,
    sort_order: i32,
) -> Uuid {
    let row = RecipeComponent {
        id: Uuid::new_v4(),
        recipe_id,
        component,
        qty,
        unit_id,
        sort_order,
    };
    let id = row.id;
    engine
        .store
        .insert_component(row)
        .await
        .expect("insert component");
    id
}

pub async fn create_menu_item(engine: &Engine, name: &str, recipe_id: Option<Uuid>) -> Uuid {
    let menu_item = MenuItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        recipe_id,
        price: dec!(12.00),
    };
    let id = menu_item.id;
    engine
        .store
        .insert_menu_item(menu_item)
        .await
        .expect("insert menu item");
    id
}

/// Records a sale of the given menu-item quantities at a location.
pub async fn record_sale(
    engine: &Engine,
    location_id: Uuid,
    sold_at: DateTime<Utc>,
    lines: &[(Uuid, Decimal)],
) -> Uuid {
    let sale = Sale {
        id: Uuid::new_v4(),
        location_id,
        sold_at,
    };
    let sale_id = sale.id;
    engine.store.insert_sale(sale).await.expect("insert sale");
    for (menu_item_id, quantity) in lines {
        engine
            .store
            .insert_sale_line(SaleLine {
                id: Uuid::new_v4(),
                sale_id,
                menu_item_id: *menu_item_id,
                quantity: *quantity,
            })
            .await
            .expect("insert sale line");
    }
    sale_id
}
