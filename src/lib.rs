//! Backline Engine
//!
//! Costing and inventory-reconciliation engine for restaurant back-office
//! operations. The engine is pure computation over a record store reached by
//! entity id: it converts between heterogeneous units of measure, recursively
//! costs recipes that nest other recipes (with yield, waste, and cycle
//! protection), maintains a stock ledger of counts, receipts, transfers, and
//! waste, reconciles theoretical against actual usage, and projects estimated
//! on-hand from the last physical count.
//!
//! Persistence, HTTP transport, UI, and authorization live with the embedding
//! application; see [`store::RecordStore`] for the collaborator boundary.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::{
    config::EngineConfig,
    events::EventSender,
    services::{
        costing::RecipeCostService, ledger::InventoryLedgerService,
        on_hand::OnHandProjectionService, reconciliation::UsageReconciliationService,
        reports::ReportService, units::UnitRegistryService,
    },
    store::RecordStore,
};

/// Fully wired engine: one handle per service, sharing a store and an event
/// channel. Construct once and clone freely.
#[derive(Clone)]
pub struct Engine {
    pub store: Arc<dyn RecordStore>,
    pub event_sender: Arc<EventSender>,
    pub config: EngineConfig,
    pub units: Arc<UnitRegistryService>,
    pub costing: Arc<RecipeCostService>,
    pub ledger: Arc<InventoryLedgerService>,
    pub reconciliation: Arc<UsageReconciliationService>,
    pub on_hand: Arc<OnHandProjectionService>,
    pub reports: Arc<ReportService>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        event_sender: EventSender,
        config: EngineConfig,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        let units = Arc::new(UnitRegistryService::new(store.clone()));
        let costing = Arc::new(RecipeCostService::new(
            store.clone(),
            units.clone(),
            event_sender.clone(),
            &config,
        ));
        let ledger = Arc::new(InventoryLedgerService::new(
            store.clone(),
            units.clone(),
            event_sender.clone(),
            &config,
        ));
        let reconciliation = Arc::new(UsageReconciliationService::new(
            store.clone(),
            costing.clone(),
            &config,
        ));
        let on_hand = Arc::new(OnHandProjectionService::new(store.clone(), costing.clone()));
        let reports = Arc::new(ReportService::new(store.clone(), &config));

        Self {
            store,
            event_sender,
            config,
            units,
            costing,
            ledger,
            reconciliation,
            on_hand,
            reports,
        }
    }
}
