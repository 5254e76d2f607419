// Core engine services
pub mod costing;
pub mod ledger;
pub mod on_hand;
pub mod reconciliation;
pub mod units;

// Derived reporting over ledger data
pub mod reports;
