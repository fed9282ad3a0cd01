//! Cascading reconciliation for climate quality control.
//!
//! When an operator saves an edited daily observation (or a monthly
//! aggregate) the change is diffed into categories, checked against the
//! historical records, and pushed into every stored period aggregate that
//! overlaps the edited date. Aggregate fields entered by hand or taken from
//! the monthly summary message are never overwritten by a rebuild.

pub mod comparator;
pub mod error;
pub mod fields;
pub mod orchestrator;
pub mod rebuilder;
pub mod service;
pub mod tracker;

#[cfg(test)]
mod mock;

pub use error::{ReconError, Target};
pub use orchestrator::{ReconciliationOrchestrator, SaveReport, SaveState};
pub use service::{ClimateService, Confirm};
