//! Core data model for climate quality control.
//!
//! Daily observations, period aggregates and historical records as they are
//! stored, together with the provenance codes and missing-value sentinels
//! that travel with them.

pub mod category;
pub mod date_range;
pub mod freeze;
pub mod missing;
pub mod observation;
pub mod period;
pub mod provenance;
pub mod record;
pub mod settings;
pub mod toggles;
pub mod weather;
