//! In-memory SQLite climate store.
//!
//! Loads daily observations, historical records, period aggregates and
//! freeze dates from fixture files into an in-memory SQLite database and
//! serves them to the reconciliation engine through
//! [`clqc_recon::ClimateService`].
//!
//! # Usage
//!
//! ```rust
//! use clqc_db::Database;
//! use chrono::NaiveDate;
//!
//! let db = Database::new().unwrap();
//! db.load_daily_csv("station_id,date,max_temp,min_temp\nKSEA,2024-01-15,50,30\n").unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let obs = db.query_daily("KSEA", date).unwrap().unwrap();
//! assert_eq!(obs.max_temp, 50);
//! assert_eq!(obs.num_heat, 25);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod schema;
mod export;
mod loader;
mod queries;
mod service;

use clqc_core::settings::ClimateThresholds;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

/// In-memory SQLite database holding one or more stations' climate data.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
    thresholds: ClimateThresholds,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    ///
    /// The database is empty after creation; use the `load_*` methods
    /// to populate it.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
            thresholds: ClimateThresholds::default(),
        })
    }

    /// Thresholds used for the custom day counts when rebuilding aggregates.
    pub fn with_thresholds(mut self, thresholds: ClimateThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> &ClimateThresholds {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_creates_successfully() {
        let db = Database::new();
        assert!(db.is_ok(), "Database should create without errors");
    }

    #[test]
    fn database_is_cloneable() {
        let db = Database::new().unwrap();
        let db2 = db.clone();
        db.load_daily_csv("station_id,date,max_temp\nKSEA,2024-01-15,50\n")
            .unwrap();
        let rows = db2.query_station_dailies("KSEA").unwrap();
        assert_eq!(rows.len(), 1, "Clone should see same data via shared Rc");
    }

    #[test]
    fn database_starts_empty() {
        let db = Database::new().unwrap();
        assert!(db.query_station_dailies("KSEA").unwrap().is_empty());
        assert!(db.query_station_aggregates("KSEA").unwrap().is_empty());
    }

    #[test]
    fn thresholds_default_to_missing() {
        let t1 = ClimateThresholds { t1: 95, ..Default::default() };
        let db = Database::new().unwrap().with_thresholds(t1);
        assert_eq!(db.thresholds().t1, 95);
        assert_eq!(Database::new().unwrap().thresholds().t1, clqc_core::missing::MISSING);
    }
}
