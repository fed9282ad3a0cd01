//! SQL schema for the in-memory climate store.
//!
//! Each stored entity keeps its identifying columns in SQL and the full
//! record as a JSON `payload`. Daily minimum temperature is also kept as a
//! column so freeze dates can be found with a plain query.

/// Returns the full SQL schema as a single batch string.
///
/// Tables:
/// - `daily_observations` - one row per station and date
/// - `extreme_records` - historical records per station and calendar day
/// - `period_records` - historical records per station, period type and month
/// - `period_aggregates` - monthly, seasonal and annual aggregates
/// - `freeze_dates` - early and late freeze per station and freeze season
///
/// Dates are stored as `YYYY-MM-DD` text so they sort chronologically.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS daily_observations (
        station_id TEXT NOT NULL,
        date TEXT NOT NULL,
        min_temp INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (station_id, date)
    );
    CREATE INDEX IF NOT EXISTS idx_daily_station ON daily_observations(station_id);
    CREATE INDEX IF NOT EXISTS idx_daily_date ON daily_observations(date);

    CREATE TABLE IF NOT EXISTS extreme_records (
        station_id TEXT NOT NULL,
        month INTEGER NOT NULL,
        day INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (station_id, month, day)
    );

    CREATE TABLE IF NOT EXISTS period_records (
        station_id TEXT NOT NULL,
        period_type TEXT NOT NULL,
        month INTEGER NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (station_id, period_type, month)
    );

    CREATE TABLE IF NOT EXISTS period_aggregates (
        station_id TEXT NOT NULL,
        period_type TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        payload TEXT NOT NULL,
        PRIMARY KEY (station_id, period_type, start_date, end_date)
    );
    CREATE INDEX IF NOT EXISTS idx_period_station ON period_aggregates(station_id);

    CREATE TABLE IF NOT EXISTS freeze_dates (
        station_id TEXT NOT NULL,
        season_start TEXT NOT NULL,
        season_end TEXT NOT NULL,
        early_freeze TEXT,
        late_freeze TEXT,
        PRIMARY KEY (station_id, season_start)
    );
    "#
}
