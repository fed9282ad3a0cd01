//! Command implementations for CLQC CLI.
//!
//! Each command loads a fixture directory into an in-memory store, runs one
//! edit or rebuild through the reconciliation engine, and prints the result
//! as JSON on stdout.

use clap::Subcommand;
use clqc_core::period::PeriodType;
use clqc_core::settings::ReconSettings;
use clqc_utils::dates::parse_date_any;
use serde::Serialize;
use std::path::PathBuf;

pub mod confirm;
pub mod edit;
pub mod qc;

use confirm::Confirmer;
use edit::parse_assignments;

#[derive(Subcommand)]
pub enum Command {
    /// Edit one day's observation and reconcile records and aggregates
    QcDaily {
        /// Directory holding daily.csv, records.csv, aggregates.json and freeze.csv
        #[arg(short = 'd', long)]
        data_dir: PathBuf,

        /// Station identifier
        #[arg(short = 's', long)]
        station: String,

        /// Observation date (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,

        /// Field edit such as max_temp=55, precip=T or weather=RA;FG (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,

        /// Answer yes to every confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Settings JSON (thresholds, freeze date redetermination)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Write the station's reconciled fixtures to this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Edit a stored monthly, seasonal or annual aggregate
    QcPeriod {
        /// Directory holding daily.csv, records.csv, aggregates.json and freeze.csv
        #[arg(short = 'd', long)]
        data_dir: PathBuf,

        /// Station identifier
        #[arg(short = 's', long)]
        station: String,

        /// Period type: monthly, seasonal or annual
        #[arg(short = 'p', long)]
        period: String,

        /// Any date inside the period (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,

        /// Field edit such as max_temp=61 (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,

        /// Answer yes to every confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Settings JSON (thresholds, freeze date redetermination)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Write the station's reconciled fixtures to this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Rebuild an aggregate from daily observations and print it
    Rebuild {
        /// Directory holding daily.csv and the other fixtures
        #[arg(short = 'd', long)]
        data_dir: PathBuf,

        /// Station identifier
        #[arg(short = 's', long)]
        station: String,

        /// Period type: monthly, seasonal or annual
        #[arg(short = 'p', long)]
        period: String,

        /// Any date inside the period (YYYY-MM-DD or YYYYMMDD)
        #[arg(long)]
        date: String,

        /// Settings JSON (thresholds)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::QcDaily {
            data_dir,
            station,
            date,
            set,
            yes,
            settings,
            export,
        } => {
            let settings = ReconSettings::load(settings.as_deref())?;
            let date = parse_date_any(&date)?;
            let edits = parse_assignments(&set)?;
            let db = qc::open_store(&data_dir, &settings)?;
            let confirm = Confirmer::new(std::io::stdin().lock(), yes);
            let report = qc::qc_daily(&db, &station, date, &edits, settings, confirm)?;
            qc::log_summary(&report);
            print_json(&report)?;
            if let Some(dir) = export {
                db.export_fixture_dir(&station, &dir)?;
            }
            Ok(())
        }
        Command::QcPeriod {
            data_dir,
            station,
            period,
            date,
            set,
            yes,
            settings,
            export,
        } => {
            let settings = ReconSettings::load(settings.as_deref())?;
            let period_type: PeriodType = period.parse()?;
            let date = parse_date_any(&date)?;
            let edits = parse_assignments(&set)?;
            let db = qc::open_store(&data_dir, &settings)?;
            let confirm = Confirmer::new(std::io::stdin().lock(), yes);
            let report =
                qc::qc_period(&db, &station, period_type, date, &edits, settings, confirm)?;
            qc::log_summary(&report);
            print_json(&report)?;
            if let Some(dir) = export {
                db.export_fixture_dir(&station, &dir)?;
            }
            Ok(())
        }
        Command::Rebuild {
            data_dir,
            station,
            period,
            date,
            settings,
        } => {
            let settings = ReconSettings::load(settings.as_deref())?;
            let period_type: PeriodType = period.parse()?;
            let date = parse_date_any(&date)?;
            let db = qc::open_store(&data_dir, &settings)?;
            print_json(&qc::rebuild(&db, &station, period_type, date)?)
        }
    }
}
