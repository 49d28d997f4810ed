//! CSV telemetry export for episode step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::env::types::StepRecord;

/// Schema v1 column header for CSV telemetry export.
const HEADER: &str = "step,time_hr,price_per_kwh,load_kw,solar_kw,wind_kw,\
                      generation_kw,curtailed_kw,battery_kw,battery_soc,\
                      battery_soh,battery_temp_c,ev_charge_kw,ev_active_sessions,\
                      grid_kw,shortfall_kw,spill_kw,energy_cost,emissions_kg,\
                      degradation_cost,safety_penalty,reward,violation_count,unmet_demand";

/// Exports episode records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step using the schema
/// v1 column layout. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes episode records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in records {
        wtr.write_record(&[
            r.step.to_string(),
            format!("{:.2}", r.time_hr),
            format!("{:.4}", r.price_per_kwh),
            format!("{:.4}", r.load_kw),
            format!("{:.4}", r.solar_kw),
            format!("{:.4}", r.wind_kw),
            format!("{:.4}", r.generation_kw),
            format!("{:.4}", r.curtailed_kw),
            format!("{:.4}", r.battery_kw),
            format!("{:.4}", r.battery_soc),
            format!("{:.6}", r.battery_soh),
            format!("{:.2}", r.battery_temp_c),
            format!("{:.4}", r.ev_charge_kw),
            r.ev_active_sessions.to_string(),
            format!("{:.4}", r.grid_kw),
            format!("{:.4}", r.shortfall_kw),
            format!("{:.4}", r.spill_kw),
            format!("{:.4}", r.energy_cost),
            format!("{:.4}", r.emissions_kg),
            format!("{:.4}", r.degradation_cost),
            format!("{:.4}", r.safety_penalty),
            format!("{:.4}", r.reward),
            r.violation_count.to_string(),
            r.unmet_demand.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
