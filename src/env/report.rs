//! Post-hoc episode report computation from step records.

use std::fmt;

use super::types::StepRecord;

/// Aggregate episode indicators derived from a complete step record.
///
/// Computed post-hoc from `&[StepRecord]` so reported numbers always agree
/// with the per-step data.
#[derive(Debug, Clone)]
pub struct EpisodeReport {
    /// Steps executed.
    pub steps: usize,
    /// Sum of step rewards.
    pub total_reward: f32,
    /// Sum of net energy costs.
    pub total_energy_cost: f32,
    /// Sum of import emissions (kg CO2).
    pub total_emissions_kg: f32,
    /// Sum of degradation costs.
    pub total_degradation_cost: f32,
    /// Sum of safety penalties.
    pub total_safety_penalty: f32,
    /// Total violations across the episode.
    pub violation_count: usize,
    /// Steps on which any demand went unmet.
    pub unmet_steps: usize,
    /// Renewable energy deliberately discarded (kWh).
    pub curtailed_kwh: f32,
    /// Peak grid import (kW).
    pub peak_import_kw: f32,
    /// Peak grid export (kW, positive magnitude).
    pub peak_export_kw: f32,
    /// Battery terminal throughput (kWh).
    pub battery_throughput_kwh: f32,
    /// Battery equivalent full cycles (throughput / 2·capacity).
    pub battery_equivalent_cycles: f32,
    /// Battery state of health at episode end.
    pub final_soh: f32,
}

impl EpisodeReport {
    /// Computes the report from the complete step record.
    ///
    /// # Arguments
    ///
    /// * `records` - Complete episode step records
    /// * `dt_hours` - Timestep duration in hours
    /// * `battery_capacity_kwh` - Battery capacity for cycle calculation
    pub fn from_records(
        records: &[StepRecord],
        dt_hours: f32,
        battery_capacity_kwh: f32,
    ) -> Self {
        let mut report = Self {
            steps: records.len(),
            total_reward: 0.0,
            total_energy_cost: 0.0,
            total_emissions_kg: 0.0,
            total_degradation_cost: 0.0,
            total_safety_penalty: 0.0,
            violation_count: 0,
            unmet_steps: 0,
            curtailed_kwh: 0.0,
            peak_import_kw: 0.0,
            peak_export_kw: 0.0,
            battery_throughput_kwh: 0.0,
            battery_equivalent_cycles: 0.0,
            final_soh: records.last().map(|r| r.battery_soh).unwrap_or(1.0),
        };

        for r in records {
            report.total_reward += r.reward;
            report.total_energy_cost += r.energy_cost;
            report.total_emissions_kg += r.emissions_kg;
            report.total_degradation_cost += r.degradation_cost;
            report.total_safety_penalty += r.safety_penalty;
            report.violation_count += r.violation_count;
            if r.unmet_demand {
                report.unmet_steps += 1;
            }
            report.curtailed_kwh += r.curtailed_kw * dt_hours;
            report.peak_import_kw = report.peak_import_kw.max(r.grid_kw);
            report.peak_export_kw = report.peak_export_kw.max(-r.grid_kw);
            report.battery_throughput_kwh += r.battery_kw.abs() * dt_hours;
        }

        if battery_capacity_kwh > 0.0 {
            report.battery_equivalent_cycles =
                report.battery_throughput_kwh / (2.0 * battery_capacity_kwh);
        }

        report
    }
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ({} steps) ---", self.steps)?;
        writeln!(f, "Total reward:          {:.3}", self.total_reward)?;
        writeln!(f, "Energy cost:           {:.3}", self.total_energy_cost)?;
        writeln!(f, "Emissions:             {:.2} kg CO2", self.total_emissions_kg)?;
        writeln!(f, "Degradation cost:      {:.3}", self.total_degradation_cost)?;
        writeln!(f, "Safety penalty:        {:.2}", self.total_safety_penalty)?;
        writeln!(f, "Violations:            {}", self.violation_count)?;
        writeln!(f, "Unmet-demand steps:    {}", self.unmet_steps)?;
        writeln!(f, "Curtailed energy:      {:.2} kWh", self.curtailed_kwh)?;
        writeln!(
            f,
            "Peak import / export:  {:.2} / {:.2} kW",
            self.peak_import_kw, self.peak_export_kw
        )?;
        writeln!(
            f,
            "Battery throughput:    {:.2} kWh ({:.3} equiv. cycles)",
            self.battery_throughput_kwh, self.battery_equivalent_cycles
        )?;
        write!(f, "Final SoH:             {:.4}", self.final_soh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(reward: f32, battery_kw: f32, grid_kw: f32) -> StepRecord {
        StepRecord {
            step: 0,
            time_hr: 0.0,
            price_per_kwh: 0.15,
            load_kw: 30.0,
            solar_kw: 0.0,
            wind_kw: 0.0,
            generation_kw: 0.0,
            curtailed_kw: 0.0,
            battery_kw,
            battery_soc: 0.5,
            battery_soh: 0.999,
            battery_temp_c: 25.0,
            ev_charge_kw: 0.0,
            ev_active_sessions: 0,
            grid_kw,
            shortfall_kw: 0.0,
            spill_kw: 0.0,
            energy_cost: 1.0,
            emissions_kg: 2.0,
            degradation_cost: 0.1,
            safety_penalty: 0.0,
            reward,
            violation_count: 1,
            unmet_demand: false,
        }
    }

    #[test]
    fn totals_accumulate() {
        let records = vec![
            make_record(-1.0, 10.0, 20.0),
            make_record(-2.0, -10.0, -15.0),
        ];
        let report = EpisodeReport::from_records(&records, 0.25, 120.0);
        assert_eq!(report.steps, 2);
        assert!((report.total_reward + 3.0).abs() < 1e-6);
        assert!((report.total_energy_cost - 2.0).abs() < 1e-6);
        assert_eq!(report.violation_count, 2);
        assert_eq!(report.peak_import_kw, 20.0);
        assert_eq!(report.peak_export_kw, 15.0);
        // 2 steps at 10 kW over 0.25 h.
        assert!((report.battery_throughput_kwh - 5.0).abs() < 1e-6);
        assert!((report.battery_equivalent_cycles - 5.0 / 240.0).abs() < 1e-6);
    }

    #[test]
    fn empty_records_give_zeroed_report() {
        let report = EpisodeReport::from_records(&[], 0.25, 120.0);
        assert_eq!(report.steps, 0);
        assert_eq!(report.total_reward, 0.0);
        assert_eq!(report.final_soh, 1.0);
    }

    #[test]
    fn display_does_not_panic() {
        let report = EpisodeReport::from_records(&[make_record(-1.0, 0.0, 0.0)], 0.25, 120.0);
        let s = format!("{report}");
        assert!(s.contains("Episode Report"));
    }
}
