//! Step result and record types returned by the environment.

use std::fmt;

use crate::env::reward::RewardBreakdown;
use crate::env::safety::Violation;

/// Observability payload attached to every step result.
///
/// Carries the full reward attribution and violation record so external
/// consumers (training loops, dashboards, report generators) never need
/// to recompute them.
#[derive(Debug, Clone)]
pub struct StepInfo {
    /// Net grid energy cost this step.
    pub energy_cost: f32,
    /// Emissions from imported energy (kg CO2).
    pub emissions_kg: f32,
    /// Monetary value of battery health lost this step.
    pub degradation_cost: f32,
    /// Summed safety penalty from the supervisor.
    pub safety_penalty: f32,
    /// Number of action components clipped beyond tolerance.
    pub violation_count: usize,
    /// `true` when any demand went unmet this step.
    pub unmet_demand: bool,
    /// Energy that went unserved this step (kWh).
    pub unmet_kwh: f32,
    /// `true` when the episode ended because demand exceeded every supply
    /// source at maximum safe output.
    pub terminal_infeasible: bool,
    /// Renewable energy deliberately discarded this step (kWh).
    pub curtailed_kwh: f32,
    /// Surplus generation spilled by the bus balance this step (kWh).
    pub spilled_kwh: f32,
    /// Per-term reward attribution.
    pub breakdown: RewardBreakdown,
    /// Violations recorded by the supervisor this step.
    pub violations: Vec<Violation>,
}

/// Result of one environment step: `(observation, reward, done, info)`.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Observation of the post-step state.
    pub observation: Vec<f32>,
    /// Scalar reward for the executed action.
    pub reward: f32,
    /// `true` when the episode is over.
    pub done: bool,
    /// Full step observability payload.
    pub info: StepInfo,
}

/// Complete record of one executed step, kept for telemetry and reports.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Step index.
    pub step: usize,
    /// Simulation time in hours.
    pub time_hr: f32,
    /// Import tariff this step (per kWh).
    pub price_per_kwh: f32,
    /// Site load demand (kW).
    pub load_kw: f32,
    /// Available solar power before curtailment (kW).
    pub solar_kw: f32,
    /// Available wind power before curtailment (kW).
    pub wind_kw: f32,
    /// Renewable power delivered after curtailment (kW).
    pub generation_kw: f32,
    /// Renewable power deliberately discarded (kW).
    pub curtailed_kw: f32,
    /// Battery power (kW; positive = charge).
    pub battery_kw: f32,
    /// Battery SoC after this step.
    pub battery_soc: f32,
    /// Battery SoH after this step.
    pub battery_soh: f32,
    /// Battery cell temperature after this step (°C).
    pub battery_temp_c: f32,
    /// EV fleet charging power (kW).
    pub ev_charge_kw: f32,
    /// Active EV sessions after this step.
    pub ev_active_sessions: usize,
    /// Grid exchange (kW; positive = import).
    pub grid_kw: f32,
    /// Unserved load (kW).
    pub shortfall_kw: f32,
    /// Spilled surplus (kW).
    pub spill_kw: f32,
    /// Net grid energy cost.
    pub energy_cost: f32,
    /// Emissions from imported energy (kg CO2).
    pub emissions_kg: f32,
    /// Degradation cost.
    pub degradation_cost: f32,
    /// Safety penalty.
    pub safety_penalty: f32,
    /// Scalar reward.
    pub reward: f32,
    /// Violations recorded this step.
    pub violation_count: usize,
    /// `true` when any demand went unmet this step.
    pub unmet_demand: bool,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({:>5.1}h) | load={:>5.1} gen={:>5.1} bat={:>6.1} \
             (SoC={:>4.1}%) ev={:>5.1} grid={:>6.1} kW | \
             cost={:>6.3} co2={:>5.2}kg pen={:>4.1} r={:>7.3} | viol={} unmet={}",
            self.step,
            self.time_hr,
            self.load_kw,
            self.generation_kw,
            self.battery_kw,
            self.battery_soc * 100.0,
            self.ev_charge_kw,
            self.grid_kw,
            self.energy_cost,
            self.emissions_kg,
            self.safety_penalty,
            self.reward,
            self.violation_count,
            self.unmet_demand,
        )
    }
}
