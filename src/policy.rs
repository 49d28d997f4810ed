//! Scripted baseline policies for the demo runner and tests.
//!
//! These stand in for the external learning agent: they consume the
//! observation vector through the published layout and emit normalized
//! action vectors. Nothing here reaches into environment internals.

use crate::config::ScenarioConfig;
use crate::env::action::ACTION_DIM;
use crate::env::observation::ObservationLayout;

/// A decision-maker over observation vectors.
pub trait Policy {
    /// Produces a normalized action for the given observation.
    fn act(&mut self, observation: &[f32]) -> Vec<f32>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Inverse of the grid affine map: physical kW to normalized `[-1, 1]`.
fn grid_to_norm(grid_kw: f32, max_export_kw: f32, max_import_kw: f32) -> f32 {
    let span = max_import_kw + max_export_kw;
    if span <= 0.0 {
        return 0.0;
    }
    (-1.0 + 2.0 * (grid_kw + max_export_kw) / span).clamp(-1.0, 1.0)
}

/// Grid-following policy: battery idle, EVs served, residual from the grid.
///
/// The do-nothing reference point for comparing smarter dispatch against.
#[derive(Debug, Clone)]
pub struct PassivePolicy {
    layout: ObservationLayout,
    max_import_kw: f32,
    max_export_kw: f32,
    ev_max_total_kw: f32,
}

impl PassivePolicy {
    /// Creates the policy for a scenario's action ranges.
    pub fn new(config: &ScenarioConfig, layout: ObservationLayout) -> Self {
        Self {
            layout,
            max_import_kw: config.grid.max_import_kw,
            max_export_kw: config.grid.max_export_kw,
            ev_max_total_kw: config.ev.max_total_kw,
        }
    }
}

impl Policy for PassivePolicy {
    fn act(&mut self, observation: &[f32]) -> Vec<f32> {
        let load = observation[self.layout.load_index()];
        let solar = observation[self.layout.solar_index()];
        let wind = observation[self.layout.wind_index()];
        let ev_requested = observation[self.layout.ev_requested_index()];

        let ev_norm = if self.ev_max_total_kw > 0.0 {
            (ev_requested / self.ev_max_total_kw).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let ev_kw = ev_norm * self.ev_max_total_kw;

        let residual_kw = load + ev_kw - solar - wind;
        let grid_norm = grid_to_norm(residual_kw, self.max_export_kw, self.max_import_kw);

        let mut action = vec![0.0; ACTION_DIM];
        action[crate::env::action::ACTION_GRID] = grid_norm;
        action[crate::env::action::ACTION_EV] = ev_norm;
        action
    }

    fn name(&self) -> &'static str {
        "passive"
    }
}

/// Time-of-use arbitrage: charge the battery when power is cheap,
/// discharge when it is expensive, grid-follow the rest.
#[derive(Debug, Clone)]
pub struct TouArbitragePolicy {
    layout: ObservationLayout,
    max_import_kw: f32,
    max_export_kw: f32,
    max_charge_kw: f32,
    max_discharge_kw: f32,
    ev_max_total_kw: f32,
    /// Charge below this price.
    pub price_low: f32,
    /// Discharge above this price.
    pub price_high: f32,
    /// Battery command magnitude as a fraction of rated power.
    pub dispatch_frac: f32,
}

impl TouArbitragePolicy {
    /// Creates the policy with thresholds straddling the base tariff.
    pub fn new(config: &ScenarioConfig, layout: ObservationLayout) -> Self {
        Self {
            layout,
            max_import_kw: config.grid.max_import_kw,
            max_export_kw: config.grid.max_export_kw,
            max_charge_kw: config.battery.max_charge_kw,
            max_discharge_kw: config.battery.max_discharge_kw,
            ev_max_total_kw: config.ev.max_total_kw,
            price_low: config.price.offpeak_per_kwh * 1.25,
            price_high: config.price.peak_per_kwh * 0.75,
            dispatch_frac: 0.8,
        }
    }
}

impl Policy for TouArbitragePolicy {
    fn act(&mut self, observation: &[f32]) -> Vec<f32> {
        let load = observation[self.layout.load_index()];
        let solar = observation[self.layout.solar_index()];
        let wind = observation[self.layout.wind_index()];
        let price = observation[self.layout.price_index()];
        let soc = observation[self.layout.battery_soc_index()];
        let ev_requested = observation[self.layout.ev_requested_index()];

        let battery_norm = if price <= self.price_low && soc < 0.85 {
            self.dispatch_frac
        } else if price >= self.price_high && soc > 0.15 {
            -self.dispatch_frac
        } else {
            0.0
        };
        let battery_kw = if battery_norm >= 0.0 {
            battery_norm * self.max_charge_kw
        } else {
            battery_norm * self.max_discharge_kw
        };

        let ev_norm = if self.ev_max_total_kw > 0.0 {
            (ev_requested / self.ev_max_total_kw).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let ev_kw = ev_norm * self.ev_max_total_kw;

        let residual_kw = load + ev_kw + battery_kw - solar - wind;
        let grid_norm = grid_to_norm(residual_kw, self.max_export_kw, self.max_import_kw);

        let mut action = vec![0.0; ACTION_DIM];
        action[crate::env::action::ACTION_BATTERY] = battery_norm;
        action[crate::env::action::ACTION_GRID] = grid_norm;
        action[crate::env::action::ACTION_EV] = ev_norm;
        action
    }

    fn name(&self) -> &'static str {
        "tou_arbitrage"
    }
}
