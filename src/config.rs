//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and seeding.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Site load profile parameters.
    #[serde(default)]
    pub load: LoadConfig,
    /// Solar PV parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Wind turbine parameters.
    #[serde(default)]
    pub wind: WindConfig,
    /// Ambient temperature profile parameters.
    #[serde(default)]
    pub ambient: AmbientConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// EV fleet parameters.
    #[serde(default)]
    pub ev: EvFleetConfig,
    /// Grid tie limits, tariff bands, and emission intensities.
    #[serde(default)]
    pub grid: GridConfig,
    /// Import price profile parameters.
    #[serde(default)]
    pub price: PriceConfig,
    /// Safety supervisor tolerance and penalty table.
    #[serde(default)]
    pub safety: SafetyConfig,
    /// Reward weighting constants.
    #[serde(default)]
    pub reward: RewardConfig,
    /// Observation vector sizing.
    #[serde(default)]
    pub observation: ObservationConfig,
    /// Health monitor windows and thresholds.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Simulation timing and seeding.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of timesteps per simulated day (must be > 0; 96 = 15 min).
    pub steps_per_day: usize,
    /// Number of days per episode (must be > 0).
    pub days: usize,
    /// Master random seed for exogenous series generation.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps_per_day: 96,
            days: 1,
            seed: 42,
        }
    }
}

/// Site load profile parameters (sinusoidal daily shape plus noise).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Baseline consumption (kW).
    pub base_kw: f32,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f32,
    /// Phase offset (radians).
    pub phase_rad: f32,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            base_kw: 30.0,
            amp_kw: 14.0,
            phase_rad: 1.2,
            noise_std: 0.8,
        }
    }
}

/// Solar PV parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Rated peak generation (kW).
    pub kw_peak: f32,
    /// Sunrise hour of day (inclusive, 0–24).
    pub sunrise_hour: f32,
    /// Sunset hour of day (exclusive, 0–24).
    pub sunset_hour: f32,
    /// AR(1) correlation coefficient of the cloud multiplier (0.0–1.0).
    pub cloud_alpha: f32,
    /// AR(1) innovation noise standard deviation.
    pub cloud_noise_std: f32,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            kw_peak: 50.0,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
            cloud_alpha: 0.9,
            cloud_noise_std: 0.2,
        }
    }
}

/// Wind turbine parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindConfig {
    /// Rated generation (kW).
    pub kw_rated: f32,
    /// Long-run mean output as a fraction of rated (0.0–1.0).
    pub mean_frac: f32,
    /// AR(1) correlation coefficient of the gust process (0.0–1.0).
    pub gust_alpha: f32,
    /// AR(1) innovation noise standard deviation.
    pub gust_noise_std: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            kw_rated: 25.0,
            mean_frac: 0.35,
            gust_alpha: 0.85,
            gust_noise_std: 0.25,
        }
    }
}

/// Ambient temperature profile parameters (sinusoidal daily shape).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientConfig {
    /// Daily mean temperature (°C).
    pub mean_c: f32,
    /// Daily swing amplitude (°C).
    pub amp_c: f32,
    /// Gaussian noise standard deviation (°C).
    pub noise_std: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            mean_c: 18.0,
            amp_c: 6.0,
            noise_std: 0.3,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Nameplate energy capacity (kWh).
    pub capacity_kwh: f32,
    /// Operational state-of-charge floor (0.0–1.0).
    pub soc_min: f32,
    /// Operational state-of-charge ceiling (0.0–1.0).
    pub soc_max: f32,
    /// Initial state of charge (must lie in [soc_min, soc_max]).
    pub initial_soc: f32,
    /// Initial state of health (0.0–1.0].
    pub initial_soh: f32,
    /// Initial cell temperature (°C).
    pub initial_temp_c: f32,
    /// Maximum charging power (kW).
    pub max_charge_kw: f32,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f32,
    /// Charge efficiency (0.0–1.0).
    pub eta_charge: f32,
    /// Discharge efficiency (0.0–1.0).
    pub eta_discharge: f32,
    /// Replacement cost used to price state-of-health loss.
    pub replacement_cost: f32,
    /// Rated equivalent full cycles until end of life.
    pub cycle_life: f32,
    /// Extra fade per unit of distance from mid state of charge.
    pub dod_stress_factor: f32,
    /// Cell temperature above which fade accelerates (°C).
    pub temp_stress_ref_c: f32,
    /// Extra fade per °C above `temp_stress_ref_c`.
    pub temp_stress_factor: f32,
    /// First-order thermal coupling to ambient per step (0.0–1.0).
    pub thermal_alpha: f32,
    /// Self-heating (°C per step at rated power).
    pub heating_c_at_rated: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 120.0,
            soc_min: 0.1,
            soc_max: 0.9,
            initial_soc: 0.5,
            initial_soh: 1.0,
            initial_temp_c: 25.0,
            max_charge_kw: 60.0,
            max_discharge_kw: 60.0,
            eta_charge: 0.95,
            eta_discharge: 0.95,
            replacement_cost: 30_000.0,
            cycle_life: 4000.0,
            dod_stress_factor: 0.5,
            temp_stress_ref_c: 35.0,
            temp_stress_factor: 0.05,
            thermal_alpha: 0.1,
            heating_c_at_rated: 1.5,
        }
    }
}

/// EV fleet parameters.
///
/// Session arrivals themselves come from the exogenous feed; the sampling
/// ranges here parameterize the synthetic arrival generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvFleetConfig {
    /// Aggregate charging power limit across all bays (kW).
    pub max_total_kw: f32,
    /// Mean number of charging sessions per day.
    pub sessions_per_day: usize,
    /// Minimum per-session charger rating (kW).
    pub session_kw_min: f32,
    /// Maximum per-session charger rating (kW).
    pub session_kw_max: f32,
    /// Minimum session energy requirement (kWh).
    pub energy_kwh_min: f32,
    /// Maximum session energy requirement (kWh).
    pub energy_kwh_max: f32,
    /// Minimum dwell duration (hours).
    pub dwell_hours_min: f32,
    /// Maximum dwell duration (hours).
    pub dwell_hours_max: f32,
}

impl Default for EvFleetConfig {
    fn default() -> Self {
        Self {
            max_total_kw: 44.0,
            sessions_per_day: 6,
            session_kw_min: 7.0,
            session_kw_max: 22.0,
            energy_kwh_min: 8.0,
            energy_kwh_max: 35.0,
            dwell_hours_min: 2.0,
            dwell_hours_max: 8.0,
        }
    }
}

/// Grid tie limits, tariff bands, and emission intensities.
///
/// Band boundaries follow a fixed calendar rule: off-peak overnight
/// (`[offpeak_start_hour, 24)` and `[0, offpeak_end_hour)`), peak in
/// `[peak_start_hour, peak_end_hour)`, base everywhere else.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum import power (kW).
    pub max_import_kw: f32,
    /// Maximum export power (kW, positive magnitude).
    pub max_export_kw: f32,
    /// Export tariff as a fraction of the import tariff.
    pub export_price_factor: f32,
    /// Off-peak emission intensity (kg CO2 per kWh imported).
    pub emission_offpeak_kg_per_kwh: f32,
    /// Base emission intensity (kg CO2 per kWh imported).
    pub emission_base_kg_per_kwh: f32,
    /// Peak emission intensity (kg CO2 per kWh imported).
    pub emission_peak_kg_per_kwh: f32,
    /// Hour the overnight off-peak band ends (0–24).
    pub offpeak_end_hour: f32,
    /// Hour the overnight off-peak band starts (0–24).
    pub offpeak_start_hour: f32,
    /// Hour the evening peak band starts (0–24).
    pub peak_start_hour: f32,
    /// Hour the evening peak band ends (0–24).
    pub peak_end_hour: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_import_kw: 80.0,
            max_export_kw: 50.0,
            export_price_factor: 0.4,
            emission_offpeak_kg_per_kwh: 0.25,
            emission_base_kg_per_kwh: 0.45,
            emission_peak_kg_per_kwh: 0.65,
            offpeak_end_hour: 6.0,
            offpeak_start_hour: 22.0,
            peak_start_hour: 17.0,
            peak_end_hour: 21.0,
        }
    }
}

/// Import price profile parameters, per tariff band.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Off-peak import price (per kWh).
    pub offpeak_per_kwh: f32,
    /// Base import price (per kWh).
    pub base_per_kwh: f32,
    /// Peak import price (per kWh).
    pub peak_per_kwh: f32,
    /// Gaussian noise standard deviation (per kWh).
    pub noise_std: f32,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            offpeak_per_kwh: 0.08,
            base_per_kwh: 0.15,
            peak_per_kwh: 0.32,
            noise_std: 0.01,
        }
    }
}

/// Safety supervisor tolerance and per-kind penalty table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyConfig {
    /// Clip distance below which no violation is recorded.
    pub tolerance: f32,
    /// Penalty for exceeding a battery rated-power limit.
    pub penalty_battery_power: f32,
    /// Penalty for commanding through a state-of-charge bound.
    pub penalty_battery_soc: f32,
    /// Penalty for exceeding a grid import/export limit.
    pub penalty_grid_limit: f32,
    /// Penalty for exceeding the EV fleet charging range.
    pub penalty_ev_limit: f32,
    /// Penalty for a curtailment command outside [0, 1].
    pub penalty_curtailment: f32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            penalty_battery_power: 2.0,
            penalty_battery_soc: 5.0,
            penalty_grid_limit: 4.0,
            penalty_ev_limit: 1.0,
            penalty_curtailment: 0.5,
        }
    }
}

/// Reward weighting constants.
///
/// The reward is `-(cost + w_e*emissions + w_d*degradation + w_r*unmet +
/// safety_penalty)`; these weights convert each term into cost units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// Weight applied to emissions mass (per kg CO2).
    pub weight_emissions: f32,
    /// Weight applied to degradation cost (dimensionless scale).
    pub weight_degradation: f32,
    /// Flat penalty applied when any demand goes unmet in a step.
    pub weight_reliability: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            weight_emissions: 0.05,
            weight_degradation: 1.0,
            weight_reliability: 50.0,
        }
    }
}

/// Observation vector sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservationConfig {
    /// Forecast horizon included per exogenous series (steps).
    pub forecast_steps: usize,
    /// Trailing history included per exogenous series (steps).
    pub history_steps: usize,
    /// Number of recent action vectors included.
    pub action_history_steps: usize,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            forecast_steps: 8,
            history_steps: 4,
            action_history_steps: 2,
        }
    }
}

/// Health monitor windows and thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Rolling window length per metric (steps, must be > 0).
    pub window_steps: usize,
    /// Battery cell temperature alert threshold (°C).
    pub battery_temp_max_c: f32,
    /// State-of-health alert floor (0.0–1.0).
    pub soh_alert_min: f32,
    /// PV performance ratio alert floor (0.0–1.0).
    pub pv_ratio_min: f32,
    /// Consecutive low-ratio steps before a PV alert fires.
    pub pv_low_steps: usize,
    /// Mean violations per step above which an alert fires.
    pub violation_rate_max: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_steps: 16,
            battery_temp_max_c: 45.0,
            soh_alert_min: 0.8,
            pv_ratio_min: 0.5,
            pv_low_steps: 8,
            violation_rate_max: 0.5,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.soc_min"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates a configuration error for the given field path.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            load: LoadConfig::default(),
            solar: SolarConfig::default(),
            wind: WindConfig::default(),
            ambient: AmbientConfig::default(),
            battery: BatteryConfig::default(),
            ev: EvFleetConfig::default(),
            grid: GridConfig::default(),
            price: PriceConfig::default(),
            safety: SafetyConfig::default(),
            reward: RewardConfig::default(),
            observation: ObservationConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Returns the high-renewables preset: oversized PV and wind relative
    /// to load, generous export headroom.
    pub fn high_renewables() -> Self {
        Self {
            solar: SolarConfig {
                kw_peak: 90.0,
                cloud_noise_std: 0.25,
                ..SolarConfig::default()
            },
            wind: WindConfig {
                kw_rated: 45.0,
                mean_frac: 0.45,
                ..WindConfig::default()
            },
            grid: GridConfig {
                max_export_kw: 90.0,
                ..GridConfig::default()
            },
            battery: BatteryConfig {
                capacity_kwh: 180.0,
                max_charge_kw: 80.0,
                max_discharge_kw: 80.0,
                ..BatteryConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the weak-grid preset: tight interconnection limits, steep
    /// peak tariff, and a heavier EV burden.
    pub fn weak_grid() -> Self {
        Self {
            grid: GridConfig {
                max_import_kw: 45.0,
                max_export_kw: 15.0,
                ..GridConfig::default()
            },
            price: PriceConfig {
                peak_per_kwh: 0.55,
                ..PriceConfig::default()
            },
            ev: EvFleetConfig {
                sessions_per_day: 10,
                energy_kwh_max: 45.0,
                ..EvFleetConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_renewables", "weak_grid"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_renewables" => Ok(Self::high_renewables()),
            "weak_grid" => Ok(Self::weak_grid()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Duration of one timestep in hours.
    pub fn dt_hours(&self) -> f32 {
        24.0 / self.simulation.steps_per_day as f32
    }

    /// Total number of steps in one episode.
    pub fn episode_steps(&self) -> usize {
        self.simulation.steps_per_day * self.simulation.days
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message: String| {
            errors.push(ConfigError::new(field, message));
        };

        let s = &self.simulation;
        if s.steps_per_day == 0 {
            fail("simulation.steps_per_day", "must be > 0".into());
        }
        if s.days == 0 {
            fail("simulation.days", "must be > 0".into());
        }

        if self.load.base_kw < 0.0 {
            fail("load.base_kw", "must be >= 0".into());
        }

        let sol = &self.solar;
        if sol.kw_peak < 0.0 {
            fail("solar.kw_peak", "must be >= 0".into());
        }
        if sol.sunrise_hour >= sol.sunset_hour {
            fail("solar.sunrise_hour", "must be < solar.sunset_hour".into());
        }
        if sol.sunset_hour > 24.0 {
            fail("solar.sunset_hour", "must be <= 24".into());
        }

        let w = &self.wind;
        if w.kw_rated < 0.0 {
            fail("wind.kw_rated", "must be >= 0".into());
        }
        if !(0.0..=1.0).contains(&w.mean_frac) {
            fail("wind.mean_frac", "must be in [0.0, 1.0]".into());
        }

        let bat = &self.battery;
        if bat.capacity_kwh <= 0.0 {
            fail("battery.capacity_kwh", "must be > 0".into());
        }
        if !(0.0..=1.0).contains(&bat.soc_min) || !(0.0..=1.0).contains(&bat.soc_max) {
            fail("battery.soc_min", "bounds must be in [0.0, 1.0]".into());
        }
        if bat.soc_min >= bat.soc_max {
            fail("battery.soc_min", "must be < battery.soc_max".into());
        }
        if !(bat.soc_min..=bat.soc_max).contains(&bat.initial_soc) {
            fail(
                "battery.initial_soc",
                format!("must be in [{}, {}]", bat.soc_min, bat.soc_max),
            );
        }
        if !(bat.initial_soh > 0.0 && bat.initial_soh <= 1.0) {
            fail("battery.initial_soh", "must be in (0.0, 1.0]".into());
        }
        if bat.max_charge_kw < 0.0 || bat.max_discharge_kw < 0.0 {
            fail("battery.max_charge_kw", "power limits must be >= 0".into());
        }
        if !(bat.eta_charge > 0.0 && bat.eta_charge <= 1.0) {
            fail("battery.eta_charge", "must be in (0.0, 1.0]".into());
        }
        if !(bat.eta_discharge > 0.0 && bat.eta_discharge <= 1.0) {
            fail("battery.eta_discharge", "must be in (0.0, 1.0]".into());
        }
        if bat.cycle_life <= 0.0 {
            fail("battery.cycle_life", "must be > 0".into());
        }
        if !(0.0..=1.0).contains(&bat.thermal_alpha) {
            fail("battery.thermal_alpha", "must be in [0.0, 1.0]".into());
        }

        let ev = &self.ev;
        if ev.max_total_kw < 0.0 {
            fail("ev.max_total_kw", "must be >= 0".into());
        }
        if ev.session_kw_min > ev.session_kw_max {
            fail("ev.session_kw_min", "must be <= ev.session_kw_max".into());
        }
        if ev.energy_kwh_min > ev.energy_kwh_max {
            fail("ev.energy_kwh_min", "must be <= ev.energy_kwh_max".into());
        }
        if ev.dwell_hours_min > ev.dwell_hours_max {
            fail("ev.dwell_hours_min", "must be <= ev.dwell_hours_max".into());
        }
        if ev.dwell_hours_min <= 0.0 {
            fail("ev.dwell_hours_min", "must be > 0".into());
        }

        let g = &self.grid;
        if g.max_import_kw < 0.0 || g.max_export_kw < 0.0 {
            fail("grid.max_import_kw", "limits must be >= 0".into());
        }
        if g.export_price_factor < 0.0 {
            fail("grid.export_price_factor", "must be >= 0".into());
        }
        if g.peak_start_hour >= g.peak_end_hour {
            fail("grid.peak_start_hour", "must be < grid.peak_end_hour".into());
        }
        if g.offpeak_end_hour > g.peak_start_hour {
            fail(
                "grid.offpeak_end_hour",
                "must be <= grid.peak_start_hour".into(),
            );
        }
        if g.offpeak_start_hour < g.peak_end_hour || g.offpeak_start_hour > 24.0 {
            fail(
                "grid.offpeak_start_hour",
                "must be in [grid.peak_end_hour, 24]".into(),
            );
        }

        if self.safety.tolerance <= 0.0 {
            fail("safety.tolerance", "must be > 0".into());
        }

        let r = &self.reward;
        if r.weight_emissions < 0.0 || r.weight_degradation < 0.0 || r.weight_reliability < 0.0 {
            fail("reward.weight_emissions", "weights must be >= 0".into());
        }

        if self.monitor.window_steps == 0 {
            fail("monitor.window_steps", "must be > 0".into());
        }
        if self.monitor.pv_low_steps == 0 {
            fail("monitor.pv_low_steps", "must be > 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn default_step_is_fifteen_minutes() {
        let cfg = ScenarioConfig::baseline();
        assert!((cfg.dt_hours() - 0.25).abs() < 1e-6);
        assert_eq!(cfg.episode_steps(), 96);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
steps_per_day = 48
days = 2
seed = 99

[battery]
capacity_kwh = 200.0
soc_min = 0.05
soc_max = 0.95
initial_soc = 0.4

[grid]
max_import_kw = 120.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps_per_day), Some(48));
        assert_eq!(cfg.as_ref().map(|c| c.battery.capacity_kwh), Some(200.0));
        // untouched sections keep defaults
        assert_eq!(cfg.as_ref().map(|c| c.solar.kw_peak), Some(50.0));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
steps_per_day = 96
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_zero_steps() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.steps_per_day = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.steps_per_day"));
    }

    #[test]
    fn validation_catches_inverted_soc_bounds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.soc_min = 0.9;
        cfg.battery.soc_max = 0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.soc_min"));
    }

    #[test]
    fn validation_catches_initial_soc_outside_bounds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.initial_soc = 0.95;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.initial_soc"));
    }

    #[test]
    fn validation_catches_negative_weight() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.reward.weight_reliability = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "reward.weight_emissions"));
    }

    #[test]
    fn weak_grid_has_tighter_limits() {
        let base = ScenarioConfig::baseline();
        let weak = ScenarioConfig::weak_grid();
        assert!(weak.grid.max_import_kw < base.grid.max_import_kw);
        assert!(weak.price.peak_per_kwh > base.price.peak_per_kwh);
    }

    #[test]
    fn high_renewables_has_larger_pv() {
        let base = ScenarioConfig::baseline();
        let high = ScenarioConfig::high_renewables();
        assert!(high.solar.kw_peak > base.solar.kw_peak);
        assert!(high.wind.kw_rated > base.wind.kw_rated);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 7
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.steps_per_day), Some(96));
    }
}
