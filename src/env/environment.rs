//! Environment step controller: the one owner of all episode state.

use std::fmt;

use crate::assets::battery::Battery;
use crate::assets::ev_fleet::EvFleet;
use crate::assets::grid::GridTie;
use crate::assets::renewable::Renewable;
use crate::config::{ConfigError, ScenarioConfig};
use crate::env::action::{ACTION_DIM, ActionMapper};
use crate::env::clock::SimulationClock;
use crate::env::observation::{ObservationBuilder, ObservationLayout};
use crate::env::reward::{RewardCalculator, StepOutcome};
use crate::env::safety::SafetySupervisor;
use crate::env::types::{StepInfo, StepRecord, StepResult};
use crate::exogenous::ExogenousFeed;
use crate::monitor::{HealthMonitor, MonitorSample};

/// Threshold below which a bus imbalance is treated as float noise.
const BALANCE_EPS_KW: f32 = 1e-3;

/// Where the environment is in its episode lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvPhase {
    /// Constructed, never reset.
    Ready,
    /// Mid-episode; `step` is valid.
    Running,
    /// Episode finished; `reset` starts the next one.
    Done,
}

impl fmt::Display for EnvPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvPhase::Ready => "Ready",
            EnvPhase::Running => "Running",
            EnvPhase::Done => "Done",
        };
        write!(f, "{name}")
    }
}

/// The microgrid control environment.
///
/// Owns all mutable episode state exclusively; the safety supervisor and
/// reward calculator are pure functions over snapshots it passes them.
/// Parallel rollouts construct independent instances — there is no shared
/// state between environments.
pub struct MicrogridEnv {
    config: ScenarioConfig,
    feed: ExogenousFeed,
    clock: SimulationClock,
    battery: Battery,
    fleet: EvFleet,
    renewable: Renewable,
    grid: GridTie,
    mapper: ActionMapper,
    supervisor: SafetySupervisor,
    reward: RewardCalculator,
    obs: ObservationBuilder,
    monitor: HealthMonitor,
    phase: EnvPhase,
    records: Vec<StepRecord>,
}

impl MicrogridEnv {
    /// Builds an environment over an externally supplied exogenous feed.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid configuration or on a feed too short for the
    /// episode plus the observation forecast horizon — a missing entry at
    /// a required step is a configuration error, never a runtime stall.
    pub fn new(config: ScenarioConfig, feed: ExogenousFeed) -> Result<Self, ConfigError> {
        if let Some(error) = config.validate().into_iter().next() {
            return Err(error);
        }

        let required = Self::required_feed_len(&config);
        if feed.len() < required {
            return Err(ConfigError::new(
                "exogenous",
                format!(
                    "feed covers {} steps but the episode needs {required} \
                     (episode {} + forecast horizon {} + 1)",
                    feed.len(),
                    config.episode_steps(),
                    config.observation.forecast_steps
                ),
            ));
        }

        let dt_hours = config.dt_hours();
        let layout = ObservationLayout::new(&config.observation);

        Ok(Self {
            clock: SimulationClock::new(config.simulation.steps_per_day, config.simulation.days),
            battery: Battery::new(&config.battery, dt_hours),
            fleet: EvFleet::new(&config.ev, dt_hours),
            renewable: Renewable::new(&config.solar, &config.wind, dt_hours),
            grid: GridTie::new(&config.grid, dt_hours),
            mapper: ActionMapper::new(&config),
            supervisor: SafetySupervisor::new(&config.safety),
            reward: RewardCalculator::new(&config.reward),
            obs: ObservationBuilder::new(layout),
            monitor: HealthMonitor::new(&config.monitor),
            phase: EnvPhase::Ready,
            records: Vec::new(),
            config,
            feed,
        })
    }

    /// Builds an environment over a synthetic feed generated from the
    /// scenario's seed.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid configuration.
    pub fn from_config(config: ScenarioConfig) -> Result<Self, ConfigError> {
        if let Some(error) = config.validate().into_iter().next() {
            return Err(error);
        }
        let feed = ExogenousFeed::synthetic(&config, Self::required_feed_len(&config));
        Self::new(config, feed)
    }

    fn required_feed_len(config: &ScenarioConfig) -> usize {
        config.episode_steps() + config.observation.forecast_steps + 1
    }

    /// Observation vector length (fixed across the environment lifetime).
    pub fn observation_size(&self) -> usize {
        self.obs.layout().len()
    }

    /// Action vector length.
    pub fn action_dim(&self) -> usize {
        ACTION_DIM
    }

    /// The published observation layout.
    pub fn observation_layout(&self) -> &ObservationLayout {
        self.obs.layout()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> EnvPhase {
        self.phase
    }

    /// Steps per episode.
    pub fn episode_steps(&self) -> usize {
        self.clock.episode_steps()
    }

    /// Current step index.
    pub fn current_step(&self) -> usize {
        self.clock.step()
    }

    /// Scenario configuration.
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Battery snapshot.
    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    /// EV fleet snapshot.
    pub fn ev_fleet(&self) -> &EvFleet {
        &self.fleet
    }

    /// Health monitor (read-only snapshot surface).
    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    /// Step records of the episode so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Starts a fresh episode and returns the initial observation.
    ///
    /// Reinitializes the clock, every asset, the observation history, and
    /// the monitor from configuration. Valid from any phase; calling it
    /// twice without stepping returns identical observations.
    pub fn reset(&mut self) -> Vec<f32> {
        let dt_hours = self.config.dt_hours();
        self.clock.reset();
        self.battery = Battery::new(&self.config.battery, dt_hours);
        self.fleet = EvFleet::new(&self.config.ev, dt_hours);
        self.renewable = Renewable::new(&self.config.solar, &self.config.wind, dt_hours);
        self.grid = GridTie::new(&self.config.grid, dt_hours);
        self.obs.reset();
        self.monitor.reset();
        self.records.clear();
        self.phase = EnvPhase::Running;

        self.build_observation()
    }

    /// Executes one environment step with the given normalized action.
    ///
    /// Sequence: fetch exogenous inputs, admit EV arrivals, map the action
    /// to physical units, safety-clip it, advance every asset with the
    /// clipped command, settle the bus balance, score the outcome, advance
    /// the clock, and detect termination.
    ///
    /// # Panics
    ///
    /// Panics when called outside the `Running` phase (stepping a finished
    /// episode is a caller bug that would corrupt aggregated metrics if
    /// masked), when the action vector has the wrong length, or when a
    /// non-finite value surfaces in reward or asset state.
    pub fn step(&mut self, action: &[f32]) -> StepResult {
        assert!(
            self.phase == EnvPhase::Running,
            "step() called while environment is {}; call reset() first",
            self.phase
        );

        let step = self.clock.step();
        let dt_hours = self.clock.dt_hours();
        let hour = self.clock.hour_of_day();
        let x = self.feed.at(step);

        // Arrivals join before the safety check so the feasible EV range
        // reflects the vehicles actually present.
        self.fleet.admit(self.feed.arrivals(step), step);

        // Physically impossible demand is episode-terminal regardless of
        // the action: even every source at maximum safe output cannot
        // carry the load. Evaluated against pre-step limits.
        let max_supply_kw = x.solar_kw
            + x.wind_kw
            + self.grid.max_import_kw()
            + self.battery.discharge_limit_kw();
        let terminal_infeasible = x.load_kw > max_supply_kw + BALANCE_EPS_KW;

        let raw = self.mapper.map(action);
        let (safe, violations, safety_penalty) =
            self.supervisor
                .check_and_clip(&raw, &self.battery, &self.fleet, &self.grid);

        let ren_out = self
            .renewable
            .advance(safe.curtailment_frac, x.solar_kw, x.wind_kw);
        let bat_out = self.battery.advance(safe.battery_kw, x.ambient_temp_c);
        let fleet_out = self.fleet.advance(safe.ev_charge_kw, step);
        let grid_out = self.grid.advance(safe.grid_kw, x.price_per_kwh, hour);

        // Bus balance: demand minus supply. A positive residual is load
        // that went unserved; a negative residual is surplus spilled.
        let residual_kw = x.load_kw + fleet_out.charge_kw + bat_out.power_kw
            - ren_out.generation_kw
            - (grid_out.import_kw - grid_out.export_kw);
        let shortfall_kw = residual_kw.max(0.0);
        let spill_kw = (-residual_kw).max(0.0);
        let shortfall_kw = if shortfall_kw > BALANCE_EPS_KW {
            shortfall_kw
        } else {
            0.0
        };

        let unmet_kwh = shortfall_kw * dt_hours + fleet_out.unmet_kwh;
        let unmet_demand = shortfall_kw > 0.0 || fleet_out.unmet_sessions > 0;

        let outcome = StepOutcome {
            energy_cost: grid_out.energy_cost,
            emissions_kg: grid_out.emissions_kg,
            degradation_cost: bat_out.degradation_cost,
            unmet_demand,
            unmet_kwh,
            safety_penalty,
            violations: violations.clone(),
        };
        let (reward, breakdown) = self.reward.compute(&outcome);

        self.monitor.update(
            step,
            MonitorSample {
                battery_temp_c: self.battery.temperature_c,
                battery_soh: self.battery.soh,
                pv_ratio: self.renewable.performance_ratio(x.solar_kw, hour),
                violation_count: violations.len(),
                sessions_completed: self.fleet.sessions_completed,
                sessions_unmet: self.fleet.sessions_unmet,
            },
        );

        let mut action_array = [0.0_f32; ACTION_DIM];
        action_array.copy_from_slice(action);
        self.obs.record_step(&x, action_array);

        self.records.push(StepRecord {
            step,
            time_hr: self.clock.time_hr(),
            price_per_kwh: x.price_per_kwh,
            load_kw: x.load_kw,
            solar_kw: x.solar_kw,
            wind_kw: x.wind_kw,
            generation_kw: ren_out.generation_kw,
            curtailed_kw: ren_out.curtailed_kw,
            battery_kw: bat_out.power_kw,
            battery_soc: self.battery.soc,
            battery_soh: self.battery.soh,
            battery_temp_c: self.battery.temperature_c,
            ev_charge_kw: fleet_out.charge_kw,
            ev_active_sessions: self.fleet.sessions().len(),
            grid_kw: grid_out.import_kw - grid_out.export_kw,
            shortfall_kw,
            spill_kw,
            energy_cost: grid_out.energy_cost,
            emissions_kg: grid_out.emissions_kg,
            degradation_cost: bat_out.degradation_cost,
            safety_penalty,
            reward,
            violation_count: violations.len(),
            unmet_demand,
        });

        self.clock.advance();
        let done = self.clock.is_done() || terminal_infeasible;
        if done {
            self.phase = EnvPhase::Done;
        }

        let observation = self.build_observation();
        StepResult {
            observation,
            reward,
            done,
            info: StepInfo {
                energy_cost: grid_out.energy_cost,
                emissions_kg: grid_out.emissions_kg,
                degradation_cost: bat_out.degradation_cost,
                safety_penalty,
                violation_count: violations.len(),
                unmet_demand,
                unmet_kwh,
                terminal_infeasible,
                curtailed_kwh: ren_out.curtailed_kw * dt_hours,
                spilled_kwh: spill_kw * dt_hours,
                breakdown,
                violations: violations.entries,
            },
        }
    }

    fn build_observation(&self) -> Vec<f32> {
        let summary = self.fleet.summary(self.clock.step());
        let health = self.monitor.health_summary();
        self.obs.build(
            &self.clock,
            &self.feed,
            &self.battery,
            &summary,
            health.overall_health,
            health.active_alert_count,
        )
    }
}
