//! Observation vector layout and assembly.
//!
//! The observation is a fixed-length ordered vector whose layout is
//! computed once from configuration and never changes within an episode
//! or across resets — a trained policy depends on offsets staying put.

use std::collections::VecDeque;

use crate::assets::battery::Battery;
use crate::assets::ev_fleet::FleetSummary;
use crate::config::ObservationConfig;
use crate::env::action::ACTION_DIM;
use crate::env::clock::SimulationClock;
use crate::exogenous::{ExogenousFeed, StepExogenous};

/// Number of cyclical time features (sin/cos of hour and weekday).
const TIME_FEATURES: usize = 4;
/// Battery features: SoC, SoH, cell temperature.
const BATTERY_FEATURES: usize = 3;
/// EV fleet features: active count, remaining energy, requested power, slack.
const EV_FEATURES: usize = 4;
/// Health features: overall index, active alert count.
const HEALTH_FEATURES: usize = 2;

/// Fixed offsets of every observation block.
///
/// Per-series blocks are laid out `[current, forecast.., history..]` with
/// history most-recent-first.
#[derive(Debug, Clone, Copy)]
pub struct ObservationLayout {
    /// Forecast horizon per exogenous series (steps).
    pub forecast_steps: usize,
    /// Trailing history per exogenous series (steps).
    pub history_steps: usize,
    /// Number of recent action vectors included.
    pub action_history_steps: usize,

    /// Offset of the cyclical time features.
    pub time_offset: usize,
    /// Offset of the solar block.
    pub solar_offset: usize,
    /// Offset of the wind block.
    pub wind_offset: usize,
    /// Offset of the load block.
    pub load_offset: usize,
    /// Offset of the battery features.
    pub battery_offset: usize,
    /// Offset of the price block (current + forecast).
    pub price_offset: usize,
    /// Offset of the EV fleet features.
    pub ev_offset: usize,
    /// Offset of the recent-action block.
    pub action_offset: usize,
    /// Offset of the health features.
    pub health_offset: usize,

    len: usize,
}

impl ObservationLayout {
    /// Computes the layout from configuration.
    pub fn new(config: &ObservationConfig) -> Self {
        let series_block = 1 + config.forecast_steps + config.history_steps;

        let time_offset = 0;
        let solar_offset = time_offset + TIME_FEATURES;
        let wind_offset = solar_offset + series_block;
        let load_offset = wind_offset + series_block;
        let battery_offset = load_offset + series_block;
        let price_offset = battery_offset + BATTERY_FEATURES;
        let ev_offset = price_offset + 1 + config.forecast_steps;
        let action_offset = ev_offset + EV_FEATURES;
        let health_offset = action_offset + ACTION_DIM * config.action_history_steps;
        let len = health_offset + HEALTH_FEATURES;

        Self {
            forecast_steps: config.forecast_steps,
            history_steps: config.history_steps,
            action_history_steps: config.action_history_steps,
            time_offset,
            solar_offset,
            wind_offset,
            load_offset,
            battery_offset,
            price_offset,
            ev_offset,
            action_offset,
            health_offset,
            len,
        }
    }

    /// Total observation vector length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a degenerate zero-length layout (never happens
    /// with the fixed feature blocks, kept for API completeness).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the current battery state of charge.
    pub fn battery_soc_index(&self) -> usize {
        self.battery_offset
    }

    /// Index of the current import price.
    pub fn price_index(&self) -> usize {
        self.price_offset
    }

    /// Index of the current site load.
    pub fn load_index(&self) -> usize {
        self.load_offset
    }

    /// Index of the current available solar power.
    pub fn solar_index(&self) -> usize {
        self.solar_offset
    }

    /// Index of the current available wind power.
    pub fn wind_index(&self) -> usize {
        self.wind_offset
    }

    /// Index of the fleet's requested charging power.
    pub fn ev_requested_index(&self) -> usize {
        self.ev_offset + 2
    }
}

/// Assembles observation vectors and owns the short history buffers.
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    layout: ObservationLayout,
    solar_hist: VecDeque<f32>,
    wind_hist: VecDeque<f32>,
    load_hist: VecDeque<f32>,
    action_hist: VecDeque<[f32; ACTION_DIM]>,
}

impl ObservationBuilder {
    /// Creates a builder with empty history.
    pub fn new(layout: ObservationLayout) -> Self {
        Self {
            layout,
            solar_hist: VecDeque::new(),
            wind_hist: VecDeque::new(),
            load_hist: VecDeque::new(),
            action_hist: VecDeque::new(),
        }
    }

    /// The layout this builder assembles.
    pub fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    /// Clears all history buffers (episode start).
    pub fn reset(&mut self) {
        self.solar_hist.clear();
        self.wind_hist.clear();
        self.load_hist.clear();
        self.action_hist.clear();
    }

    /// Records the exogenous values and raw action of an executed step.
    pub fn record_step(&mut self, x: &StepExogenous, action: [f32; ACTION_DIM]) {
        push_bounded(&mut self.solar_hist, x.solar_kw, self.layout.history_steps);
        push_bounded(&mut self.wind_hist, x.wind_kw, self.layout.history_steps);
        push_bounded(&mut self.load_hist, x.load_kw, self.layout.history_steps);
        push_bounded(
            &mut self.action_hist,
            action,
            self.layout.action_history_steps,
        );
    }

    /// Builds the observation for the clock's current step.
    ///
    /// Missing history (early in an episode) is zero-padded so the vector
    /// length never changes.
    pub fn build(
        &self,
        clock: &SimulationClock,
        feed: &ExogenousFeed,
        battery: &Battery,
        fleet: &FleetSummary,
        overall_health: f32,
        active_alerts: usize,
    ) -> Vec<f32> {
        let step = clock.step();
        let mut obs = Vec::with_capacity(self.layout.len());

        // Cyclical time encodings.
        let hour_angle = 2.0 * std::f32::consts::PI * clock.hour_of_day() / 24.0;
        obs.push(hour_angle.sin());
        obs.push(hour_angle.cos());
        let dow_angle = 2.0 * std::f32::consts::PI * clock.day_of_week() as f32 / 7.0;
        obs.push(dow_angle.sin());
        obs.push(dow_angle.cos());

        self.push_series(&mut obs, step, feed, |x| x.solar_kw, &self.solar_hist);
        self.push_series(&mut obs, step, feed, |x| x.wind_kw, &self.wind_hist);
        self.push_series(&mut obs, step, feed, |x| x.load_kw, &self.load_hist);

        obs.push(battery.soc);
        obs.push(battery.soh);
        obs.push(battery.temperature_c);

        // Price: current plus forecast, no history.
        obs.push(feed.at(step).price_per_kwh);
        for i in 1..=self.layout.forecast_steps {
            obs.push(feed.at(step + i).price_per_kwh);
        }

        obs.push(fleet.active_sessions as f32);
        obs.push(fleet.remaining_kwh);
        obs.push(fleet.requested_kw);
        obs.push(fleet.min_slack_steps);

        for k in 0..self.layout.action_history_steps {
            match self.action_hist.get(k) {
                Some(a) => obs.extend_from_slice(a),
                None => obs.extend_from_slice(&[0.0; ACTION_DIM]),
            }
        }

        obs.push(overall_health);
        obs.push(active_alerts as f32);

        assert_eq!(
            obs.len(),
            self.layout.len(),
            "observation length drifted from layout"
        );
        obs
    }

    fn push_series(
        &self,
        obs: &mut Vec<f32>,
        step: usize,
        feed: &ExogenousFeed,
        select: impl Fn(&StepExogenous) -> f32,
        hist: &VecDeque<f32>,
    ) {
        obs.push(select(&feed.at(step)));
        for i in 1..=self.layout.forecast_steps {
            obs.push(select(&feed.at(step + i)));
        }
        for k in 0..self.layout.history_steps {
            obs.push(hist.get(k).copied().unwrap_or(0.0));
        }
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, cap: usize) {
    if cap == 0 {
        return;
    }
    buf.push_front(value);
    buf.truncate(cap);
}
