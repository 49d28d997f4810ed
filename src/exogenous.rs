//! Pre-materialized exogenous series and the synthetic scenario generator.
//!
//! The environment never produces its own weather, load, price, or EV
//! arrival data mid-episode: everything exogenous is materialized up front,
//! validated against the episode horizon at construction, and looked up by
//! step index. [`ExogenousFeed::synthetic`] builds a deterministic seeded
//! scenario so the crate runs self-contained.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::assets::grid::TouBand;
use crate::config::{ConfigError, ScenarioConfig};

/// Seed offsets so each synthetic series draws from an independent stream.
const SOLAR_SEED_OFFSET: u64 = 1;
const WIND_SEED_OFFSET: u64 = 2;
const LOAD_SEED_OFFSET: u64 = 3;
const PRICE_SEED_OFFSET: u64 = 4;
const AMBIENT_SEED_OFFSET: u64 = 5;
const ARRIVAL_SEED_OFFSET: u64 = 6;

/// Cloud multiplier clamp range (heavy overcast to cloud-edge enhancement).
const CLOUD_MULT_MIN: f32 = 0.2;
const CLOUD_MULT_MAX: f32 = 1.2;

/// Gaussian noise via the Box-Muller transform.
///
/// Returns a draw from a zero-mean Gaussian with the given standard
/// deviation, or `0.0` when `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}

/// Half-cosine daylight fraction for a given hour of day.
///
/// Rises from 0 at `sunrise_hour`, peaks mid-window, and returns to 0 at
/// `sunset_hour`; 0 outside the window.
pub fn daylight_frac(hour: f32, sunrise_hour: f32, sunset_hour: f32) -> f32 {
    if hour < sunrise_hour || hour >= sunset_hour {
        return 0.0;
    }
    let span = sunset_hour - sunrise_hour;
    let pos = (hour - sunrise_hour) / span;
    (std::f32::consts::PI * pos).sin().max(0.0)
}

/// One EV charging session arrival event from the exogenous feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvArrival {
    /// Stable vehicle identifier.
    pub vehicle_id: u32,
    /// Energy the session must receive before its deadline (kWh).
    pub energy_kwh: f32,
    /// Per-session charger rating (kW).
    pub max_charge_kw: f32,
    /// Connected duration in steps; the deadline is `arrival + dwell`.
    pub dwell_steps: usize,
}

/// Exogenous scalar inputs for one timestep.
#[derive(Debug, Clone, Copy)]
pub struct StepExogenous {
    /// Available (pre-curtailment) solar power (kW).
    pub solar_kw: f32,
    /// Available (pre-curtailment) wind power (kW).
    pub wind_kw: f32,
    /// Site load demand (kW).
    pub load_kw: f32,
    /// Import tariff for this step (per kWh).
    pub price_per_kwh: f32,
    /// Ambient temperature (°C).
    pub ambient_temp_c: f32,
}

/// Pre-materialized per-step exogenous series.
///
/// All series share one length; a lookup past that length is a fatal error
/// (the horizon requirement is checked when the environment is built, so a
/// panic here indicates a defect, not a recoverable condition).
#[derive(Debug, Clone)]
pub struct ExogenousFeed {
    solar_kw: Vec<f32>,
    wind_kw: Vec<f32>,
    load_kw: Vec<f32>,
    price_per_kwh: Vec<f32>,
    ambient_temp_c: Vec<f32>,
    arrivals: Vec<Vec<EvArrival>>,
}

impl ExogenousFeed {
    /// Builds a feed from externally supplied series.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the offending series when lengths
    /// differ, a series is empty, or any value is non-finite or negative
    /// where the quantity is physically non-negative.
    pub fn from_series(
        solar_kw: Vec<f32>,
        wind_kw: Vec<f32>,
        load_kw: Vec<f32>,
        price_per_kwh: Vec<f32>,
        ambient_temp_c: Vec<f32>,
        arrivals: Vec<Vec<EvArrival>>,
    ) -> Result<Self, ConfigError> {
        let n = solar_kw.len();
        if n == 0 {
            return Err(ConfigError::new("exogenous.solar_kw", "series is empty"));
        }
        let lengths = [
            ("exogenous.wind_kw", wind_kw.len()),
            ("exogenous.load_kw", load_kw.len()),
            ("exogenous.price_per_kwh", price_per_kwh.len()),
            ("exogenous.ambient_temp_c", ambient_temp_c.len()),
            ("exogenous.arrivals", arrivals.len()),
        ];
        for (field, len) in lengths {
            if len != n {
                return Err(ConfigError::new(
                    field,
                    format!("length {len} does not match solar_kw length {n}"),
                ));
            }
        }

        let non_negative = [
            ("exogenous.solar_kw", &solar_kw),
            ("exogenous.wind_kw", &wind_kw),
            ("exogenous.load_kw", &load_kw),
            ("exogenous.price_per_kwh", &price_per_kwh),
        ];
        for (field, series) in non_negative {
            for (i, v) in series.iter().enumerate() {
                if !v.is_finite() || *v < 0.0 {
                    return Err(ConfigError::new(
                        field,
                        format!("invalid value {v} at step {i}"),
                    ));
                }
            }
        }
        for (i, v) in ambient_temp_c.iter().enumerate() {
            if !v.is_finite() {
                return Err(ConfigError::new(
                    "exogenous.ambient_temp_c",
                    format!("invalid value {v} at step {i}"),
                ));
            }
        }

        Ok(Self {
            solar_kw,
            wind_kw,
            load_kw,
            price_per_kwh,
            ambient_temp_c,
            arrivals,
        })
    }

    /// Generates a deterministic synthetic scenario covering `horizon_steps`.
    ///
    /// Each series draws from its own seeded stream derived from the master
    /// seed, so identical configurations always yield identical feeds.
    pub fn synthetic(config: &ScenarioConfig, horizon_steps: usize) -> Self {
        let spd = config.simulation.steps_per_day;
        let dt_hours = config.dt_hours();
        let seed = config.simulation.seed;

        let mut solar_rng = StdRng::seed_from_u64(seed.wrapping_add(SOLAR_SEED_OFFSET));
        let mut wind_rng = StdRng::seed_from_u64(seed.wrapping_add(WIND_SEED_OFFSET));
        let mut load_rng = StdRng::seed_from_u64(seed.wrapping_add(LOAD_SEED_OFFSET));
        let mut price_rng = StdRng::seed_from_u64(seed.wrapping_add(PRICE_SEED_OFFSET));
        let mut ambient_rng = StdRng::seed_from_u64(seed.wrapping_add(AMBIENT_SEED_OFFSET));

        let mut solar_kw = Vec::with_capacity(horizon_steps);
        let mut wind_kw = Vec::with_capacity(horizon_steps);
        let mut load_kw = Vec::with_capacity(horizon_steps);
        let mut price_per_kwh = Vec::with_capacity(horizon_steps);
        let mut ambient_temp_c = Vec::with_capacity(horizon_steps);

        let mut cloud_mult = 1.0_f32;
        let mut wind_frac = config.wind.mean_frac;

        for t in 0..horizon_steps {
            let day_pos = (t % spd) as f32 / spd as f32;
            let hour = day_pos * 24.0;

            // Solar: half-cosine daylight shape under an AR(1) cloud multiplier.
            let eps = gaussian_noise(&mut solar_rng, config.solar.cloud_noise_std);
            cloud_mult = config.solar.cloud_alpha * cloud_mult
                + (1.0 - config.solar.cloud_alpha) * (1.0 + eps);
            cloud_mult = cloud_mult.clamp(CLOUD_MULT_MIN, CLOUD_MULT_MAX);
            let frac = daylight_frac(hour, config.solar.sunrise_hour, config.solar.sunset_hour);
            solar_kw.push((config.solar.kw_peak * frac * cloud_mult).max(0.0));

            // Wind: AR(1) gust process around the long-run mean fraction.
            let gust = gaussian_noise(&mut wind_rng, config.wind.gust_noise_std);
            wind_frac = config.wind.gust_alpha * wind_frac
                + (1.0 - config.wind.gust_alpha) * (config.wind.mean_frac + gust);
            wind_frac = wind_frac.clamp(0.0, 1.0);
            wind_kw.push(config.wind.kw_rated * wind_frac);

            // Load: sinusoidal daily pattern plus Gaussian noise.
            let angle = 2.0 * std::f32::consts::PI * day_pos + config.load.phase_rad;
            let load = config.load.base_kw
                + config.load.amp_kw * angle.sin()
                + gaussian_noise(&mut load_rng, config.load.noise_std);
            load_kw.push(load.max(0.0));

            // Price: tariff-band base price plus small noise.
            let band_price = match TouBand::for_hour(&config.grid, hour) {
                TouBand::OffPeak => config.price.offpeak_per_kwh,
                TouBand::Base => config.price.base_per_kwh,
                TouBand::Peak => config.price.peak_per_kwh,
            };
            let price = band_price + gaussian_noise(&mut price_rng, config.price.noise_std);
            price_per_kwh.push(price.max(0.0));

            // Ambient temperature: warmest mid-afternoon.
            let temp_angle = 2.0 * std::f32::consts::PI * (day_pos - 0.375);
            let temp = config.ambient.mean_c
                + config.ambient.amp_c * temp_angle.sin()
                + gaussian_noise(&mut ambient_rng, config.ambient.noise_std);
            ambient_temp_c.push(temp);
        }

        let arrivals = Self::sample_arrivals(config, horizon_steps, dt_hours, seed);

        Self {
            solar_kw,
            wind_kw,
            load_kw,
            price_per_kwh,
            ambient_temp_c,
            arrivals,
        }
    }

    /// Samples EV session arrivals per day across the horizon.
    ///
    /// Session energy is capped at what the sampled charger rating can
    /// deliver within the dwell window, so every arrival is feasible in
    /// isolation.
    fn sample_arrivals(
        config: &ScenarioConfig,
        horizon_steps: usize,
        dt_hours: f32,
        seed: u64,
    ) -> Vec<Vec<EvArrival>> {
        let spd = config.simulation.steps_per_day;
        let ev = &config.ev;
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(ARRIVAL_SEED_OFFSET));
        let mut arrivals: Vec<Vec<EvArrival>> = vec![Vec::new(); horizon_steps];
        let mut next_vehicle_id = 0_u32;

        let days = horizon_steps.div_ceil(spd);
        for day in 0..days {
            for _ in 0..ev.sessions_per_day {
                let dwell_hours = rng.random_range(ev.dwell_hours_min..=ev.dwell_hours_max);
                let dwell_steps = ((dwell_hours / dt_hours).ceil() as usize).max(1);

                let arrival = day * spd + rng.random_range(0..spd);
                if arrival >= horizon_steps {
                    continue;
                }

                let max_charge_kw = rng.random_range(ev.session_kw_min..=ev.session_kw_max);
                let raw_energy = rng.random_range(ev.energy_kwh_min..=ev.energy_kwh_max);
                let deliverable = max_charge_kw * dwell_steps as f32 * dt_hours;
                let energy_kwh = raw_energy.min(deliverable).max(0.0);

                arrivals[arrival].push(EvArrival {
                    vehicle_id: next_vehicle_id,
                    energy_kwh,
                    max_charge_kw,
                    dwell_steps,
                });
                next_vehicle_id += 1;
            }
        }

        arrivals
    }

    /// Number of materialized steps.
    pub fn len(&self) -> usize {
        self.solar_kw.len()
    }

    /// Returns `true` when no steps are materialized.
    pub fn is_empty(&self) -> bool {
        self.solar_kw.is_empty()
    }

    /// Scalar inputs for the given step.
    ///
    /// # Panics
    ///
    /// Panics when `step` is past the materialized horizon. The horizon is
    /// validated at environment construction, so reaching this panic means
    /// an internal indexing defect.
    pub fn at(&self, step: usize) -> StepExogenous {
        assert!(
            step < self.len(),
            "exogenous feed has no entry for step {step} (horizon {})",
            self.len()
        );
        StepExogenous {
            solar_kw: self.solar_kw[step],
            wind_kw: self.wind_kw[step],
            load_kw: self.load_kw[step],
            price_per_kwh: self.price_per_kwh[step],
            ambient_temp_c: self.ambient_temp_c[step],
        }
    }

    /// EV arrivals firing at the given step.
    ///
    /// # Panics
    ///
    /// Panics when `step` is past the materialized horizon.
    pub fn arrivals(&self, step: usize) -> &[EvArrival] {
        assert!(
            step < self.len(),
            "exogenous feed has no arrivals entry for step {step} (horizon {})",
            self.len()
        );
        &self.arrivals[step]
    }
}
