//! Shared test fixtures for integration tests.

use microgrid_env::config::ScenarioConfig;
use microgrid_env::env::MicrogridEnv;
use microgrid_env::env::action::ACTION_DIM;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Default test configuration: hourly steps, one day, seed 42.
///
/// Hourly resolution keeps episodes short while exercising every
/// tariff band.
pub fn default_config() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.steps_per_day = 24;
    cfg
}

/// Builds an environment over the default test configuration.
pub fn default_env() -> MicrogridEnv {
    MicrogridEnv::from_config(default_config()).expect("default test config should be valid")
}

/// Normalized action that leaves every asset alone.
pub fn idle_action() -> Vec<f32> {
    vec![0.0; ACTION_DIM]
}

/// Deterministic stream of random actions, deliberately overshooting the
/// symbolic ranges so the safety supervisor has work to do.
pub struct RandomActions {
    rng: StdRng,
}

impl RandomActions {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_action(&mut self) -> Vec<f32> {
        (0..ACTION_DIM)
            .map(|_| self.rng.random_range(-2.0..=2.0_f32))
            .collect()
    }
}
