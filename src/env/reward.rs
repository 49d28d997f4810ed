//! Multi-objective reward computation with per-term attribution.

use crate::config::RewardConfig;
use crate::env::safety::ViolationRecord;

/// Everything the reward calculator consumes for one step.
///
/// Created fresh each step from executed-action outcomes; discarded after
/// reward computation except for logging.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Net grid energy cost (import spend minus export revenue).
    pub energy_cost: f32,
    /// Emissions from imported energy (kg CO2).
    pub emissions_kg: f32,
    /// Monetary value of battery health lost this step.
    pub degradation_cost: f32,
    /// `true` when any demand (site load or an EV session) went unmet.
    pub unmet_demand: bool,
    /// Energy that went unserved this step (kWh).
    pub unmet_kwh: f32,
    /// Summed safety penalty from the supervisor.
    pub safety_penalty: f32,
    /// Violations recorded by the supervisor this step.
    pub violations: ViolationRecord,
}

/// Per-term reward attribution, already weighted into cost units.
///
/// The scalar reward always equals the negative sum of these terms, so
/// consumers can attribute contributions without recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardBreakdown {
    /// Net energy cost term.
    pub cost: f32,
    /// Weighted emissions term.
    pub emissions: f32,
    /// Weighted degradation term.
    pub degradation: f32,
    /// Reliability term (flat weight while any demand is unmet).
    pub reliability: f32,
    /// Safety penalty term, passed through from the supervisor.
    pub safety: f32,
}

impl RewardBreakdown {
    /// Sum of all terms; the reward is the negation of this.
    pub fn total(&self) -> f32 {
        self.cost + self.emissions + self.degradation + self.reliability + self.safety
    }
}

/// The single authoritative reward calculator.
///
/// Pure function of the step outcome; weights are fixed configuration
/// constants, never derived at runtime. Invoked exactly once per step —
/// any external reward shaping must transform the returned breakdown
/// rather than recompute it.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    weight_emissions: f32,
    weight_degradation: f32,
    weight_reliability: f32,
}

impl RewardCalculator {
    /// Creates a calculator from validated configuration.
    pub fn new(config: &RewardConfig) -> Self {
        Self {
            weight_emissions: config.weight_emissions,
            weight_degradation: config.weight_degradation,
            weight_reliability: config.weight_reliability,
        }
    }

    /// Computes the scalar reward and its per-term breakdown.
    ///
    /// # Panics
    ///
    /// Panics if the result is non-finite — bounded, clipped inputs can
    /// never produce NaN/Inf, so a non-finite reward is a modeling defect
    /// that must not be coerced away.
    pub fn compute(&self, outcome: &StepOutcome) -> (f32, RewardBreakdown) {
        let breakdown = RewardBreakdown {
            cost: outcome.energy_cost,
            emissions: self.weight_emissions * outcome.emissions_kg,
            degradation: self.weight_degradation * outcome.degradation_cost,
            reliability: if outcome.unmet_demand {
                self.weight_reliability
            } else {
                0.0
            },
            safety: outcome.safety_penalty,
        };
        let reward = -breakdown.total();
        assert!(
            reward.is_finite(),
            "non-finite reward from outcome {outcome:?}"
        );
        (reward, breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewardConfig;

    fn calculator() -> RewardCalculator {
        RewardCalculator::new(&RewardConfig::default())
    }

    #[test]
    fn zero_activity_yields_zero_reward() {
        let (reward, breakdown) = calculator().compute(&StepOutcome::default());
        assert_eq!(reward, 0.0);
        assert_eq!(breakdown.total(), 0.0);
    }

    #[test]
    fn reward_equals_negative_breakdown_sum() {
        let outcome = StepOutcome {
            energy_cost: 3.5,
            emissions_kg: 12.0,
            degradation_cost: 0.8,
            unmet_demand: true,
            unmet_kwh: 2.0,
            safety_penalty: 7.0,
            violations: Default::default(),
        };
        let (reward, breakdown) = calculator().compute(&outcome);
        assert!((reward + breakdown.total()).abs() < 1e-6);
    }

    #[test]
    fn terms_are_weighted_from_config() {
        let cfg = RewardConfig {
            weight_emissions: 2.0,
            weight_degradation: 3.0,
            weight_reliability: 10.0,
        };
        let calc = RewardCalculator::new(&cfg);
        let outcome = StepOutcome {
            energy_cost: 1.0,
            emissions_kg: 5.0,
            degradation_cost: 0.5,
            unmet_demand: true,
            ..Default::default()
        };
        let (reward, breakdown) = calc.compute(&outcome);
        assert_eq!(breakdown.cost, 1.0);
        assert_eq!(breakdown.emissions, 10.0);
        assert_eq!(breakdown.degradation, 1.5);
        assert_eq!(breakdown.reliability, 10.0);
        assert_eq!(breakdown.safety, 0.0);
        assert!((reward + 22.5).abs() < 1e-6);
    }

    #[test]
    fn reliability_term_is_flat_indicator() {
        let calc = calculator();
        let small = StepOutcome {
            unmet_demand: true,
            unmet_kwh: 0.1,
            ..Default::default()
        };
        let large = StepOutcome {
            unmet_demand: true,
            unmet_kwh: 100.0,
            ..Default::default()
        };
        let (_, a) = calc.compute(&small);
        let (_, b) = calc.compute(&large);
        assert_eq!(a.reliability, b.reliability);
    }

    #[test]
    fn export_revenue_can_make_reward_positive() {
        let outcome = StepOutcome {
            energy_cost: -2.0,
            ..Default::default()
        };
        let (reward, _) = calculator().compute(&outcome);
        assert_eq!(reward, 2.0);
    }
}
