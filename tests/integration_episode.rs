//! Integration tests for the episode lifecycle and step contract.

mod common;

use microgrid_env::env::EnvPhase;
use microgrid_env::env::report::EpisodeReport;

#[test]
fn episode_yields_done_only_on_final_step() {
    let mut env = common::default_env();
    env.reset();
    let steps = env.episode_steps();
    for t in 0..steps {
        let result = env.step(&common::idle_action());
        if t + 1 < steps {
            assert!(!result.done, "done=true before the final step at t={t}");
        } else {
            assert!(result.done, "done=false on the final step");
        }
    }
}

#[test]
fn reset_twice_returns_identical_observations() {
    let mut env = common::default_env();
    let first = env.reset();
    let second = env.reset();
    assert_eq!(first, second);
}

#[test]
fn reset_after_done_starts_a_fresh_episode() {
    let mut env = common::default_env();
    env.reset();
    for _ in 0..env.episode_steps() {
        env.step(&common::idle_action());
    }
    assert_eq!(env.phase(), EnvPhase::Done);

    let obs = env.reset();
    assert_eq!(env.phase(), EnvPhase::Running);
    assert_eq!(env.current_step(), 0);
    assert_eq!(obs.len(), env.observation_size());
    assert!(env.records().is_empty());
}

#[test]
fn info_exposes_the_minimum_contract_fields() {
    let mut env = common::default_env();
    env.reset();
    let result = env.step(&common::idle_action());
    let info = &result.info;
    assert!(info.energy_cost.is_finite());
    assert!(info.emissions_kg.is_finite() && info.emissions_kg >= 0.0);
    assert!(info.degradation_cost.is_finite() && info.degradation_cost >= 0.0);
    assert!(info.safety_penalty >= 0.0);
    assert_eq!(info.violation_count, info.violations.len());
}

#[test]
fn reward_always_equals_negative_breakdown_total() {
    let mut env = common::default_env();
    let mut actions = common::RandomActions::new(7);
    env.reset();
    for _ in 0..env.episode_steps() {
        let result = env.step(&actions.next_action());
        assert!(
            (result.reward + result.info.breakdown.total()).abs() < 1e-5,
            "reward must be the negative sum of its breakdown"
        );
    }
}

#[test]
fn episode_violation_total_equals_per_step_sum() {
    let mut env = common::default_env();
    let mut actions = common::RandomActions::new(11);
    env.reset();

    let mut from_info = 0_usize;
    for _ in 0..env.episode_steps() {
        let result = env.step(&actions.next_action());
        from_info += result.info.violation_count;
    }

    let from_records: usize = env.records().iter().map(|r| r.violation_count).sum();
    let report = EpisodeReport::from_records(
        env.records(),
        env.config().dt_hours(),
        env.battery().capacity_kwh,
    );
    assert_eq!(from_info, from_records);
    assert_eq!(report.violation_count, from_records);
}

#[test]
fn report_matches_record_totals() {
    let mut env = common::default_env();
    env.reset();
    for _ in 0..env.episode_steps() {
        env.step(&common::idle_action());
    }

    let records = env.records();
    let report = EpisodeReport::from_records(
        records,
        env.config().dt_hours(),
        env.battery().capacity_kwh,
    );

    let reward_sum: f32 = records.iter().map(|r| r.reward).sum();
    let cost_sum: f32 = records.iter().map(|r| r.energy_cost).sum();
    assert!((report.total_reward - reward_sum).abs() < 1e-4);
    assert!((report.total_energy_cost - cost_sum).abs() < 1e-4);
    assert_eq!(report.steps, records.len());
    assert!(report.final_soh <= 1.0);
}

#[test]
fn multi_day_episode_runs_to_length() {
    let mut cfg = common::default_config();
    cfg.simulation.days = 3;
    let mut env = microgrid_env::env::MicrogridEnv::from_config(cfg).expect("valid config");
    env.reset();
    let mut done_count = 0;
    for _ in 0..env.episode_steps() {
        if env.step(&common::idle_action()).done {
            done_count += 1;
        }
    }
    assert_eq!(done_count, 1);
    assert_eq!(env.records().len(), 72);
}
