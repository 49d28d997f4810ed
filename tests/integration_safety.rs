//! Integration tests for the safety invariant under adversarial actions.

mod common;

#[test]
fn random_actions_never_break_battery_bounds() {
    for seed in 0..5 {
        let mut env = common::default_env();
        let mut actions = common::RandomActions::new(seed);
        env.reset();
        let soc_min = env.config().battery.soc_min;
        let soc_max = env.config().battery.soc_max;

        for _ in 0..env.episode_steps() {
            env.step(&actions.next_action());
            let soc = env.battery().soc;
            assert!(
                (soc_min - 1e-5..=soc_max + 1e-5).contains(&soc),
                "SoC {soc} escaped [{soc_min}, {soc_max}] under seed {seed}"
            );
        }
    }
}

#[test]
fn random_actions_never_exceed_grid_limits() {
    let mut env = common::default_env();
    let mut actions = common::RandomActions::new(99);
    env.reset();
    let max_import = env.config().grid.max_import_kw;
    let max_export = env.config().grid.max_export_kw;

    for _ in 0..env.episode_steps() {
        env.step(&actions.next_action());
    }
    for r in env.records() {
        assert!(
            r.grid_kw <= max_import + 1e-4 && r.grid_kw >= -max_export - 1e-4,
            "grid exchange {} escaped [-{max_export}, {max_import}] at step {}",
            r.grid_kw,
            r.step
        );
    }
}

#[test]
fn random_actions_never_exceed_fleet_limit() {
    let mut env = common::default_env();
    let mut actions = common::RandomActions::new(123);
    env.reset();
    let max_total = env.config().ev.max_total_kw;

    for _ in 0..env.episode_steps() {
        env.step(&actions.next_action());
    }
    for r in env.records() {
        assert!(
            r.ev_charge_kw <= max_total + 1e-4 && r.ev_charge_kw >= 0.0,
            "fleet draw {} escaped [0, {max_total}] at step {}",
            r.ev_charge_kw,
            r.step
        );
    }
}

#[test]
fn battery_soh_never_increases_under_any_policy() {
    let mut env = common::default_env();
    let mut actions = common::RandomActions::new(5);
    env.reset();
    let mut last_soh = env.battery().soh;
    for _ in 0..env.episode_steps() {
        env.step(&actions.next_action());
        let soh = env.battery().soh;
        assert!(soh <= last_soh, "SoH increased from {last_soh} to {soh}");
        last_soh = soh;
    }
}

#[test]
fn violations_are_recorded_iff_clipping_occurred() {
    let mut env = common::default_env();
    env.reset();

    // Idle action within every range: zero violations, zero penalty.
    let clean = env.step(&common::idle_action());
    assert_eq!(clean.info.violation_count, 0);
    assert_eq!(clean.info.safety_penalty, 0.0);

    // Grossly out-of-range action on every component: penalty matches the
    // recorded violations exactly.
    let dirty = env.step(&[2.0, 2.0, 2.0, 2.0]);
    assert!(dirty.info.violation_count > 0);
    assert!(dirty.info.safety_penalty > 0.0);
}

#[test]
fn safety_penalty_flows_into_reward_breakdown() {
    let mut env = common::default_env();
    env.reset();
    let result = env.step(&[2.0, 2.0, 2.0, 2.0]);
    assert_eq!(result.info.breakdown.safety, result.info.safety_penalty);
}

#[test]
fn curtailment_command_reduces_generation() {
    let mut cfg = common::default_config();
    cfg.wind.mean_frac = 0.8;
    cfg.wind.gust_noise_std = 0.0;
    let mut env = microgrid_env::env::MicrogridEnv::from_config(cfg).expect("valid config");
    env.reset();
    // Full curtailment: nothing reaches the bus.
    let result = env.step(&[0.0, 0.0, 0.0, 1.0]);
    let record = env.records().last().cloned().expect("one record");
    assert_eq!(record.generation_kw, 0.0);
    assert!(record.curtailed_kw > 0.0, "wind was available to discard");
    assert!(result.info.curtailed_kwh > 0.0);
}
