//! Demo runner — CLI wiring and config-driven environment episodes.

use std::path::Path;
use std::process;

use microgrid_env::config::ScenarioConfig;
use microgrid_env::env::MicrogridEnv;
use microgrid_env::env::report::EpisodeReport;
use microgrid_env::policy::{PassivePolicy, Policy, TouArbitragePolicy};
use microgrid_env::telemetry::export_csv;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    episodes: usize,
    policy: String,
    telemetry_out: Option<String>,
    quiet: bool,
}

fn print_help() {
    eprintln!("microgrid-env — microgrid control environment demo runner");
    eprintln!();
    eprintln!("Usage: microgrid-env [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --episodes <n>           Number of episodes to run (default: 1)");
    eprintln!("  --policy <name>          Scripted policy: passive | tou (default: tou)");
    eprintln!("  --telemetry-out <path>   Export last episode's step records to CSV");
    eprintln!("  --quiet                  Suppress per-step log lines");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        episodes: 1,
        policy: "tou".to_string(),
        telemetry_out: None,
        quiet: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--episodes" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --episodes requires a count argument");
                    process::exit(1);
                }
                match args[i].parse::<usize>() {
                    Ok(n) if n > 0 => cli.episodes = n,
                    _ => {
                        eprintln!(
                            "error: --episodes value \"{}\" is not a positive count",
                            args[i]
                        );
                        process::exit(1);
                    }
                }
            }
            "--policy" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --policy requires a name argument");
                    process::exit(1);
                }
                cli.policy = args[i].clone();
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            "--quiet" => {
                cli.quiet = true;
            }
            other => {
                eprintln!("error: unknown argument: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive");
        process::exit(1);
    }
    if cli.policy != "passive" && cli.policy != "tou" {
        eprintln!(
            "error: unknown policy \"{}\" (expected passive | tou)",
            cli.policy
        );
        process::exit(1);
    }

    cli
}

fn load_config(cli: &CliArgs) -> ScenarioConfig {
    let mut config = if let Some(path) = &cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    } else {
        let preset = cli.preset.as_deref().unwrap_or("baseline");
        match ScenarioConfig::from_preset(preset) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    };

    if let Some(seed) = cli.seed_override {
        config.simulation.seed = seed;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("error: {e}");
        }
        process::exit(1);
    }

    config
}

fn run_episode(env: &mut MicrogridEnv, policy: &mut dyn Policy, quiet: bool) {
    let mut obs = env.reset();
    loop {
        let action = policy.act(&obs);
        let result = env.step(&action);
        if !quiet {
            if let Some(record) = env.records().last() {
                println!("{record}");
            }
        }
        obs = result.observation;
        if result.done {
            if result.info.terminal_infeasible {
                println!(
                    "episode terminated early at step {}: demand exceeds every \
                     supply source at maximum safe output",
                    env.current_step()
                );
            }
            break;
        }
    }
}

fn main() {
    let cli = parse_args();
    let base_config = load_config(&cli);

    for episode in 0..cli.episodes {
        let mut config = base_config.clone();
        config.simulation.seed = base_config.simulation.seed.wrapping_add(episode as u64);

        let mut env = match MicrogridEnv::from_config(config) {
            Ok(env) => env,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };

        let layout = *env.observation_layout();
        let mut passive;
        let mut tou;
        let policy: &mut dyn Policy = if cli.policy == "passive" {
            passive = PassivePolicy::new(env.config(), layout);
            &mut passive
        } else {
            tou = TouArbitragePolicy::new(env.config(), layout);
            &mut tou
        };

        println!(
            "episode {episode} | policy={} seed={} steps={}",
            policy.name(),
            env.config().simulation.seed,
            env.episode_steps()
        );
        run_episode(&mut env, policy, cli.quiet);

        let report = EpisodeReport::from_records(
            env.records(),
            env.config().dt_hours(),
            env.battery().capacity_kwh,
        );
        println!("\n{report}\n");

        let health = env.monitor().health_summary();
        println!(
            "health: overall={:.3} active_alerts={} total_alerts={}",
            health.overall_health, health.active_alert_count, health.total_alert_count
        );
        for (component, index) in &health.component_health {
            println!("  {component}: {index:.3}");
        }
        for alert in env.monitor().all_alerts() {
            println!("  {alert}");
        }

        // Telemetry covers the final episode when several are run.
        if episode + 1 == cli.episodes {
            if let Some(path) = &cli.telemetry_out {
                if let Err(e) = export_csv(env.records(), Path::new(path)) {
                    eprintln!("error: failed to write telemetry to \"{path}\": {e}");
                    process::exit(1);
                }
                println!("telemetry written to {path}");
            }
        }
    }
}
