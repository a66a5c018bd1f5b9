//! Battery box simulator entry point: CLI wiring and config-driven run.

use std::process;

use tracing::info;

use battery_box_sim::cli::{self, CliOptions};
use battery_box_sim::config::ScenarioConfig;
use battery_box_sim::error::SimError;
use battery_box_sim::input::load_series;
use battery_box_sim::io::export::{export_csv, export_summary_json};
use battery_box_sim::sim::engine::run_scenario;
use battery_box_sim::telemetry::init_tracing;

fn load_config(cli: &CliOptions) -> Result<ScenarioConfig, SimError> {
    // --scenario takes priority, then --preset, then baseline default
    let mut cfg = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
        (None, Some(name)) => ScenarioConfig::from_preset(name)?,
        (None, None) => ScenarioConfig::baseline(),
    };
    if let Some(path) = &cli.weather {
        cfg.weather.csv_path = Some(path.clone());
    }
    if let Some(path) = &cli.load {
        cfg.load.csv_path = Some(path.clone());
    }
    Ok(cfg)
}

fn run(cli: &CliOptions) -> Result<(), SimError> {
    let cfg = load_config(cli)?;

    let errors = cfg.validate();
    if let Some(first) = errors.first() {
        for e in &errors {
            eprintln!("{e}");
        }
        return Err(first.clone().into());
    }

    let series = load_series(&cfg)?;
    let result = run_scenario(&cfg, &series)?;
    let summary = result.summary();

    println!("{summary}");

    if let Some(path) = &cli.out {
        export_csv(result.rows(), path)?;
        info!(path = %path.display(), rows = result.len(), "results written");
    }
    if let Some(path) = &cli.summary_out {
        export_summary_json(&summary, path)?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}

fn main() {
    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if cli.help {
        cli::print_usage();
        return;
    }

    init_tracing(cli.log_json);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
