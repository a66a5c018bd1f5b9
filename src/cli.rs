use std::env;
use std::path::PathBuf;

/// Parsed command-line options for the `battery-box-sim` binary.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub weather: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub summary_out: Option<PathBuf>,
    pub log_json: bool,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                set_once(&mut opts.scenario, PathBuf::from(path), "--scenario")?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--weather" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --weather (expected a CSV file path)")?;
                set_once(&mut opts.weather, PathBuf::from(path), "--weather")?;
            }
            "--load" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --load (expected a CSV file path)")?;
                set_once(&mut opts.load, PathBuf::from(path), "--load")?;
            }
            "--out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --out (expected a file path)")?;
                set_once(&mut opts.out, PathBuf::from(path), "--out")?;
            }
            "--summary-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --summary-out (expected a file path)")?;
                set_once(&mut opts.summary_out, PathBuf::from(path), "--summary-out")?;
            }
            "--log-json" => opts.log_json = true,
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("battery-box-sim: thermal simulation of a battery in an insulated box");
    eprintln!();
    eprintln!("Usage: battery-box-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, cold_climate, no_heater)");
    eprintln!("  --weather <path>         Weather CSV (timestamp,ambient_temp_c,irradiance_w_m2)");
    eprintln!("  --load <path>            Load CSV (timestamp,load_w)");
    eprintln!("  --out <path>             Export result rows to CSV");
    eprintln!("  --summary-out <path>     Export run summary to JSON");
    eprintln!("  --log-json               Emit logs as JSON lines");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}
