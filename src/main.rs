//! Representative-day clusterer entry point — CLI wiring and pipeline run.

use std::path::Path;
use std::process;

use repdays::config::RunConfig;
use repdays::io::export::export_csv;
use repdays::io::series::read_series_csv;
use repdays::pipeline::{RunSummary, run_clustering};
use repdays::weather::WeatherData;

/// Parsed CLI arguments.
struct CliArgs {
    weather_path: Option<String>,
    price_path: Option<String>,
    wind_path: Option<String>,
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    summary_out: Option<String>,
}

fn print_help() {
    eprintln!("repdays — representative-day selection for annual energy simulation");
    eprintln!();
    eprintln!("Usage: repdays --weather <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --weather <path>      Annual weather file (SAM-style CSV, required)");
    eprintln!("  --price <path>        Hourly electricity price CSV (single column)");
    eprintln!("  --wind <path>         Hourly wind-resource CSV (single column)");
    eprintln!("  --scenario <path>     Load run configuration from TOML file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, pv_battery, coarse)");
    eprintln!("  --seed <u64>          Override the clustering seed");
    eprintln!("  --summary-out <path>  Export the per-cluster summary to CSV");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        weather_path: None,
        price_path: None,
        wind_path: None,
        scenario_path: None,
        preset: None,
        seed_override: None,
        summary_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--weather" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --weather requires a path argument");
                    process::exit(1);
                }
                cli.weather_path = Some(args[i].clone());
            }
            "--price" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --price requires a path argument");
                    process::exit(1);
                }
                cli.price_path = Some(args[i].clone());
            }
            "--wind" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --wind requires a path argument");
                    process::exit(1);
                }
                cli.wind_path = Some(args[i].clone());
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
            "--summary-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --summary-out requires a path argument");
                    process::exit(1);
                }
                cli.summary_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();

    // Logs go to stderr so stdout stays a parseable table.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config: --scenario takes priority, then --preset, then baseline default
    let mut config = if let Some(ref path) = cli.scenario_path {
        match RunConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match RunConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        RunConfig::baseline()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        config.clustering.seed = seed;
    }

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Load inputs
    let Some(ref weather_path) = cli.weather_path else {
        eprintln!("error: --weather is required");
        eprintln!();
        print_help();
        process::exit(1);
    };
    let weather = match WeatherData::from_csv_path(Path::new(weather_path)) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let price = cli.price_path.as_ref().map(|p| {
        read_series_csv(Path::new(p)).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    });
    let wind = cli.wind_path.as_ref().map(|p| {
        read_series_csv(Path::new(p)).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        })
    });

    // Cluster
    let run = match run_clustering(&weather, wind.as_deref(), price.as_deref(), &config) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // Print the per-cluster table
    let rows = run.summary_rows();
    for r in &rows {
        println!("{r}");
    }

    // Print the run summary
    println!("\n{}", RunSummary::from_run(&run));

    // Export CSV if requested
    if let Some(ref path) = cli.summary_out {
        if let Err(e) = export_csv(&rows, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Summary written to {path}");
    }
}
