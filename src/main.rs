//! pv-recommender entry point: CLI wiring, config and catalog loading.

use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use pv_recommender::catalog::Catalog;
use pv_recommender::config::EngineConfig;
use pv_recommender::engine::Engine;
use pv_recommender::intake::{BillingPeriod, IntakeProfile, RoofType, SupplyPhase};
use pv_recommender::io::export::export_csv;

/// Intake fields given directly on the command line.
#[derive(Default)]
struct QuickIntake {
    bill: Option<f64>,
    period: Option<BillingPeriod>,
    tariff: Option<f64>,
    roof: Option<RoofType>,
    storeys: Option<u8>,
    phase: Option<SupplyPhase>,
    postcode: Option<String>,
    brand: Option<String>,
    ev: Option<String>,
}

/// Parsed CLI arguments.
struct CliArgs {
    intake_path: Option<PathBuf>,
    quick: QuickIntake,
    config_path: Option<PathBuf>,
    preset: Option<String>,
    catalog_path: Option<PathBuf>,
    json: bool,
    csv_out: Option<PathBuf>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("pv-recommender - residential solar and battery system recommendations");
    eprintln!();
    eprintln!("Usage: pv-recommender [OPTIONS]");
    eprintln!();
    eprintln!("Intake:");
    eprintln!("  --intake <path>          Load intake from a TOML or JSON file");
    eprintln!("  --bill <amount>          Electricity bill amount");
    eprintln!("  --period <name>          Billing period: monthly, quarterly (default: quarterly)");
    eprintln!("  --tariff <c/kWh>         Tariff in cents per kWh (default: region flat rate)");
    eprintln!("  --roof <type>            tile, metal, concrete, flat, slate (default: tile)");
    eprintln!("  --storeys <1-3>          Number of storeys (default: 1)");
    eprintln!("  --phase <name>           single, three, unknown (default: unknown)");
    eprintln!("  --postcode <code>        Four-digit postcode");
    eprintln!("  --brand <name>           Preferred inverter brand");
    eprintln!("  --ev [brand]             Household owns an EV, optionally of this brand");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load engine config from TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        EngineConfig::PRESETS.join(", ")
    );
    eprintln!("  --catalog <path>         Load product catalog from TOML file");
    eprintln!("  --json                   Print the recommendation as JSON");
    eprintln!("  --csv-out <path>         Export the shortlist to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) for pipeline diagnostics on stderr.");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

/// Returns the argument following `flag`, exiting if it is missing.
fn next_arg<'a>(args: &'a [String], i: &mut usize, flag: &str, kind: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.as_str(),
        None => fail(format!("{flag} requires {kind} argument")),
    }
}

fn parse_value<T: FromStr>(raw: &str, flag: &str, kind: &str) -> T {
    raw.parse::<T>()
        .unwrap_or_else(|_| fail(format!("{flag} value \"{raw}\" is not a valid {kind}")))
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        intake_path: None,
        quick: QuickIntake::default(),
        config_path: None,
        preset: None,
        catalog_path: None,
        json: false,
        csv_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--intake" => cli.intake_path = Some(next_arg(&args, &mut i, flag, "a path").into()),
            "--bill" => {
                let raw = next_arg(&args, &mut i, flag, "a number");
                cli.quick.bill = Some(parse_value(raw, flag, "number"));
            }
            "--period" => {
                let raw = next_arg(&args, &mut i, flag, "a name");
                cli.quick.period = Some(parse_value(raw, flag, "billing period"));
            }
            "--tariff" => {
                let raw = next_arg(&args, &mut i, flag, "a number");
                cli.quick.tariff = Some(parse_value(raw, flag, "number"));
            }
            "--roof" => {
                let raw = next_arg(&args, &mut i, flag, "a roof type");
                cli.quick.roof = Some(parse_value(raw, flag, "roof type"));
            }
            "--storeys" => {
                let raw = next_arg(&args, &mut i, flag, "a number");
                cli.quick.storeys = Some(parse_value(raw, flag, "storey count"));
            }
            "--phase" => {
                let raw = next_arg(&args, &mut i, flag, "a name");
                cli.quick.phase = Some(parse_value(raw, flag, "phase"));
            }
            "--postcode" => cli.quick.postcode = Some(next_arg(&args, &mut i, flag, "a postcode").to_string()),
            "--brand" => cli.quick.brand = Some(next_arg(&args, &mut i, flag, "a brand").to_string()),
            "--ev" => {
                // Brand is optional: only consume the next argument if it is not a flag.
                let brand = args.get(i + 1).filter(|a| !a.starts_with("--"));
                if brand.is_some() {
                    i += 1;
                }
                cli.quick.ev = Some(brand.cloned().unwrap_or_default());
            }
            "--config" => cli.config_path = Some(next_arg(&args, &mut i, flag, "a path").into()),
            "--preset" => cli.preset = Some(next_arg(&args, &mut i, flag, "a name").to_string()),
            "--catalog" => cli.catalog_path = Some(next_arg(&args, &mut i, flag, "a path").into()),
            "--json" => cli.json = true,
            "--csv-out" => cli.csv_out = Some(next_arg(&args, &mut i, flag, "a path").into()),
            #[cfg(feature = "api")]
            "--serve" => cli.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                let raw = next_arg(&args, &mut i, flag, "a u16");
                cli.port = parse_value(raw, flag, "u16");
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

/// Builds the intake from `--intake` or the quick flags. `None` if neither was given.
fn load_intake(cli: &CliArgs) -> Option<IntakeProfile> {
    if let Some(path) = &cli.intake_path {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("cannot read \"{}\": {e}", path.display())));
        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            IntakeProfile::from_json_str(&content)
        } else {
            IntakeProfile::from_toml_str(&content)
        };
        return Some(parsed.unwrap_or_else(|e| fail(e)));
    }

    let q = &cli.quick;
    let bill = q.bill?;
    let mut intake = IntakeProfile::new(
        bill,
        q.period.unwrap_or(BillingPeriod::Quarterly),
        q.roof.unwrap_or(RoofType::Tile),
        q.storeys.unwrap_or(1),
    );
    if let Some(tariff) = q.tariff {
        intake = intake.with_tariff(tariff);
    }
    if let Some(phase) = q.phase {
        intake = intake.with_phase(phase);
    }
    if let Some(postcode) = &q.postcode {
        intake = intake.with_postcode(postcode.as_str());
    }
    if let Some(brand) = &q.brand {
        intake = intake.with_brand_preference(brand.as_str());
    }
    if let Some(ev) = &q.ev {
        intake = intake.with_ev(Some(ev.as_str()));
    }
    if let Err(e) = intake.validate() {
        fail(e);
    }
    Some(intake)
}

fn load_config(cli: &CliArgs) -> EngineConfig {
    let config = if let Some(path) = &cli.config_path {
        EngineConfig::from_toml_file(path)
    } else if let Some(name) = &cli.preset {
        EngineConfig::from_preset(name)
    } else {
        Ok(EngineConfig::baseline())
    };
    let config = config.unwrap_or_else(|e| fail(e));

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn load_catalog(path: Option<&Path>) -> Catalog {
    let catalog = match path {
        Some(path) => Catalog::from_toml_file(path).unwrap_or_else(|e| fail(e)),
        None => Catalog::builtin(),
    };
    let errors = catalog.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    catalog
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    let config = load_config(&cli);
    let catalog = load_catalog(cli.catalog_path.as_deref());
    let region = config.resolve_region().unwrap_or_else(|e| fail(e));

    let intake = load_intake(&cli);

    #[cfg(feature = "api")]
    let serving = cli.serve;
    #[cfg(not(feature = "api"))]
    let serving = false;

    if intake.is_none() && !serving {
        eprintln!("error: no intake given (use --intake <path> or --bill <amount>)");
        print_help();
        process::exit(1);
    }

    if let Some(intake) = intake {
        let recommendation = Engine::new(&catalog, &region, &config)
            .recommend(&intake)
            .unwrap_or_else(|e| fail(e));

        if cli.json {
            match serde_json::to_string_pretty(&recommendation) {
                Ok(json) => println!("{json}"),
                Err(e) => fail(format!("failed to encode JSON: {e}")),
            }
        } else {
            println!("{recommendation}");
        }

        if let Some(path) = &cli.csv_out {
            if let Err(e) = export_csv(&recommendation.shortlist, path) {
                fail(format!("failed to write CSV: {e}"));
            }
            eprintln!("Shortlist written to {}", path.display());
        }
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        use pv_recommender::api::{AppState, ConfigSource};

        let source = match (&cli.config_path, &cli.preset) {
            (Some(path), _) => ConfigSource::File(path.clone()),
            (None, Some(name)) => ConfigSource::Preset(name.clone()),
            (None, None) => ConfigSource::Preset("baseline".to_string()),
        };
        let state = Arc::new(AppState {
            catalog,
            config: source,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        rt.block_on(pv_recommender::api::serve(state, addr));
    }
}
