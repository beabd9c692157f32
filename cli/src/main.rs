mod config;
mod logging;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use license_monitor_parser::output::{
    LicenseReport, OutputFormat, UsersOfReport, format_catalog, format_reports, format_users_of,
};
use license_monitor_parser::{LicenseParser, ParseOutcome};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use config::{ConfigError, DialectChoice, MonitorConfig};

/// Input path meaning "read the dump from stdin".
const STDIN_INPUT: &str = "-";

const EXIT_FAILURE: i32 = 1;
const EXIT_UNAVAILABLE: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "lsmon-report")]
#[command(about = "Report license seat usage from captured license server status dumps")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one or more status dumps (`-` reads stdin).
    Parse(ParseArgs),
    /// Print the effective product code catalog.
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Dump files to parse; `-` reads stdin.
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Dump dialect (default: from config, else auto-detect).
    #[arg(long)]
    dialect: Option<DialectChoice>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
    /// Print only the holders of this product (display name or product code).
    #[arg(long)]
    product: Option<String>,
    /// Show every product instead of the featured ones.
    #[arg(long)]
    all: bool,
    /// Reference time for elapsed durations and expiry checks,
    /// as `YYYY-MM-DDTHH:MM[:SS]` (default: local time).
    #[arg(long, value_parser = parse_reference_time)]
    now: Option<NaiveDateTime>,
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{failed} of {total} input(s) could not reach the license server")]
    Unavailable { failed: usize, total: usize },
    #[error("{0}")]
    Message(String),
}

impl From<String> for CliError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::Unavailable { .. } => EXIT_UNAVAILABLE,
            _ => EXIT_FAILURE,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = MonitorConfig::load_or_default(cli.config.as_deref())?;
    logging::init_logging(&config.log_level);
    debug!(config = ?cli.config, dialect = ?config.dialect, "Loaded configuration");

    match cli.command {
        Command::Parse(args) => run_parse(args, &config),
        Command::Catalog(args) => run_catalog(args, &config),
    }
}

// ---------------------------------------------------------------------------
// parse command
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs, config: &MonitorConfig) -> Result<(), CliError> {
    let dialect = args.dialect.unwrap_or(config.dialect).dialect();
    let parser = LicenseParser::new(dialect, config.catalog());
    let now = args.now.unwrap_or_else(|| Local::now().naive_local());
    let inputs = read_inputs(&args.inputs)?;
    let total = inputs.len();

    // Dumps are independent; each gets its own table.
    let results: Vec<_> = inputs
        .into_par_iter()
        .map(|(source, text)| {
            let result = parser.parse_at(&text, now);
            (source, result)
        })
        .collect();

    let filters: &[String] = if args.all || args.product.is_some() {
        &[]
    } else {
        &config.featured_products
    };

    let mut parsed: Vec<(String, ParseOutcome)> = Vec::with_capacity(total);
    let mut failed = 0;
    for (source, result) in results {
        match result {
            Ok(outcome) => parsed.push((source, outcome)),
            Err(err) => {
                warn!(%source, error = %err, "Skipping unavailable license server dump");
                eprintln!("error: {source}: {err}");
                failed += 1;
            }
        }
    }

    if !parsed.is_empty() {
        let output = match args.product.as_deref() {
            Some(product) => {
                let name = parser.catalog().resolve(product);
                let reports: Vec<UsersOfReport> = parsed
                    .iter()
                    .map(|(source, outcome)| UsersOfReport::build(source, &outcome.table, name, now))
                    .collect();
                format_users_of(&reports, args.format)?
            }
            None => {
                let reports: Vec<LicenseReport> = parsed
                    .iter()
                    .map(|(source, outcome)| LicenseReport::build(source, outcome, filters, now))
                    .collect();
                format_reports(&reports, args.format)?
            }
        };
        println!("{}", output.trim_end());
    }

    if failed > 0 {
        return Err(CliError::Unavailable { failed, total });
    }
    Ok(())
}

/// Reads every input up front as `(source, text)` pairs.
fn read_inputs(inputs: &[String]) -> Result<Vec<(String, String)>, CliError> {
    if inputs.iter().filter(|input| *input == STDIN_INPUT).count() > 1 {
        return Err(CliError::Message(
            "stdin ('-') can only be given once".to_string(),
        ));
    }

    inputs
        .iter()
        .map(|input| -> Result<(String, String), CliError> {
            if input == STDIN_INPUT {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|err| format!("Failed to read stdin: {err}"))?;
                Ok(("stdin".to_string(), text))
            } else {
                let text = fs::read_to_string(input)
                    .map_err(|err| format!("Failed to read '{input}': {err}"))?;
                Ok((input.clone(), text))
            }
        })
        .collect()
}

fn parse_reference_time(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got '{value}'"))
}

// ---------------------------------------------------------------------------
// catalog command
// ---------------------------------------------------------------------------

fn run_catalog(args: CatalogArgs, config: &MonitorConfig) -> Result<(), CliError> {
    let output = format_catalog(&config.catalog(), args.format)?;
    println!("{}", output.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_time() {
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(parse_reference_time("2024-06-15T12:00"), Ok(expected));
        assert_eq!(parse_reference_time("2024-06-15 12:00:00"), Ok(expected));
        assert!(parse_reference_time("yesterday").is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Unavailable { failed: 1, total: 2 }.exit_code(),
            EXIT_UNAVAILABLE
        );
        assert_eq!(
            CliError::Message("boom".to_string()).exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_cli_parses_parse_arguments() {
        let cli = Cli::try_parse_from([
            "lsmon-report",
            "parse",
            "a.txt",
            "-",
            "--dialect",
            "verbose",
            "--format",
            "json",
            "--all",
        ])
        .unwrap();
        let Command::Parse(args) = cli.command else {
            panic!("expected parse command");
        };
        assert_eq!(args.inputs, vec!["a.txt", "-"]);
        assert_eq!(args.dialect, Some(DialectChoice::Verbose));
        assert!(args.all);
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_cli_accepts_format_with_product() {
        let cli = Cli::try_parse_from([
            "lsmon-report",
            "parse",
            "a.txt",
            "--product",
            "RVT",
            "--format",
            "yaml",
        ])
        .unwrap();
        let Command::Parse(args) = cli.command else {
            panic!("expected parse command");
        };
        assert_eq!(args.product.as_deref(), Some("RVT"));
        assert!(matches!(args.format, OutputFormat::Yaml));
    }
}
