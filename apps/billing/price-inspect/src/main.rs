//! Price Inspect
//!
//! Decodes price payloads (a single price or a list page) from a file or
//! stdin, and reports how the client models see them.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_pricing::{ModelOptions, PriceCodec};
use eyre::{Result, WrapErr};
use tracing::info;

mod inspect;

use inspect::Payload;

#[derive(Parser)]
#[command(name = "price-inspect")]
#[command(about = "Decode, validate and round-trip price payloads")]
struct Cli {
    /// Reject invalid or unknown prices while decoding
    /// (overrides PRICING_RESPONSE_VALIDATION)
    #[arg(long, global = true)]
    validate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the model type of every price and whether it is known
    Decode {
        /// Input file; reads stdin when omitted
        path: Option<PathBuf>,
    },

    /// Validate every price and report failures
    Validate {
        /// Input file; reads stdin when omitted
        path: Option<PathBuf>,
    },

    /// Re-encode the payload and compare it with the input
    Roundtrip {
        /// Input file; reads stdin when omitted
        path: Option<PathBuf>,
    },
}

fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .wrap_err("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();

    let mut options = ModelOptions::from_env()?;
    if cli.validate {
        options = options.with_response_validation(true);
    }
    let codec = PriceCodec::new(options);

    match cli.command {
        Commands::Decode { path } => {
            let bytes = read_input(path.as_ref())?;
            let payload = Payload::decode(&codec, &bytes)?;
            let summary = inspect::summarize(&payload);
            info!(prices = summary.len(), "decoded payload");
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Validate { path } => {
            let bytes = read_input(path.as_ref())?;
            let payload = Payload::decode(&codec, &bytes)?;
            let reports = inspect::validate_all(&payload);
            println!("{}", serde_json::to_string_pretty(&reports)?);

            let invalid = reports.iter().filter(|r| !r.valid).count();
            if invalid > 0 {
                eyre::bail!("{invalid} of {} price(s) failed validation", reports.len());
            }
        }

        Commands::Roundtrip { path } => {
            let bytes = read_input(path.as_ref())?;
            let input: serde_json::Value =
                serde_json::from_slice(&bytes).wrap_err("Input is not valid JSON")?;
            let payload = Payload::decode(&codec, &bytes)?;
            let report = inspect::round_trip(&input, &payload)?;
            info!(identical = report.identical, "round trip complete");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
