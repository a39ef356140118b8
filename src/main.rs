//! Command line entry point: merges the linked sheets of a catalog workbook.

use anyhow::Context;
use anyhow::Result;
use catalog_merge::merge::DEFAULT_CATALOG_SHEET;
use catalog_merge::merge::DEFAULT_INPUT;
use catalog_merge::merge::DEFAULT_OUTPUT;
use catalog_merge::MergeConfig;
use clap::Parser;
use std::path::PathBuf;

/// Copies the data rows of every sheet linked from the catalog sheet into a new workbook.
#[derive(Parser)]
#[command(name = "catalog-merge", version, long_about = None)]
struct Cli {
    /// Workbook containing the catalog sheet
    #[arg(env = "CATALOG_MERGE_INPUT", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Workbook to create
    #[arg(env = "CATALOG_MERGE_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Name of the catalog sheet
    #[arg(long, env = "CATALOG_MERGE_CATALOG", default_value = DEFAULT_CATALOG_SHEET)]
    catalog: String,

    /// Log format: text (default) or json.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "catalog_merge=info",
        1 => "catalog_merge=debug",
        _ => "catalog_merge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = MergeConfig {
        input: cli.input,
        output: cli.output,
        catalog_sheet: cli.catalog,
    };
    catalog_merge::run(&config).context("catalog merge failed")?;
    Ok(())
}
