use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rust_decimal::Decimal;

use credo_tools::data;
use credo_tools::logging;
use credo_tools::statement::credo::load_transactions;
use credo_tools::statement::matching::{match_transactions, MatchOptions};
use credo_tools::statement::transfers::{find_currency_transfers, TransferIndex};
use credo_tools::statement::zen::ZenTable;

/// Match transactions from a ZenMoney CSV with a Credo bank JSON export.
#[derive(Debug, Parser)]
#[command(name = "credo-match", version)]
struct Cli {
    /// Path to the ZenMoney CSV file
    zen_csv: PathBuf,

    /// Path to the Credo bank JSON file
    credo_json: PathBuf,

    /// Output CSV file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output CSV file for currency transfers
    #[arg(short, long)]
    transfers: Option<PathBuf>,

    /// Date format in the ZenMoney CSV
    #[arg(short, long, default_value = "%Y-%m-%d")]
    date_format: String,

    /// Tolerance for date matching in days
    #[arg(long, default_value_t = 1)]
    tolerance: i64,

    /// Relative tolerance for amount matching
    #[arg(short, long, default_value = "0.01")]
    amount_tolerance: Decimal,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Row number (0-based) holding the ZenMoney headers (default: auto-detect)
    #[arg(long)]
    header_row: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let zen = ZenTable::load(&cli.zen_csv, cli.header_row)
        .with_context(|| format!("failed to load {}", cli.zen_csv.display()))?;
    let file = File::open(&cli.credo_json).with_context(|| format!("failed to open {}", cli.credo_json.display()))?;
    let credo = load_transactions(BufReader::new(file))
        .with_context(|| format!("failed to load {}", cli.credo_json.display()))?;

    info!("loaded {} ZenMoney transactions", zen.len());
    info!("loaded {} Credo bank transactions", credo.len());

    let pairs = find_currency_transfers(&credo);
    info!("found {} currency transfer pairs", pairs.len());

    if let Some(path) = cli.transfers.as_deref() {
        if !pairs.is_empty() {
            data::export_transfers(&pairs, data::open_output(Some(path))?)?;
            info!("currency transfers saved to {}", path.display());
        }
    }

    let options = MatchOptions {
        date_format: cli.date_format,
        date_tolerance_days: cli.tolerance,
        amount_tolerance: cli.amount_tolerance,
    };
    let index = TransferIndex::new(&pairs);
    let matches = match_transactions(&zen, &credo, &index, &options)?;

    data::export_matches(&matches, &zen, data::open_output(cli.output.as_deref())?)?;
    if let Some(path) = cli.output.as_deref() {
        info!("results saved to {}", path.display());
    }

    Ok(())
}
