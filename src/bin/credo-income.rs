use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};

use credo_tools::data;
use credo_tools::logging;
use credo_tools::statement::income::{summarize_income, Period};
use credo_tools::statement::zen::ZenTable;

/// Sum income per period from ZenMoney CSV exports.
#[derive(Debug, Parser)]
#[command(name = "credo-income", version)]
struct Cli {
    /// Grouping unit: D, W, M, Q or Y for day, week, month, quarter and year
    #[arg(short, long, default_value = "M")]
    time: Period,

    /// Row number (0-based) holding the headers (default: auto-detect)
    #[arg(long)]
    header_row: Option<usize>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(required = true)]
    source: Vec<PathBuf>,
}

fn summarize(cli: &Cli, source: &Path, out: &mut impl Write) -> Result<()> {
    let table = ZenTable::load(source, cli.header_row)?;
    let totals = summarize_income(&table, cli.time)?;
    info!("{}: {} periods of {}", source.display(), totals.len(), cli.time);

    data::export_income(&totals, &mut *out)?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let mut stdout = io::stdout().lock();
    let mut failed = 0;

    for (index, source) in cli.source.iter().enumerate() {
        if index > 0 {
            writeln!(stdout)?;
        }

        if let Err(err) = summarize(&cli, source, &mut stdout) {
            error!("cannot summarize {}: {:#}", source.display(), err);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} sources failed", failed, cli.source.len());
    }

    Ok(())
}
