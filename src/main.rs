use std::env;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use credo_tools::data;
use credo_tools::logging;
use credo_tools::statement::har::Extractor;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 2 {
        eprintln!("Usage: credo-extract [input.har] > transactions.json");
        std::process::exit(1);
    }

    logging::init_logging(false);

    let input = data::read_input(args.get(1).map(Path::new))?;
    let records = Extractor::default()
        .extract(&input)
        .context("failed to extract transactions")?;
    info!("extracted {} transactions", records.len());

    data::export_json(&records, io::stdout().lock())?;

    Ok(())
}
