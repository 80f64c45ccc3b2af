use std::env;
use std::io;
use std::path::Path;

use anyhow::Result;
use log::info;

use credo_tools::data::{self, RecordTable};
use credo_tools::logging;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 2 {
        eprintln!("Usage: credo-json2csv [transactions.json] > transactions.csv");
        std::process::exit(1);
    }

    logging::init_logging(false);

    let input = data::read_input(args.get(1).map(Path::new))?;
    let table = RecordTable::from_json(&input)?;
    info!("{} records, {} columns", table.rows.len(), table.headers.len());

    table.write_csv(io::stdout().lock())?;

    Ok(())
}
