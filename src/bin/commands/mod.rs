pub mod check;
pub mod database;
pub mod migrate;

use serde::Serialize;
use stfc_data::database::{ensure_parent_dir, AllianceStore};
use stfc_data::{BotConfig, OutputFormat};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Ask for confirmation on stderr; JSON output never prompts
pub(crate) fn confirm(message: &str, skip_confirm: bool, output_format: OutputFormat) -> bool {
    if skip_confirm || output_format.is_json() {
        return true;
    }

    eprintln!("{}", message);
    eprint!("Are you sure? [y/N] ");

    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_ok() {
        let input = input.trim().to_lowercase();
        if input == "y" || input == "yes" {
            return true;
        }
    }
    eprintln!("Aborted.");
    false
}

/// Open the configured database, creating its directory and tables
pub(crate) fn open_store(config: &BotConfig) -> AllianceStore {
    let path = Path::new(config.database_path.as_str());
    if let Err(e) = ensure_parent_dir(path) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
    match AllianceStore::open(path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: Failed to open database: {}", e);
            std::process::exit(1);
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T, output_format: OutputFormat) {
    match output_format.to_json(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("ERROR: Failed to serialize output: {}", e),
    }
}

pub(crate) fn print_table<T: Tabled>(
    rows: impl IntoIterator<Item = T>,
    output_format: OutputFormat,
) {
    let mut table = Table::new(rows);
    match output_format {
        OutputFormat::Markdown => println!("{}", table.with(Style::markdown())),
        _ => println!("{}", table.with(Style::rounded())),
    }
}
