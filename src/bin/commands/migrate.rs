use super::print_json;
use stfc_data::{migrate_legacy_config, OutputFormat};
use std::path::Path;

pub fn run(legacy: &Path, env: &Path, force: bool, output_format: OutputFormat) {
    let report = match migrate_legacy_config(legacy, env, force) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Migration failed: {}", e);
            eprintln!("Create a .env file manually with DISCORD_TOKEN and BOT_PREFIX set.");
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(&report, output_format);
        return;
    }

    println!(
        "Created {} with {} bot configurations",
        report.env_path.display(),
        report.migrated.len()
    );
    for (bot_type, settings) in &report.migrated {
        println!("  - {}: {}", bot_type, settings.join(", "));
    }
    println!(
        "Old config file backed up as {}",
        report.backup_path.display()
    );
    println!("Review the new file, then run 'stfc-data check' to verify the setup.");
}
