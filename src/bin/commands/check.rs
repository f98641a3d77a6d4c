use super::{print_json, print_table};
use serde::Serialize;
use stfc_data::config::mask_secret;
use stfc_data::database::{ensure_parent_dir, AllianceStore, DatabaseConn, SchemaStatus};
use stfc_data::{BotConfig, OutputFormat};
use std::path::Path;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct CheckResult {
    check: String,
    passed: bool,
    detail: String,
}

impl CheckResult {
    fn new(check: &str, result: Result<String, String>) -> Self {
        let (passed, detail) = match result {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        Self {
            check: check.to_string(),
            passed,
            detail,
        }
    }
}

/// Verify the bot can start: credentials, SQLite, and schema
pub fn run(config: &BotConfig, output_format: OutputFormat) {
    let results = vec![
        CheckResult::new("credentials", check_credentials(config)),
        CheckResult::new("sqlite", check_sqlite(config)),
        CheckResult::new("tables", check_tables(config)),
    ];
    let all_passed = results.iter().all(|r| r.passed);

    if output_format.is_json() {
        print_json(&results, output_format);
    } else {
        println!("{}\n", config.summary());
        print_table(results, output_format);
        if all_passed {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. Please fix the issues above.");
        }
    }

    if !all_passed {
        std::process::exit(1);
    }
}

fn check_credentials(config: &BotConfig) -> Result<String, String> {
    let credentials = config.credentials().map_err(|e| e.to_string())?;
    Ok(format!(
        "{} token {} with prefix '{}'",
        config.bot_type,
        mask_secret(&credentials.token),
        credentials.prefix
    ))
}

fn check_sqlite(config: &BotConfig) -> Result<String, String> {
    let path = Path::new(config.database_path.as_str());
    ensure_parent_dir(path).map_err(|e| e.to_string())?;
    let db = DatabaseConn::open(path).map_err(|e| e.to_string())?;
    let version = db.sqlite_version().map_err(|e| e.to_string())?;
    Ok(format!("SQLite {}", version))
}

fn check_tables(config: &BotConfig) -> Result<String, String> {
    let store = AllianceStore::open(config.database_path.as_str()).map_err(|e| e.to_string())?;
    match store.schema().check_status().map_err(|e| e.to_string())? {
        SchemaStatus::Current => Ok(format!("all tables present in {}", store.path().display())),
        other => Err(format!("schema {}", other)),
    }
}
