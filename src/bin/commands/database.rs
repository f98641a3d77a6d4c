use super::{confirm, open_store, print_json, print_table};
use serde::Serialize;
use stfc_data::database::{AllianceStore, ResourceRecord, ServerId};
use stfc_data::{format_size, get_database_info, BotConfig, OutputFormat};
use tabled::Tabled;

#[derive(Tabled)]
struct TableOutcome {
    table: String,
    result: String,
}

pub fn run_init(config: &BotConfig, yes: bool, output_format: OutputFormat) {
    let message = format!(
        "This will DROP every table in {} and recreate it with default data.",
        config.database_path
    );
    if !confirm(&message, yes, output_format) {
        return;
    }

    let store = open_store(config);
    match store.schema().initialize_database() {
        Ok(report) => {
            if output_format.is_json() {
                print_json(&report, output_format);
                return;
            }
            print_reset_failures(&report.reset.failed);
            println!(
                "Database initialized at {} ({} resources seeded)",
                config.database_path, report.seeded
            );
        }
        Err(e) => {
            eprintln!("ERROR: Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn run_create(config: &BotConfig, output_format: OutputFormat) {
    // opening the store creates every missing table
    let store = open_store(config);
    let status = match store.schema().check_status() {
        Ok(status) => status,
        Err(e) => {
            eprintln!("ERROR: Failed to read schema status: {}", e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(&status, output_format);
    } else {
        println!("Tables ready in {} (schema {})", config.database_path, status);
    }
}

pub fn run_reset(config: &BotConfig, yes: bool, output_format: OutputFormat) {
    let message = format!("This will DROP every table in {}.", config.database_path);
    if !confirm(&message, yes, output_format) {
        return;
    }

    let store = AllianceStore::new(config.database_path.as_str());
    let report = match store.schema().reset_all_tables() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Failed to reset database: {}", e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(&report, output_format);
    } else {
        let rows = report
            .dropped
            .iter()
            .map(|table| TableOutcome {
                table: table.clone(),
                result: "dropped".to_string(),
            })
            .chain(report.failed.iter().map(|(table, error)| TableOutcome {
                table: table.clone(),
                result: format!("failed: {}", error),
            }));
        print_table(rows, output_format);
    }

    if !report.is_complete() {
        std::process::exit(1);
    }
}

pub fn run_seed(config: &BotConfig, output_format: OutputFormat) {
    let store = open_store(config);
    match store.schema().seed_default_resources() {
        Ok(inserted) => {
            if output_format.is_json() {
                print_json(&serde_json::json!({ "inserted": inserted }), output_format);
            } else {
                println!("Seeded {} default resource rows", inserted);
            }
        }
        Err(e) => {
            eprintln!("ERROR: Failed to seed resources: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn run_status(config: &BotConfig, output_format: OutputFormat) {
    let info = get_database_info(&config.database_path);

    if output_format.is_json() {
        print_json(&info, output_format);
        return;
    }

    println!("Alliance Database Status");
    println!("========================\n");
    println!("  Path:           {}", info.path);
    println!(
        "  Status:         {}",
        if info.exists { "exists" } else { "not created" }
    );
    if let Some(size) = info.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    if let Some(schema) = &info.schema {
        println!("  Schema:         {}", schema);
    }

    if !info.tables.is_empty() {
        println!();
        print_table(info.tables.iter().cloned(), output_format);
    }
}

#[derive(Serialize)]
struct PurgeOutput {
    server_id: ServerId,
    rows_deleted: usize,
    deleted: Vec<(String, usize)>,
    failed: Vec<(String, String)>,
}

pub fn run_purge_server(
    config: &BotConfig,
    server_id: ServerId,
    yes: bool,
    output_format: OutputFormat,
) {
    let message = format!("This will delete all stored data of server {}.", server_id);
    if !confirm(&message, yes, output_format) {
        return;
    }

    let store = open_store(config);
    let report = match store.delete_server_data(server_id) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: Failed to purge server {}: {}", server_id, e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(
            &PurgeOutput {
                server_id,
                rows_deleted: report.rows_deleted(),
                deleted: report.deleted.clone(),
                failed: report.failed.clone(),
            },
            output_format,
        );
    } else {
        let rows = report
            .deleted
            .iter()
            .map(|(table, rows)| TableOutcome {
                table: table.clone(),
                result: format!("{} rows deleted", rows),
            })
            .chain(report.failed.iter().map(|(table, error)| TableOutcome {
                table: table.clone(),
                result: format!("failed: {}", error),
            }));
        print_table(rows, output_format);
    }

    if !report.is_complete() {
        std::process::exit(1);
    }
}

pub fn run_resources(config: &BotConfig, resource: Option<String>, output_format: OutputFormat) {
    let store = open_store(config);
    let result = match &resource {
        Some(name) => store.resources().find(name),
        None => store.resources().resources(),
    };

    let records: Vec<ResourceRecord> = match result {
        Ok(records) => records,
        Err(e) => {
            eprintln!("ERROR: Failed to read resources: {}", e);
            std::process::exit(1);
        }
    };

    if output_format.is_json() {
        print_json(&records, output_format);
    } else if records.is_empty() {
        println!("No resources found (run: stfc-data seed)");
    } else {
        print_table(records, output_format);
    }
}

fn print_reset_failures(failed: &[(String, String)]) {
    for (table, error) in failed {
        eprintln!("WARNING: could not drop {}: {}", table, error);
    }
}
