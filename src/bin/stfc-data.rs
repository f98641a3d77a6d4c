use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stfc_data::{BotConfig, OutputFormat};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.stfc-data/stfc-data.toml is used
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty
    #[clap(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Database file path, overrides DATABASE_PATH
    #[clap(long, global = true)]
    database: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop all tables, recreate them and load the default resources
    Init {
        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Create any missing tables
    Create,

    /// Drop all tables
    Reset {
        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// Load the default resource locations, keeping existing rows
    Seed,

    /// Show database path, size, schema status and row counts
    Status,

    /// Delete every row stored for one Discord server
    PurgeServer {
        /// Discord server (guild) ID
        #[clap(value_name = "SERVER_ID")]
        server_id: u64,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// List resource locations
    Resources {
        /// Only show this resource, e.g. "ore"
        #[clap(value_name = "RESOURCE")]
        resource: Option<String>,
    },

    /// Verify configuration and database setup
    Check,

    /// Convert a legacy `config` file into a `.env` file
    MigrateConfig {
        /// Path of the legacy config file
        #[clap(long, default_value = "config")]
        legacy: PathBuf,

        /// Path of the .env file to write
        #[clap(long, default_value = ".env")]
        env: PathBuf,

        /// Overwrite an existing .env file
        #[clap(long)]
        force: bool,
    },
}

fn init_logging(debug: bool, log_level: &str) {
    let directive = if debug { "debug" } else { log_level };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // a missing .env is fine; the config file and environment still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let output_format = cli.format;

    if let Commands::MigrateConfig { legacy, env, force } = &cli.command {
        init_logging(cli.debug, "info");
        commands::migrate::run(legacy, env, *force, output_format);
        return;
    }

    let mut config = match BotConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    init_logging(cli.debug, &config.log_level);

    match cli.command {
        Commands::Init { yes } => commands::database::run_init(&config, yes, output_format),
        Commands::Create => commands::database::run_create(&config, output_format),
        Commands::Reset { yes } => commands::database::run_reset(&config, yes, output_format),
        Commands::Seed => commands::database::run_seed(&config, output_format),
        Commands::Status => commands::database::run_status(&config, output_format),
        Commands::PurgeServer { server_id, yes } => {
            commands::database::run_purge_server(&config, server_id, yes, output_format)
        }
        Commands::Resources { resource } => {
            commands::database::run_resources(&config, resource, output_format)
        }
        Commands::Check => commands::check::run(&config, output_format),
        Commands::MigrateConfig { .. } => {}
    }
}
