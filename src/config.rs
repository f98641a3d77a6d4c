use crate::database::{AllianceStore, SchemaStatus};
use anyhow::{anyhow, Result};
use config::{Config, ConfigBuilder, FileFormat};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Keys read from the config file or the process environment
pub const CONFIG_KEYS: &[&str] = &[
    "DISCORD_TOKEN",
    "BOT_PREFIX",
    "TEST_DISCORD_TOKEN",
    "TEST_BOT_PREFIX",
    "BOT_TYPE",
    "DATABASE_PATH",
    "LOG_LEVEL",
    "DISCORD_INTENTS_MESSAGE_CONTENT",
    "DISCORD_INTENTS_GUILDS",
    "DISCORD_INTENTS_MEMBERS",
];

/// Token value shipped in example env files
pub const PLACEHOLDER_TOKEN: &str = "your_bot_token_here";

const EMPTY_CONFIG: &str = r#"### stfc-data configuration file
### every key can also be set as an environment variable (e.g. DISCORD_TOKEN)

### bot credentials
# discord_token = "your_bot_token_here"
# bot_prefix = "."
# test_discord_token = "your_bot_token_here"
# test_bot_prefix = "!"

### which credentials to use: DATA or DATAtestsim
# bot_type = "DATA"

### location of the SQLite database file
# database_path = "~/.stfc-data/stfc_bot.db"

# log_level = "info"

### gateway intents
# discord_intents_message_content = true
# discord_intents_guilds = true
# discord_intents_members = true
"#;

/// Which bot account the process runs as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BotType {
    /// Production bot
    #[default]
    #[serde(rename = "DATA")]
    Data,
    /// Test simulation bot
    #[serde(rename = "DATAtestsim")]
    DataTestSim,
}

impl fmt::Display for BotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotType::Data => write!(f, "DATA"),
            BotType::DataTestSim => write!(f, "DATAtestsim"),
        }
    }
}

impl FromStr for BotType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "data" => Ok(BotType::Data),
            "datatestsim" => Ok(BotType::DataTestSim),
            _ => Err(anyhow!(
                "Unknown bot type '{}'. Available: DATA, DATAtestsim",
                s
            )),
        }
    }
}

/// Gateway intents requested at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntentSettings {
    pub message_content: bool,
    pub guilds: bool,
    pub members: bool,
}

impl Default for IntentSettings {
    fn default() -> Self {
        Self {
            message_content: true,
            guilds: true,
            members: true,
        }
    }
}

/// Bot credentials resolved for the selected [`BotType`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub prefix: String,
}

pub struct BotConfig {
    pub bot_type: BotType,

    pub discord_token: Option<String>,
    pub bot_prefix: Option<String>,
    pub test_discord_token: Option<String>,
    pub test_bot_prefix: Option<String>,

    /// Path of the SQLite database file
    pub database_path: String,

    /// Default log level for the binary (trace, debug, info, warn, error)
    pub log_level: String,

    pub intents: IntentSettings,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_type: BotType::default(),
            discord_token: None,
            bot_prefix: None,
            test_discord_token: None,
            test_bot_prefix: None,
            database_path: format!("{}/stfc_bot.db", default_data_dir()),
            log_level: "info".to_string(),
            intents: IntentSettings::default(),
        }
    }
}

impl BotConfig {
    /// Create and initialize a configuration from the config file and the environment
    ///
    /// By default `$HOME/.stfc-data/stfc-data.toml` is used; a commented
    /// template is written there when missing. Environment variables named
    /// after [`CONFIG_KEYS`] take precedence over the file.
    pub fn new(path: &Option<String>) -> Result<BotConfig> {
        let mut builder = Config::builder();

        let file_path = match path {
            Some(p) => p.clone(),
            None => {
                let dir = default_data_dir();
                std::fs::create_dir_all(dir.as_str())
                    .map_err(|e| anyhow!("Unable to create data directory {}: {}", dir, e))?;
                Self::config_file_path()
            }
        };

        if Path::new(file_path.as_str()).exists() {
            builder = builder.add_source(config::File::new(file_path.as_str(), FileFormat::Toml));
        } else {
            std::fs::write(file_path.as_str(), EMPTY_CONFIG)
                .map_err(|e| anyhow!("Unable to create config file {}: {}", file_path, e))?;
        }

        Self::build(builder, env_overrides(std::env::vars()))
    }

    /// Build a configuration from TOML text and explicit environment values
    pub fn from_toml_str(toml: &str, env: HashMap<String, String>) -> Result<BotConfig> {
        let builder = Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml));
        Self::build(builder, env)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
        env: HashMap<String, String>,
    ) -> Result<BotConfig> {
        // keys are matched case-insensitively; the environment is applied last
        let mut config = lowercase_keys(builder, "configuration file")?;
        let env_builder =
            Config::builder().add_source(config::Environment::default().source(Some(env)));
        config.extend(lowercase_keys(env_builder, "environment")?);

        let text = |key: &str| {
            config
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str| -> Result<bool> {
            match text(key) {
                None => Ok(true),
                Some(v) => parse_bool(&v)
                    .ok_or_else(|| anyhow!("Invalid boolean for {}: '{}'", key, v)),
            }
        };

        let defaults = BotConfig::default();

        let bot_type = match text("bot_type") {
            Some(t) => t.parse()?,
            None => defaults.bot_type,
        };

        let database_path = text("database_path")
            .map(|p| expand_home(&p))
            .unwrap_or(defaults.database_path);

        Ok(BotConfig {
            bot_type,
            discord_token: text("discord_token"),
            bot_prefix: text("bot_prefix"),
            test_discord_token: text("test_discord_token"),
            test_bot_prefix: text("test_bot_prefix"),
            database_path,
            log_level: text("log_level")
                .map(|l| l.to_lowercase())
                .unwrap_or(defaults.log_level),
            intents: IntentSettings {
                message_content: flag("discord_intents_message_content")?,
                guilds: flag("discord_intents_guilds")?,
                members: flag("discord_intents_members")?,
            },
        })
    }

    /// Token and command prefix for the selected bot type
    pub fn credentials(&self) -> Result<Credentials> {
        let (token, prefix, token_key, prefix_key) = match self.bot_type {
            BotType::Data => (
                &self.discord_token,
                &self.bot_prefix,
                "DISCORD_TOKEN",
                "BOT_PREFIX",
            ),
            BotType::DataTestSim => (
                &self.test_discord_token,
                &self.test_bot_prefix,
                "TEST_DISCORD_TOKEN",
                "TEST_BOT_PREFIX",
            ),
        };

        let token = token
            .as_deref()
            .filter(|t| *t != PLACEHOLDER_TOKEN)
            .ok_or_else(|| {
                anyhow!(
                    "Missing or invalid {} for bot type {}",
                    token_key,
                    self.bot_type
                )
            })?;
        let prefix = prefix
            .as_deref()
            .ok_or_else(|| anyhow!("Missing {} for bot type {}", prefix_key, self.bot_type))?;

        Ok(Credentials {
            token: token.to_string(),
            prefix: prefix.to_string(),
        })
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let masked = |v: &Option<String>| match v {
            Some(t) => mask_secret(t),
            None => "(not set)".to_string(),
        };

        [
            format!("Bot Type:           {}", self.bot_type),
            format!("Discord Token:      {}", masked(&self.discord_token)),
            format!(
                "Bot Prefix:         {}",
                self.bot_prefix.as_deref().unwrap_or("(not set)")
            ),
            format!("Test Token:         {}", masked(&self.test_discord_token)),
            format!(
                "Test Prefix:        {}",
                self.test_bot_prefix.as_deref().unwrap_or("(not set)")
            ),
            format!("Database Path:      {}", self.database_path),
            format!("Log Level:          {}", self.log_level),
            format!(
                "Intents:            message_content={} guilds={} members={}",
                self.intents.message_content, self.intents.guilds, self.intents.members
            ),
        ]
        .join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        format!("{}/stfc-data.toml", default_data_dir())
    }
}

/// `$HOME/.stfc-data`, or `./.stfc-data` when no home directory is known
pub fn default_data_dir() -> String {
    let home_dir = dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    format!("{}/.stfc-data", home_dir)
}

/// Keep only the recognised keys from an environment listing
pub fn env_overrides<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(k, _)| CONFIG_KEYS.contains(&k.as_str()))
        .collect()
}

/// Build one configuration layer into a map with lower-case keys
///
/// Two spellings of the same key within one layer are rejected.
fn lowercase_keys(
    builder: ConfigBuilder<config::builder::DefaultState>,
    layer: &str,
) -> Result<HashMap<String, String>> {
    let raw = builder
        .build()
        .map_err(|e| anyhow!("Failed to build {}: {}", layer, e))?
        .try_deserialize::<HashMap<String, String>>()
        .map_err(|e| anyhow!("Failed to deserialize {}: {}", layer, e))?;

    let mut keys = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let lower = key.to_lowercase();
        if keys.insert(lower.clone(), value).is_some() {
            return Err(anyhow!("Key '{}' is set more than once in {}", lower, layer));
        }
    }
    Ok(keys)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}/{}", home.to_string_lossy(), rest),
        _ => path.to_string(),
    }
}

/// Show at most the length of a secret, never its content
pub fn mask_secret(secret: &str) -> String {
    format!("{}...", "*".repeat(secret.chars().count().min(10)))
}

// =============================================================================
// Database info (shared by the status and check commands)
// =============================================================================

/// Information about the SQLite database file
#[derive(Debug, Serialize, Clone)]
pub struct DatabaseInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaStatus>,
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Serialize, Clone)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct TableInfo {
    pub table: String,
    #[cfg_attr(feature = "display", tabled(display = "display_rows"))]
    pub rows: Option<u64>,
}

#[cfg(feature = "display")]
fn display_rows(rows: &Option<u64>) -> String {
    match rows {
        Some(count) => count.to_string(),
        None => "missing".to_string(),
    }
}

/// Inspect the database file without creating it
pub fn get_database_info(database_path: &str) -> DatabaseInfo {
    let exists = Path::new(database_path).exists();
    let size_bytes = if exists {
        std::fs::metadata(database_path).ok().map(|m| m.len())
    } else {
        None
    };

    let (schema, tables) = if exists {
        let store = AllianceStore::new(database_path);
        let schema = store.schema().check_status().ok();
        let tables = store
            .schema()
            .table_counts()
            .map(|counts| {
                counts
                    .into_iter()
                    .map(|(table, rows)| TableInfo { table, rows })
                    .collect()
            })
            .unwrap_or_default();
        (schema, tables)
    } else {
        (None, Vec::new())
    };

    DatabaseInfo {
        path: database_path.to_string(),
        exists,
        size_bytes,
        schema,
        tables,
    }
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// =============================================================================
// Legacy configuration migration
// =============================================================================

/// Settings from the old whitespace-separated `config` file
///
/// Each line reads `<BOT_TYPE> <setting> <value>`. Blank lines and `#`
/// comments are skipped, as are lines with fewer than three fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LegacyConfig {
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl LegacyConfig {
    pub fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if let [bot_type, setting, value, ..] = fields.as_slice() {
                sections
                    .entry(bot_type.to_string())
                    .or_default()
                    .insert(setting.to_string(), value.to_string());
            }
        }
        Self { sections }
    }

    fn setting(&self, bot_type: BotType, key: &str) -> Option<&str> {
        self.sections
            .get(&bot_type.to_string())
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Render the equivalent `.env` file
    pub fn to_env(&self) -> String {
        let mut lines = vec![
            "# Discord Bot Configuration".to_string(),
            "# Migrated from old config file".to_string(),
            String::new(),
        ];

        let mapping = [
            (BotType::Data, "token", "DISCORD_TOKEN"),
            (BotType::Data, "prefix", "BOT_PREFIX"),
            (BotType::DataTestSim, "token", "TEST_DISCORD_TOKEN"),
            (BotType::DataTestSim, "prefix", "TEST_BOT_PREFIX"),
        ];
        for (bot_type, setting, key) in mapping {
            if let Some(value) = self.setting(bot_type, setting) {
                lines.push(format!("{}={}", key, value));
            }
        }

        lines.extend(
            [
                "",
                "# Default settings",
                "BOT_TYPE=DATA",
                "DATABASE_PATH=./utils/stfc_bot.db",
                "LOG_LEVEL=INFO",
                "DISCORD_INTENTS_MESSAGE_CONTENT=true",
                "DISCORD_INTENTS_GUILDS=true",
                "DISCORD_INTENTS_MEMBERS=true",
            ]
            .map(String::from),
        );

        let mut env = lines.join("\n");
        env.push('\n');
        env
    }
}

/// Outcome of [`migrate_legacy_config`]
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub env_path: PathBuf,
    pub backup_path: PathBuf,
    /// Migrated bot types with the setting names found for each
    pub migrated: Vec<(String, Vec<String>)>,
}

/// Convert a legacy `config` file into a `.env` file
///
/// The legacy file is renamed to `config.backup` next to it once the new
/// file has been written. An existing `.env` is only replaced when
/// `overwrite` is set.
pub fn migrate_legacy_config(
    config_path: &Path,
    env_path: &Path,
    overwrite: bool,
) -> Result<MigrationReport> {
    if !config_path.exists() {
        return Err(anyhow!(
            "No legacy config file found at {}",
            config_path.display()
        ));
    }
    if env_path.exists() && !overwrite {
        return Err(anyhow!(
            "{} already exists; pass --force to overwrite it",
            env_path.display()
        ));
    }

    let text = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
    let legacy = LegacyConfig::parse(&text);

    std::fs::write(env_path, legacy.to_env())
        .map_err(|e| anyhow!("Failed to write {}: {}", env_path.display(), e))?;
    info!(
        "Wrote {} with {} bot configurations",
        env_path.display(),
        legacy.sections.len()
    );

    let backup_path = config_path.with_file_name("config.backup");
    std::fs::rename(config_path, &backup_path).map_err(|e| {
        anyhow!(
            "Failed to back up {} as {}: {}",
            config_path.display(),
            backup_path.display(),
            e
        )
    })?;

    Ok(MigrationReport {
        env_path: env_path.to_path_buf(),
        backup_path,
        migrated: legacy
            .sections
            .into_iter()
            .map(|(bot_type, settings)| (bot_type, settings.into_keys().collect()))
            .collect(),
    })
}
