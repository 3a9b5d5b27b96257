//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Every section has defaults, and the environment can override the secrets and the
//! database connection (the same variables the database container is configured with).

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct DiscordConfig {
    #[serde(default)]
    pub token: String,
    /// Bot owners. When empty the application owner is looked up on connect.
    #[serde(default)]
    pub owners: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_db_name() -> String {
    "postgres".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}

/// Values used the first time the bot starts against an empty database.
#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
    #[serde(default = "default_true")]
    pub delete_messages: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_prefix: default_prefix(),
            delete_messages: true,
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_true")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: default_log_file(),
            filter: default_log_filter(),
            console: true,
        }
    }
}

fn default_log_dir() -> String {
    "data".to_string()
}
fn default_log_file() -> String {
    "bot.log".to_string()
}
fn default_log_filter() -> String {
    "info,serenity=warn,sqlx=warn,tracing=warn".to_string()
}

impl AppConfig {
    /// Reads the YAML file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies overrides from the process environment (and an optional `.env` file).
    pub fn apply_env(&mut self) {
        dotenvy::dotenv().ok();
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(host) = lookup("POSTGRES_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("POSTGRES_PORT").and_then(|p| p.parse().ok()) {
            self.database.port = port;
        }
        if let Some(user) = lookup("POSTGRES_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("POSTGRES_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = lookup("POSTGRES_DB") {
            self.database.name = name;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord.token.trim().is_empty() {
            bail!("No Discord token configured. Set discord.token or DISCORD_TOKEN.");
        }
        if self.bot.default_prefix.trim() != self.bot.default_prefix {
            bail!("The default prefix cannot start or end with whitespace.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "discord:\n  token: abc\n  owners: [42]\ndatabase:\n  name: bot\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.owners, vec![42]);
        assert_eq!(config.database.name, "bot");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.bot.default_prefix, "!");
        assert!(config.bot.delete_messages);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.database.host, "localhost");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "secret"),
            ("POSTGRES_USER", "travus"),
            ("POSTGRES_PASSWORD", "pw"),
            ("POSTGRES_DB", "travus_db"),
            ("POSTGRES_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.discord.token, "secret");
        assert_eq!(config.database.user, "travus");
        assert_eq!(config.database.password, "pw");
        assert_eq!(config.database.name, "travus_db");
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "discord: [unclosed").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
