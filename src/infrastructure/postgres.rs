//! # PostgreSQL Storage
//!
//! Implements the `Storage` trait on a `sqlx` connection pool. Discord ids are stored as
//! text; rows whose ids no longer parse are skipped with a warning.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;

use crate::domain::config::DatabaseConfig;
use crate::domain::traits::Storage;
use crate::domain::types::{GuildId, MuteRecord, Reminder, UserId};

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

type ReminderRow = (i64, Option<String>, Option<String>, String, DateTime<Utc>, String);

/// Parses a stored id, logging values that are not valid ids.
fn parse_id(value: &str, table: &str) -> Option<u64> {
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!("Skipping row in '{}' with invalid id: {}", table, value);
            None
        }
    }
}

fn mute_from_row((guild, user, until): (String, String, Option<DateTime<Utc>>)) -> Option<MuteRecord> {
    Some(MuteRecord {
        guild_id: parse_id(&guild, "mutes")?,
        user_id: parse_id(&user, "mutes")?,
        until,
    })
}

fn reminder_from_row((id, guild, channel, user, until, message): ReminderRow) -> Option<Reminder> {
    let guild_id = match guild {
        Some(guild) => Some(parse_id(&guild, "reminders")?),
        None => None,
    };
    let channel_id = match channel {
        Some(channel) => Some(parse_id(&channel, "reminders")?),
        None => None,
    };
    Some(Reminder {
        id,
        guild_id,
        channel_id,
        user_id: parse_id(&user, "reminders")?,
        until,
        message,
    })
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database '{}' at {}:{}",
                    config.name, config.host, config.port
                )
            })?;
        tracing::info!("Connected to database '{}' at {}:{}.", config.name, config.host, config.port);
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed.");
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn init(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("Failed to create tables")?;
        Ok(())
    }

    async fn setting(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn default_modules(&self) -> Result<Vec<String>> {
        let modules = sqlx::query_scalar::<_, String>("SELECT module FROM default_modules ORDER BY module")
            .fetch_all(&self.pool)
            .await?;
        Ok(modules)
    }

    async fn add_default_module(&self, module: &str) -> Result<bool> {
        let result = sqlx::query("INSERT INTO default_modules (module) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(module)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_default_module(&self, module: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM default_modules WHERE module = $1")
            .bind(module)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn command_state(&self, command: &str) -> Result<Option<i16>> {
        let state = sqlx::query_scalar::<_, i16>("SELECT state FROM command_states WHERE command = $1")
            .bind(command)
            .fetch_optional(&self.pool)
            .await?;
        Ok(state)
    }

    async fn set_command_state(&self, command: &str, state: i16) -> Result<()> {
        sqlx::query(
            "INSERT INTO command_states (command, state) VALUES ($1, $2) \
             ON CONFLICT (command) DO UPDATE SET state = EXCLUDED.state",
        )
        .bind(command)
        .bind(state)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn config_entries(&self) -> Result<Vec<(String, String)>> {
        let entries = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM config ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO config (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_config(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM config WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mutes(&self) -> Result<Vec<MuteRecord>> {
        let rows = sqlx::query_as::<_, (String, String, Option<DateTime<Utc>>)>(
            "SELECT guild, muted_user, until FROM mutes",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().filter_map(mute_from_row).collect())
    }

    async fn save_mute(&self, mute: &MuteRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO mutes (guild, muted_user, until) VALUES ($1, $2, $3) \
             ON CONFLICT (guild, muted_user) DO UPDATE SET until = EXCLUDED.until",
        )
        .bind(mute.guild_id.to_string())
        .bind(mute.user_id.to_string())
        .bind(mute.until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_mute(&self, guild: GuildId, user: UserId) -> Result<()> {
        sqlx::query("DELETE FROM mutes WHERE guild = $1 AND muted_user = $2")
            .bind(guild.to_string())
            .bind(user.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reminders(&self) -> Result<Vec<Reminder>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            "SELECT id, guild, channel, reminding_user, until, message FROM reminders ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().filter_map(reminder_from_row).collect())
    }

    async fn add_reminder(&self, reminder: &Reminder) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO reminders (guild, channel, reminding_user, until, message) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(reminder.guild_id.map(|g| g.to_string()))
        .bind(reminder.channel_id.map(|c| c.to_string()))
        .bind(reminder.user_id.to_string())
        .bind(reminder.until)
        .bind(&reminder.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn delete_reminder(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rows_with_invalid_ids_are_skipped() {
        let until = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mute = mute_from_row(("100".to_string(), "42".to_string(), Some(until))).unwrap();
        assert_eq!(mute.guild_id, 100);
        assert_eq!(mute.until, Some(until));
        assert!(mute_from_row(("guild".to_string(), "42".to_string(), None)).is_none());

        let dm = reminder_from_row((7, None, None, "42".to_string(), until, "Do the dishes".to_string())).unwrap();
        assert_eq!(dm.guild_id, None);
        assert_eq!(dm.user_id, 42);
        let broken = (8, Some("x".to_string()), Some("1".to_string()), "42".to_string(), until, String::new());
        assert!(reminder_from_row(broken).is_none());
    }

    #[test]
    fn test_schema_creates_every_table() {
        for table in ["settings", "default_modules", "command_states", "config", "mutes", "reminders"] {
            assert!(SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")), "{table}");
        }
    }
}
