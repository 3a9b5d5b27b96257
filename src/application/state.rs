//! # Bot State
//!
//! Runtime state shared by the router, the modules and the background tasks. Persistent
//! parts are loaded from storage on start and written through when changed.

use std::collections::HashMap;

use crate::application::commands::CommandSet;
use crate::application::help::{HelpInfo, ModuleInfo};
use crate::domain::types::UserId;

#[derive(Debug, Default)]
pub struct BotState {
    /// `None` when the bot only listens to mentions.
    pub prefix: Option<String>,
    pub delete_messages: bool,
    /// Values of the `config` table, such as `mute_role` and `alert_channel`.
    pub config: HashMap<String, String>,
    pub owners: Vec<UserId>,
    pub last_error: Option<String>,
    pub last_module_error: Option<String>,
    pub connected: bool,
    pub commands: CommandSet,
    /// Help entries by qualified command name.
    pub help: HashMap<String, HelpInfo>,
    /// Module info by lower-cased module name.
    pub modules: HashMap<String, ModuleInfo>,
}

impl BotState {
    /// Config keys from `required` that are not set.
    pub fn missing_config(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|key| !self.config.contains_key(*key))
            .cloned()
            .collect()
    }

    /// Config value parsed as an id. Invalid values are recorded as the last error.
    pub fn config_id(&mut self, key: &str) -> Option<u64> {
        let value = self.config.get(key)?;
        match value.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                let message = format!("Invalid config for '{key}', should be int: {value}");
                tracing::warn!("{}", message);
                self.last_error = Some(message);
                None
            }
        }
    }
}
