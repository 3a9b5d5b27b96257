//! # Commands
//!
//! Definition of bot commands, their checks and persisted enable/hide state, plus the
//! set of currently registered commands with its name and alias index.

use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashMap};

use crate::domain::traits::ChatError;
use crate::domain::types::Permission;

/// Restrictions evaluated before a command body runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checks {
    pub owner_only: bool,
    pub guild_only: bool,
    pub dm_only: bool,
    pub permissions: Vec<Permission>,
    /// Config keys that must be set. Missing keys are reported to the invoker.
    pub required_config: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub description: String,
    /// Qualified name of the parent group, for sub-commands.
    pub parent: Option<String>,
    pub checks: Checks,
    /// Registry name of the module that handles the command.
    pub module: String,
    /// Cog name the command is persisted under.
    pub cog: String,
    pub enabled: bool,
    pub hidden: bool,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            usage: None,
            description: String::new(),
            parent: None,
            checks: Checks::default(),
            module: String::new(),
            cog: String::new(),
            enabled: true,
            hidden: false,
        }
    }

    /// A sub-command of the group with qualified name `parent`.
    pub fn sub(parent: &str, name: &str) -> Self {
        Self {
            parent: Some(parent.to_string()),
            ..Self::new(name)
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.checks.owner_only = true;
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.checks.guild_only = true;
        self
    }

    pub fn dm_only(mut self) -> Self {
        self.checks.dm_only = true;
        self
    }

    pub fn permissions(mut self, permissions: &[Permission]) -> Self {
        self.checks.permissions = permissions.to_vec();
        self
    }

    pub fn required_config(mut self, keys: &[&str]) -> Self {
        self.checks.required_config = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent} {}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn full_parent_name(&self) -> &str {
        self.parent.as_deref().unwrap_or("")
    }

    /// Key under which the command's state is stored, `Cog.name`.
    pub fn state_key(&self) -> String {
        if self.cog.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.cog, self.name)
        }
    }

    pub fn state(&self) -> CommandState {
        CommandState {
            enabled: self.enabled,
            hidden: self.hidden,
        }
    }

    pub fn set_state(&mut self, state: CommandState) {
        self.enabled = state.enabled;
        self.hidden = state.hidden;
    }
}

/// Enable/hide flags as persisted in `command_states`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandState {
    pub enabled: bool,
    pub hidden: bool,
}

impl Default for CommandState {
    fn default() -> Self {
        Self {
            enabled: true,
            hidden: false,
        }
    }
}

impl CommandState {
    /// 0 visible, 1 hidden, 2 disabled, 3 hidden and disabled. Unknown codes are visible.
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => Self {
                enabled: true,
                hidden: true,
            },
            2 => Self {
                enabled: false,
                hidden: false,
            },
            3 => Self {
                enabled: false,
                hidden: true,
            },
            _ => Self::default(),
        }
    }

    pub fn code(self) -> i16 {
        match (self.enabled, self.hidden) {
            (true, false) => 0,
            (true, true) => 1,
            (false, false) => 2,
            (false, true) => 3,
        }
    }
}

fn permission_labels(permissions: &[Permission]) -> String {
    permissions.iter().map(|p| p.label()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Command \"{0}\" is not found")]
    NotFound(String),
    #[error("{0}")]
    BadArgument(String),
    #[error("{0} is a required argument that is missing.")]
    MissingArgument(String),
    #[error("Expected closing quotation mark.")]
    UnclosedQuote,
    #[error("This command cannot be used in private messages.")]
    NoPrivateMessage,
    #[error("This command can only be used in private messages.")]
    PrivateMessageOnly,
    #[error("You do not own this bot.")]
    NotOwner,
    #[error("You are missing {} permission(s) to run this command.", permission_labels(.0))]
    MissingPermissions(Vec<Permission>),
    #[error("{0} command is disabled")]
    Disabled(String),
    #[error("Command {command} missing config options: {missing}")]
    MissingConfig { command: String, missing: String },
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    pub fn bad_argument(message: impl Into<String>) -> Self {
        CommandError::BadArgument(message.into())
    }

    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            CommandError::BadArgument(_) | CommandError::MissingArgument(_) | CommandError::UnclosedQuote
        )
    }

    /// Failures of a check, including disabled commands. These are never reported.
    pub fn is_check_failure(&self) -> bool {
        matches!(
            self,
            CommandError::NoPrivateMessage
                | CommandError::PrivateMessageOnly
                | CommandError::NotOwner
                | CommandError::MissingPermissions(_)
                | CommandError::Disabled(_)
                | CommandError::MissingConfig { .. }
        )
    }
}

/// All registered commands, keyed by qualified name.
#[derive(Debug, Default)]
pub struct CommandSet {
    commands: BTreeMap<String, Command>,
    /// `name` or `parent name` (aliases included) to qualified name.
    lookup: HashMap<String, String>,
}

impl CommandSet {
    fn lookup_key(parent: Option<&str>, name: &str) -> String {
        match parent {
            Some(parent) => format!("{parent} {name}"),
            None => name.to_string(),
        }
    }

    /// Registers a command. Parents must be registered before their sub-commands.
    pub fn add(&mut self, command: Command) -> Result<()> {
        let qualified = command.qualified_name();
        if let Some(parent) = &command.parent
            && !self.commands.contains_key(parent)
        {
            bail!("The parent command `{parent}` of `{qualified}` is not registered.");
        }
        let keys: Vec<String> = std::iter::once(&command.name)
            .chain(command.aliases.iter())
            .map(|n| Self::lookup_key(command.parent.as_deref(), n))
            .collect();
        if let Some(taken) = keys.iter().find(|k| self.lookup.contains_key(*k)) {
            bail!("The command or alias `{taken}` is already registered.");
        }
        for key in keys {
            self.lookup.insert(key, qualified.clone());
        }
        self.commands.insert(qualified, command);
        Ok(())
    }

    /// Removes every command handled by `module`.
    pub fn remove_module(&mut self, module: &str) -> Vec<String> {
        let removed: Vec<String> = self
            .commands
            .values()
            .filter(|c| c.module == module)
            .map(|c| c.qualified_name())
            .collect();
        for name in &removed {
            self.commands.remove(name);
        }
        self.lookup.retain(|_, target| !removed.contains(target));
        removed
    }

    pub fn get(&self, qualified: &str) -> Option<&Command> {
        self.commands.get(qualified)
    }

    pub fn get_mut(&mut self, qualified: &str) -> Option<&mut Command> {
        self.commands.get_mut(qualified)
    }

    /// Top-level command by name or alias.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.lookup.get(name).and_then(|q| self.commands.get(q))
    }

    /// Sub-command of `parent` by name or alias.
    pub fn find_sub(&self, parent: &str, name: &str) -> Option<&Command> {
        self.lookup
            .get(&Self::lookup_key(Some(parent), name))
            .and_then(|q| self.commands.get(q))
    }

    pub fn has_children(&self, qualified: &str) -> bool {
        self.commands.values().any(|c| c.parent.as_deref() == Some(qualified))
    }

    pub fn top_level(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().filter(|c| c.parent.is_none())
    }

    pub fn top_level_mut(&mut self) -> impl Iterator<Item = &mut Command> {
        self.commands.values_mut().filter(|c| c.parent.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// The top-level ancestor of a command.
    pub fn root_of<'a>(&'a self, command: &'a Command) -> &'a Command {
        let mut current = command;
        while let Some(parent) = current.parent.as_deref().and_then(|p| self.commands.get(p)) {
            current = parent;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(command: Command) -> Command {
        Command {
            module: "core_commands".to_string(),
            cog: "CoreCommands".to_string(),
            ..command
        }
    }

    #[test]
    fn test_state_codes() {
        for code in 0..4 {
            assert_eq!(CommandState::from_code(code).code(), code);
        }
        assert_eq!(CommandState::from_code(7), CommandState::default());
        assert!(!CommandState::from_code(2).enabled);
        assert!(CommandState::from_code(3).hidden);
    }

    #[test]
    fn test_names() {
        let sub = owned(Command::sub("module", "load"));
        assert_eq!(sub.qualified_name(), "module load");
        assert_eq!(sub.full_parent_name(), "module");
        assert_eq!(owned(Command::new("prefix")).state_key(), "CoreCommands.prefix");
    }

    #[test]
    fn test_lookup_by_alias_and_sub_command() {
        let mut set = CommandSet::default();
        set.add(owned(Command::new("module").aliases(&["modules"]))).unwrap();
        set.add(owned(Command::sub("module", "load").aliases(&["l"]))).unwrap();

        assert_eq!(set.find("modules").unwrap().name, "module");
        assert_eq!(set.find_sub("module", "l").unwrap().qualified_name(), "module load");
        assert!(set.find("load").is_none());
        assert!(set.has_children("module"));
        let sub = set.get("module load").unwrap();
        assert_eq!(set.root_of(sub).name, "module");
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut set = CommandSet::default();
        set.add(owned(Command::new("about"))).unwrap();
        assert!(set.add(owned(Command::new("info").aliases(&["about"]))).is_err());
        assert!(set.find("info").is_none());
        assert!(set.add(owned(Command::sub("missing", "x"))).is_err());
    }

    #[test]
    fn test_remove_module() {
        let mut set = CommandSet::default();
        set.add(owned(Command::new("about"))).unwrap();
        let whois = Command {
            module: "moderation".to_string(),
            ..Command::new("whois")
        };
        set.add(whois).unwrap();
        assert_eq!(set.remove_module("moderation"), vec!["whois".to_string()]);
        assert!(set.find("whois").is_none());
        assert!(set.find("about").is_some());
    }

    #[test]
    fn test_error_kinds() {
        assert!(CommandError::bad_argument("x").is_user_input());
        assert!(CommandError::NotOwner.is_check_failure());
        assert!(!CommandError::NotFound("x".into()).is_check_failure());
        let missing = CommandError::MissingPermissions(vec![Permission::ManageRoles]);
        assert_eq!(missing.to_string(), "You are missing Manage Roles permission(s) to run this command.");
    }
}
