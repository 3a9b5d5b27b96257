//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.
//! Includes command replies, error messages and alert texts.

// Framework
pub fn missing_config(missing: &str) -> String {
    format!(
        "This command requires the following missing configuration options to be set: {missing}.\n\
         Please contact an administrator for assistance."
    )
}

pub fn correct_syntax(usage: &str) -> String {
    format!("Correct syntax: `{usage}`")
}

pub fn no_sub_command(name: &str) -> String {
    format!("No sub-command given for {name}.")
}

pub const NO_BOT_DESCRIPTION: &str = "No description for the bot found. Set description with `botconfig` command.";

// Modules
pub fn module_loaded(name: &str) -> String {
    format!("Module `{name}` successfully loaded.")
}

pub fn module_unloaded(name: &str) -> String {
    format!("Module `{name}` successfully unloaded.")
}

pub fn module_reloaded(name: &str) -> String {
    format!("Module `{name}` successfully reloaded.")
}

pub fn module_not_found(name: &str) -> String {
    format!("No `{name}` module was found.")
}

pub fn module_failed(name: &str, detail: &str) -> String {
    format!("The `{name}` module failed while loading. The error was:\n\n{detail}")
}

pub const MODULE_CRASHED: &str = "**Error! Something went really wrong! Contact module maintainer.**\n\
                                  Error printed to console and stored in module error command.";
pub const NO_MODULE_ERRORS: &str = "There have not been any errors loading modules since the last restart.";

pub fn module_list(loaded: &str, available: &str) -> String {
    format!("Loaded modules: {loaded}\nAvailable Modules: {available}")
}

pub fn default_modules(modules: &str) -> String {
    format!("Default modules: {modules}")
}

pub fn default_added(name: &str) -> String {
    format!("The `{name}` module is now a default module.")
}

pub fn default_exists(name: &str) -> String {
    format!("The `{name}` module is already a default module.")
}

pub fn default_removed(name: &str) -> String {
    format!("Removed `{name}` module from default modules.")
}

pub fn default_missing(name: &str) -> String {
    format!("No `{name}` module in default modules.")
}

// Settings
pub const DELETING_COMMANDS: &str = "Now deleting user commands.";
pub const NOT_DELETING_COMMANDS: &str = "No longer deleting user commands.";
pub const OPERATION_NOT_SUPPORTED: &str = "Operation not supported.";

pub fn prefix_changed(prefix: &str) -> String {
    format!("The bot prefix has successfully been changed to `{prefix}`.")
}

pub const PREFIX_REMOVED: &str = "The bot is now only listens to pings.";

// Command states
pub fn command_already(name: &str, state: &str) -> String {
    format!("The `{name}` command is already {state}.")
}

pub fn command_now(name: &str, state: &str) -> String {
    format!("The `{name}` command is now {state}.")
}

pub fn command_not_found(name: &str) -> String {
    format!("No `{name}` command found.")
}

pub const CORE_CANNOT_BE_DISABLED: &str = "Core commands cannot be disabled.";

// About & usage
pub fn no_module_info(name: &str, loaded: bool) -> String {
    if loaded {
        format!("No information for `{name}` module was found.")
    } else {
        format!("No information for `{name}` module was found.\nAdditionally no module with this name is loaded.")
    }
}

pub fn no_usage(name: &str) -> String {
    format!("The `{name}` module does not have its usage defined.")
}

// Shutdown
pub const GOODBYE: &str = "Goodbye!";
pub const SHUTTING_DOWN: &str = "Shutting down!";
pub const SHUTDOWN_OUT_OF_RANGE: &str = "The time for this command must be between 0 seconds to 24 hours.";
pub const SHUTDOWN_UNPARSEABLE: &str =
    "The time could not be parsed correctly. Check the help command for shutdown for examples of times.";

pub fn shutdown_in(seconds: i64) -> String {
    format!("Shutdown will commence in {seconds} seconds.")
}

// Help
pub fn no_such_command(name: &str) -> String {
    format!("No command called `{name}` found.")
}

pub fn no_such_subcommand(command: &str, sub: &str) -> String {
    format!("The `{command}` command has no subcommand called `{sub}`.")
}

pub fn command_disabled(name: &str) -> String {
    format!("The `{name}` command has been disabled.")
}

pub const NO_HELP_REGISTERED: &str = "No help information is registered for this command.";
pub const NO_HELP_FOUND: &str = "No help information was found.";

// Config
pub fn config_list(lines: &[String]) -> String {
    if lines.is_empty() {
        "No config options are set.".to_string()
    } else {
        format!("Config options:\n{}", lines.join("\n"))
    }
}

pub fn config_set(key: &str, value: &str) -> String {
    format!("The `{key}` config option has been set to `{value}`.")
}

pub fn config_removed(key: &str) -> String {
    format!("The `{key}` config option has been removed.")
}

pub fn config_not_set(key: &str) -> String {
    format!("The `{key}` config option is not set.")
}

pub const BOT_DESCRIPTION_SET: &str = "The bot description has been updated.";
pub const BOT_DESCRIPTION_RESET: &str = "The bot description has been removed.";
pub const BOT_CREDITS_SET: &str = "The additional credits have been updated.";
pub const BOT_CREDITS_RESET: &str = "The additional credits have been removed.";
pub const NO_LAST_ERROR: &str = "There have not been any errors since the last restart.";

// Moderation
pub fn rejoined_muted(mention: &str, success: bool) -> String {
    if success {
        format!("{mention} re-joined while muted! Re-muted user.")
    } else {
        format!("{mention} re-joined while muted! **Failed to re-mute user!**")
    }
}

pub fn mute_expired(mention: &str) -> String {
    format!("Mute of {mention} expired. User unmuted.")
}

pub fn mute_expired_forbidden(mention: &str) -> String {
    format!("Mute of {mention} expired. **Lacking permission to unmute!**")
}

pub fn mute_expired_failed(mention: &str) -> String {
    format!("Mute of {mention} expired. **Failed to unmute!**")
}

pub fn channel_not_in_guild(name: &str) -> String {
    format!("The `{name}` channel is not part of this server.")
}

pub fn no_delete_permission(name: &str) -> String {
    format!("You do not have permissions to delete messages in {name}.")
}

pub const DELETION_FAILED: &str = "Something went wrong during deletion.\nPosting log of deleted messages.";
pub const NOTHING_TO_DELETE: &str = "Nothing to delete.";
pub const DELETION_LOG_FILE: &str = "Deletion log.txt";
pub const NO_MESSAGE_TEXT: &str = "NO TEXT CONTENT IN MESSAGE.";

pub fn deletion_log_header(name: &str, id: u64, channel: &str, channel_id: u64, time: &str) -> String {
    format!("Messages deleted by {name} ({id}) in {channel} ({channel_id}) on {time}:\n\n")
}

pub fn deletion_log_post(mention: &str, channel: &str) -> String {
    format!("Deletion log by {mention} from {channel}:")
}

pub fn hierarchy_too_low(action: &str) -> String {
    format!("You can only {action} members below you in the role hierarchy.")
}

pub fn mute_role_unavailable(value: &str) -> String {
    format!("Could not retrieve mute role: {value}")
}

pub const INVALID_DURATION: &str = "Invalid duration. Must be valid duration and at least 1 second.";
pub const CANNOT_ASSIGN_MUTE: &str = "Lacking permission to assign mute role.";
pub const NOT_MUTED: &str = "This user is not muted.";
pub const CANNOT_UNMUTE: &str = "Lacking permission to unmute.";

// Utils
pub fn reminder_set(mention: &str) -> String {
    format!("Ok, will do {mention}!")
}

pub fn reminder(mention: &str, text: &str) -> String {
    format!("Hey {mention}, you told me to remind you:\n{text}")
}
