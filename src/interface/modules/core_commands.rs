//! # Core Commands
//!
//! The built-in commands every bot has: prefix and settings management, module loading,
//! command states, the help system, about and usage pages, config options and shutdown.
//! Always loaded, cannot be unloaded.

use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::bot::{Bot, CORE_MODULE};
use crate::application::commands::{Command, CommandError, CommandState};
use crate::application::context::CommandContext;
use crate::application::converters;
use crate::application::help::{self, Restrictions};
use crate::application::modules::{BotModule, ModuleError};
use crate::application::router::run_checks;
use crate::application::text::{MESSAGE_LIMIT, escape_mentions};
use crate::domain::time::parse_time;
use crate::domain::types::Permission;
use crate::strings::{help as text, messages};

const COG: &str = "CoreCommands";
const CATEGORY: &str = "Core";

const TRUTHY: [&str; 7] = ["enable", "true", "on", "yes", "y", "+", "1"];
const FALSY: [&str; 7] = ["disable", "false", "off", "no", "n", "-", "0"];

pub struct CoreCommands;

fn commands() -> Vec<Command> {
    let admin = [Permission::Administrator];
    vec![
        Command::new("help").usage("(COMMAND NAME)").description(text::HELP),
        Command::new("prefix")
            .usage("<NEW PREFIX/remove>")
            .description(text::PREFIX)
            .owner_only(),
        Command::new("module")
            .aliases(&["modules"])
            .usage("<list/load/unload/reload/error>")
            .description(text::MODULE)
            .permissions(&admin),
        Command::sub("module", "list").description(text::MODULE_LIST).permissions(&admin),
        Command::sub("module", "load")
            .aliases(&["l"])
            .usage("<MODULE NAME>")
            .description(text::MODULE_LOAD)
            .permissions(&admin),
        Command::sub("module", "unload")
            .aliases(&["ul"])
            .usage("<MODULE NAME>")
            .description(text::MODULE_UNLOAD)
            .permissions(&admin),
        Command::sub("module", "reload")
            .aliases(&["rl"])
            .usage("<MODULE NAME>")
            .description(text::MODULE_RELOAD)
            .permissions(&admin),
        Command::sub("module", "error").description(text::MODULE_ERROR).permissions(&admin),
        Command::new("default")
            .aliases(&["defaults"])
            .usage("<add/remove/list>")
            .description(text::DEFAULT)
            .owner_only(),
        Command::sub("default", "list").description(text::DEFAULT_LIST).owner_only(),
        Command::sub("default", "add")
            .usage("<MODULE NAME>")
            .description(text::DEFAULT_ADD)
            .owner_only(),
        Command::sub("default", "remove")
            .usage("<MODULE NAME>")
            .description(text::DEFAULT_REMOVE)
            .owner_only(),
        Command::new("deletemessages")
            .aliases(&[
                "deletemsgs",
                "deletecommands",
                "deletecmds",
                "delmessages",
                "delmsgs",
                "delcommands",
                "delcmds",
            ])
            .usage("<enable/disable>")
            .description(text::DELETE_MESSAGES)
            .permissions(&admin),
        Command::new("command")
            .aliases(&["commands"])
            .usage("<enable/disable/show/hide>")
            .description(text::COMMAND)
            .permissions(&admin),
        Command::sub("command", "enable")
            .usage("<COMMAND NAME>")
            .description(text::COMMAND_ENABLE)
            .permissions(&admin),
        Command::sub("command", "disable")
            .usage("<COMMAND NAME>")
            .description(text::COMMAND_DISABLE)
            .permissions(&admin),
        Command::sub("command", "show")
            .usage("<COMMAND NAME>")
            .description(text::COMMAND_SHOW)
            .permissions(&admin),
        Command::sub("command", "hide")
            .usage("<COMMAND NAME>")
            .description(text::COMMAND_HIDE)
            .permissions(&admin),
        Command::new("about")
            .aliases(&["info"])
            .usage("(MODULE NAME)")
            .description(text::ABOUT),
        Command::new("usage").usage("(MODULE NAME)").description(text::USAGE),
        Command::new("shutdown")
            .aliases(&["goodbye", "goodnight"])
            .usage("(TIME BEFORE SHUTDOWN)")
            .description(text::SHUTDOWN)
            .owner_only(),
        Command::new("config")
            .usage("<list/set/remove>")
            .description(text::CONFIG)
            .permissions(&admin),
        Command::sub("config", "list").description(text::CONFIG_LIST).permissions(&admin),
        Command::sub("config", "set")
            .usage("<OPTION> <VALUE>")
            .description(text::CONFIG_SET)
            .permissions(&admin),
        Command::sub("config", "remove")
            .usage("<OPTION>")
            .description(text::CONFIG_REMOVE)
            .permissions(&admin),
        Command::new("botconfig")
            .usage("<description/credits>")
            .description(text::BOTCONFIG)
            .owner_only(),
        Command::sub("botconfig", "description")
            .usage("<TEXT/remove>")
            .description(text::BOTCONFIG_DESCRIPTION)
            .owner_only(),
        Command::sub("botconfig", "credits")
            .usage("<TEXT/remove>")
            .description(text::BOTCONFIG_CREDITS)
            .owner_only(),
        Command::new("lasterror").description(text::LASTERROR).owner_only(),
    ]
}

/// Help entries as (command, administrator only, examples).
const HELP_ENTRIES: &[(&str, bool, &[&str])] = &[
    ("help", false, &["", "about", "module load"]),
    ("prefix", false, &["$", "bot!", "bot ?", "remove"]),
    ("module", true, &["list", "load", "unload", "reload"]),
    ("module list", true, &[""]),
    ("module load", true, &["fun", "economy"]),
    ("module unload", true, &["fun", "economy"]),
    ("module reload", true, &["fun", "economy"]),
    ("module error", true, &[""]),
    ("default", false, &["list", "add", "remove"]),
    ("default list", false, &[""]),
    ("default add", false, &["fun", "economy"]),
    ("default remove", false, &["fun", "economy"]),
    ("deletemessages", true, &["enable", "y", "disable", "n"]),
    ("command", true, &["enable", "disable", "show", "hide"]),
    ("command enable", true, &["balance", "pay"]),
    ("command disable", true, &["balance", "pay"]),
    ("command show", true, &["module", "balance"]),
    ("command hide", true, &["module", "balance"]),
    ("about", false, &["", "fun"]),
    ("usage", false, &["", "dev"]),
    ("shutdown", false, &["", "1h", "1h30m", "10m-30s", "2m30s"]),
    ("config", true, &["list", "set", "remove"]),
    ("config list", true, &[""]),
    ("config set", true, &["mute_role Muted", "alert_channel #mod-log"]),
    ("config remove", true, &["alert_channel"]),
    ("botconfig", false, &["description", "credits"]),
    ("botconfig description", false, &["A bot for the penguin server.", "remove"]),
    ("botconfig credits", false, &["Thanks to\\n\\tEveryone", "remove"]),
    ("lasterror", false, &[""]),
];

#[async_trait]
impl BotModule for CoreCommands {
    fn name(&self) -> &'static str {
        CORE_MODULE
    }

    async fn setup(&self, bot: &Arc<Bot>) -> anyhow::Result<()> {
        bot.add_commands(CORE_MODULE, COG, commands()).await?;
        for (command, admin, examples) in HELP_ENTRIES {
            let restrictions = if *admin {
                Restrictions::perms(&["Administrator"])
            } else {
                Restrictions::none()
            };
            bot.add_command_help(command, CATEGORY, restrictions, examples).await?;
        }
        Ok(())
    }

    async fn teardown(&self, _bot: &Arc<Bot>) {}

    async fn invoke(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match ctx.command.qualified_name().as_str() {
            "help" => handle_help(ctx).await,
            "prefix" => handle_prefix(ctx).await,
            "module" | "default" | "command" | "config" | "botconfig" => {
                Err(CommandError::bad_argument(messages::no_sub_command(&ctx.command.name)))
            }
            "module list" => handle_module_list(ctx).await,
            "module load" => handle_module_operation(ctx, Operation::Load).await,
            "module unload" => handle_module_operation(ctx, Operation::Unload).await,
            "module reload" => handle_module_operation(ctx, Operation::Reload).await,
            "module error" => handle_module_error(ctx).await,
            "default list" => handle_default_list(ctx).await,
            "default add" => handle_default_add(ctx).await,
            "default remove" => handle_default_remove(ctx).await,
            "deletemessages" => handle_delete_messages(ctx).await,
            "command enable" => handle_command_state(ctx, StateChange::Enable).await,
            "command disable" => handle_command_state(ctx, StateChange::Disable).await,
            "command show" => handle_command_state(ctx, StateChange::Show).await,
            "command hide" => handle_command_state(ctx, StateChange::Hide).await,
            "about" => handle_about(ctx).await,
            "usage" => handle_usage(ctx).await,
            "shutdown" => handle_shutdown(ctx).await,
            "config list" => handle_config_list(ctx).await,
            "config set" => handle_config_set(ctx).await,
            "config remove" => handle_config_remove(ctx).await,
            "botconfig description" => handle_botconfig(ctx, "bot_description").await,
            "botconfig credits" => handle_botconfig(ctx, "additional_credits").await,
            "lasterror" => handle_last_error(ctx).await,
            other => Err(anyhow!("Unhandled command `{other}`.").into()),
        }
    }
}

async fn handle_prefix(ctx: &CommandContext) -> Result<(), CommandError> {
    let new_prefix = ctx.args().required_rest("new_prefix")?;
    if new_prefix.eq_ignore_ascii_case("remove") {
        ctx.bot.set_prefix(None).await?;
        ctx.send(messages::PREFIX_REMOVED).await?;
    } else {
        ctx.bot.set_prefix(Some(new_prefix.clone())).await?;
        ctx.send(messages::prefix_changed(&new_prefix)).await?;
    }
    Ok(())
}

async fn handle_module_list(ctx: &CommandContext) -> Result<(), CommandError> {
    let loaded = ctx.bot.loaded_modules().await;
    let mut loaded_names = Vec::with_capacity(loaded.len());
    for name in &loaded {
        loaded_names.push(format!("`{}`", ctx.clean(name).await));
    }
    let mut available_names = Vec::new();
    for name in ctx.bot.available_modules() {
        if !loaded.iter().any(|l| l == name) {
            available_names.push(format!("`{}`", ctx.clean(name).await));
        }
    }
    ctx.send(messages::module_list(&list_or_none(&loaded_names), &list_or_none(&available_names)))
        .await?;
    Ok(())
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Load,
    Unload,
    Reload,
}

async fn handle_module_operation(ctx: &CommandContext, operation: Operation) -> Result<(), CommandError> {
    let name = ctx.args().required_rest("mod")?;
    let author = ctx.author().id;
    let result = match operation {
        Operation::Load => ctx.bot.load_module(&name).await,
        Operation::Unload => ctx.bot.unload_module(&name).await,
        Operation::Reload => ctx.bot.reload_module(&name).await,
    };
    let shown = ctx.clean(&name).await;
    match result {
        Ok(()) => {
            let (reply, verb) = match operation {
                Operation::Load => (messages::module_loaded(&shown), "loaded"),
                Operation::Unload => (messages::module_unloaded(&shown), "unloaded"),
                Operation::Reload => (messages::module_reloaded(&shown), "reloaded"),
            };
            tracing::info!("{} {} '{}' module.", author, verb, name);
            ctx.send(reply).await?;
        }
        Err(ModuleError::NotFound(_)) => {
            ctx.send(messages::module_not_found(&shown)).await?;
        }
        Err(ModuleError::AlreadyLoaded(_)) => {
            ctx.send(ModuleError::AlreadyLoaded(shown).to_string()).await?;
        }
        Err(ModuleError::NotLoaded(_)) => {
            ctx.send(ModuleError::NotLoaded(shown).to_string()).await?;
        }
        Err(e @ ModuleError::Failed { .. }) => {
            let detail = e.detail();
            tracing::error!("{} tried loading '{}' module, and it failed:\n\n{}", author, name, detail);
            let cleaned = ctx.clean(&detail).await;
            ctx.bot.state.lock().await.last_module_error = Some(messages::module_failed(&shown, &cleaned));
            ctx.send(messages::MODULE_CRASHED).await?;
        }
    }
    Ok(())
}

async fn handle_module_error(ctx: &CommandContext) -> Result<(), CommandError> {
    let error = ctx.bot.state.lock().await.last_module_error.clone();
    ctx.send(error.unwrap_or_else(|| messages::NO_MODULE_ERRORS.to_string()))
        .await?;
    Ok(())
}

async fn handle_default_list(ctx: &CommandContext) -> Result<(), CommandError> {
    let modules = ctx.bot.storage.default_modules().await?;
    let mut names = Vec::with_capacity(modules.len());
    for module in &modules {
        names.push(format!("`{}`", ctx.clean(module).await));
    }
    ctx.send(messages::default_modules(&list_or_none(&names))).await?;
    Ok(())
}

async fn handle_default_add(ctx: &CommandContext) -> Result<(), CommandError> {
    let name = ctx.args().required_rest("mod")?;
    let shown = ctx.clean(&name).await;
    if !ctx.bot.has_module(&name) {
        ctx.send(messages::module_not_found(&shown)).await?;
    } else if ctx.bot.storage.add_default_module(&name).await? {
        ctx.send(messages::default_added(&shown)).await?;
    } else {
        ctx.send(messages::default_exists(&shown)).await?;
    }
    Ok(())
}

async fn handle_default_remove(ctx: &CommandContext) -> Result<(), CommandError> {
    let name = ctx.args().required_rest("mod")?;
    let shown = ctx.clean(&name).await;
    if ctx.bot.storage.remove_default_module(&name).await? {
        ctx.send(messages::default_removed(&shown)).await?;
    } else {
        ctx.send(messages::default_missing(&shown)).await?;
    }
    Ok(())
}

async fn handle_delete_messages(ctx: &CommandContext) -> Result<(), CommandError> {
    let operation = ctx.args().required("operation")?.to_lowercase();
    if TRUTHY.contains(&operation.as_str()) {
        ctx.bot.set_delete_messages(true).await?;
        ctx.send(messages::DELETING_COMMANDS).await?;
    } else if FALSY.contains(&operation.as_str()) {
        ctx.bot.set_delete_messages(false).await?;
        ctx.send(messages::NOT_DELETING_COMMANDS).await?;
    } else {
        return Err(CommandError::bad_argument(messages::OPERATION_NOT_SUPPORTED));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateChange {
    Enable,
    Disable,
    Show,
    Hide,
}

impl StateChange {
    fn label(self) -> &'static str {
        match self {
            StateChange::Enable => "enabled",
            StateChange::Disable => "disabled",
            StateChange::Show => "shown",
            StateChange::Hide => "hidden",
        }
    }

    /// Whether `state` already is what this change would produce.
    fn is_applied(self, state: CommandState) -> bool {
        match self {
            StateChange::Enable => state.enabled,
            StateChange::Disable => !state.enabled,
            StateChange::Show => !state.hidden,
            StateChange::Hide => state.hidden,
        }
    }

    /// New stored code, derived from the stored code.
    fn next_code(self, stored: i16) -> i16 {
        match self {
            StateChange::Enable => {
                if stored == 2 {
                    0
                } else {
                    1
                }
            }
            StateChange::Disable => {
                if stored == 0 {
                    2
                } else {
                    3
                }
            }
            StateChange::Show => {
                if stored == 1 {
                    0
                } else {
                    2
                }
            }
            StateChange::Hide => {
                if stored == 0 {
                    1
                } else {
                    3
                }
            }
        }
    }
}

async fn handle_command_state(ctx: &CommandContext, change: StateChange) -> Result<(), CommandError> {
    let name = ctx.args().required_rest("command_name")?;
    let shown = ctx.clean(&name).await;
    let found = {
        let state = ctx.bot.state.lock().await;
        state.commands.find(&name).map(|command| {
            let qualified = command.qualified_name();
            let core = state
                .help
                .get(&qualified)
                .is_some_and(|h| h.category.eq_ignore_ascii_case("core"));
            (qualified, command.state_key(), command.state(), core)
        })
    };
    let Some((qualified, key, current, core)) = found else {
        ctx.send(messages::command_not_found(&shown)).await?;
        return Ok(());
    };

    let stored = ctx.bot.command_state_code(&key).await?;
    if change == StateChange::Disable && core {
        ctx.send(messages::CORE_CANNOT_BE_DISABLED).await?;
    } else if change.is_applied(current) {
        ctx.send(messages::command_already(&shown, change.label())).await?;
    } else {
        let next = CommandState::from_code(change.next_code(stored));
        ctx.bot.set_command_state(&qualified, next).await?;
        ctx.send(messages::command_now(&shown, change.label())).await?;
    }
    Ok(())
}

async fn handle_about(ctx: &CommandContext) -> Result<(), CommandError> {
    let prefix = ctx.prefix().await;
    let requested = ctx.args().rest();
    let key = match &requested {
        Some(name) => name.to_lowercase(),
        None => ctx.chat.current_user().name.to_lowercase(),
    };
    let embed = ctx
        .bot
        .state
        .lock()
        .await
        .modules
        .get(&key)
        .map(|info| info.about_embed(&prefix, ctx.author()));
    match (embed, requested) {
        (Some(embed), _) => {
            ctx.send(embed).await?;
        }
        (None, None) => return Err(anyhow!("Bot info module not found.").into()),
        (None, Some(name)) => {
            let loaded = ctx.bot.module(&name).await.is_some();
            ctx.send(messages::no_module_info(&ctx.clean(&name).await, loaded))
                .await?;
        }
    }
    Ok(())
}

async fn handle_usage(ctx: &CommandContext) -> Result<(), CommandError> {
    let prefix = ctx.prefix().await;
    let bot_name = ctx.chat.current_user().name.to_lowercase();
    let requested = ctx.args().rest();
    let name = match requested {
        Some(name) if ![bot_name.as_str(), CORE_MODULE, "core commands"].contains(&name.to_lowercase().as_str()) => {
            name
        }
        _ => {
            ctx.send(text::how_to_use(&prefix)).await?;
            return Ok(());
        }
    };

    let info = ctx.bot.state.lock().await.modules.get(&name.to_lowercase()).cloned();
    let shown = ctx.clean(&name).await;
    match info {
        Some(info) => match info.usage {
            Some(usage) if usage.chars().count() < MESSAGE_LIMIT => {
                ctx.send(usage).await?;
            }
            Some(usage) => {
                let cut: String = usage.chars().take(MESSAGE_LIMIT - 1).collect();
                ctx.send(format!("{cut}...")).await?;
            }
            None => {
                ctx.send(messages::no_usage(&shown)).await?;
            }
        },
        None => {
            let loaded = ctx.bot.module(&name).await.is_some();
            ctx.send(messages::no_module_info(&shown, loaded)).await?;
        }
    }
    Ok(())
}

async fn handle_shutdown(ctx: &CommandContext) -> Result<(), CommandError> {
    let Some(countdown) = ctx.args().next_word()? else {
        ctx.send(messages::GOODBYE).await?;
        tracing::info!("{} shut the bot down.", ctx.author().id);
        ctx.bot.request_shutdown();
        return Ok(());
    };
    match parse_time(&countdown, Some(0), Some(86_400), true) {
        Ok(seconds) => {
            ctx.send(messages::shutdown_in(seconds)).await?;
            tracing::info!("{} scheduled a shutdown in {} seconds.", ctx.author().id, seconds);
            tokio::time::sleep(Duration::from_secs(seconds.unsigned_abs())).await;
            ctx.send(messages::SHUTTING_DOWN).await?;
            ctx.bot.request_shutdown();
        }
        Err(e) if e.is_out_of_range() => {
            ctx.send(messages::SHUTDOWN_OUT_OF_RANGE).await?;
        }
        Err(e) => {
            ctx.send(messages::SHUTDOWN_UNPARSEABLE).await?;
            tracing::warn!("{}: {}", ctx.author().id, e);
        }
    }
    Ok(())
}

/// Sends the help list, or the help page of the named command or module.
async fn handle_help(ctx: &CommandContext) -> Result<(), CommandError> {
    let Some(query) = ctx.args().rest() else {
        let commands: Vec<Command> = {
            let state = ctx.bot.state.lock().await;
            state.commands.top_level().filter(|c| c.enabled && !c.hidden).cloned().collect()
        };
        return send_command_list(ctx, commands).await;
    };

    let cog_commands: Vec<Command> = {
        let state = ctx.bot.state.lock().await;
        state
            .commands
            .top_level()
            .filter(|c| c.cog == query && c.enabled && !c.hidden)
            .cloned()
            .collect()
    };
    if !cog_commands.is_empty() {
        return send_command_list(ctx, cog_commands).await;
    }

    let mut words = query.split_whitespace();
    let first = words.next().unwrap_or_default();
    let resolved = {
        let state = ctx.bot.state.lock().await;
        let mut current = state.commands.find(first).cloned();
        let mut missing_sub = None;
        if let Some(mut command) = current.take() {
            for word in words {
                match state.commands.find_sub(&command.qualified_name(), word) {
                    Some(sub) => command = sub.clone(),
                    None => {
                        missing_sub = Some(messages::no_such_subcommand(&command.qualified_name(), word));
                        break;
                    }
                }
            }
            current = Some(command);
        }
        match (current, missing_sub) {
            (_, Some(reply)) => Err(reply),
            (None, None) => Err(messages::no_such_command(first)),
            (Some(mut command), None) => {
                while !state.help.contains_key(&command.qualified_name())
                    && let Some(parent) = command.parent.as_deref().and_then(|p| state.commands.get(p))
                {
                    command = parent.clone();
                }
                Ok(command)
            }
        }
    };

    match resolved {
        Ok(command) => send_help_entry(ctx, &command).await,
        Err(reply) => {
            ctx.send(escape_mentions(&reply)).await?;
            Ok(())
        }
    }
}

async fn send_help_entry(ctx: &CommandContext, command: &Command) -> Result<(), CommandError> {
    let qualified = command.qualified_name();
    let info = ctx.bot.state.lock().await.help.get(&qualified).cloned();
    match info {
        Some(info) if command.enabled => {
            let prefix = ctx.prefix().await;
            ctx.send(info.embed(&prefix, ctx.author())).await?;
        }
        Some(_) => {
            ctx.send(messages::command_disabled(&qualified)).await?;
        }
        None => {
            ctx.send(messages::NO_HELP_REGISTERED).await?;
        }
    }
    Ok(())
}

/// Lists the commands the author can run here, marking those only runnable in DMs.
async fn send_command_list(ctx: &CommandContext, commands: Vec<Command>) -> Result<(), CommandError> {
    let author = ctx.author().id;
    let mut entries = Vec::new();
    let mut has_dm_only = false;
    for command in commands {
        let here = run_checks(
            &ctx.bot,
            ctx.chat.as_ref(),
            &command,
            author,
            ctx.guild_id(),
            ctx.channel_id(),
            false,
        )
        .await
        .is_ok();
        if here {
            entries.push((help::list_entry(&command, false), command));
            continue;
        }
        let in_dms = run_checks(&ctx.bot, ctx.chat.as_ref(), &command, author, None, ctx.channel_id(), false)
            .await
            .is_ok();
        if in_dms {
            has_dm_only = true;
            entries.push((help::list_entry(&command, true), command));
        }
    }
    if entries.is_empty() {
        ctx.send(messages::NO_HELP_FOUND).await?;
        return Ok(());
    }

    let mut categories: BTreeMap<String, Vec<String>> = BTreeMap::new();
    {
        let state = ctx.bot.state.lock().await;
        for (entry, command) in entries {
            if let Some(info) = state.help.get(&command.qualified_name()) {
                let category = if info.category.is_empty() {
                    "no category".to_string()
                } else {
                    info.category.to_lowercase()
                };
                categories.entry(category).or_default().push(entry);
            }
        }
    }
    let prefix = ctx.prefix().await;
    for message in help::command_list(&categories, has_dm_only, &ctx.author().mention(), &prefix) {
        ctx.send(message).await?;
    }
    Ok(())
}

async fn handle_config_list(ctx: &CommandContext) -> Result<(), CommandError> {
    let entries: BTreeMap<String, String> = ctx
        .bot
        .state
        .lock()
        .await
        .config
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let mut lines = Vec::with_capacity(entries.len());
    for (key, value) in &entries {
        lines.push(format!("`{}`: `{}`", ctx.clean(key).await, ctx.clean(value).await));
    }
    ctx.send(messages::config_list(&lines)).await?;
    Ok(())
}

async fn handle_config_set(ctx: &CommandContext) -> Result<(), CommandError> {
    let mut args = ctx.args();
    let key = args.required("option")?.to_lowercase();
    let value = args.required_rest("value")?;
    let chat = ctx.chat.as_ref();
    let value = match ctx.guild_id() {
        Some(guild) if key.ends_with("_role") => converters::role(chat, guild, &value).await?.id.to_string(),
        Some(guild) if key.ends_with("_channel") => converters::text_channel(chat, guild, &value).await?.id.to_string(),
        _ => value,
    };
    ctx.bot.set_config(&key, &value).await?;
    tracing::info!("{} set config option '{}' to '{}'.", ctx.author().id, key, value);
    ctx.send(messages::config_set(&ctx.clean(&key).await, &ctx.clean(&value).await))
        .await?;
    Ok(())
}

async fn handle_config_remove(ctx: &CommandContext) -> Result<(), CommandError> {
    let key = ctx.args().required("option")?.to_lowercase();
    let shown = ctx.clean(&key).await;
    if ctx.bot.remove_config(&key).await? {
        ctx.send(messages::config_removed(&shown)).await?;
    } else {
        ctx.send(messages::config_not_set(&shown)).await?;
    }
    Ok(())
}

async fn handle_botconfig(ctx: &CommandContext, setting: &str) -> Result<(), CommandError> {
    let value = ctx.args().required_rest("text")?;
    let reset = value.eq_ignore_ascii_case("remove");
    ctx.bot
        .storage
        .set_setting(setting, if reset { "" } else { value.as_str() })
        .await?;
    ctx.bot.register_bot_info().await?;
    let reply = match (setting, reset) {
        ("bot_description", false) => messages::BOT_DESCRIPTION_SET,
        ("bot_description", true) => messages::BOT_DESCRIPTION_RESET,
        (_, false) => messages::BOT_CREDITS_SET,
        (_, true) => messages::BOT_CREDITS_RESET,
    };
    ctx.send(reply).await?;
    Ok(())
}

async fn handle_last_error(ctx: &CommandContext) -> Result<(), CommandError> {
    let error = ctx.bot.state.lock().await.last_error.clone();
    match error {
        Some(error) => ctx.send(ctx.clean(&error).await).await?,
        None => ctx.send(messages::NO_LAST_ERROR).await?,
    };
    Ok(())
}
