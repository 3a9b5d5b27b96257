//! # Help Text
//!
//! Command descriptions, module descriptions and usage pages.
//! Displayed to users via the `help`, `about` and `usage` commands.

pub const BOT_AUTHOR: &str = "[Travus](https://github.com/Travus):\n\tTravus Bot Base\n\tCore functions\n\n\
                              [serenity](https://github.com/serenity-rs/serenity):\n\tDiscord API wrapper";

pub const MODULE_AUTHOR: &str = "[Travus](https://github.com/Travus):\n\tCommands";

// Core commands
pub const HELP: &str = "This command shows a list of categorized commands you have access to. If the name of a \
command is sent along it will show detailed help information for that command, such as what the command does, \
aliases, what restrictions it has, and examples.";

pub const PREFIX: &str = "This command changes the bot prefix. The default prefix is `!`. Prefixes can be everything \
from symbols to words or a combination of the two, and can even include spaces, though they cannot start or end with \
spaces since Discord removes empty space at the start and end of messages. The prefix is saved across reboots. \
Setting the prefix to `remove` will remove the prefix. The bot will always listen to pings as if they were a prefix, \
regardless of if there is another prefix set or not.";

pub const MODULE: &str = "This command can load, unload, reload and list available modules. It can also show any \
errors that occur during the loading process. Modules contain added functionality, such as commands. The intended \
purpose for modules is to extend the bot's functionality in semi-independent packages so that parts of the bot's \
functionality can be removed or restarted without affecting the rest of the bot's functionality. See the help text \
for the subcommands for more info.";

pub const MODULE_LIST: &str = "This command lists all currently loaded and available modules. Modules listed by this \
command can be loaded, unloaded and reloaded by the respective commands for this. See help text for `module load`, \
`module unload` and `module reload` for more info on this.";

pub const MODULE_LOAD: &str = "This command loads modules. The `module list` command can be used to show all modules \
available for loading. Once a module is loaded the functionality defined in the module will be added to the bot. If \
an error is encountered during the loading process the user will be informed and the `module error` command can then \
be used to see the error details. The module will then not be loaded. If you want modules to stay loaded after \
restarts, see the `default` command.";

pub const MODULE_UNLOAD: &str = "This command unloads modules. When a loaded module is unloaded it's functionality \
will be removed. You can use the `module list` command to see all currently loaded modules. This will not prevent \
default modules from being loaded when the bot starts. See the `default` command for removing modules starting with \
the bot.";

pub const MODULE_RELOAD: &str = "This command reloads a module that is currently loaded. This will unload and load \
the module in one command. If the loading process encounters an error the module will not be reloaded and the \
functionality from before the reload will be retained and the user informed, the `module error` command can then be \
used to see the error details. You can use the module list command to see all currently loaded modules.";

pub const MODULE_ERROR: &str = "This command will show the last error that was encountered during the module load or \
reloading process. This information will also be logged when the error first is encountered. This command retains \
this information until another error replaces it, or the bot shuts down.";

pub const DEFAULT: &str = "This command is used to add, remove or list default modules. Modules contain added \
functionality, such as commands. Default modules are loaded automatically when the bot starts and as such any \
functionality in them will be available as soon as the bot is online. For more info see the help text of the \
subcommands.";

pub const DEFAULT_LIST: &str = "This command lists all current default modules. For more information on modules see \
the help text for the `module` command. All modules in this list start as soon as the bot is launched. For a list of \
all available or loaded modules see the `module list` command.";

pub const DEFAULT_ADD: &str = "This command adds a module to the list of default modules. Modules in this list are \
loaded automatically once the bot starts. This command does not load modules if they are not already loaded until \
the bot is started the next time. For that, see the `module load` command. For a list of existing default modules, \
see the `default list` command.";

pub const DEFAULT_REMOVE: &str = "This command removes a module from the list of default modules. Once removed from \
this list the module will no longer automatically be loaded when the bot starts. This command will not unload \
modules that are already loaded. For that, see the `module unload` command. For a list of existing default modules, \
see the `default list` command.";

pub const DELETE_MESSAGES: &str = "This command sets the behaviour for deletion of command triggers. If this is \
enabled then messages that trigger commands will be deleted. Is this is disabled then the bot will not delete \
messages that trigger commands. Per default this is enabled. This setting is saved across restarts.";

pub const COMMAND: &str = "This command disables, enables, hides and shows other commands. Hiding commands means \
they don't show up in the overall help command list. Disabling a command means it can't be used. Disabled commands \
also do not show up in the overall help command list and the specific help text for the command will not be \
viewable. Core commands cannot be disabled. These settings are saved across restarts.";

pub const COMMAND_ENABLE: &str = "This command enables commands which have previously been disabled. This will allow \
them to be used again. It will also add the command back into the list of commands shown by the help command and \
re-enable the viewing of it's help text given the command has help text and it has not otherwise been hidden.";

pub const COMMAND_DISABLE: &str = "This command can disable other commands. Disabled commands cannot be used and are \
removed from the list of commands shown by the help command. The command's help text will also not be viewable. Core \
commands cannot be disabled. Disabled commands can be re-enabled with the `command enable` command.";

pub const COMMAND_SHOW: &str = "This command will show commands which have previously been hidden, reversing the \
hiding of the command. This will add the command back into the list of commands shown by the help command. This will \
not re-enable the command if it has been disabled. See the `command enable` command to re-enable disabled commands.";

pub const COMMAND_HIDE: &str = "This command will hide commands from the list of commands shown by the help command. \
It will not disable the viewing of the help text for the command if someone already knows it's name. Commands who \
have been hidden can be un-hidden with the `command show` command.";

pub const ABOUT: &str = "This command gives information about modules, such as a description, authors, and other \
credits. Module authors can even add a small image to be displayed alongside this info. If no module name is given \
or the bot's name is used then information about the bot itself is shown.";

pub const USAGE: &str = "This command explains how a module is intended to be used. If no module name is given it \
will show some basic information about usage of the bot itself.";

pub const SHUTDOWN: &str = "This command turns the bot off. A delay can be set causing the bot to wait before \
shutting down. The time uses a format of numbers followed by units, see examples for details. Times supported are \
weeks (w), days (d), hours (h), minutes (m) and seconds (s), and even negative numbers. For this command the delay \
must be between 0 seconds and 24 hours. Supplying no time will cause the bot to shut down immediately. Once started, \
a shutdown cannot be stopped.";

pub const CONFIG: &str = "This command lists, sets and removes config options. Config options are used by modules, \
such as `mute_role` and `alert_channel` used by the moderation module. Commands that need an option that is not set \
will say so when used. These settings are saved across restarts.";

pub const CONFIG_LIST: &str = "This command lists all config options that are currently set, along with their values.";

pub const CONFIG_SET: &str = "This command sets a config option. Roles and channels can be given by mention, name or \
ID for options ending in `_role` and `_channel`, and are stored by ID.";

pub const CONFIG_REMOVE: &str = "This command removes a config option. Commands requiring it can no longer be used \
until it is set again.";

pub const BOTCONFIG: &str = "This command changes the information shown on the bot's about page. The description and \
additional credits support `\\n` for new lines and `\\t` for indentation.";

pub const BOTCONFIG_DESCRIPTION: &str = "This command sets the description shown on the bot's about page. Setting it \
to `remove` restores the default description.";

pub const BOTCONFIG_CREDITS: &str = "This command sets the additional credits shown on the bot's about page. Setting \
it to `remove` removes the additional credits.";

pub const LASTERROR: &str = "This command shows the last error encountered while running a command, along with when \
it happened and who ran the command.";

/// Usage page of the bot itself.
pub fn how_to_use(pref: &str) -> String {
    format!(
        "**How To Use:**\nThis bot features a variety of commands. You can get a list of all commands you have access \
         to with the `{pref}help` command. In order to use a command your message has to start with the *bot prefix*, \
         the bot prefix is currently set to `{pref}`. Simply type this prefix, followed by a command name, and you \
         will run the command. For more information on individual commands, run `{pref}help` followed by the command \
         name. This will give you info on the command, along with some examples of it and any aliases the command \
         might have. You might not have access to all commands everywhere, the help command will only tell you about \
         commands you have access to in that channel, and commands you can run only in the DMs with the bot. DM only \
         commands will be labeled as such by the help command.\n\nSome commands accept extra input, an example would \
         be how the help command accepts a command name. You can usually see an example of how the command is used on \
         the command's help page. If you use a command incorrectly by missing some input or sending invalid input, it \
         will send you the expected input. This is how to read the expected input:\n\nArguments encased in `<>` are \
         obligatory.\nArguments encased in `()` are optional and can be skipped.\nArguments written in all uppercase \
         are placeholders like names.\nArguments not written in uppercase are exact values.\nIf an argument lists \
         multiple things separated by `/` then any one of them is valid.\nThe `<>` and `()` symbols are not part of \
         the command.\n\nSample expected input: `{pref}about (MODULE NAME)`\nHere `{pref}about` is the command, and \
         it takes an optional argument. The argument is written in all uppercase, so it is a placeholder. In other \
         words you are expected to replace 'MODULE NAME' with the actual name of a module. Since the module name is \
         optional, sending just `{pref}about` is also a valid command."
    )
}

// Moderation
pub const MODERATION_DESCRIPTION: &str = "This module includes commands helpful for moderation, such as retrieving \
info about users, mass-deleting messages, etc. This module is intended to be used by moderators, and as such the \
commands in this section are locked behind permissions and/or roles.";

pub const MODERATION_USAGE: &str = "**How To Use The Moderation Module:**\nThis module is meant for use by \
moderators. It has features such as muting users, seeing user information, mass deleting messages, and more. For \
information on how to use the commands in this module, check their respective help entries.";

pub const WHOIS: &str = "Supplies information about a user on the server, such as join date, registration date, ID \
and similar.";

pub const PURGE: &str = "This command can mass-delete messages. The bot will attempt to delete the past X messages \
from the current channel. If a channel is passed along then the bot will remove messages from that channel instead. \
If a user is passed along then among the X messages only messages by that user are deleted. The bot will generate a \
log of deleted messages and post it in the alerts channel.";

pub const MUTE: &str = "This command lets you mute a user for some period of time, or until unmuted. The mute \
duration should be given as a duration such as `12h`, where `w` is weeks, `d` is days, `h` is hours, `m` is minutes \
and `s` is seconds. More than 1 type of time can be supplied as such; `1d12h`. The bot checks every 15 seconds if a \
mute has expired, and unmutes if that is the case. Newer mutes overwrite older ones, and the `unmute` command cancels \
mutes outright.";

pub const UNMUTE: &str = "This command lets you unmute a user. Unmuting a user will lift both temporary and permanent \
mutes.";

// Utils
pub const UTILS_DESCRIPTION: &str = "This module includes various utility commands, such as setting server info, \
user count, setting reminders, etc. There commands are meant for use by both regular users and moderators and the \
commands are intended to provide some value, opposed to just give fun responses.";

pub const UTILS_USAGE: &str = "**How To Use The Utils Module:**\nThis module holds miscellaneous utility commands. It \
has features such as getting information about the server, the amount of users in the server, setting reminders and \
more. For information on how to use the commands in this module, check their respective help entries.";

pub const USERCOUNT: &str = "This command lets you see the amount of users in the server. It lists both regular users \
and bot users.";

pub const SERVERINFO: &str = "This command lets you see the server information of the current server. It returns \
various statistics such as id, owner, member count, boost state, and more.";

pub const REMINDME: &str = "This command will make the bot post a message in the channel it is used after some period \
of time, with a given message. It is intended to make set reminders. The command works in both DMs and channels. The \
time until the reminder should go off should be given as a duration such as `12h`, where `w` is weeks, `d` is days, \
`h` is hours, `m` is minutes and `s` is seconds. More than 1 type of time can be supplied as such; `1d12h`. The bot \
checks every minute if a reminder should go off. The reminder will not be sent if you do not have sending permissions \
in the channel at the time of the reminder.";
