//! # Command Router
//!
//! Turns incoming messages into command invocations. It resolves the prefix (or a mention
//! of the bot), looks the command up, runs its checks and hands it to the owning module.
//! Errors from any step end up in the error handler.

use anyhow::anyhow;
use std::sync::Arc;

use crate::application::bot::Bot;
use crate::application::commands::{Command, CommandError};
use crate::application::context::CommandContext;
use crate::application::text::cur_time;
use crate::domain::traits::{ChatError, ChatProvider};
use crate::domain::types::{ChannelId, GuildId, MessageInfo, Permissions, UserId};
use crate::strings::messages;

/// Text after the prefix or bot mention that starts `content`, if any.
///
/// A mention may be followed by whitespace; a prefix is followed directly by the command.
pub fn strip_prefix<'a>(content: &'a str, prefix: Option<&str>, bot_id: UserId) -> Option<&'a str> {
    for mention in [format!("<@{bot_id}>"), format!("<@!{bot_id}>")] {
        if let Some(rest) = content.strip_prefix(mention.as_str()) {
            return Some(rest.trim_start());
        }
    }
    match prefix {
        Some(prefix) if !prefix.is_empty() => content.strip_prefix(prefix),
        _ => None,
    }
}

/// The first word of `text` and everything after it.
fn split_word(text: &str) -> (&str, &str) {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (&text[..end], &text[end..])
}

/// Evaluates a command's checks for `author` in `channel`.
///
/// `guild == None` evaluates as a DM. Config requirements are only checked when
/// `with_config` is set, and missing options are then reported in the channel.
pub async fn run_checks(
    bot: &Bot,
    chat: &dyn ChatProvider,
    command: &Command,
    author: UserId,
    guild: Option<GuildId>,
    channel: ChannelId,
    with_config: bool,
) -> Result<(), CommandError> {
    let checks = &command.checks;
    if !command.enabled {
        return Err(CommandError::Disabled(command.qualified_name()));
    }
    if checks.dm_only && guild.is_some() {
        return Err(CommandError::PrivateMessageOnly);
    }
    if checks.guild_only && guild.is_none() {
        return Err(CommandError::NoPrivateMessage);
    }
    if checks.owner_only && !bot.is_owner(author).await {
        return Err(CommandError::NotOwner);
    }
    if !checks.permissions.is_empty() {
        let permissions = match guild {
            Some(_) => chat.permissions_in(guild, channel, author).await,
            None => Permissions::direct_message(),
        };
        let missing = permissions.missing(&checks.permissions);
        if !missing.is_empty() {
            return Err(CommandError::MissingPermissions(missing));
        }
    }
    if with_config && !checks.required_config.is_empty() {
        let missing = bot.state.lock().await.missing_config(&checks.required_config);
        if !missing.is_empty() {
            let missing: Vec<String> = missing.iter().map(|k| format!("`{k}`")).collect();
            let missing = missing.join(", ");
            if let Err(e) = chat.send(channel, messages::missing_config(&missing).into()).await {
                tracing::warn!("Failed to report missing config options: {}", e);
            }
            return Err(CommandError::MissingConfig {
                command: command.qualified_name(),
                missing,
            });
        }
    }
    Ok(())
}

pub struct CommandRouter {
    bot: Arc<Bot>,
}

impl CommandRouter {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self { bot }
    }

    pub async fn route(&self, chat: Arc<dyn ChatProvider>, message: MessageInfo) {
        if message.author.bot {
            return;
        }
        let prefix = self.bot.prefix().await;
        let Some(rest) = strip_prefix(&message.content, prefix.as_deref(), chat.current_user().id) else {
            return;
        };
        let (invoked_with, arguments) = split_word(rest);
        if invoked_with.is_empty() {
            return;
        }
        let (invoked_with, arguments) = (invoked_with.to_string(), arguments.to_string());

        let root = self.bot.state.lock().await.commands.find(&invoked_with).cloned();
        let Some(root) = root else {
            let error = CommandError::NotFound(invoked_with.clone());
            self.handle_error(chat.as_ref(), &message, None, &invoked_with, error).await;
            return;
        };

        tracing::debug!(
            "Router dispatching cmd='{}' args='{}' sender='{}'",
            invoked_with,
            arguments.trim(),
            message.author.id
        );
        self.delete_invocation(chat.as_ref(), &message).await;

        let mut ctx = CommandContext {
            bot: self.bot.clone(),
            chat: chat.clone(),
            message,
            command: root,
            invoked_with,
            arguments,
        };
        if let Err(error) = self.invoke(&mut ctx).await {
            self.handle_error(chat.as_ref(), &ctx.message, Some(&ctx.command), &ctx.invoked_with, error)
                .await;
        }
    }

    async fn delete_invocation(&self, chat: &dyn ChatProvider, message: &MessageInfo) {
        let delete = self.bot.state.lock().await.delete_messages;
        if !delete || message.guild_id.is_none() {
            return;
        }
        match chat.delete_message(message.channel_id, message.id).await {
            Ok(()) => {}
            Err(ChatError::Forbidden) => {
                tracing::warn!("Bot does not have required permissions to delete message.")
            }
            Err(e) => tracing::warn!("Failed to delete command message: {}", e),
        }
    }

    /// Walks down into sub-commands, checking each level, then runs the body.
    async fn invoke(&self, ctx: &mut CommandContext) -> Result<(), CommandError> {
        loop {
            run_checks(
                &self.bot,
                ctx.chat.as_ref(),
                &ctx.command,
                ctx.author().id,
                ctx.guild_id(),
                ctx.channel_id(),
                true,
            )
            .await?;

            let (word, rest) = split_word(ctx.arguments.trim_start());
            if word.is_empty() {
                break;
            }
            let sub = self
                .bot
                .state
                .lock()
                .await
                .commands
                .find_sub(&ctx.command.qualified_name(), word)
                .cloned();
            let Some(sub) = sub else {
                break;
            };
            let (word, rest) = (word.to_string(), rest.to_string());
            ctx.command = sub;
            ctx.invoked_with = word;
            ctx.arguments = rest;
        }

        let module = self
            .bot
            .module(&ctx.command.module)
            .await
            .ok_or_else(|| anyhow!("The `{}` module is not loaded.", ctx.command.module))?;
        module.invoke(ctx).await
    }

    async fn handle_error(
        &self,
        chat: &dyn ChatProvider,
        message: &MessageInfo,
        command: Option<&Command>,
        invoked_with: &str,
        error: CommandError,
    ) {
        let author = message.author.id;
        if error.is_check_failure() {
            // Missing config options were already reported by the check.
        } else if error.is_user_input() {
            if let Some(command) = command
                && let Some(usage) = &command.usage
            {
                let prefix = self.bot.display_prefix().await;
                let parent = match command.full_parent_name() {
                    "" => String::new(),
                    parent => format!("{parent} "),
                };
                let reply = messages::correct_syntax(&format!("{prefix}{parent}{invoked_with} {usage}"));
                if let Err(e) = chat.send(message.channel_id, reply.into()).await {
                    tracing::warn!("{}: {}", author, e);
                }
            }
        } else {
            match &error {
                CommandError::Chat(ChatError::Http(_)) => {
                    tracing::warn!("{}: Connection error to Discord. Message lost.", author)
                }
                CommandError::Chat(ChatError::Forbidden) => tracing::warn!("{}: Missing permissions.", author),
                CommandError::Other(e) => tracing::warn!("{}: {:#}", author, e),
                other => tracing::warn!("{}: {}", author, other),
            }
        }
        self.bot
            .record_error(format!("[{}] {}: {}", cur_time(), author, error))
            .await;
    }
}
