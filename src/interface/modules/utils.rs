//! # Utils Module
//!
//! Utility commands for everyone: member counts, server information and reminders.
//! Reminders are stored in the database and delivered by a background task.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::application::bot::Bot;
use crate::application::commands::{Command, CommandError};
use crate::application::context::CommandContext;
use crate::application::help::{ModuleInfo, Restrictions};
use crate::application::modules::BotModule;
use crate::application::text;
use crate::domain::time::parse_time;
use crate::domain::types::{Embed, GuildInfo, Permission, Reminder};
use crate::strings::{help as text_help, messages};

pub const NAME: &str = "utils";
const COG: &str = "Utils";
const CATEGORY: &str = "Utility";
const REMINDER_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
pub struct Utils {
    /// Pending reminders by id.
    reminders: Arc<Mutex<BTreeMap<i64, Reminder>>>,
    sender: Mutex<Option<JoinHandle<()>>>,
}

fn commands() -> Vec<Command> {
    vec![
        Command::new("usercount")
            .aliases(&["users"])
            .description(text_help::USERCOUNT)
            .guild_only(),
        Command::new("serverinfo")
            .aliases(&["guildinfo"])
            .description(text_help::SERVERINFO)
            .guild_only(),
        Command::new("remindme")
            .aliases(&["reminder"])
            .usage("<TIME UNTIL REMINDER> <TEXT>")
            .description(text_help::REMINDME),
    ]
}

#[async_trait]
impl BotModule for Utils {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn setup(&self, bot: &Arc<Bot>) -> anyhow::Result<()> {
        let stored = bot.storage.reminders().await.context("Failed to load reminders")?;
        self.reminders.lock().await.extend(stored.into_iter().map(|r| (r.id, r)));

        bot.add_commands(NAME, COG, commands()).await?;
        bot.add_command_help("usercount", CATEGORY, Restrictions::none(), &[""]).await?;
        bot.add_command_help("serverinfo", CATEGORY, Restrictions::none(), &[""]).await?;
        bot.add_command_help(
            "remindme",
            CATEGORY,
            Restrictions::none(),
            &["2h Check for a response", "2h30m Do the dishes"],
        )
        .await?;
        let info = ModuleInfo::new(
            "Utils",
            text_help::MODULE_AUTHOR,
            Some(text_help::UTILS_USAGE.to_string()),
            Some(text_help::UTILS_DESCRIPTION),
        );
        bot.add_module_info(info).await?;

        let handle = tokio::spawn(remind_sender(bot.clone(), self.reminders.clone()));
        *self.sender.lock().await = Some(handle);
        Ok(())
    }

    async fn teardown(&self, bot: &Arc<Bot>) {
        if let Some(handle) = self.sender.lock().await.take() {
            handle.abort();
        }
        bot.remove_module_info("Utils").await;
    }

    async fn invoke(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match ctx.command.qualified_name().as_str() {
            "usercount" => handle_usercount(ctx).await,
            "serverinfo" => handle_serverinfo(ctx).await,
            "remindme" => self.handle_remindme(ctx).await,
            other => Err(anyhow!("Unhandled command `{other}`.").into()),
        }
    }
}

async fn remind_sender(bot: Arc<Bot>, reminders: Arc<Mutex<BTreeMap<i64, Reminder>>>) {
    loop {
        tokio::time::sleep(REMINDER_INTERVAL).await;
        if bot.is_connected().await {
            send_due_reminders(&bot, &reminders).await;
        }
    }
}

/// Delivers every reminder that is due. Each due reminder is removed whether or not it
/// could be delivered.
async fn send_due_reminders(bot: &Bot, reminders: &Mutex<BTreeMap<i64, Reminder>>) {
    let Some(chat) = bot.chat().await else {
        return;
    };
    let mut reminders = reminders.lock().await;
    let now = Utc::now();
    let due: Vec<Reminder> = reminders.values().filter(|r| r.until <= now).cloned().collect();

    for reminder in due {
        reminders.remove(&reminder.id);
        if let Err(e) = bot.storage.delete_reminder(reminder.id).await {
            tracing::error!("Failed to delete reminder {}: {:#}", reminder.id, e);
        }

        let user = reminder.user_id;
        if chat.user(user).await.is_none() {
            tracing::warn!("Could not retrieve user {}.", user);
            continue;
        }
        let mention = format!("<@{user}>");
        let (Some(guild), Some(channel)) = (reminder.guild_id, reminder.channel_id) else {
            let body = text::clean(chat.as_ref(), None, &reminder.message, false).await;
            if let Err(e) = chat.send_dm(user, messages::reminder(&mention, &body).into()).await {
                tracing::warn!("Failed to send reminder {} to user {}: {}", reminder.id, user, e);
            }
            continue;
        };
        if chat.guild(guild).await.is_none() {
            tracing::warn!("Could not retrieve guild {}.", guild);
            continue;
        }
        if chat.channel(channel).await.is_none_or(|c| c.guild_id != Some(guild)) {
            tracing::warn!("Could not retrieve channel {}.", channel);
            continue;
        }
        if chat.member(guild, user).await.is_none() {
            tracing::warn!("Could not retrieve member {} from guild {}.", user, guild);
            continue;
        }
        let permissions = chat.permissions_in(Some(guild), channel, user).await;
        if !permissions.contains(Permission::SendMessages) {
            tracing::warn!("Member {} does not have sending permissions in channel {}.", user, channel);
            continue;
        }
        let body = text::clean(chat.as_ref(), Some(guild), &reminder.message, false).await;
        if let Err(e) = chat.send(channel, messages::reminder(&mention, &body).into()).await {
            tracing::warn!("Failed to send reminder {} in channel {}: {}", reminder.id, channel, e);
        }
    }
}

async fn current_guild(ctx: &CommandContext) -> Result<GuildInfo, CommandError> {
    let guild = ctx.guild_id().ok_or(CommandError::NoPrivateMessage)?;
    Ok(ctx
        .chat
        .guild(guild)
        .await
        .ok_or_else(|| anyhow!("Guild {guild} not found."))?)
}

/// Human and bot member counts of a guild.
async fn member_counts(ctx: &CommandContext, guild: &GuildInfo) -> (usize, usize) {
    let members = ctx.chat.guild_members(guild.id).await;
    let bots = members.iter().filter(|m| m.user.bot).count();
    (members.len() - bots, bots)
}

fn guild_embed(ctx: &CommandContext, guild: &GuildInfo) -> Embed {
    let author = ctx.author();
    Embed::new()
        .timestamp(Utc::now())
        .author(guild.name.clone(), guild.icon_url.clone())
        .footer(author.display_name.clone(), author.avatar_url.clone())
}

async fn handle_usercount(ctx: &CommandContext) -> Result<(), CommandError> {
    let guild = current_guild(ctx).await?;
    let (members, bots) = member_counts(ctx, &guild).await;
    let embed = guild_embed(ctx, &guild)
        .field("Members", members.to_string(), true)
        .field("Bots", bots.to_string(), true);
    ctx.send(embed).await?;
    Ok(())
}

async fn handle_serverinfo(ctx: &CommandContext) -> Result<(), CommandError> {
    let guild = current_guild(ctx).await?;
    let (members, bots) = member_counts(ctx, &guild).await;
    let information = format!(
        "**Server ID**: {}\n**Server Owner**: <@{}>\n**Creation Time**: {}\n**Boost Level**: {} ({} boosts)",
        guild.id,
        guild.owner_id,
        guild.created_at.format("%b %d, %Y %I:%M %p UTC"),
        guild.premium_tier,
        guild.premium_subscription_count
    );
    let statistics = format!(
        "**Member Count**: {members} users, {bots} bots\n**Text Channels**: {}\n**Voice Channels**: {}\n**Roles**: {}",
        guild.text_channels, guild.voice_channels, guild.role_count
    );
    let embed = guild_embed(ctx, &guild)
        .thumbnail(guild.icon_url.clone())
        .field("Information", information, false)
        .field("Statistics", statistics, false);
    ctx.send(embed).await?;
    Ok(())
}

impl Utils {
    async fn handle_remindme(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let mut args = ctx.args();
        let duration = args.required("duration")?;
        let message = args.required_rest("text")?;
        let until = parse_time(&duration, Some(1), None, true)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        let Some(until) = until else {
            ctx.send(messages::INVALID_DURATION).await?;
            return Ok(());
        };

        let guild_id = ctx.guild_id();
        let reminder = Reminder {
            id: 0,
            guild_id,
            channel_id: guild_id.map(|_| ctx.channel_id()),
            user_id: ctx.author().id,
            until,
            message,
        };
        {
            let mut reminders = self.reminders.lock().await;
            let id = ctx.bot.storage.add_reminder(&reminder).await?;
            reminders.insert(id, Reminder { id, ..reminder });
        }
        tracing::debug!("Reminder set by {} for {}.", ctx.author().id, until);
        ctx.send(messages::reminder_set(&ctx.author().mention())).await?;
        Ok(())
    }
}
