//! # Moderation Module
//!
//! Commands for moderators: member lookups, mass deletion with a deletion log, and
//! timed or permanent mutes. Mutes survive restarts and re-joins; a background task
//! lifts expired ones.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::application::bot::Bot;
use crate::application::commands::{Command, CommandError};
use crate::application::context::CommandContext;
use crate::application::converters;
use crate::application::help::{ModuleInfo, Restrictions};
use crate::application::modules::BotModule;
use crate::application::text::{self, cur_time, minute_stamp};
use crate::domain::time::parse_time;
use crate::domain::traits::{ChatError, ChatProvider};
use crate::domain::types::{
    Attachment, ChannelId, ChannelKind, Embed, GuildId, MemberInfo, MessageInfo, MuteRecord, OutgoingMessage,
    Permission, RoleId, RoleInfo, UserId,
};
use crate::strings::{help as text_help, messages};

pub const NAME: &str = "moderation";
const COG: &str = "Moderation";
const CATEGORY: &str = "Moderation";
const UNMUTE_INTERVAL: Duration = Duration::from_secs(15);
const DATE_FORMAT: &str = "%a, %b %d, %Y %I:%M %p";

/// Mute expiry by guild and user. `None` never expires.
type MuteMap = HashMap<(GuildId, UserId), Option<DateTime<Utc>>>;

#[derive(Default)]
pub struct Moderation {
    mutes: Arc<Mutex<MuteMap>>,
    unmuter: Mutex<Option<JoinHandle<()>>>,
}

fn commands() -> Vec<Command> {
    vec![
        Command::new("whois")
            .usage("<USER>")
            .description(text_help::WHOIS)
            .guild_only()
            .permissions(&[Permission::ManageGuild]),
        Command::new("purge")
            .aliases(&["prune"])
            .usage("<AMOUNT> (CHANNEL) (USER)")
            .description(text_help::PURGE)
            .guild_only()
            .permissions(&[Permission::ManageMessages])
            .required_config(&["alert_channel"]),
        Command::new("mute")
            .usage("<USER> (DURATION)")
            .description(text_help::MUTE)
            .guild_only()
            .permissions(&[Permission::ManageRoles])
            .required_config(&["mute_role"]),
        Command::new("unmute")
            .usage("<USER>")
            .description(text_help::UNMUTE)
            .guild_only()
            .permissions(&[Permission::ManageRoles])
            .required_config(&["mute_role"]),
    ]
}

/// Help entries as (command, required permission, examples).
const HELP_ENTRIES: &[(&str, &str, &[&str])] = &[
    ("whois", "Manage Server", &["Travus#8888", "118954681241174016"]),
    (
        "purge",
        "Manage Messages",
        &["50", "50 penguin_pen", "25 Travus#8888", "25 bot_room BernieBot#4328"],
    ),
    ("mute", "Manage Roles", &["Travus#8888", "Travus#8888 12h"]),
    ("unmute", "Manage Roles", &["Travus#8888"]),
];

#[async_trait]
impl BotModule for Moderation {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn setup(&self, bot: &Arc<Bot>) -> anyhow::Result<()> {
        let records = bot.storage.mutes().await.context("Failed to load mutes")?;
        {
            let mut mutes = self.mutes.lock().await;
            for record in records {
                mutes.insert((record.guild_id, record.user_id), record.until);
            }
        }

        bot.add_commands(NAME, COG, commands()).await?;
        for (command, permission, examples) in HELP_ENTRIES {
            bot.add_command_help(command, CATEGORY, Restrictions::perms(&[*permission]), examples)
                .await?;
        }
        let info = ModuleInfo::new(
            "Moderation",
            text_help::MODULE_AUTHOR,
            Some(text_help::MODERATION_USAGE.to_string()),
            Some(text_help::MODERATION_DESCRIPTION),
        );
        bot.add_module_info(info).await?;

        let handle = tokio::spawn(auto_unmuter(bot.clone(), self.mutes.clone()));
        *self.unmuter.lock().await = Some(handle);
        Ok(())
    }

    async fn teardown(&self, bot: &Arc<Bot>) {
        if let Some(handle) = self.unmuter.lock().await.take() {
            handle.abort();
        }
        bot.remove_module_info("Moderation").await;
    }

    async fn invoke(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match ctx.command.qualified_name().as_str() {
            "whois" => self.handle_whois(ctx).await,
            "purge" => handle_purge(ctx).await,
            "mute" => self.handle_mute(ctx).await,
            "unmute" => self.handle_unmute(ctx).await,
            other => Err(anyhow!("Unhandled command `{other}`.").into()),
        }
    }

    /// Re-applies the mute role to members who leave and re-join while muted.
    async fn on_member_join(&self, bot: &Arc<Bot>, member: &MemberInfo) {
        if !self.mutes.lock().await.contains_key(&(member.guild_id, member.id())) {
            return;
        }
        let Some(chat) = bot.chat().await else {
            return;
        };
        let (role, alert_channel) = {
            let mut state = bot.state.lock().await;
            (state.config_id("mute_role"), state.config_id("alert_channel"))
        };
        let Some(role) = mute_role(chat.as_ref(), member.guild_id, role).await else {
            return;
        };
        let success = match chat.add_role(member.guild_id, member.id(), role.id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to re-mute {} in guild {}: {}", member.user.name, member.guild_id, e);
                false
            }
        };
        alert(chat.as_ref(), alert_channel, messages::rejoined_muted(&member.mention(), success)).await;
    }
}

fn guild_of(ctx: &CommandContext) -> Result<GuildId, CommandError> {
    ctx.guild_id().ok_or(CommandError::NoPrivateMessage)
}

/// The configured mute role, if it exists in `guild`.
async fn mute_role(chat: &dyn ChatProvider, guild: GuildId, role: Option<RoleId>) -> Option<RoleInfo> {
    let role = role?;
    chat.guild_roles(guild).await.into_iter().find(|r| r.id == role)
}

/// Posts to the alert channel, if one is set. Failures are only logged.
async fn alert(chat: &dyn ChatProvider, channel: Option<ChannelId>, message: impl Into<OutgoingMessage>) {
    let Some(channel) = channel else {
        return;
    };
    if let Err(e) = chat.send(channel, message.into()).await {
        tracing::warn!("Failed to post in alert channel {}: {}", channel, e);
    }
}

/// Whether the author sits above `member` in the role hierarchy or owns the guild.
async fn outranks(ctx: &CommandContext, guild: GuildId, member: &MemberInfo) -> bool {
    let Some(author) = ctx.author_member().await else {
        return false;
    };
    if author.top_role_position > member.top_role_position {
        return true;
    }
    ctx.chat.guild(guild).await.is_some_and(|g| g.owner_id == author.id())
}

async fn auto_unmuter(bot: Arc<Bot>, mutes: Arc<Mutex<MuteMap>>) {
    loop {
        tokio::time::sleep(UNMUTE_INTERVAL).await;
        if bot.is_connected().await {
            unmute_expired(&bot, &mutes).await;
        }
    }
}

/// Lifts every mute whose expiry has passed and reports it in the alert channel.
async fn unmute_expired(bot: &Bot, mutes: &Mutex<MuteMap>) {
    let Some(chat) = bot.chat().await else {
        return;
    };
    let (role, alert_channel) = {
        let mut state = bot.state.lock().await;
        (state.config_id("mute_role"), state.config_id("alert_channel"))
    };

    let mut mutes = mutes.lock().await;
    let now = Utc::now();
    let expired: Vec<(GuildId, UserId)> = mutes
        .iter()
        .filter(|(_, until)| until.is_some_and(|until| until <= now))
        .map(|(key, _)| *key)
        .collect();

    for (guild, user) in expired {
        let Some(member) = chat.member(guild, user).await else {
            tracing::warn!("Could not retrieve member {} from guild {}.", user, guild);
            continue;
        };
        let Some(role) = mute_role(chat.as_ref(), guild, role).await else {
            if let Some(value) = bot.config_value("mute_role").await {
                tracing::warn!("Could not retrieve mute role {}.", value);
            }
            continue;
        };
        match chat.remove_role(guild, user, role.id).await {
            Ok(()) => {}
            Err(ChatError::Forbidden) => {
                tracing::warn!("Could not unmute {} in guild {}, missing permission.", member.user.name, guild);
                alert(chat.as_ref(), alert_channel, messages::mute_expired_forbidden(&member.mention())).await;
                continue;
            }
            Err(e) => {
                tracing::warn!("Failed to unmute {}: {}", member.user.name, e);
                alert(chat.as_ref(), alert_channel, messages::mute_expired_failed(&member.mention())).await;
                continue;
            }
        }
        mutes.remove(&(guild, user));
        if let Err(e) = bot.storage.delete_mute(guild, user).await {
            tracing::error!("Failed to delete expired mute of {} in guild {}: {:#}", user, guild, e);
        }
        alert(chat.as_ref(), alert_channel, messages::mute_expired(&member.mention())).await;
    }
}

impl Moderation {
    async fn handle_whois(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let guild = guild_of(ctx)?;
        let argument = ctx.args().required("user")?;
        let chat = ctx.chat.as_ref();
        let member = converters::member(chat, guild, &argument).await?;

        let mut members = chat.guild_members(guild).await;
        members.sort_by_key(|m| m.joined_at);
        let join_position = members.iter().position(|m| m.id() == member.id()).map_or(0, |p| p + 1);

        let (count, last_message) = recent_messages(chat, guild, member.id()).await;
        let muted = match self.mutes.lock().await.get(&(guild, member.id())) {
            None => "No".to_string(),
            Some(None) => "Yes".to_string(),
            Some(Some(until)) => format!("Until {}", until.format("%b %d, %Y %I:%M %p UTC")),
        };

        let user = &member.user;
        let avatar = user.avatar_url.clone();
        let picture = match &avatar {
            Some(url) => format!("[Link]({url})"),
            None => "None".to_string(),
        };
        let information = format!(
            "**Name**: {}\n**Nickname:**: {}\n**ID:** {}\n**Profile Picture:** {}\n**Status:** {}\n**Muted:** {}\n\
             **Bot:** {}\n",
            user.tag(),
            member.nick.as_deref().unwrap_or("None"),
            user.id,
            picture,
            member.status.as_deref().unwrap_or("offline"),
            muted,
            if user.bot { "Yes" } else { "No" },
        );
        let joined = member
            .joined_at
            .map_or_else(|| "Unknown".to_string(), |at| at.format(DATE_FORMAT).to_string());
        let mut dates = format!(
            "**Registered:** {}\n**Joined:** {}\n**Join Position:** {}\n",
            user.created_at.format(DATE_FORMAT),
            joined,
            join_position
        );
        if let Some(since) = member.premium_since {
            dates.push_str(&format!("**Boosting:** {}", since.format(DATE_FORMAT)));
        }

        let mut roles: Vec<RoleInfo> = chat
            .guild_roles(guild)
            .await
            .into_iter()
            .filter(|r| r.name == "@everyone" || member.roles.contains(&r.id))
            .collect();
        roles.sort_by_key(|r| r.position);
        let roles = if roles.is_empty() {
            "None".to_string()
        } else {
            roles.iter().map(RoleInfo::mention).collect::<Vec<_>>().join(", ")
        };
        let last = match last_message {
            None => "None in 12 hours!".to_string(),
            Some(message) => format!(
                "In <#{}>\nAt {}\n[Link To Message]({})",
                message.channel_id,
                minute_stamp(message.created_at),
                message.jump_url()
            ),
        };

        let embed = Embed::new()
            .description(format!("**{}**", member.mention()))
            .timestamp(Utc::now())
            .thumbnail(avatar.clone())
            .author(user.tag(), avatar)
            .footer(ctx.author().name.clone(), ctx.author().avatar_url.clone())
            .field("Information", information, false)
            .field("Dates", dates, false)
            .field("Roles", roles, false)
            .field("Last Message", last, true)
            .field("Messages Last 12H", format!("{count} messages"), true);
        ctx.send(embed).await?;
        Ok(())
    }

    async fn handle_mute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let guild = guild_of(ctx)?;
        let mut args = ctx.args();
        let argument = args.required("member")?;
        let duration = args.next_word()?;
        let member = converters::member(ctx.chat.as_ref(), guild, &argument).await?;

        if !outranks(ctx, guild, &member).await {
            ctx.send(messages::hierarchy_too_low("mute")).await?;
            return Ok(());
        }
        let (role, alert_channel) = {
            let mut state = ctx.bot.state.lock().await;
            (state.config_id("mute_role"), state.config_id("alert_channel"))
        };
        let Some(role) = mute_role(ctx.chat.as_ref(), guild, role).await else {
            let value = ctx.bot.config_value("mute_role").await.unwrap_or_default();
            ctx.send(messages::mute_role_unavailable(&value)).await?;
            return Ok(());
        };

        let until = match duration {
            None => None,
            Some(duration) => {
                let until = parse_time(&duration, Some(1), None, true)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|delta| Utc::now().checked_add_signed(delta));
                if until.is_none() {
                    ctx.send(messages::INVALID_DURATION).await?;
                    return Ok(());
                }
                until
            }
        };

        match ctx.chat.add_role(guild, member.id(), role.id).await {
            Ok(()) => {}
            Err(ChatError::Forbidden) => {
                ctx.send(messages::CANNOT_ASSIGN_MUTE).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        {
            let mut mutes = self.mutes.lock().await;
            mutes.insert((guild, member.id()), until);
            let record = MuteRecord {
                guild_id: guild,
                user_id: member.id(),
                until,
            };
            ctx.bot.storage.save_mute(&record).await?;
        }
        tracing::info!("{} muted {} in guild {} until {:?}.", ctx.author().id, member.id(), guild, until);

        let temporarily = if until.is_some() { " temporarily" } else { "" };
        let embed = Embed::new()
            .description(format!(
                "{} was{} muted by {}!",
                member.mention(),
                temporarily,
                ctx.author().mention()
            ))
            .timestamp(until.unwrap_or_else(Utc::now))
            .author("Mute", None)
            .footer(
                if until.is_some() { "Muted Until" } else { "Muted On" },
                member.user.avatar_url.clone(),
            );
        ctx.send(embed.clone()).await?;
        if let Some(channel) = alert_channel
            && channel != ctx.channel_id()
        {
            ctx.chat.send(channel, embed.into()).await?;
        }
        Ok(())
    }

    async fn handle_unmute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let guild = guild_of(ctx)?;
        let argument = ctx.args().required("member")?;
        let member = converters::member(ctx.chat.as_ref(), guild, &argument).await?;

        if !outranks(ctx, guild, &member).await {
            ctx.send(messages::hierarchy_too_low("unmute")).await?;
            return Ok(());
        }
        let (role, alert_channel) = {
            let mut state = ctx.bot.state.lock().await;
            (state.config_id("mute_role"), state.config_id("alert_channel"))
        };
        let Some(role) = mute_role(ctx.chat.as_ref(), guild, role).await else {
            let value = ctx.bot.config_value("mute_role").await.unwrap_or_default();
            ctx.send(messages::mute_role_unavailable(&value)).await?;
            return Ok(());
        };

        if !self.mutes.lock().await.contains_key(&(guild, member.id())) {
            ctx.send(messages::NOT_MUTED).await?;
            return Ok(());
        }
        match ctx.chat.remove_role(guild, member.id(), role.id).await {
            Ok(()) => {}
            Err(ChatError::Forbidden) => {
                ctx.send(messages::CANNOT_UNMUTE).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        {
            let mut mutes = self.mutes.lock().await;
            mutes.remove(&(guild, member.id()));
            ctx.bot.storage.delete_mute(guild, member.id()).await?;
        }

        let embed = Embed::new()
            .description(format!("{} was unmuted by {}!", member.mention(), ctx.author().mention()))
            .timestamp(Utc::now())
            .author("Unmute", None)
            .footer("Unmuted On", member.user.avatar_url.clone());
        ctx.send(embed.clone()).await?;
        if let Some(channel) = alert_channel
            && channel != ctx.channel_id()
        {
            ctx.chat.send(channel, embed.into()).await?;
        }
        Ok(())
    }
}

/// Number of messages by `user` across readable text channels in the last 12 hours,
/// along with the newest of them.
async fn recent_messages(chat: &dyn ChatProvider, guild: GuildId, user: UserId) -> (usize, Option<MessageInfo>) {
    let since = Utc::now() - TimeDelta::hours(12);
    let me = chat.current_user().id;
    let mut count = 0;
    let mut newest: Option<MessageInfo> = None;
    for channel in chat.guild_channels(guild).await {
        if channel.kind != ChannelKind::Text {
            continue;
        }
        let permissions = chat.permissions_in(Some(guild), channel.id, me).await;
        if !permissions.contains(Permission::ReadMessageHistory) {
            continue;
        }
        let history = match chat.history(channel.id, 10_000, Some(since)).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Could not read history of channel {}: {}", channel.id, e);
                continue;
            }
        };
        for message in history.into_iter().filter(|m| m.author.id == user) {
            count += 1;
            if newest.as_ref().is_none_or(|n| message.created_at > n.created_at) {
                newest = Some(message);
            }
        }
    }
    (count, newest)
}

async fn handle_purge(ctx: &CommandContext) -> Result<(), CommandError> {
    let guild = guild_of(ctx)?;
    let chat = ctx.chat.as_ref();
    let mut args = ctx.args();
    let amount = args.required_int("amount")?;

    let mut channel = None;
    if let Some(word) = args.peek_word()? {
        match converters::text_channel(chat, guild, &word).await {
            Ok(found) => {
                args.next_word()?;
                channel = Some(found);
            }
            Err(_) => {
                if let Some(id) = converters::channel_id(&word)
                    && let Some(other) = chat.channel(id).await
                    && other.guild_id != Some(guild)
                {
                    ctx.send(messages::channel_not_in_guild(&ctx.clean(&other.name).await))
                        .await?;
                    return Ok(());
                }
            }
        }
    }
    let mut user = None;
    if let Some(word) = args.peek_word()?
        && let Ok(found) = converters::member(chat, guild, &word).await
    {
        args.next_word()?;
        user = Some(found);
    }

    let channel = match channel {
        Some(channel) => channel,
        None => chat
            .channel(ctx.channel_id())
            .await
            .ok_or_else(|| anyhow!("Channel {} not found.", ctx.channel_id()))?,
    };
    let permissions = chat.permissions_in(Some(guild), channel.id, ctx.author().id).await;
    if !permissions.contains(Permission::ManageMessages) {
        ctx.send(messages::no_delete_permission(&ctx.clean(&channel.name).await))
            .await?;
        return Ok(());
    }
    let alert_channel = ctx.bot.state.lock().await.config_id("alert_channel");

    let limit = usize::try_from(amount).unwrap_or(0);
    let mut failed = false;
    let history = match chat.history(channel.id, limit, None).await {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!("Failed to read history of channel {}: {}", channel.id, e);
            failed = true;
            Vec::new()
        }
    };
    let mut deleted: Vec<MessageInfo> = Vec::new();
    for message in history {
        if user.as_ref().is_some_and(|u: &MemberInfo| message.author.id != u.id()) {
            continue;
        }
        if let Err(e) = chat.delete_message(channel.id, message.id).await {
            tracing::warn!("Failed to delete message {} in channel {}: {}", message.id, channel.id, e);
            failed = true;
            break;
        }
        deleted.push(message);
    }

    if failed {
        ctx.send(messages::DELETION_FAILED).await?;
    }
    if deleted.is_empty() {
        ctx.send(messages::NOTHING_TO_DELETE).await?;
        return Ok(());
    }
    tracing::info!("{} purged {} messages in channel {}.", ctx.author().id, deleted.len(), channel.id);
    let Some(alert_channel) = alert_channel else {
        return Ok(());
    };

    let author = ctx.author();
    let mut log = messages::deletion_log_header(&author.name, author.id, &channel.name, channel.id, &cur_time());
    for message in deleted.iter().rev() {
        log.push_str(&log_entry(chat, guild, message).await);
    }
    let post = OutgoingMessage {
        content: Some(messages::deletion_log_post(&author.mention(), &channel.name)),
        embed: None,
        file: Some(Attachment {
            filename: messages::DELETION_LOG_FILE.to_string(),
            data: log.into_bytes(),
        }),
    };
    chat.send(alert_channel, post).await?;
    Ok(())
}

/// One message in the deletion log.
async fn log_entry(chat: &dyn ChatProvider, guild: GuildId, message: &MessageInfo) -> String {
    let time = match message.edited_at {
        Some(edited) => format!("[{} (edit)]", minute_stamp(edited)),
        None => format!("[{}]", minute_stamp(message.created_at)),
    };
    let mut content = text::clean(chat, Some(guild), &message.content, false).await;
    if content.is_empty() {
        content = messages::NO_MESSAGE_TEXT.to_string();
    }
    let mut entry = format!(
        "{time} Message {} by {} ({}):\n{content}\n\n",
        message.id,
        message.author.tag(),
        message.author.id
    );
    if !message.attachments.is_empty() {
        entry.push_str(&format!("Attachments:\n{}\n\n", message.attachments.join("\n")));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::modules::ModuleRegistry;
    use crate::application::router::CommandRouter;
    use crate::domain::traits::Storage;
    use crate::domain::types::{GuildInfo, Permissions};
    use crate::testing::{
        BOT_ID, CHANNEL, GUILD, MemoryStorage, RecordingChat, RoleChange, epoch, guild_message, test_config,
        test_member, test_user, text_channel,
    };

    const OWNER: u64 = 1;
    const MODERATOR: u64 = 2;
    const TRAVUS: u64 = 118954681241174016;
    const MUTE_ROLE: u64 = 500;
    const ALERTS: u64 = 300;

    struct Harness {
        bot: Arc<Bot>,
        chat: Arc<RecordingChat>,
        storage: Arc<MemoryStorage>,
        router: CommandRouter,
    }

    impl Harness {
        async fn new() -> Self {
            Self::with_storage(Arc::new(MemoryStorage::default())).await
        }

        async fn with_storage(storage: Arc<MemoryStorage>) -> Self {
            let registry = ModuleRegistry::new().with(NAME, || Arc::new(Moderation::default()));
            let bot = Bot::new(test_config(), storage.clone(), registry);
            bot.init().await.unwrap();
            bot.set_delete_messages(false).await.unwrap();
            bot.set_config("mute_role", &MUTE_ROLE.to_string()).await.unwrap();
            bot.set_config("alert_channel", &ALERTS.to_string()).await.unwrap();

            let chat = Arc::new(RecordingChat::new());
            chat.add_guild(GuildInfo {
                id: GUILD,
                name: "Penguins".to_string(),
                owner_id: OWNER,
                icon_url: None,
                created_at: epoch(),
                premium_tier: 0,
                premium_subscription_count: 0,
                text_channels: 2,
                voice_channels: 0,
                role_count: 2,
            });
            chat.add_channel(text_channel(ALERTS, GUILD, "mod-log"));
            chat.add_role(
                GUILD,
                RoleInfo {
                    id: MUTE_ROLE,
                    name: "Muted".to_string(),
                    position: 1,
                },
            );
            chat.add_member(test_member(GUILD, test_user(OWNER, "Owner"), 0));
            chat.add_member(test_member(GUILD, test_user(MODERATOR, "Mod"), 5));
            let mut travus = test_user(TRAVUS, "Travus");
            travus.discriminator = Some(8888);
            chat.add_member(test_member(GUILD, travus, 1));
            for user in [OWNER, MODERATOR] {
                chat.set_permissions(CHANNEL, user, Permissions::all());
            }
            chat.set_permissions(CHANNEL, BOT_ID, Permissions::all());

            bot.on_ready(chat.clone()).await.unwrap();
            bot.load_module(NAME).await.unwrap();
            let router = CommandRouter::new(bot.clone());
            Self {
                bot,
                chat,
                storage,
                router,
            }
        }

        async fn run(&self, author: u64, content: &str) {
            self.router.route(self.chat.clone(), guild_message(author, content)).await;
        }

        fn last(&self) -> OutgoingMessage {
            self.chat.sent().last().map(|(_, m)| m.clone()).unwrap_or_default()
        }

        fn last_description(&self) -> String {
            self.last()
                .embed
                .and_then(|e| e.description)
                .unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn test_mute_and_unmute() {
        let h = Harness::new().await;
        h.run(MODERATOR, "!mute Travus#8888").await;
        assert_eq!(h.chat.role_changes(), vec![RoleChange::Added(GUILD, TRAVUS, MUTE_ROLE)]);
        let mutes = h.storage.mutes().await.unwrap();
        assert_eq!(mutes.len(), 1);
        assert_eq!(mutes[0].until, None);

        let in_channel = h.chat.sent_to(CHANNEL);
        let embed = in_channel.last().and_then(|m| m.embed.clone()).unwrap();
        assert_eq!(embed.description.as_deref(), Some("<@118954681241174016> was muted by <@2>!"));
        assert_eq!(embed.footer.unwrap().text, "Muted On");
        assert_eq!(h.chat.sent_to(ALERTS).len(), 1);

        h.run(MODERATOR, "!unmute Travus").await;
        assert_eq!(h.last_description(), "<@118954681241174016> was unmuted by <@2>!");
        assert_eq!(h.chat.role_changes().len(), 2);
        assert!(h.storage.mutes().await.unwrap().is_empty());

        h.run(MODERATOR, "!unmute Travus").await;
        assert_eq!(h.last().text(), messages::NOT_MUTED);
    }

    #[tokio::test]
    async fn test_temporary_mute() {
        let h = Harness::new().await;
        h.run(MODERATOR, "!mute Travus 1h").await;
        let embed = h.last().embed.unwrap();
        assert_eq!(
            embed.description.as_deref(),
            Some("<@118954681241174016> was temporarily muted by <@2>!")
        );
        assert_eq!(embed.footer.unwrap().text, "Muted Until");
        let until = h.storage.mutes().await.unwrap()[0].until.unwrap();
        assert!(until > Utc::now() + TimeDelta::minutes(59));

        h.run(MODERATOR, "!mute Travus 0s").await;
        assert_eq!(h.last().text(), messages::INVALID_DURATION);
        h.run(MODERATOR, "!mute Travus soon").await;
        assert_eq!(h.last().text(), messages::INVALID_DURATION);
    }

    #[tokio::test]
    async fn test_mute_respects_hierarchy() {
        let h = Harness::new().await;
        h.chat.set_permissions(CHANNEL, TRAVUS, Permissions::all());
        h.run(TRAVUS, "!mute Mod").await;
        assert_eq!(h.last().text(), "You can only mute members below you in the role hierarchy.");
        assert!(h.chat.role_changes().is_empty());

        // The guild owner has the lowest role but may still mute.
        h.run(OWNER, "!mute Mod").await;
        assert_eq!(h.chat.role_changes(), vec![RoleChange::Added(GUILD, MODERATOR, MUTE_ROLE)]);
    }

    #[tokio::test]
    async fn test_mute_failures() {
        let h = Harness::new().await;
        h.chat.deny_roles();
        h.run(MODERATOR, "!mute Travus").await;
        assert_eq!(h.last().text(), messages::CANNOT_ASSIGN_MUTE);
        assert!(h.storage.mutes().await.unwrap().is_empty());

        h.bot.set_config("mute_role", "12345").await.unwrap();
        h.run(MODERATOR, "!mute Travus").await;
        assert_eq!(h.last().text(), "Could not retrieve mute role: 12345");

        h.bot.remove_config("mute_role").await.unwrap();
        h.run(MODERATOR, "!mute Travus").await;
        assert!(h.last().text().contains("`mute_role`"));
    }

    #[tokio::test]
    async fn test_expired_mutes_are_lifted() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .save_mute(&MuteRecord {
                guild_id: GUILD,
                user_id: TRAVUS,
                until: Some(Utc::now() - TimeDelta::seconds(5)),
            })
            .await
            .unwrap();
        storage
            .save_mute(&MuteRecord {
                guild_id: GUILD,
                user_id: MODERATOR,
                until: None,
            })
            .await
            .unwrap();
        let h = Harness::with_storage(storage).await;

        let module = Moderation::default();
        h.bot.unload_module(NAME).await.unwrap();
        module.setup(&h.bot).await.unwrap();
        unmute_expired(&h.bot, &module.mutes).await;
        module.teardown(&h.bot).await;

        assert_eq!(h.chat.role_changes(), vec![RoleChange::Removed(GUILD, TRAVUS, MUTE_ROLE)]);
        let remaining = h.storage.mutes().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, MODERATOR);
        let alerts = h.chat.sent_to(ALERTS);
        assert_eq!(alerts.last().unwrap().text(), "Mute of <@118954681241174016> expired. User unmuted.");
    }

    #[tokio::test]
    async fn test_rejoining_member_is_muted_again() {
        let h = Harness::new().await;
        h.run(MODERATOR, "!mute Travus").await;
        let member = h.chat.member(GUILD, TRAVUS).await.unwrap();
        h.bot.on_member_join(&member).await;
        assert_eq!(h.chat.role_changes().len(), 2);
        assert_eq!(
            h.chat.sent_to(ALERTS).last().unwrap().text(),
            "<@118954681241174016> re-joined while muted! Re-muted user."
        );

        let other = h.chat.member(GUILD, MODERATOR).await.unwrap();
        h.bot.on_member_join(&other).await;
        assert_eq!(h.chat.role_changes().len(), 2);
    }

    #[tokio::test]
    async fn test_purge_posts_deletion_log() {
        let h = Harness::new().await;
        let mut first = guild_message(TRAVUS, "first");
        first.author = h.chat.user(TRAVUS).await.unwrap();
        first.created_at = epoch();
        let mut second = guild_message(MODERATOR, "second");
        second.created_at = epoch();
        let mut third = guild_message(TRAVUS, "");
        third.author = first.author.clone();
        third.created_at = epoch();
        third.attachments = vec!["https://cdn.example.com/a.png".to_string()];
        for message in [first.clone(), second.clone(), third.clone()] {
            h.chat.add_history(message);
        }

        h.run(MODERATOR, "!purge 3 Travus#8888").await;
        assert_eq!(h.chat.deleted(), vec![(CHANNEL, third.id), (CHANNEL, first.id)]);
        let post = h.chat.sent_to(ALERTS).pop().unwrap();
        assert_eq!(post.text(), "Deletion log by <@2> from general:");
        let file = post.file.unwrap();
        assert_eq!(file.filename, "Deletion log.txt");
        let log = String::from_utf8(file.data).unwrap();
        assert!(log.starts_with("Messages deleted by user2 (2) in general (200) on "));
        let first_entry = log.find(&format!("Message {} by Travus#8888", first.id)).unwrap();
        let third_entry = log.find(&format!("Message {} by Travus#8888", third.id)).unwrap();
        assert!(first_entry < third_entry);
        assert!(log.contains("[2020-01-01 00:00] Message"));
        assert!(log.contains("NO TEXT CONTENT IN MESSAGE.\n\nAttachments:\nhttps://cdn.example.com/a.png\n\n"));

        h.run(MODERATOR, "!purge 5 Travus").await;
        assert_eq!(h.last().text(), messages::NOTHING_TO_DELETE);
    }

    #[tokio::test]
    async fn test_purge_other_channel_needs_permission() {
        let h = Harness::new().await;
        h.chat.add_history(guild_message(TRAVUS, "hello"));
        h.run(MODERATOR, "!purge 10 mod-log").await;
        assert_eq!(h.last().text(), "You do not have permissions to delete messages in mod-log.");

        h.chat.add_channel(text_channel(300000000000000009, 555, "elsewhere"));
        h.run(MODERATOR, "!purge 10 <#300000000000000009>").await;
        assert_eq!(h.last().text(), "The `elsewhere` channel is not part of this server.");

        h.chat.deny_deletes();
        h.run(MODERATOR, "!prune 10").await;
        let texts = h.chat.texts();
        assert_eq!(
            texts[texts.len() - 2..],
            [messages::DELETION_FAILED.to_string(), messages::NOTHING_TO_DELETE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_whois() {
        let h = Harness::new().await;
        let mut message = guild_message(TRAVUS, "hi");
        message.author = h.chat.user(TRAVUS).await.unwrap();
        h.chat.add_history(message.clone());
        h.run(MODERATOR, "!mute Travus").await;

        h.run(MODERATOR, "!whois 118954681241174016").await;
        let embed = h.last().embed.unwrap();
        assert_eq!(embed.description.as_deref(), Some("**<@118954681241174016>**"));
        let information = embed.field_value("Information").unwrap();
        assert!(information.contains("**Name**: Travus#8888\n"));
        assert!(information.contains("**Muted:** Yes\n"));
        assert!(embed.field_value("Dates").unwrap().contains("**Join Position:** 3\n"));
        assert_eq!(embed.field_value("Messages Last 12H"), Some("1 messages"));
        assert!(embed.field_value("Last Message").unwrap().starts_with("In <#200>\nAt "));

        let sent = h.chat.sent().len();
        h.run(TRAVUS, "!whois Mod").await;
        assert_eq!(h.chat.sent().len(), sent);
    }
}
