//! # Discord Service Adapter
//!
//! Implements the `ChatProvider` trait on top of `serenity`, and the gateway event
//! handler that feeds messages, connection changes and member joins into the bot.
//! Serenity types are converted into the plain domain snapshots here so the rest of
//! the bot never depends on the client library.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    ActivityData, Channel, ChannelType, ConnectionStage, Context, CreateAttachment, CreateEmbed, CreateEmbedAuthor,
    CreateEmbedFooter, CreateMessage, EventHandler, GetMessages, Guild, GuildChannel, Member, Message,
    Permissions as DiscordPermissions, PremiumTier, Ready, ResumedEvent, Role, ShardStageUpdateEvent, Timestamp, User,
};
use serenity::all::{ChannelId as DiscordChannelId, GuildId as DiscordGuildId, MessageId as DiscordMessageId};
use serenity::all::{RoleId as DiscordRoleId, UserId as DiscordUserId};
use serenity::http::HttpError;
use std::sync::Arc;

use crate::application::bot::Bot;
use crate::application::router::CommandRouter;
use crate::domain::traits::{ChatError, ChatProvider};
use crate::domain::types::{
    ChannelId, ChannelInfo, ChannelKind, Embed, GuildId, GuildInfo, MemberInfo, MessageId, MessageInfo,
    OutgoingMessage, Permission, Permissions, RoleId, RoleInfo, UserId, UserInfo,
};

/// Discord caps history requests at this many messages.
const HISTORY_PAGE: usize = 100;

fn to_utc(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_default()
}

fn map_error(error: serenity::Error) -> ChatError {
    match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => match response.status_code.as_u16() {
            403 => ChatError::Forbidden,
            404 => ChatError::NotFound,
            _ => ChatError::Http(error.to_string()),
        },
        _ => ChatError::Http(error.to_string()),
    }
}

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id.get(),
        name: user.name.clone(),
        discriminator: user.discriminator.map(|d| d.get()),
        display_name: user.global_name.clone().unwrap_or_else(|| user.name.clone()),
        bot: user.bot,
        avatar_url: user.avatar_url(),
        created_at: to_utc(user.id.created_at()),
    }
}

fn role_info(role: &Role) -> RoleInfo {
    RoleInfo {
        id: role.id.get(),
        name: role.name.clone(),
        position: role.position,
    }
}

fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text | ChannelType::News => ChannelKind::Text,
        ChannelType::Voice | ChannelType::Stage => ChannelKind::Voice,
        ChannelType::Category => ChannelKind::Category,
        ChannelType::Private => ChannelKind::Private,
        _ => ChannelKind::Other,
    }
}

fn channel_info(channel: &GuildChannel) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.get(),
        guild_id: Some(channel.guild_id.get()),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
    }
}

/// Member snapshot. `guild` supplies role positions and presence when it is cached.
fn member_info(member: &Member, guild: Option<&Guild>) -> MemberInfo {
    let top_role_position = guild
        .map(|g| {
            member
                .roles
                .iter()
                .filter_map(|r| g.roles.get(r))
                .map(|r| r.position)
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    let status = guild
        .and_then(|g| g.presences.get(&member.user.id))
        .map(|p| p.status.name().to_string());
    MemberInfo {
        user: user_info(&member.user),
        guild_id: member.guild_id.get(),
        nick: member.nick.clone(),
        roles: member.roles.iter().map(|r| r.get()).collect(),
        top_role_position,
        joined_at: member.joined_at.map(to_utc),
        premium_since: member.premium_since.map(to_utc),
        status,
    }
}

fn premium_tier(tier: PremiumTier) -> u8 {
    match tier {
        PremiumTier::Tier1 => 1,
        PremiumTier::Tier2 => 2,
        PremiumTier::Tier3 => 3,
        _ => 0,
    }
}

fn guild_info(guild: &Guild) -> GuildInfo {
    let count = |kind: ChannelKind| {
        guild
            .channels
            .values()
            .filter(|c| channel_kind(c.kind) == kind)
            .count()
    };
    GuildInfo {
        id: guild.id.get(),
        name: guild.name.clone(),
        owner_id: guild.owner_id.get(),
        icon_url: guild.icon_url(),
        created_at: to_utc(guild.id.created_at()),
        premium_tier: premium_tier(guild.premium_tier),
        premium_subscription_count: guild.premium_subscription_count.unwrap_or(0),
        text_channels: count(ChannelKind::Text),
        voice_channels: count(ChannelKind::Voice),
        role_count: guild.roles.len(),
    }
}

fn message_info(message: &Message) -> MessageInfo {
    MessageInfo {
        id: message.id.get(),
        channel_id: message.channel_id.get(),
        guild_id: message.guild_id.map(|g| g.get()),
        author: user_info(&message.author),
        content: message.content.clone(),
        created_at: to_utc(message.timestamp),
        edited_at: message.edited_timestamp.map(to_utc),
        attachments: message.attachments.iter().map(|a| a.url.clone()).collect(),
    }
}

fn permissions(discord: DiscordPermissions) -> Permissions {
    let checks = [
        (discord.administrator(), Permission::Administrator),
        (discord.manage_guild(), Permission::ManageGuild),
        (discord.manage_messages(), Permission::ManageMessages),
        (discord.manage_roles(), Permission::ManageRoles),
        (discord.send_messages(), Permission::SendMessages),
        (discord.read_message_history(), Permission::ReadMessageHistory),
    ];
    checks
        .into_iter()
        .filter(|(granted, _)| *granted)
        .fold(Permissions::empty(), |perms, (_, permission)| perms.with(permission))
}

fn build_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new().colour(embed.colour);
    if let Some(author) = embed.author {
        let mut author_builder = CreateEmbedAuthor::new(author.name);
        if let Some(icon) = author.icon_url {
            author_builder = author_builder.icon_url(icon);
        }
        builder = builder.author(author_builder);
    }
    if let Some(description) = embed.description {
        builder = builder.description(description);
    }
    builder = builder.fields(embed.fields.into_iter().map(|f| (f.name, f.value, f.inline)));
    if let Some(footer) = embed.footer {
        let mut footer_builder = CreateEmbedFooter::new(footer.text);
        if let Some(icon) = footer.icon_url {
            footer_builder = footer_builder.icon_url(icon);
        }
        builder = builder.footer(footer_builder);
    }
    if let Some(thumbnail) = embed.thumbnail {
        builder = builder.thumbnail(thumbnail);
    }
    if let Some(timestamp) = embed.timestamp
        && let Ok(timestamp) = Timestamp::from_unix_timestamp(timestamp.timestamp())
    {
        builder = builder.timestamp(timestamp);
    }
    builder
}

fn build_message(message: OutgoingMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = message.content {
        builder = builder.content(content);
    }
    if let Some(embed) = message.embed {
        builder = builder.embed(build_embed(embed));
    }
    if let Some(file) = message.file {
        builder = builder.add_file(CreateAttachment::bytes(file.data, file.filename));
    }
    builder
}

/// `ChatProvider` backed by a gateway context. One is created per event; the
/// context clones share the same HTTP client and cache.
#[derive(Clone)]
pub struct DiscordChat {
    ctx: Context,
    me: UserInfo,
}

impl DiscordChat {
    pub fn new(ctx: Context) -> Self {
        let me = user_info(&ctx.cache.current_user());
        Self { ctx, me }
    }

    /// Runs `f` on the cached guild. The cache guard must not live across an await.
    fn with_guild<T>(&self, guild: GuildId, f: impl FnOnce(&Guild) -> T) -> Option<T> {
        self.ctx.cache.guild(DiscordGuildId::new(guild)).map(|g| f(&g))
    }
}

#[async_trait]
impl ChatProvider for DiscordChat {
    fn current_user(&self) -> UserInfo {
        self.me.clone()
    }

    async fn send(&self, channel: ChannelId, message: OutgoingMessage) -> Result<MessageId, ChatError> {
        tracing::debug!("Sending message to channel {}", channel);
        DiscordChannelId::new(channel)
            .send_message(&self.ctx, build_message(message))
            .await
            .map(|m| m.id.get())
            .map_err(map_error)
    }

    async fn send_dm(&self, user: UserId, message: OutgoingMessage) -> Result<MessageId, ChatError> {
        let dm = DiscordUserId::new(user)
            .create_dm_channel(&self.ctx)
            .await
            .map_err(map_error)?;
        dm.id
            .send_message(&self.ctx, build_message(message))
            .await
            .map(|m| m.id.get())
            .map_err(map_error)
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError> {
        DiscordChannelId::new(channel)
            .delete_message(&self.ctx.http, DiscordMessageId::new(message))
            .await
            .map_err(map_error)
    }

    async fn history(
        &self,
        channel: ChannelId,
        limit: usize,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageInfo>, ChatError> {
        let channel = DiscordChannelId::new(channel);
        let mut collected = Vec::new();
        let mut before: Option<DiscordMessageId> = None;
        while collected.len() < limit {
            let page = (limit - collected.len()).min(HISTORY_PAGE);
            let mut request = GetMessages::new().limit(page as u8);
            if let Some(before) = before {
                request = request.before(before);
            }
            let batch = channel.messages(&self.ctx, request).await.map_err(map_error)?;
            let exhausted = batch.len() < page;
            before = batch.last().map(|m| m.id);
            for message in &batch {
                let info = message_info(message);
                if after.is_some_and(|after| info.created_at < after) {
                    return Ok(collected);
                }
                collected.push(info);
            }
            if exhausted || before.is_none() {
                break;
            }
        }
        Ok(collected)
    }

    async fn set_listening(&self, activity: &str) {
        self.ctx.set_activity(Some(ActivityData::listening(activity)));
    }

    async fn user(&self, user: UserId) -> Option<UserInfo> {
        DiscordUserId::new(user)
            .to_user(&self.ctx)
            .await
            .map(|u| user_info(&u))
            .ok()
    }

    async fn guild(&self, guild: GuildId) -> Option<GuildInfo> {
        self.with_guild(guild, guild_info)
    }

    async fn member(&self, guild: GuildId, user: UserId) -> Option<MemberInfo> {
        let cached = self.with_guild(guild, |g| {
            g.members
                .get(&DiscordUserId::new(user))
                .map(|m| member_info(m, Some(g)))
        });
        match cached {
            Some(Some(member)) => Some(member),
            _ => {
                let member = self
                    .ctx
                    .http
                    .get_member(DiscordGuildId::new(guild), DiscordUserId::new(user))
                    .await
                    .ok()?;
                let info = self.with_guild(guild, |g| member_info(&member, Some(g)));
                Some(info.unwrap_or_else(|| member_info(&member, None)))
            }
        }
    }

    async fn guild_members(&self, guild: GuildId) -> Vec<MemberInfo> {
        self.with_guild(guild, |g| g.members.values().map(|m| member_info(m, Some(g))).collect())
            .unwrap_or_default()
    }

    async fn guild_channels(&self, guild: GuildId) -> Vec<ChannelInfo> {
        self.with_guild(guild, |g| g.channels.values().map(channel_info).collect())
            .unwrap_or_default()
    }

    async fn guild_roles(&self, guild: GuildId) -> Vec<RoleInfo> {
        self.with_guild(guild, |g| g.roles.values().map(role_info).collect())
            .unwrap_or_default()
    }

    async fn channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        match DiscordChannelId::new(channel).to_channel(&self.ctx).await.ok()? {
            Channel::Guild(channel) => Some(channel_info(&channel)),
            Channel::Private(private) => Some(ChannelInfo {
                id: private.id.get(),
                guild_id: None,
                name: private.recipient.name.clone(),
                kind: ChannelKind::Private,
            }),
            _ => None,
        }
    }

    async fn permissions_in(&self, guild: Option<GuildId>, channel: ChannelId, user: UserId) -> Permissions {
        let Some(guild) = guild else {
            return Permissions::direct_message();
        };
        self.with_guild(guild, |g| {
            let channel = g.channels.get(&DiscordChannelId::new(channel))?;
            let member = g.members.get(&DiscordUserId::new(user))?;
            Some(permissions(g.user_permissions_in(channel, member)))
        })
        .flatten()
        .unwrap_or_else(Permissions::empty)
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError> {
        self.ctx
            .http
            .add_member_role(
                DiscordGuildId::new(guild),
                DiscordUserId::new(user),
                DiscordRoleId::new(role),
                None,
            )
            .await
            .map_err(map_error)
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError> {
        self.ctx
            .http
            .remove_member_role(
                DiscordGuildId::new(guild),
                DiscordUserId::new(user),
                DiscordRoleId::new(role),
                None,
            )
            .await
            .map_err(map_error)
    }
}

/// Gateway event handler. Forwards events into the bot core.
pub struct Handler {
    bot: Arc<Bot>,
    router: Arc<CommandRouter>,
}

impl Handler {
    pub fn new(bot: Arc<Bot>) -> Self {
        let router = Arc::new(CommandRouter::new(bot.clone()));
        Self { bot, router }
    }

    /// Owners of the application, or of its team.
    async fn application_owners(ctx: &Context) -> Vec<UserId> {
        match ctx.http.get_current_application_info().await {
            Ok(info) => match (info.team, info.owner) {
                (Some(team), _) => team.members.iter().map(|m| m.user.id.get()).collect(),
                (None, Some(owner)) => vec![owner.id.get()],
                (None, None) => Vec::new(),
            },
            Err(e) => {
                tracing::error!("Failed to look up the application owner: {}", e);
                Vec::new()
            }
        }
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, message: Message) {
        let chat: Arc<dyn ChatProvider> = Arc::new(DiscordChat::new(ctx));
        let router = self.router.clone();
        let info = message_info(&message);
        tokio::spawn(async move {
            router.route(chat, info).await;
        });
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("Connected as {} to {} guild(s).", ready.user.name, ready.guilds.len());
        let owners = Self::application_owners(&ctx).await;
        if !owners.is_empty() {
            self.bot.set_owners(owners).await;
        }
        if let Err(e) = self.bot.on_ready(Arc::new(DiscordChat::new(ctx))).await {
            tracing::error!("Failed to finish start-up: {:#}", e);
        }
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        self.bot.on_resume().await;
    }

    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        match event.new {
            ConnectionStage::Connected => self.bot.on_resume().await,
            ConnectionStage::Disconnected | ConnectionStage::Resuming => self.bot.on_disconnect().await,
            _ => {}
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let guild = ctx.cache.guild(new_member.guild_id).map(|g| member_info(&new_member, Some(&g)));
        let member = guild.unwrap_or_else(|| member_info(&new_member, None));
        tracing::debug!("Member {} joined guild {}", member.id(), member.guild_id);
        self.bot.on_member_join(&member).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Attachment;

    #[test]
    fn test_permission_conversion() {
        let granted = permissions(DiscordPermissions::MANAGE_ROLES | DiscordPermissions::SEND_MESSAGES);
        assert!(granted.contains(Permission::ManageRoles));
        assert!(granted.contains(Permission::SendMessages));
        assert!(!granted.contains(Permission::ManageGuild));

        let admin = permissions(DiscordPermissions::ADMINISTRATOR);
        assert!(admin.contains(Permission::ManageMessages));
        assert_eq!(permissions(DiscordPermissions::empty()), Permissions::empty());
    }

    #[test]
    fn test_channel_kinds() {
        assert_eq!(channel_kind(ChannelType::Text), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::News), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::Voice), ChannelKind::Voice);
        assert_eq!(channel_kind(ChannelType::Category), ChannelKind::Category);
        assert_eq!(channel_kind(ChannelType::Forum), ChannelKind::Other);
    }

    #[test]
    fn test_timestamps_convert_to_utc() {
        let timestamp = Timestamp::from_unix_timestamp(1_600_000_000).unwrap();
        assert_eq!(to_utc(timestamp).timestamp(), 1_600_000_000);
    }

    #[test]
    fn test_build_message_accepts_every_part() {
        let message = OutgoingMessage {
            content: Some("Here you go.".to_string()),
            embed: Some(Embed::new().description("Done").field("Members", "3", true)),
            file: Some(Attachment {
                filename: "bot.log".to_string(),
                data: b"log".to_vec(),
            }),
        };
        // Builders are opaque; this only checks that conversion does not panic.
        let _ = build_message(message);
    }
}
