//! Test doubles: an in-memory [`Storage`] and a [`ChatProvider`] that records what the
//! bot does instead of talking to Discord.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::config::AppConfig;
use crate::domain::traits::{ChatError, ChatProvider, Storage};
use crate::domain::types::{
    ChannelId, ChannelInfo, ChannelKind, GuildId, GuildInfo, MemberInfo, MessageId, MessageInfo, MuteRecord,
    OutgoingMessage, Permissions, Reminder, RoleId, RoleInfo, UserId, UserInfo,
};

pub const BOT_ID: UserId = 999;
pub const GUILD: GuildId = 100;
pub const CHANNEL: ChannelId = 200;

static NEXT_ID: AtomicU64 = AtomicU64::new(10_000);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Configuration with a token and user 1 as the only owner.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.discord.token = "token".to_string();
    config.discord.owners = vec![1];
    config
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

pub fn test_user(id: UserId, name: &str) -> UserInfo {
    UserInfo {
        id,
        name: name.to_string(),
        discriminator: None,
        display_name: name.to_string(),
        bot: false,
        avatar_url: None,
        created_at: epoch(),
    }
}

pub fn test_member(guild: GuildId, user: UserInfo, top_role_position: u16) -> MemberInfo {
    MemberInfo {
        user,
        guild_id: guild,
        nick: None,
        roles: Vec::new(),
        top_role_position,
        joined_at: Some(epoch()),
        premium_since: None,
        status: None,
    }
}

pub fn text_channel(id: ChannelId, guild: GuildId, name: &str) -> ChannelInfo {
    ChannelInfo {
        id,
        guild_id: Some(guild),
        name: name.to_string(),
        kind: ChannelKind::Text,
    }
}

/// A message from user `author` in the test guild's main channel.
pub fn guild_message(author: UserId, content: &str) -> MessageInfo {
    MessageInfo {
        id: next_id(),
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        author: test_user(author, &format!("user{author}")),
        content: content.to_string(),
        created_at: Utc::now(),
        edited_at: None,
        attachments: Vec::new(),
    }
}

pub fn dm_message(author: UserId, content: &str) -> MessageInfo {
    MessageInfo {
        guild_id: None,
        ..guild_message(author, content)
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    settings: Mutex<HashMap<String, String>>,
    default_modules: Mutex<Vec<String>>,
    command_states: Mutex<HashMap<String, i16>>,
    config: Mutex<BTreeMap<String, String>>,
    mutes: Mutex<Vec<MuteRecord>>,
    reminders: Mutex<Vec<Reminder>>,
    next_reminder: AtomicU64,
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.settings.lock().unwrap().get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.settings.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn default_modules(&self) -> Result<Vec<String>> {
        Ok(self.default_modules.lock().unwrap().clone())
    }

    async fn add_default_module(&self, module: &str) -> Result<bool> {
        let mut modules = self.default_modules.lock().unwrap();
        if modules.iter().any(|m| m == module) {
            return Ok(false);
        }
        modules.push(module.to_string());
        Ok(true)
    }

    async fn remove_default_module(&self, module: &str) -> Result<bool> {
        let mut modules = self.default_modules.lock().unwrap();
        let before = modules.len();
        modules.retain(|m| m != module);
        Ok(modules.len() != before)
    }

    async fn command_state(&self, command: &str) -> Result<Option<i16>> {
        Ok(self.command_states.lock().unwrap().get(command).copied())
    }

    async fn set_command_state(&self, command: &str, state: i16) -> Result<()> {
        self.command_states.lock().unwrap().insert(command.to_string(), state);
        Ok(())
    }

    async fn config_entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .config
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.config.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_config(&self, key: &str) -> Result<bool> {
        Ok(self.config.lock().unwrap().remove(key).is_some())
    }

    async fn mutes(&self) -> Result<Vec<MuteRecord>> {
        Ok(self.mutes.lock().unwrap().clone())
    }

    async fn save_mute(&self, mute: &MuteRecord) -> Result<()> {
        let mut mutes = self.mutes.lock().unwrap();
        mutes.retain(|m| !(m.guild_id == mute.guild_id && m.user_id == mute.user_id));
        mutes.push(mute.clone());
        Ok(())
    }

    async fn delete_mute(&self, guild: GuildId, user: UserId) -> Result<()> {
        self.mutes
            .lock()
            .unwrap()
            .retain(|m| !(m.guild_id == guild && m.user_id == user));
        Ok(())
    }

    async fn reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.reminders.lock().unwrap().clone())
    }

    async fn add_reminder(&self, reminder: &Reminder) -> Result<i64> {
        let id = self.next_reminder.fetch_add(1, Ordering::Relaxed) as i64 + 1;
        self.reminders.lock().unwrap().push(Reminder {
            id,
            ..reminder.clone()
        });
        Ok(id)
    }

    async fn delete_reminder(&self, id: i64) -> Result<()> {
        self.reminders.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChange {
    Added(GuildId, UserId, RoleId),
    Removed(GuildId, UserId, RoleId),
}

/// Records every outgoing action. Lookups are served from what tests put in.
pub struct RecordingChat {
    me: UserInfo,
    sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    dms: Mutex<Vec<(UserId, OutgoingMessage)>>,
    deleted: Mutex<Vec<(ChannelId, MessageId)>>,
    role_changes: Mutex<Vec<RoleChange>>,
    activity: Mutex<Option<String>>,
    users: Mutex<HashMap<UserId, UserInfo>>,
    guilds: Mutex<HashMap<GuildId, GuildInfo>>,
    members: Mutex<Vec<MemberInfo>>,
    channels: Mutex<Vec<ChannelInfo>>,
    roles: Mutex<Vec<(GuildId, RoleInfo)>>,
    permissions: Mutex<HashMap<(ChannelId, UserId), Permissions>>,
    history: Mutex<HashMap<ChannelId, Vec<MessageInfo>>>,
    deny_deletes: Mutex<bool>,
    deny_roles: Mutex<bool>,
}

impl Default for RecordingChat {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingChat {
    pub fn new() -> Self {
        Self {
            me: UserInfo {
                bot: true,
                ..test_user(BOT_ID, "TestBot")
            },
            sent: Mutex::default(),
            dms: Mutex::default(),
            deleted: Mutex::default(),
            role_changes: Mutex::default(),
            activity: Mutex::default(),
            users: Mutex::default(),
            guilds: Mutex::default(),
            members: Mutex::default(),
            channels: Mutex::new(vec![text_channel(CHANNEL, GUILD, "general")]),
            roles: Mutex::default(),
            permissions: Mutex::default(),
            history: Mutex::default(),
            deny_deletes: Mutex::new(false),
            deny_roles: Mutex::new(false),
        }
    }

    pub fn add_user(&self, user: UserInfo) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn add_guild(&self, guild: GuildInfo) {
        self.guilds.lock().unwrap().insert(guild.id, guild);
    }

    /// Adds a member, and the member's user.
    pub fn add_member(&self, member: MemberInfo) {
        self.add_user(member.user.clone());
        self.members.lock().unwrap().push(member);
    }

    pub fn add_channel(&self, channel: ChannelInfo) {
        self.channels.lock().unwrap().push(channel);
    }

    pub fn add_role(&self, guild: GuildId, role: RoleInfo) {
        self.roles.lock().unwrap().push((guild, role));
    }

    pub fn set_permissions(&self, channel: ChannelId, user: UserId, permissions: Permissions) {
        self.permissions.lock().unwrap().insert((channel, user), permissions);
    }

    /// Adds a message to a channel's history. Add oldest first.
    pub fn add_history(&self, message: MessageInfo) {
        self.history
            .lock()
            .unwrap()
            .entry(message.channel_id)
            .or_default()
            .insert(0, message);
    }

    pub fn deny_deletes(&self) {
        *self.deny_deletes.lock().unwrap() = true;
    }

    pub fn deny_roles(&self) {
        *self.deny_roles.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// Text content of every message sent to a channel.
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, m)| m.content.clone())
            .collect()
    }

    pub fn sent_to(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn dms(&self) -> Vec<(UserId, OutgoingMessage)> {
        self.dms.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(ChannelId, MessageId)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn role_changes(&self) -> Vec<RoleChange> {
        self.role_changes.lock().unwrap().clone()
    }

    pub fn activity(&self) -> Option<String> {
        self.activity.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for RecordingChat {
    fn current_user(&self) -> UserInfo {
        self.me.clone()
    }

    async fn send(&self, channel: ChannelId, message: OutgoingMessage) -> Result<MessageId, ChatError> {
        self.sent.lock().unwrap().push((channel, message));
        Ok(next_id())
    }

    async fn send_dm(&self, user: UserId, message: OutgoingMessage) -> Result<MessageId, ChatError> {
        self.dms.lock().unwrap().push((user, message));
        Ok(next_id())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError> {
        if *self.deny_deletes.lock().unwrap() {
            return Err(ChatError::Forbidden);
        }
        self.deleted.lock().unwrap().push((channel, message));
        if let Some(history) = self.history.lock().unwrap().get_mut(&channel) {
            history.retain(|m| m.id != message);
        }
        Ok(())
    }

    async fn history(
        &self,
        channel: ChannelId,
        limit: usize,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageInfo>, ChatError> {
        let history = self.history.lock().unwrap();
        Ok(history
            .get(&channel)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| after.is_none_or(|after| m.created_at > after))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_listening(&self, activity: &str) {
        *self.activity.lock().unwrap() = Some(activity.to_string());
    }

    async fn user(&self, user: UserId) -> Option<UserInfo> {
        self.users.lock().unwrap().get(&user).cloned()
    }

    async fn guild(&self, guild: GuildId) -> Option<GuildInfo> {
        self.guilds.lock().unwrap().get(&guild).cloned()
    }

    async fn member(&self, guild: GuildId, user: UserId) -> Option<MemberInfo> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.guild_id == guild && m.id() == user)
            .cloned()
    }

    async fn guild_members(&self, guild: GuildId) -> Vec<MemberInfo> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.guild_id == guild)
            .cloned()
            .collect()
    }

    async fn guild_channels(&self, guild: GuildId) -> Vec<ChannelInfo> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.guild_id == Some(guild))
            .cloned()
            .collect()
    }

    async fn guild_roles(&self, guild: GuildId) -> Vec<RoleInfo> {
        self.roles
            .lock()
            .unwrap()
            .iter()
            .filter(|(g, _)| *g == guild)
            .map(|(_, r)| r.clone())
            .collect()
    }

    async fn channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        self.channels.lock().unwrap().iter().find(|c| c.id == channel).cloned()
    }

    async fn permissions_in(&self, guild: Option<GuildId>, channel: ChannelId, user: UserId) -> Permissions {
        if guild.is_none() {
            return Permissions::direct_message();
        }
        self.permissions
            .lock()
            .unwrap()
            .get(&(channel, user))
            .copied()
            .unwrap_or_default()
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError> {
        if *self.deny_roles.lock().unwrap() {
            return Err(ChatError::Forbidden);
        }
        self.role_changes.lock().unwrap().push(RoleChange::Added(guild, user, role));
        Ok(())
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError> {
        if *self.deny_roles.lock().unwrap() {
            return Err(ChatError::Forbidden);
        }
        self.role_changes.lock().unwrap().push(RoleChange::Removed(guild, user, role));
        Ok(())
    }
}
