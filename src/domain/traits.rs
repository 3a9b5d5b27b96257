//! # Domain Traits
//!
//! Abstract interfaces for the two outside systems the bot talks to: the chat
//! platform and the database. Implementations live in the Infrastructure layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::types::{
    ChannelId, ChannelInfo, GuildId, GuildInfo, MemberInfo, MessageId, MessageInfo, MuteRecord, OutgoingMessage,
    Permissions, Reminder, RoleId, RoleInfo, UserId, UserInfo,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("missing permissions")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("request failed: {0}")]
    Http(String),
}

/// Abstract interface for the chat platform (Discord in production).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The bot's own account.
    fn current_user(&self) -> UserInfo;

    /// Post a message in a channel, returning its id.
    async fn send(&self, channel: ChannelId, message: OutgoingMessage) -> Result<MessageId, ChatError>;

    /// Post a message in a user's DMs.
    async fn send_dm(&self, user: UserId, message: OutgoingMessage) -> Result<MessageId, ChatError>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError>;

    /// Newest-first history of a channel, at most `limit` messages, optionally stopping at `after`.
    async fn history(
        &self,
        channel: ChannelId,
        limit: usize,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<MessageInfo>, ChatError>;

    /// Show a "Listening to ..." status.
    async fn set_listening(&self, activity: &str);

    async fn user(&self, user: UserId) -> Option<UserInfo>;

    async fn guild(&self, guild: GuildId) -> Option<GuildInfo>;

    async fn member(&self, guild: GuildId, user: UserId) -> Option<MemberInfo>;

    async fn guild_members(&self, guild: GuildId) -> Vec<MemberInfo>;

    async fn guild_channels(&self, guild: GuildId) -> Vec<ChannelInfo>;

    async fn guild_roles(&self, guild: GuildId) -> Vec<RoleInfo>;

    async fn channel(&self, channel: ChannelId) -> Option<ChannelInfo>;

    /// Effective permissions of `user` in `channel`. Without a guild this is a DM channel.
    async fn permissions_in(&self, guild: Option<GuildId>, channel: ChannelId, user: UserId) -> Permissions;

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError>;

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), ChatError>;
}

/// Abstract interface for persistent bot data.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create tables if they do not exist yet.
    async fn init(&self) -> Result<()>;

    async fn setting(&self, key: &str) -> Result<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    async fn default_modules(&self) -> Result<Vec<String>>;

    /// Returns `false` when the module already was a default module.
    async fn add_default_module(&self, module: &str) -> Result<bool>;

    /// Returns `false` when the module was not a default module.
    async fn remove_default_module(&self, module: &str) -> Result<bool>;

    async fn command_state(&self, command: &str) -> Result<Option<i16>>;

    async fn set_command_state(&self, command: &str, state: i16) -> Result<()>;

    async fn config_entries(&self) -> Result<Vec<(String, String)>>;

    async fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// Returns `false` when the key was not set.
    async fn remove_config(&self, key: &str) -> Result<bool>;

    async fn mutes(&self) -> Result<Vec<MuteRecord>>;

    /// Insert or overwrite the mute for the record's guild and user.
    async fn save_mute(&self, mute: &MuteRecord) -> Result<()>;

    async fn delete_mute(&self, guild: GuildId, user: UserId) -> Result<()>;

    async fn reminders(&self) -> Result<Vec<Reminder>>;

    /// Stores a reminder and returns its id. The `id` field of the argument is ignored.
    async fn add_reminder(&self, reminder: &Reminder) -> Result<i64>;

    async fn delete_reminder(&self, id: i64) -> Result<()>;
}
