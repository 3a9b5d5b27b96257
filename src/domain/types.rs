//! # Domain Types
//!
//! Plain snapshots of the Discord objects the bot works with. The adapter in
//! `infrastructure::discord` converts library types into these so the rest of the
//! bot never touches the client library directly.

use chrono::{DateTime, Utc};

pub type UserId = u64;
pub type GuildId = u64;
pub type ChannelId = u64;
pub type RoleId = u64;
pub type MessageId = u64;

/// Embed colour used by every embed the bot sends.
pub const EMBED_COLOUR: u32 = 0x4a4a4a;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub discriminator: Option<u16>,
    pub display_name: String,
    pub bot: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// `name#1234` for legacy accounts, plain `name` otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator {
            Some(d) => format!("{}#{:04}", self.name, d),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user: UserInfo,
    pub guild_id: GuildId,
    pub nick: Option<String>,
    pub roles: Vec<RoleId>,
    pub top_role_position: u16,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl MemberInfo {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn mention(&self) -> String {
        self.user.mention()
    }

    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
    pub position: u16,
}

impl RoleInfo {
    pub fn mention(&self) -> String {
        if self.name == "@everyone" {
            self.name.clone()
        } else {
            format!("<@&{}>", self.id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Private,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelInfo {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub premium_tier: u8,
    pub premium_subscription_count: u64,
    pub text_channels: usize,
    pub voice_channels: usize,
    pub role_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: UserInfo,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub attachments: Vec<String>,
}

impl MessageInfo {
    pub fn jump_url(&self) -> String {
        let guild = self
            .guild_id
            .map(|g| g.to_string())
            .unwrap_or_else(|| "@me".to_string());
        format!("https://discord.com/channels/{}/{}/{}", guild, self.channel_id, self.id)
    }
}

/// The channel permissions the bot's checks care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Administrator,
    ManageGuild,
    ManageMessages,
    ManageRoles,
    SendMessages,
    ReadMessageHistory,
}

impl Permission {
    fn bit(self) -> u32 {
        match self {
            Permission::Administrator => 1,
            Permission::ManageGuild => 1 << 1,
            Permission::ManageMessages => 1 << 2,
            Permission::ManageRoles => 1 << 3,
            Permission::SendMessages => 1 << 4,
            Permission::ReadMessageHistory => 1 << 5,
        }
    }

    /// Name as shown in the Discord client.
    pub fn label(self) -> &'static str {
        match self {
            Permission::Administrator => "Administrator",
            Permission::ManageGuild => "Manage Server",
            Permission::ManageMessages => "Manage Messages",
            Permission::ManageRoles => "Manage Roles",
            Permission::SendMessages => "Send Messages",
            Permission::ReadMessageHistory => "Read Message History",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions(u32);

impl Permissions {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self(Permission::Administrator.bit())
    }

    /// What anyone has inside a DM channel.
    pub fn direct_message() -> Self {
        Self::empty()
            .with(Permission::SendMessages)
            .with(Permission::ReadMessageHistory)
    }

    pub fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    /// Administrator implies every other permission.
    pub fn contains(self, permission: Permission) -> bool {
        self.0 & Permission::Administrator.bit() != 0 || self.0 & permission.bit() != 0
    }

    pub fn missing(self, required: &[Permission]) -> Vec<Permission> {
        required.iter().copied().filter(|p| !self.contains(*p)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub colour: u32,
    pub author: Option<EmbedAuthor>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<EmbedFooter>,
    pub thumbnail: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for Embed {
    fn default() -> Self {
        Self {
            colour: EMBED_COLOUR,
            author: None,
            description: None,
            fields: Vec::new(),
            footer: None,
            thumbnail: None,
            timestamp: None,
        }
    }
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            icon_url,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Anything the bot can post: text, an embed, a file, or a mix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub file: Option<Attachment>,
}

impl OutgoingMessage {
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

impl From<&str> for OutgoingMessage {
    fn from(value: &str) -> Self {
        Self {
            content: Some(value.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for OutgoingMessage {
    fn from(value: String) -> Self {
        Self {
            content: Some(value),
            ..Default::default()
        }
    }
}

impl From<Embed> for OutgoingMessage {
    fn from(value: Embed) -> Self {
        Self {
            embed: Some(value),
            ..Default::default()
        }
    }
}

/// A persisted mute. `until == None` means the mute never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteRecord {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub until: Option<DateTime<Utc>>,
}

/// A persisted reminder. Reminders set in DMs carry no guild or channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    pub until: DateTime<Utc>,
    pub message: String,
}
