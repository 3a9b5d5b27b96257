//! # Command Context
//!
//! Everything a command body needs about its invocation.

use std::sync::Arc;

use crate::application::args::Args;
use crate::application::bot::Bot;
use crate::application::commands::{Command, CommandError};
use crate::application::text;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{ChannelId, GuildId, MemberInfo, MessageId, MessageInfo, OutgoingMessage, UserInfo};

pub struct CommandContext {
    pub bot: Arc<Bot>,
    pub chat: Arc<dyn ChatProvider>,
    pub message: MessageInfo,
    pub command: Command,
    /// The name or alias the command was invoked with.
    pub invoked_with: String,
    /// Raw text following the command name.
    pub arguments: String,
}

impl CommandContext {
    pub fn author(&self) -> &UserInfo {
        &self.message.author
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }

    pub fn args(&self) -> Args<'_> {
        Args::new(&self.arguments)
    }

    /// Reply in the channel the command was used in.
    pub async fn send(&self, message: impl Into<OutgoingMessage> + Send) -> Result<MessageId, CommandError> {
        Ok(self.chat.send(self.channel_id(), message.into()).await?)
    }

    /// Resolves mentions and escapes markdown, for echoing user input back.
    pub async fn clean(&self, text: &str) -> String {
        text::clean(self.chat.as_ref(), self.guild_id(), text, true).await
    }

    pub async fn author_member(&self) -> Option<MemberInfo> {
        let guild = self.guild_id()?;
        self.chat.member(guild, self.author().id).await
    }

    /// Prefix to show in replies.
    pub async fn prefix(&self) -> String {
        self.bot.display_prefix().await
    }
}
