//! # Argument Converters
//!
//! Resolve command arguments to guild members, channels and roles. Each accepts a
//! mention, a raw id or a name, tried in that order.

use std::sync::LazyLock;

use regex::Regex;

use crate::application::commands::CommandError;
use crate::domain::traits::ChatProvider;
use crate::domain::types::{ChannelInfo, ChannelKind, GuildId, MemberInfo, RoleInfo};

static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{15,20})$").unwrap());
static USER_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@!?([0-9]{15,20})>$").unwrap());
static CHANNEL_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<#([0-9]{15,20})>$").unwrap());
static ROLE_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<@&([0-9]{15,20})>$").unwrap());

/// Id from a mention matched by `mention`, or from a bare id.
fn parse_id(argument: &str, mention: &Regex) -> Option<u64> {
    mention
        .captures(argument)
        .or_else(|| ID_RE.captures(argument))
        .and_then(|c| c[1].parse().ok())
}

/// Finds a member by mention, id, `name#discriminator`, username or nickname.
pub async fn member(chat: &dyn ChatProvider, guild: GuildId, argument: &str) -> Result<MemberInfo, CommandError> {
    let not_found = || CommandError::bad_argument(format!("Member \"{argument}\" not found."));
    if let Some(id) = parse_id(argument, &USER_MENTION_RE) {
        return chat.member(guild, id).await.ok_or_else(not_found);
    }
    let members = chat.guild_members(guild).await;
    if argument.len() > 5
        && let Some((_, discriminator)) = argument.rsplit_once('#')
        && discriminator.len() == 4
        && discriminator.chars().all(|c| c.is_ascii_digit())
        && let Some(found) = members.iter().find(|m| m.user.tag() == argument)
    {
        return Ok(found.clone());
    }
    members
        .iter()
        .find(|m| m.user.name == argument)
        .or_else(|| members.iter().find(|m| m.nick.as_deref() == Some(argument)))
        .cloned()
        .ok_or_else(not_found)
}

/// Id of a channel mention or bare id, without checking which guild it belongs to.
pub fn channel_id(argument: &str) -> Option<u64> {
    parse_id(argument, &CHANNEL_MENTION_RE)
}

/// Finds a text channel of `guild` by mention, id or name.
pub async fn text_channel(
    chat: &dyn ChatProvider,
    guild: GuildId,
    argument: &str,
) -> Result<ChannelInfo, CommandError> {
    let not_found = || CommandError::bad_argument(format!("Channel \"{argument}\" not found."));
    let channels = chat.guild_channels(guild).await;
    let found = match parse_id(argument, &CHANNEL_MENTION_RE) {
        Some(id) => channels.into_iter().find(|c| c.id == id),
        None => channels.into_iter().find(|c| c.name == argument),
    };
    found.filter(|c| c.kind == ChannelKind::Text).ok_or_else(not_found)
}

/// Finds a role of `guild` by mention, id or name.
pub async fn role(chat: &dyn ChatProvider, guild: GuildId, argument: &str) -> Result<RoleInfo, CommandError> {
    let roles = chat.guild_roles(guild).await;
    let found = match parse_id(argument, &ROLE_MENTION_RE) {
        Some(id) => roles.into_iter().find(|r| r.id == id),
        None => roles.into_iter().find(|r| r.name == argument),
    };
    found.ok_or_else(|| CommandError::bad_argument(format!("Role \"{argument}\" not found.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CHANNEL, GUILD, RecordingChat, test_member, test_user, text_channel as channel};

    const TRAVUS: u64 = 118954681241174016;

    fn chat() -> RecordingChat {
        let chat = RecordingChat::new();
        let mut travus = test_user(TRAVUS, "Travus");
        travus.discriminator = Some(8888);
        let mut member = test_member(GUILD, travus, 5);
        member.nick = Some("Trav".to_string());
        chat.add_member(member);
        chat.add_channel(channel(300000000000000001, GUILD, "penguin_pen"));
        chat.add_role(
            GUILD,
            RoleInfo {
                id: 400000000000000001,
                name: "Muted".to_string(),
                position: 1,
            },
        );
        chat
    }

    #[tokio::test]
    async fn test_member_lookups() {
        let chat = chat();
        for argument in ["<@118954681241174016>", "<@!118954681241174016>", "118954681241174016", "Travus#8888"] {
            assert_eq!(member(&chat, GUILD, argument).await.unwrap().id(), TRAVUS, "{argument}");
        }
        assert_eq!(member(&chat, GUILD, "Travus").await.unwrap().id(), TRAVUS);
        assert_eq!(member(&chat, GUILD, "Trav").await.unwrap().id(), TRAVUS);
        let err = member(&chat, GUILD, "Nobody").await.unwrap_err();
        assert_eq!(err.to_string(), "Member \"Nobody\" not found.");
        assert!(err.is_user_input());
    }

    #[tokio::test]
    async fn test_channel_and_role_lookups() {
        let chat = chat();
        assert_eq!(text_channel(&chat, GUILD, "penguin_pen").await.unwrap().id, 300000000000000001);
        assert_eq!(
            text_channel(&chat, GUILD, "<#300000000000000001>").await.unwrap().name,
            "penguin_pen"
        );
        assert_eq!(text_channel(&chat, GUILD, "general").await.unwrap().id, CHANNEL);
        assert!(text_channel(&chat, GUILD, "nowhere").await.is_err());

        assert_eq!(role(&chat, GUILD, "Muted").await.unwrap().id, 400000000000000001);
        assert_eq!(role(&chat, GUILD, "<@&400000000000000001>").await.unwrap().name, "Muted");
        assert!(role(&chat, GUILD, "Admins").await.is_err());
    }
}
