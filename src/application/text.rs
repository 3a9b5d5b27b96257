//! # Text Utilities
//!
//! Helpers for preparing text before it is posted: splitting long messages, resolving and
//! neutralising mentions, escaping markdown and suppressing link embeds.

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::traits::ChatProvider;
use crate::domain::types::GuildId;

/// Longest chunk the bot posts in one message. Discord's hard limit is 2000.
pub const MESSAGE_LIMIT: usize = 1950;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@!?(\d+)>|<#(\d+)>|<@&(\d+)>").unwrap());
static MASS_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(everyone|here|[!&]?[0-9]{17,20})").unwrap());
static MARKDOWN_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[^: >]+:/[^ >]+>|(?:https?|steam)://[^\s<]+[^<.,:;"'\]\s]"#).unwrap());
static EMBEDDABLE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\b|<)https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{2,256}\.[a-z]{2,6}\b([-a-zA-Z0-9@:%_+.~#?&\\/=]*)>?")
        .unwrap()
});

/// Current UTC time as `YYYY-MM-DD HH:MM`.
pub fn cur_time() -> String {
    minute_stamp(Utc::now())
}

pub fn minute_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Cuts descriptions that would not fit into an embed.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() < MESSAGE_LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MESSAGE_LIMIT - 1).collect();
        format!("{cut}...")
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Splits `text` at `delimiter` so that no part reaches `max_len` characters.
///
/// The delimiter stays attached to the end of each piece; it only marks where a split
/// is allowed. A single piece longer than `max_len` is kept whole.
pub fn split_long_messages(text: &str, max_len: usize, delimiter: &str) -> Vec<String> {
    let mut blocks: Vec<String> = text.split(delimiter).map(|b| format!("{b}{delimiter}")).collect();
    if let Some(last) = blocks.pop() {
        blocks.push(last.trim_end_matches(|c| delimiter.contains(c)).to_string());
    }

    let mut messages = Vec::new();
    let mut message = String::new();
    let mut message_len = 0;
    for block in blocks {
        let block_len = block.chars().count();
        if block_len + message_len < max_len {
            message.push_str(&block);
            message_len += block_len;
        } else {
            messages.push(std::mem::replace(&mut message, block));
            message_len = block_len;
        }
    }
    if !message.is_empty() {
        messages.push(message);
    }
    messages.retain(|m| !m.is_empty());
    messages
}

/// Wraps every link in `<>` so Discord does not generate a preview for it.
pub fn unembed_urls(text: &str) -> String {
    EMBEDDABLE_URL_RE
        .replace_all(text, |caps: &Captures| {
            let url = caps[0].trim_start_matches('<').trim_end_matches('>');
            format!("<{url}>")
        })
        .into_owned()
}

/// Backslash-escapes markdown control characters, leaving links untouched.
pub fn escape_markdown(text: &str) -> String {
    let urls: Vec<(usize, usize)> = MARKDOWN_URL_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut out = String::with_capacity(text.len() + 8);
    let mut previous: Option<char> = None;
    for (i, c) in text.char_indices() {
        let in_url = urls.iter().any(|(start, end)| i >= *start && i < *end);
        if !in_url {
            match c {
                '\\' | '*' | '_' | '~' | '|' | '`' => out.push('\\'),
                '>' if previous.is_none_or(|p| p == '\n') => out.push('\\'),
                _ => {}
            }
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// Breaks `@everyone`, `@here` and raw id mentions with a zero-width space.
pub fn escape_mentions(text: &str) -> String {
    MASS_MENTION_RE.replace_all(text, "@\u{200b}${1}").into_owned()
}

/// Ids found in user, channel and role mentions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MentionIds {
    pub users: Vec<u64>,
    pub channels: Vec<u64>,
    pub roles: Vec<u64>,
}

pub fn mention_ids(text: &str) -> MentionIds {
    let mut ids = MentionIds::default();
    for caps in MENTION_RE.captures_iter(text) {
        let parsed = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
        if let Some(id) = parsed(1) {
            ids.users.push(id);
        } else if let Some(id) = parsed(2) {
            ids.channels.push(id);
        } else if let Some(id) = parsed(3) {
            ids.roles.push(id);
        }
    }
    ids
}

/// Names to substitute for mentions. Channel and role mentions are only resolved in guilds.
#[derive(Debug, Default)]
pub struct MentionNames {
    pub users: HashMap<u64, String>,
    pub channels: HashMap<u64, String>,
    pub roles: HashMap<u64, String>,
    pub in_guild: bool,
}

/// Replaces mentions with plain names, optionally escapes markdown, and defuses mass mentions.
pub fn clean_with(text: &str, names: &MentionNames, escape: bool) -> String {
    let resolved = MENTION_RE.replace_all(text, |caps: &Captures| {
        let id = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
        if caps.get(1).is_some() {
            return match id(1).and_then(|id| names.users.get(&id)) {
                Some(name) => format!("@{name}"),
                None => "@deleted-user".to_string(),
            };
        }
        if !names.in_guild {
            return caps[0].to_string();
        }
        if caps.get(2).is_some() {
            return match id(2).and_then(|id| names.channels.get(&id)) {
                Some(name) => format!("#{name}"),
                None => "#deleted-channel".to_string(),
            };
        }
        match id(3).and_then(|id| names.roles.get(&id)) {
            Some(name) => format!("@{name}"),
            None => "@deleted-role".to_string(),
        }
    });
    let text = if escape {
        escape_markdown(&resolved)
    } else {
        resolved.into_owned()
    };
    escape_mentions(&text)
}

/// Looks up the names behind every mention in `text` and cleans it.
pub async fn clean(chat: &dyn ChatProvider, guild: Option<GuildId>, text: &str, escape: bool) -> String {
    let ids = mention_ids(text);
    let mut names = MentionNames {
        in_guild: guild.is_some(),
        ..Default::default()
    };
    for id in ids.users {
        if let Some(user) = chat.user(id).await {
            names.users.insert(id, user.name);
        }
    }
    if let Some(guild) = guild {
        if !ids.channels.is_empty() {
            for channel in chat.guild_channels(guild).await {
                names.channels.insert(channel.id, channel.name);
            }
        }
        if !ids.roles.is_empty() {
            for role in chat.guild_roles(guild).await {
                names.roles.insert(role.id, role.name);
            }
        }
    }
    clean_with(text, &names, escape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_short_text_whole() {
        assert_eq!(split_long_messages("hello world", 1950, " "), vec!["hello world"]);
        assert!(split_long_messages("", 1950, " ").is_empty());
    }

    #[test]
    fn test_split_on_delimiter() {
        let parts = split_long_messages("aaaa bbbb cccc", 10, " ");
        assert_eq!(parts, vec!["aaaa ", "bbbb ", "cccc"]);

        let lines = split_long_messages("one\ntwo\nthree\n\n", 9, "\n");
        assert_eq!(lines, vec!["one\ntwo\n", "three"]);
    }

    #[test]
    fn test_split_never_exceeds_limit_for_small_blocks() {
        let text = "word ".repeat(1000);
        for part in split_long_messages(&text, 1950, " ") {
            assert!(part.chars().count() < 1950);
        }
    }

    #[test]
    fn test_clean_resolves_user_mentions() {
        let mut names = MentionNames::default();
        names.users.insert(118954681241174016, "Travus".to_string());
        let cleaned = clean_with("hi <@118954681241174016> and <@!2>", &names, false);
        assert_eq!(cleaned, "hi @Travus and @deleted-user");
    }

    #[test]
    fn test_clean_resolves_guild_mentions_only_in_guilds() {
        let mut names = MentionNames {
            in_guild: true,
            ..Default::default()
        };
        names.channels.insert(5, "general".to_string());
        names.roles.insert(7, "Mods".to_string());
        assert_eq!(clean_with("<#5> <@&7> <#6>", &names, false), "#general @Mods #deleted-channel");

        names.in_guild = false;
        assert_eq!(clean_with("<#5>", &names, false), "<#5>");
    }

    #[test]
    fn test_clean_defuses_mass_mentions() {
        let names = MentionNames::default();
        let cleaned = clean_with("@everyone look @here", &names, false);
        assert_eq!(cleaned, "@\u{200b}everyone look @\u{200b}here");
    }

    #[test]
    fn test_escape_markdown_skips_links() {
        assert_eq!(escape_markdown("**bold** _x_"), "\\*\\*bold\\*\\* \\_x\\_");
        assert_eq!(escape_markdown("see https://a.com/x_y"), "see https://a.com/x_y");
        assert_eq!(escape_markdown("> quote"), "\\> quote");
        assert_eq!(escape_markdown("a > b"), "a > b");
    }

    #[test]
    fn test_unembed_urls() {
        assert_eq!(
            unembed_urls("see https://example.com/path?q=1 now"),
            "see <https://example.com/path?q=1> now"
        );
        assert_eq!(unembed_urls("<https://example.com>"), "<https://example.com>");
        assert_eq!(unembed_urls("no links here"), "no links here");
    }

    #[test]
    fn test_title_case_and_truncate() {
        assert_eq!(title_case("no category"), "No Category");
        assert_eq!(title_case("MODULE load"), "Module Load");
        let long = "x".repeat(2000);
        let cut = truncate_description(&long);
        assert_eq!(cut.chars().count(), 1952);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_description("short"), "short");
    }
}
