//! # Help System
//!
//! Help entries for commands, about pages for modules, and the rendering of the
//! categorised command list.

use chrono::Utc;
use std::collections::BTreeMap;

use crate::application::commands::Command;
use crate::application::text::{MESSAGE_LIMIT, escape_mentions, split_long_messages, title_case, truncate_description};
use crate::domain::types::{Embed, UserInfo};

/// Spaces Discord does not collapse, used in place of tabs.
const TAB: &str = "\u{202f}\u{202f}\u{202f}\u{202f}\u{202f}";

/// Restrictions listed on a help page beyond what the command's checks already say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    pub perms: Vec<String>,
    pub roles: Vec<String>,
    pub other: Option<String>,
}

impl Restrictions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn perms(perms: &[&str]) -> Self {
        Self {
            perms: perms.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpInfo {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub category: String,
    pub examples: Vec<String>,
    pub restrictions: Restrictions,
    pub owner_only: bool,
    pub guild_only: bool,
    pub dm_only: bool,
}

impl HelpInfo {
    pub fn new(command: &Command, category: &str, restrictions: Restrictions, examples: &[&str]) -> Self {
        let description = if command.description.is_empty() {
            "No description found.".to_string()
        } else {
            command.description.replace('\n', " ")
        };
        let mut aliases = command.aliases.clone();
        aliases.push(command.name.clone());
        Self {
            name: command.qualified_name(),
            description,
            aliases,
            category: category.to_string(),
            examples: examples.iter().map(|e| e.to_string()).collect(),
            restrictions,
            owner_only: command.checks.owner_only,
            guild_only: command.checks.guild_only,
            dm_only: command.checks.dm_only,
        }
    }

    fn restrictions_text(&self) -> String {
        let mut text = String::new();
        if self.owner_only {
            text.push_str("Bot Owner Only: Yes\n");
        }
        if self.dm_only {
            text.push_str("DM Only: Yes\n");
        } else if self.guild_only {
            text.push_str("Server Only: Yes");
        } else {
            text.push_str("Server Only: No");
        }
        if !self.restrictions.perms.is_empty() {
            text.push_str("\nPermissions:\n");
            let perms: Vec<String> = self.restrictions.perms.iter().map(|p| format!("   {p}")).collect();
            text.push_str(&perms.join("\n"));
        }
        if !self.restrictions.roles.is_empty() {
            text.push_str("\nAny role of:\n");
            let roles: Vec<String> = self.restrictions.roles.iter().map(|r| format!("   {r}")).collect();
            text.push_str(&roles.join("\n"));
        }
        if let Some(other) = &self.restrictions.other {
            text.push('\n');
            text.push_str(other);
        }
        text
    }

    pub fn embed(&self, prefix: &str, requester: &UserInfo) -> Embed {
        let description = format!("Category: {}\n\n{}", title_case(&self.category), self.description);
        let mut aliases = self.aliases.clone();
        aliases.sort();
        let examples: Vec<String> = self
            .examples
            .iter()
            .map(|example| {
                if example.is_empty() {
                    format!("`{prefix}{}`", self.name)
                } else {
                    format!("`{prefix}{} {example}`", self.name)
                }
            })
            .collect();
        let examples = if examples.is_empty() {
            "No examples found.".to_string()
        } else {
            examples.join("\n")
        };

        Embed::new()
            .description(truncate_description(&description))
            .timestamp(Utc::now())
            .author(format!("{} Command", title_case(&self.name)), None)
            .field("Aliases", format!("```\n{}```", aliases.join("\n")), true)
            .field("Restrictions", format!("```{}```", self.restrictions_text()), true)
            .field("Examples", examples, false)
            .footer(requester.display_name.clone(), requester.avatar_url.clone())
    }
}

/// About page of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub author: String,
    pub usage: Option<String>,
    pub description: String,
    pub credits: Option<String>,
    pub image: Option<String>,
}

impl ModuleInfo {
    pub fn new(name: &str, author: &str, usage: Option<String>, description: Option<&str>) -> Self {
        let description = match description {
            Some(d) => collapse_lines(d),
            None => "No module description found.".to_string(),
        };
        Self {
            name: name.to_string(),
            author: author.replace('\t', TAB),
            usage,
            description,
            credits: None,
            image: None,
        }
    }

    pub fn credits(mut self, credits: Option<&str>) -> Self {
        self.credits = credits.map(|c| c.replace('\t', TAB));
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn about_embed(&self, prefix: &str, requester: &UserInfo) -> Embed {
        let description = self.description.replace("_prefix_", prefix);
        let embed = Embed::new()
            .description(truncate_description(&description))
            .timestamp(Utc::now())
            .author(self.name.clone(), None)
            .footer(requester.display_name.clone(), requester.avatar_url.clone())
            .thumbnail(self.image.clone());
        match &self.credits {
            None => embed.field("Authored By", self.author.clone(), true),
            Some(credits) => embed
                .field("Authored By", self.author.clone(), true)
                .field("Additional Credits", credits.clone(), true),
        }
    }
}

/// Joins wrapped description lines into one paragraph.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the categorised command list.
///
/// `categories` maps a lower-cased category to the entries shown in it. An entry is the
/// quoted command name, suffixed with `¹` when it can only be used in DMs.
pub fn command_list(
    categories: &BTreeMap<String, Vec<String>>,
    has_dm_only: bool,
    requester_mention: &str,
    prefix: &str,
) -> Vec<String> {
    let mut text = format!("__**Help Info {requester_mention}:**__\n\n");
    for (category, entries) in categories {
        let mut entries = entries.clone();
        entries.sort();
        let mut category_text = format!("**{}**\n{}\n\n", title_case(category), entries.join(", "));
        if category_text.chars().count() > MESSAGE_LIMIT {
            category_text = split_long_messages(&category_text, MESSAGE_LIMIT, " ").join("\n");
        }
        text.push_str(&escape_mentions(&category_text));
    }
    if has_dm_only {
        text.push_str("¹ = In DMs only.\n");
    }
    text.push_str(&format!("Use `{prefix}help <COMMAND>` for more info on individual commands."));
    split_long_messages(&text, MESSAGE_LIMIT, "\n")
}

/// Entry text of a command in the command list.
pub fn list_entry(command: &Command, dm_only: bool) -> String {
    if dm_only {
        format!("`{}`¹", command.qualified_name())
    } else {
        format!("`{}`", command.qualified_name())
    }
}
