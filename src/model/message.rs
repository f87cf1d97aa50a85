//! Messages, embeds, and the outbound "create message" body. Trimmed to
//! what the sample HTTP endpoints in [`crate::http::endpoint`] need —
//! attachments/components/reactions beyond this are external model-layer
//! concerns (§1).

use serde::{Deserialize, Serialize};

use super::id::{ChannelMarker, GuildMarker, Id, MessageMarker};
use super::user::User;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub id: Id<MessageMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub author: User,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub mention_everyone: bool,
    #[serde(default)]
    pub mentions: Vec<User>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub message_reference: Option<MessageReference>,
}

impl Message {
    /// Unix-millisecond timestamp derived from the message snowflake.
    pub fn snowflake_timestamp_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }

    /// Whether a given user is mentioned in the message.
    pub fn mentions_user(&self, user_id: Id<super::id::UserMarker>) -> bool {
        self.mentions.iter().any(|u| u.id == user_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageReference {
    pub message_id: Option<Id<MessageMarker>>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub guild_id: Option<Id<GuildMarker>>,
    #[serde(default)]
    pub fail_if_not_exists: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Outbound body for `POST /channels/{channel.id}/messages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

impl CreateMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.content = Some(text.into());
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    pub fn reply_to(mut self, message_id: Id<MessageMarker>) -> Self {
        self.message_reference = Some(MessageReference {
            message_id: Some(message_id),
            channel_id: None,
            guild_id: None,
            fail_if_not_exists: false,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_builder_skips_absent_fields() {
        let embed = Embed::new().title("hi").color(0xff0000);
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["title"], "hi");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn create_message_reply_sets_reference() {
        let msg = CreateMessage::new()
            .content("pong")
            .reply_to(Id::new(42));
        assert_eq!(
            msg.message_reference.unwrap().message_id.unwrap().get(),
            42
        );
    }
}
