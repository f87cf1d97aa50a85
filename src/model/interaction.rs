//! Interactions (slash commands, components) — trimmed to what the sample
//! `interactions/*/callback` endpoint and gateway dispatch parsing need.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::guild::GuildMember;
use super::id::{ApplicationMarker, ChannelMarker, GuildMarker, Id, InteractionMarker};
use super::message::Message;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Interaction {
    pub id: Id<InteractionMarker>,
    pub application_id: Id<ApplicationMarker>,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub guild_id: Option<Id<GuildMarker>>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub member: Option<GuildMember>,
    pub user: Option<User>,
    pub token: String,
    pub message: Option<Message>,
}

impl Interaction {
    /// The user who triggered the interaction — nested inside `member` in a
    /// guild context, top-level in a DM.
    pub fn author(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: InteractionCallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr)]
#[repr(u8)]
pub enum InteractionCallbackType {
    Pong = 1,
    ChannelMessageWithSource = 4,
    DeferredChannelMessageWithSource = 5,
    DeferredUpdateMessage = 6,
    UpdateMessage = 7,
}

impl<'de> Deserialize<'de> for InteractionCallbackType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            6 => Ok(Self::DeferredUpdateMessage),
            7 => Ok(Self::UpdateMessage),
            other => Err(D::Error::custom(format!(
                "unknown interaction callback type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionCallbackData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_prefers_member_user_over_top_level() {
        let member_user = User {
            id: Id::new(1),
            username: "member".into(),
            discriminator: None,
            avatar: None,
            bot: false,
            global_name: None,
        };
        let interaction = Interaction {
            id: Id::new(1),
            application_id: Id::new(2),
            kind: InteractionType::ApplicationCommand,
            guild_id: None,
            channel_id: None,
            member: Some(GuildMember {
                user: Some(member_user.clone()),
                nick: None,
                roles: Vec::new(),
                joined_at: None,
                deaf: false,
                mute: false,
            }),
            user: None,
            token: "tok".into(),
            message: None,
        };
        assert_eq!(interaction.author().unwrap().id, member_user.id);
    }
}
