//! Guild and channel objects — trimmed to the fields the gateway dispatch
//! parser and the sample HTTP endpoints (§6) need. The full guild/channel
//! object catalog is an external model-layer concern (§1).

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::id::{ChannelMarker, GuildMarker, Id, UserMarker};
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize_repr, Serialize_repr)]
#[repr(u8)]
pub enum ChannelType {
    GuildText = 0,
    Dm = 1,
    GuildVoice = 2,
    GroupDm = 3,
    GuildCategory = 4,
    GuildAnnouncement = 5,
    AnnouncementThread = 10,
    PublicThread = 11,
    PrivateThread = 12,
    GuildStageVoice = 13,
    GuildDirectory = 14,
    GuildForum = 15,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Channel {
    pub id: Id<ChannelMarker>,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub guild_id: Option<Id<GuildMarker>>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: Option<i32>,
    pub parent_id: Option<Id<ChannelMarker>>,
    #[serde(default)]
    pub nsfw: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Guild {
    pub id: Id<GuildMarker>,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Option<Id<UserMarker>>,
    pub approximate_member_count: Option<u64>,
    pub approximate_presence_count: Option<u64>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub members: Vec<GuildMember>,
}

impl Guild {
    /// Unix-millisecond timestamp derived from the guild snowflake.
    pub fn created_at_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuildMember {
    pub user: Option<User>,
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Id<super::id::RoleMarker>>,
    pub joined_at: Option<String>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_at_ms_matches_known_snowflake() {
        let guild = Guild {
            id: Id::new(175928847299117063),
            name: "test".into(),
            icon: None,
            owner_id: None,
            approximate_member_count: None,
            approximate_presence_count: None,
            channels: Vec::new(),
            members: Vec::new(),
        };
        assert_eq!(
            guild.created_at_ms(),
            (175928847299117063u64 >> 22) + 1_420_070_400_000
        );
    }
}
