//! `PRESENCE_UPDATE` dispatch payload — deliberately slimmer than Discord's
//! full presence object; callers needing more fields should decode `t`/`d`
//! off the gateway event's raw payload themselves (see
//! [`crate::gateway::event::GatewayEvent::Unknown`]).

use serde::{Deserialize, Serialize};

use super::id::{GuildMarker, Id};
use super::user::PartialUser;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresenceUpdate {
    pub user: PartialUser,
    pub guild_id: Option<Id<GuildMarker>>,
    pub status: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub url: Option<String>,
    pub state: Option<String>,
    pub details: Option<String>,
}
