//! The `READY` dispatch payload (§4.E "Ready dispatch").

use serde::{Deserialize, Serialize};

use super::id::{ApplicationMarker, Id};
use super::user::User;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyEvent {
    pub v: u8,
    pub user: User,
    pub session_id: String,
    pub resume_gateway_url: String,
    #[serde(default)]
    pub guilds: Vec<UnavailableGuild>,
    pub application: ReadyApplication,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyApplication {
    pub id: Id<ApplicationMarker>,
    pub flags: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UnavailableGuild {
    pub id: Id<super::id::GuildMarker>,
    #[serde(default)]
    pub unavailable: bool,
}
