//! User objects, as seen on `READY`, `MESSAGE_CREATE`, and `PRESENCE_UPDATE`.

use serde::{Deserialize, Serialize};

use super::id::{Id, UserMarker};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
    pub global_name: Option<String>,
}

impl User {
    /// CDN URL for the user's avatar, or `None` if they have none set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash)
        })
    }

    /// `Username#Discriminator`, or just `Username` under the new username system.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some("0") | None => self.username.clone(),
            Some(disc) => format!("{}#{}", self.username, disc),
        }
    }
}

/// Partial user, e.g. embedded in `PRESENCE_UPDATE`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PartialUser {
    pub id: Id<UserMarker>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(discriminator: Option<&str>) -> User {
        User {
            id: Id::new(789),
            username: "alice".into(),
            discriminator: discriminator.map(String::from),
            avatar: None,
            bot: false,
            global_name: None,
        }
    }

    #[test]
    fn tag_with_legacy_discriminator() {
        assert_eq!(user(Some("0001")).tag(), "alice#0001");
    }

    #[test]
    fn tag_on_new_username_system() {
        assert_eq!(user(Some("0")).tag(), "alice");
        assert_eq!(user(None).tag(), "alice");
    }

    #[test]
    fn avatar_url_absent_without_hash() {
        assert!(user(None).avatar_url().is_none());
    }

    #[test]
    fn avatar_url_present_with_hash() {
        let mut u = user(None);
        u.avatar = Some("1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d".into());
        let url = u.avatar_url().unwrap();
        assert!(url.contains("789"));
        assert!(url.starts_with("https://cdn.discordapp.com/avatars/"));
    }
}
