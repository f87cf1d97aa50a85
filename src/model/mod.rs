//! A minimal, typed slice of the Discord object model.
//!
//! This is deliberately not a full REST/gateway object catalog — per the
//! crate's scope (see the top-level docs), model types are an external,
//! pluggable concern. What lives here is the subset the gateway state
//! machine must parse unconditionally (the envelope, `READY`) plus enough
//! of the REST surface to exercise the HTTP client core end to end.
//!
//! The typed-ID pattern (`Id<Marker>`) and the general shape of these types
//! follow the `twilight-model`-derived layer this crate grew from.

pub mod envelope;
pub mod guild;
pub mod id;
pub mod interaction;
pub mod message;
pub mod presence;
pub mod ready;
pub mod user;

pub use envelope::GatewayPayload;
pub use guild::{Channel, ChannelType, Guild, GuildMember};
pub use id::{
    ApplicationMarker, ChannelMarker, CommandMarker, GuildMarker, Id, InteractionMarker,
    MessageMarker, RoleMarker, UserMarker,
};
pub use interaction::{
    Interaction, InteractionCallbackData, InteractionCallbackType, InteractionResponse,
    InteractionType,
};
pub use message::{CreateMessage, Embed, Message, MessageReference};
pub use presence::{Activity, PresenceUpdate};
pub use ready::{ReadyApplication, ReadyEvent, UnavailableGuild};
pub use user::{PartialUser, User};
