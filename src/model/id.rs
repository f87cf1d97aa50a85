//! Type-safe snowflake IDs with marker types.
//!
//! Discord transmits snowflakes as JSON strings so large `u64` values survive
//! round-tripping through JavaScript's `Number`. `Id<T>` wraps the integer
//! value and serializes/deserializes through that string form, while `T`
//! (one of the zero-sized markers below) keeps a channel ID from being
//! accidentally used where a guild ID is expected.

use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker for application IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct ApplicationMarker;

/// Marker for channel IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct ChannelMarker;

/// Marker for guild IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct GuildMarker;

/// Marker for message IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct MessageMarker;

/// Marker for user IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct UserMarker;

/// Marker for interaction IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct InteractionMarker;

/// Marker for application-command IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct CommandMarker;

/// Marker for role IDs.
#[derive(Debug)]
#[non_exhaustive]
pub struct RoleMarker;

/// A Discord snowflake, typed by what kind of resource it identifies.
///
/// `T` carries no data (it's one of the marker types above) — it only
/// exists so `Id<UserMarker>` and `Id<ChannelMarker>` are distinct types.
pub struct Id<T> {
    value: NonZeroU64,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Create an ID from a raw snowflake value.
    ///
    /// # Panics
    ///
    /// Panics if `value` is zero — Discord never issues a zero snowflake.
    /// Only call this with a value that's already known to be valid (e.g. a
    /// literal in code or test fixtures). Anything coming off the wire
    /// should go through [`Id::try_new`] instead.
    pub fn new(value: u64) -> Self {
        Self::try_new(value).expect("snowflake ids are never zero")
    }

    /// Create an ID from a raw snowflake value, returning `None` if it's
    /// zero rather than panicking. Used by [`Deserialize`] so a malformed
    /// `"id":"0"` in an inbound payload surfaces as a parse failure instead
    /// of taking down the task reading it.
    pub fn try_new(value: u64) -> Option<Self> {
        Some(Self {
            value: NonZeroU64::new(value)?,
            phantom: PhantomData,
        })
    }

    /// The raw integer value.
    pub fn get(&self) -> u64 {
        self.value.get()
    }

    /// Unix-millisecond timestamp embedded in the snowflake (Discord epoch).
    pub fn timestamp_ms(&self) -> u64 {
        (self.value.get() >> 22) + 1_420_070_400_000
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s.parse()?;
        Ok(Self::new(raw))
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for IdVisitor<T> {
            type Value = Id<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake ID (string or integer)")
            }

            fn visit_str<E: DeError>(self, v: &str) -> Result<Self::Value, E> {
                let raw: u64 = v.parse().map_err(|_| E::custom(format!("invalid snowflake: {v}")))?;
                Id::try_new(raw).ok_or_else(|| E::custom("snowflake ids are never zero"))
            }

            fn visit_u64<E: DeError>(self, v: u64) -> Result<Self::Value, E> {
                Id::try_new(v).ok_or_else(|| E::custom("snowflake ids are never zero"))
            }
        }

        deserializer.deserialize_any(IdVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_string() {
        let id: Id<UserMarker> = serde_json::from_str("\"175928847299117063\"").unwrap();
        assert_eq!(id.get(), 175928847299117063);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"175928847299117063\"");
    }

    #[test]
    fn accepts_bare_integers_too() {
        let id: Id<GuildMarker> = serde_json::from_str("12345").unwrap();
        assert_eq!(id.get(), 12345);
    }

    #[test]
    fn timestamp_extraction() {
        let id = Id::<MessageMarker>::new(175928847299117063);
        assert_eq!(id.timestamp_ms(), (175928847299117063u64 >> 22) + 1_420_070_400_000);
    }

    #[test]
    fn zero_id_is_rejected_not_panicked() {
        assert!(Id::<UserMarker>::try_new(0).is_none());
        let result: Result<Id<UserMarker>, _> = serde_json::from_str("\"0\"");
        assert!(result.is_err());
        let result: Result<Id<UserMarker>, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }

    #[test]
    fn distinct_marker_types_do_not_unify() {
        let user_id = Id::<UserMarker>::new(1);
        let guild_id = Id::<GuildMarker>::new(1);
        // Both print the same value; the type system is what keeps them apart,
        // which we can only demonstrate by formatting, not by comparing.
        assert_eq!(user_id.to_string(), guild_id.to_string());
    }
}
