//! Routing helpers for the sharding coordinator (§4.F).

use crate::model::id::{GuildMarker, Id};

/// `shard_id = (guild_id >> 22) % shard_count`, Discord's standard sharding
/// formula. Guild snowflakes embed enough entropy in their high bits that
/// this distributes guilds evenly across shards.
pub fn shard_id_for_guild(guild_id: Id<GuildMarker>, shard_count: u32) -> u32 {
    ((guild_id.get() >> 22) % shard_count as u64) as u32
}

/// A gateway command to route to one or more shards.
#[derive(Debug, Clone)]
pub enum ShardCommand {
    /// Routed to the shard owning this guild.
    Guild {
        guild_id: Id<GuildMarker>,
        payload: serde_json::Value,
    },
    /// Fanned out to every shard (e.g. a presence update).
    Broadcast(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_zero_routes_to_shard_zero() {
        assert_eq!(shard_id_for_guild(Id::new(1), 4), 0);
    }

    #[test]
    fn routing_stays_within_shard_count() {
        for raw in [1u64, 123456789, 987654321000, u64::MAX >> 1] {
            let shard = shard_id_for_guild(Id::new(raw), 16);
            assert!(shard < 16);
        }
    }

    #[test]
    fn routing_is_deterministic() {
        let guild = Id::new(111111111111111111);
        assert_eq!(shard_id_for_guild(guild, 8), shard_id_for_guild(guild, 8));
    }
}
