use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::clock;
use crate::constants::ONLINE_THRESHOLD_MS;

/// Last-heartbeat state for a single player
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub last_seen_ms: i64,
    pub info: Value,
}

/// In-memory presence map, one record per player identity.
///
/// Owned by the server state and dropped with it; nothing here is persisted.
/// After a restart players repopulate the map within one heartbeat interval,
/// which is well inside the online threshold.
pub struct PresenceStore {
    players: DashMap<String, PlayerRecord>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
        }
    }

    /// Record a heartbeat at the current server time
    pub fn record(&self, player_id: &str, info: Value) {
        self.record_at(player_id, info, clock::now_ms());
    }

    /// Record a heartbeat with an explicit timestamp.
    ///
    /// Last-seen is monotonic per player: a heartbeat older than the stored
    /// one (a delayed retry) is discarded whole, so last_seen is always the
    /// maximum timestamp observed and info follows the winning heartbeat.
    /// The entry API gives per-key atomicity; heartbeats from distinct
    /// players never contend with each other.
    pub fn record_at(&self, player_id: &str, info: Value, timestamp_ms: i64) {
        match self.players.entry(player_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if timestamp_ms >= record.last_seen_ms {
                    record.last_seen_ms = timestamp_ms;
                    record.info = info;
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(PlayerRecord {
                    last_seen_ms: timestamp_ms,
                    info,
                });
            }
        }
    }

    /// Point-in-time copy of every known player
    pub fn snapshot(&self) -> Vec<(String, PlayerRecord)> {
        self.players
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PresenceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A player is online while its last heartbeat is younger than the threshold.
/// Pure derivation, recomputed on every read - never cached as a flag.
pub fn is_online(last_seen_ms: i64, threshold_ms: i64, now_ms: i64) -> bool {
    now_ms - last_seen_ms < threshold_ms
}

/// is_online with the default 30 second threshold
pub fn is_online_default(last_seen_ms: i64, now_ms: i64) -> bool {
    is_online(last_seen_ms, ONLINE_THRESHOLD_MS, now_ms)
}
