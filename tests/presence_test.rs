//! # Presence Store Tests
//!
//! These tests verify heartbeat recording and the online/offline derivation:
//! monotonic last-seen under out-of-order arrival, the exact threshold
//! boundary, and write safety under concurrent heartbeats.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test presence_test
//! ```

use serde_json::json;
use std::sync::Arc;
use std::thread;

use signage_server::constants::ONLINE_THRESHOLD_MS;
use signage_server::presence::{is_online, is_online_default, PresenceStore};

#[test]
fn test_last_seen_is_monotonic_under_out_of_order_arrival() {
    let store = PresenceStore::new();

    // In-order arrival
    store.record_at("P1", json!({"userAgent": "a"}), 1_000);
    store.record_at("P1", json!({"userAgent": "b"}), 2_000);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].1.last_seen_ms, 2_000);
    assert_eq!(snapshot[0].1.info, json!({"userAgent": "b"}));

    // Delayed retry with an older timestamp must not regress the record
    store.record_at("P1", json!({"userAgent": "stale"}), 1_500);
    let snapshot = store.snapshot();
    assert_eq!(snapshot[0].1.last_seen_ms, 2_000);
    assert_eq!(
        snapshot[0].1.info,
        json!({"userAgent": "b"}),
        "stale heartbeat info must not overwrite the winner's"
    );
}

#[test]
fn test_equal_timestamp_heartbeat_wins_last_write() {
    let store = PresenceStore::new();

    store.record_at("P1", json!({"seq": 1}), 1_000);
    store.record_at("P1", json!({"seq": 2}), 1_000);

    let snapshot = store.snapshot();
    assert_eq!(snapshot[0].1.last_seen_ms, 1_000);
    assert_eq!(snapshot[0].1.info, json!({"seq": 2}));
}

#[test]
fn test_online_threshold_boundary() {
    let now = 1_000_000;

    // One millisecond inside the threshold: online
    assert!(is_online(now - 29_999, 30_000, now));
    // Exactly at the threshold: offline
    assert!(!is_online(now - 30_000, 30_000, now));
    // Past the threshold: offline
    assert!(!is_online(now - 30_001, 30_000, now));

    // The default threshold is the documented 30 seconds
    assert_eq!(ONLINE_THRESHOLD_MS, 30_000);
    assert!(is_online_default(now - 29_999, now));
    assert!(!is_online_default(now - 30_000, now));
}

#[test]
fn test_heartbeat_scenario_29s_online_31s_offline() {
    let store = PresenceStore::new();

    store.record_at("P1", json!({"userAgent": "player/1.0"}), 0);
    let (_, record) = store.snapshot().into_iter().next().unwrap();

    assert!(is_online_default(record.last_seen_ms, 29_000));
    assert!(!is_online_default(record.last_seen_ms, 31_000));
}

#[test]
fn test_distinct_players_do_not_interfere() {
    let store = PresenceStore::new();

    store.record_at("P1", json!(null), 1_000);
    store.record_at("P2", json!(null), 9_000);

    let mut snapshot = store.snapshot();
    snapshot.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].1.last_seen_ms, 1_000);
    assert_eq!(snapshot[1].1.last_seen_ms, 9_000);
}

#[test]
fn test_concurrent_heartbeats_lose_nothing() {
    let store = Arc::new(PresenceStore::new());
    let players = 8;
    let beats_per_player: i64 = 200;

    let mut handles = Vec::new();
    for p in 0..players {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            let player_id = format!("player-{}", p);
            for t in 1..=beats_per_player {
                store.record_at(&player_id, json!({"beat": t}), t);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), players as usize, "no player record lost");
    for (_, record) in snapshot {
        assert_eq!(
            record.last_seen_ms, beats_per_player,
            "each record ends at its maximum timestamp"
        );
    }
}

#[test]
fn test_store_starts_empty() {
    // Presence is process state only; a fresh store (= a restarted server)
    // knows no players until they re-announce
    let store = PresenceStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.snapshot().is_empty());
}
