//! # Playlist Tests
//!
//! These tests verify entry validation, the single-active invariant across
//! replaces, and the defense-in-depth serving filter that keeps expired or
//! orphaned entries away from players even before the purge scheduler runs.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test playlist_test
//! ```

use sqlx::sqlite::SqlitePool;

use signage_server::content::{self, ContentItem, NewContent};
use signage_server::playlist::{
    self, EntryKind, PlaylistEntry, PlaylistEntryInput,
};

/// Helper to create a test database
async fn create_test_database() -> (SqlitePool, tempfile::TempDir) {
    let (pool, guard) = signage_server::db::create_test_connection_in_temporary_file()
        .await
        .unwrap();
    signage_server::db::init_database_schema(&pool)
        .await
        .unwrap();
    (pool, guard)
}

/// Helper to insert a content record (no backing file needed here)
async fn insert_content(
    pool: &SqlitePool,
    name: &str,
    expiry_at_ms: Option<i64>,
) -> ContentItem {
    content::insert(
        pool,
        NewContent {
            original_name: name.to_string(),
            stored_name: format!("1000_{}", name),
            mime_type: "video/mp4".to_string(),
            file_size: 42,
            uploader: Some("op".to_string()),
            created_at_ms: 1_000,
            expiry_at_ms,
        },
    )
    .await
    .unwrap()
}

fn image_entry(content_id: &str, duration_sec: i64) -> PlaylistEntry {
    PlaylistEntry {
        content_id: content_id.to_string(),
        kind: EntryKind::Image,
        duration_sec: Some(duration_sec),
    }
}

fn video_entry(content_id: &str) -> PlaylistEntry {
    PlaylistEntry {
        content_id: content_id.to_string(),
        kind: EntryKind::Video,
        duration_sec: None,
    }
}

async fn count_active(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM playlists WHERE is_active = 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_exactly_one_active_playlist_after_replaces() {
    let (pool, _guard) = create_test_database().await;
    let a = insert_content(&pool, "a.mp4", None).await;
    let b = insert_content(&pool, "b.mp4", None).await;

    assert_eq!(count_active(&pool).await, 0);

    playlist::replace_active(&pool, "active", &[video_entry(&a.id)], 1_000)
        .await
        .unwrap();
    assert_eq!(count_active(&pool).await, 1);

    playlist::replace_active(&pool, "active", &[video_entry(&b.id)], 2_000)
        .await
        .unwrap();
    playlist::replace_active(&pool, "active", &[video_entry(&a.id), video_entry(&b.id)], 3_000)
        .await
        .unwrap();

    // However many replaces, exactly one active - older rows survive as history
    assert_eq!(count_active(&pool).await, 1);
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 3);

    // The active one is the latest, in submitted order
    let active = playlist::load_active(&pool).await.unwrap().unwrap();
    let ids: Vec<&str> = active.entries.iter().map(|e| e.content_id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
}

#[tokio::test]
async fn test_replace_with_empty_sequence_clears_playback() {
    let (pool, _guard) = create_test_database().await;
    let a = insert_content(&pool, "a.mp4", None).await;

    playlist::replace_active(&pool, "active", &[video_entry(&a.id)], 1_000)
        .await
        .unwrap();
    playlist::replace_active(&pool, "active", &[], 2_000)
        .await
        .unwrap();

    assert_eq!(count_active(&pool).await, 1);
    let served = playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), 2_000)
        .await
        .unwrap();
    assert!(served.playlist.is_empty());
}

#[test]
fn test_validate_rejects_malformed_entries() {
    // Missing duration on an image
    let inputs = vec![PlaylistEntryInput {
        content_id: "c1".to_string(),
        kind: "image".to_string(),
        duration_sec: None,
    }];
    assert!(playlist::validate_entries(&inputs).is_err());

    // Non-positive duration on an image
    let inputs = vec![PlaylistEntryInput {
        content_id: "c1".to_string(),
        kind: "image".to_string(),
        duration_sec: Some(0),
    }];
    assert!(playlist::validate_entries(&inputs).is_err());

    // Unknown kind
    let inputs = vec![PlaylistEntryInput {
        content_id: "c1".to_string(),
        kind: "gif".to_string(),
        duration_sec: Some(5),
    }];
    assert!(playlist::validate_entries(&inputs).is_err());

    // Blank content id
    let inputs = vec![PlaylistEntryInput {
        content_id: "  ".to_string(),
        kind: "video".to_string(),
        duration_sec: None,
    }];
    assert!(playlist::validate_entries(&inputs).is_err());

    // One bad entry rejects the whole sequence
    let inputs = vec![
        PlaylistEntryInput {
            content_id: "c1".to_string(),
            kind: "video".to_string(),
            duration_sec: None,
        },
        PlaylistEntryInput {
            content_id: "c2".to_string(),
            kind: "image".to_string(),
            duration_sec: None,
        },
    ];
    assert!(playlist::validate_entries(&inputs).is_err());
}

#[test]
fn test_validate_normalizes_video_duration() {
    // A duration on a video entry is meaningless and dropped
    let inputs = vec![PlaylistEntryInput {
        content_id: "c1".to_string(),
        kind: "video".to_string(),
        duration_sec: Some(30),
    }];
    let entries = playlist::validate_entries(&inputs).unwrap();
    assert_eq!(entries[0].kind, EntryKind::Video);
    assert_eq!(entries[0].duration_sec, None);

    let inputs = vec![PlaylistEntryInput {
        content_id: "c2".to_string(),
        kind: "image".to_string(),
        duration_sec: Some(10),
    }];
    let entries = playlist::validate_entries(&inputs).unwrap();
    assert_eq!(entries[0].duration_sec, Some(10));
}

#[tokio::test]
async fn test_serving_filter_drops_expired_and_orphaned_entries() {
    let (pool, _guard) = create_test_database().await;

    let now = 10_000;
    let live = insert_content(&pool, "live.mp4", Some(now + 60_000)).await;
    let expired = insert_content(&pool, "expired.mp4", Some(now - 1)).await;
    let orphaned = insert_content(&pool, "orphan.mp4", None).await;

    playlist::replace_active(
        &pool,
        "active",
        &[
            video_entry(&live.id),
            video_entry(&expired.id),
            video_entry(&orphaned.id),
        ],
        now,
    )
    .await
    .unwrap();

    // Orphan the third entry: content row deleted, entry left behind.
    // No scheduler has run - the read-time filter alone must cope.
    content::delete(&pool, &orphaned.id).await.unwrap();

    let served = playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), now)
        .await
        .unwrap();

    let ids: Vec<&str> = served.playlist.iter().map(|e| e.content_id.as_str()).collect();
    assert_eq!(ids, vec![live.id.as_str()]);
    assert_eq!(served.playlist[0].public_url, format!("/uploads/{}", live.stored_name));
    assert_eq!(served.playlist[0].mime_type, "video/mp4");
}

#[tokio::test]
async fn test_serving_filter_boundary_at_expiry_instant() {
    let (pool, _guard) = create_test_database().await;

    let now = 10_000;
    let item = insert_content(&pool, "edge.mp4", Some(now)).await;
    playlist::replace_active(&pool, "active", &[video_entry(&item.id)], now)
        .await
        .unwrap();

    // expiry_at == now is already expired for serving purposes
    let served = playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), now)
        .await
        .unwrap();
    assert!(served.playlist.is_empty());

    // One millisecond earlier it still plays
    let served =
        playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), now - 1)
            .await
            .unwrap();
    assert_eq!(served.playlist.len(), 1);
}

#[tokio::test]
async fn test_serving_filter_drops_mid_purge_entries() {
    let (pool, _guard) = create_test_database().await;

    let now = 10_000;
    let item = insert_content(&pool, "midpurge.mp4", Some(now + 60_000)).await;
    playlist::replace_active(&pool, "active", &[video_entry(&item.id)], now)
        .await
        .unwrap();

    // A record whose file is already gone must not be served even though
    // the row still exists
    content::mark_file_removed(&pool, &item.id).await.unwrap();

    let served = playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), now)
        .await
        .unwrap();
    assert!(served.playlist.is_empty());
}

#[tokio::test]
async fn test_no_active_playlist_serves_empty_list() {
    let (pool, _guard) = create_test_database().await;

    let served = playlist::resolve_active_for_playback(&pool, |s| format!("/uploads/{}", s), 0)
        .await
        .unwrap();
    assert!(served.id.is_none());
    assert!(served.playlist.is_empty());
}

#[tokio::test]
async fn test_detach_touches_active_playlist_only() {
    let (pool, _guard) = create_test_database().await;

    let a = insert_content(&pool, "a.mp4", None).await;
    let b = insert_content(&pool, "b.mp4", None).await;

    playlist::replace_active(&pool, "active", &[video_entry(&a.id)], 1_000)
        .await
        .unwrap();
    playlist::replace_active(&pool, "active", &[video_entry(&a.id), video_entry(&b.id)], 2_000)
        .await
        .unwrap();

    let detached = playlist::detach_content_from_active(&pool, &a.id)
        .await
        .unwrap();
    assert_eq!(detached, 1, "only the active playlist's entry is removed");

    // Historical playlist still holds its reference
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM playlist_entries WHERE content_id = ?1")
            .bind(&a.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 1);

    let active = playlist::load_active(&pool).await.unwrap().unwrap();
    let ids: Vec<&str> = active.entries.iter().map(|e| e.content_id.as_str()).collect();
    assert_eq!(ids, vec![b.id.as_str()]);
}

#[tokio::test]
async fn test_entry_order_and_durations_round_trip() {
    let (pool, _guard) = create_test_database().await;

    let a = insert_content(&pool, "a.mp4", None).await;
    let b = insert_content(&pool, "b.png", None).await;
    let c = insert_content(&pool, "c.png", None).await;

    playlist::replace_active(
        &pool,
        "active",
        &[video_entry(&a.id), image_entry(&b.id, 10), image_entry(&c.id, 25)],
        1_000,
    )
    .await
    .unwrap();

    let active = playlist::load_active(&pool).await.unwrap().unwrap();
    assert_eq!(active.entries.len(), 3);
    assert_eq!(active.entries[0].kind, EntryKind::Video);
    assert_eq!(active.entries[0].duration_sec, None);
    assert_eq!(active.entries[1].duration_sec, Some(10));
    assert_eq!(active.entries[2].duration_sec, Some(25));
    assert_eq!(active.entries[2].content_id, c.id);
}
