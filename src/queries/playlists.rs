use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::{PlaylistEntries, Playlists};

/// UPDATE playlists SET is_active = 0 WHERE is_active = 1
pub fn deactivate_all() -> String {
    Query::update()
        .table(Playlists::Table)
        .value(Playlists::IsActive, 0)
        .and_where(Expr::col(Playlists::IsActive).eq(1))
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO playlists (id, name, is_active, created_at_ms) VALUES (?, ?, 1, ?)
pub fn insert_active(id: &str, name: &str, created_at_ms: i64) -> String {
    Query::insert()
        .into_table(Playlists::Table)
        .columns([
            Playlists::Id,
            Playlists::Name,
            Playlists::IsActive,
            Playlists::CreatedAtMs,
        ])
        .values_panic([id.into(), name.into(), 1.into(), created_at_ms.into()])
        .to_string(SqliteQueryBuilder)
}

/// SELECT id, name, created_at_ms FROM playlists WHERE is_active = 1
pub fn select_active() -> String {
    Query::select()
        .columns([Playlists::Id, Playlists::Name, Playlists::CreatedAtMs])
        .from(Playlists::Table)
        .and_where(Expr::col(Playlists::IsActive).eq(1))
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO playlist_entries (playlist_id, position, content_id, kind, duration_sec)
/// VALUES (?, ?, ?, ?, ?)
pub fn insert_entry(
    playlist_id: &str,
    position: i64,
    content_id: &str,
    kind: &str,
    duration_sec: Option<i64>,
) -> String {
    Query::insert()
        .into_table(PlaylistEntries::Table)
        .columns([
            PlaylistEntries::PlaylistId,
            PlaylistEntries::Position,
            PlaylistEntries::ContentId,
            PlaylistEntries::Kind,
            PlaylistEntries::DurationSec,
        ])
        .values_panic([
            playlist_id.into(),
            position.into(),
            content_id.into(),
            kind.into(),
            duration_sec.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT content_id, kind, duration_sec FROM playlist_entries
/// WHERE playlist_id = ? ORDER BY position
pub fn select_entries(playlist_id: &str) -> String {
    Query::select()
        .columns([
            PlaylistEntries::ContentId,
            PlaylistEntries::Kind,
            PlaylistEntries::DurationSec,
        ])
        .from(PlaylistEntries::Table)
        .and_where(Expr::col(PlaylistEntries::PlaylistId).eq(playlist_id))
        .order_by(PlaylistEntries::Position, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM playlist_entries WHERE content_id = ? AND playlist_id IN
/// (SELECT id FROM playlists WHERE is_active = 1)
///
/// Detaches a content item from active playlists only; inactive (historical)
/// playlists keep their entries, matching the purge contract.
pub fn delete_entries_for_content_in_active(content_id: &str) -> String {
    let active_ids = Query::select()
        .column(Playlists::Id)
        .from(Playlists::Table)
        .and_where(Expr::col(Playlists::IsActive).eq(1))
        .to_owned();

    Query::delete()
        .from_table(PlaylistEntries::Table)
        .and_where(Expr::col(PlaylistEntries::ContentId).eq(content_id))
        .and_where(Expr::col(PlaylistEntries::PlaylistId).in_subquery(active_ids))
        .to_string(SqliteQueryBuilder)
}
