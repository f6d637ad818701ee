use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, SqliteQueryBuilder, Table};

use crate::schema::{Content, Metadata, PlaylistEntries, Playlists};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS content (
///     id TEXT PRIMARY KEY,
///     original_name TEXT NOT NULL,
///     stored_name TEXT NOT NULL,
///     mime_type TEXT NOT NULL,
///     file_size INTEGER NOT NULL,
///     uploader TEXT,
///     created_at_ms INTEGER NOT NULL,
///     expiry_at_ms INTEGER,
///     is_expired INTEGER NOT NULL DEFAULT 0,
///     expired_at_ms INTEGER,
///     file_removed INTEGER NOT NULL DEFAULT 0
/// )
pub fn create_content_table() -> String {
    Table::create()
        .table(Content::Table)
        .if_not_exists()
        .col(ColumnDef::new(Content::Id).string().primary_key())
        .col(ColumnDef::new(Content::OriginalName).string().not_null())
        .col(ColumnDef::new(Content::StoredName).string().not_null())
        .col(ColumnDef::new(Content::MimeType).string().not_null())
        .col(ColumnDef::new(Content::FileSize).big_integer().not_null())
        .col(ColumnDef::new(Content::Uploader).string())
        .col(ColumnDef::new(Content::CreatedAtMs).big_integer().not_null())
        .col(ColumnDef::new(Content::ExpiryAtMs).big_integer())
        .col(
            ColumnDef::new(Content::IsExpired)
                .integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(Content::ExpiredAtMs).big_integer())
        .col(
            ColumnDef::new(Content::FileRemoved)
                .integer()
                .not_null()
                .default(0),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS playlists (
///     id TEXT PRIMARY KEY,
///     name TEXT NOT NULL,
///     is_active INTEGER NOT NULL DEFAULT 0,
///     created_at_ms INTEGER NOT NULL
/// )
pub fn create_playlists_table() -> String {
    Table::create()
        .table(Playlists::Table)
        .if_not_exists()
        .col(ColumnDef::new(Playlists::Id).string().primary_key())
        .col(ColumnDef::new(Playlists::Name).string().not_null())
        .col(
            ColumnDef::new(Playlists::IsActive)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(Playlists::CreatedAtMs)
                .big_integer()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS playlist_entries (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     playlist_id TEXT NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
///     position INTEGER NOT NULL,
///     content_id TEXT NOT NULL,
///     kind TEXT NOT NULL,
///     duration_sec INTEGER
/// )
///
/// content_id is deliberately not a foreign key: an entry that outlives its
/// content row is an orphan filtered out at read time, not a constraint error.
pub fn create_playlist_entries_table() -> String {
    Table::create()
        .table(PlaylistEntries::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(PlaylistEntries::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(PlaylistEntries::PlaylistId).string().not_null())
        .col(ColumnDef::new(PlaylistEntries::Position).integer().not_null())
        .col(ColumnDef::new(PlaylistEntries::ContentId).string().not_null())
        .col(ColumnDef::new(PlaylistEntries::Kind).string().not_null())
        .col(ColumnDef::new(PlaylistEntries::DurationSec).integer())
        .foreign_key(
            ForeignKey::create()
                .from(PlaylistEntries::Table, PlaylistEntries::PlaylistId)
                .to(Playlists::Table, Playlists::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_content_expiry ON content(expiry_at_ms)
pub fn create_content_expiry_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_content_expiry")
        .table(Content::Table)
        .col(Content::ExpiryAtMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_content_created ON content(created_at_ms)
pub fn create_content_created_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_content_created")
        .table(Content::Table)
        .col(Content::CreatedAtMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_entries_playlist ON playlist_entries(playlist_id, position)
pub fn create_entries_playlist_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_entries_playlist")
        .table(PlaylistEntries::Table)
        .col(PlaylistEntries::PlaylistId)
        .col(PlaylistEntries::Position)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_entries_content ON playlist_entries(content_id)
pub fn create_entries_content_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_entries_content")
        .table(PlaylistEntries::Table)
        .col(PlaylistEntries::ContentId)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_playlists_active ON playlists(is_active)
pub fn create_playlists_active_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_playlists_active")
        .table(Playlists::Table)
        .col(Playlists::IsActive)
        .to_string(SqliteQueryBuilder)
}
