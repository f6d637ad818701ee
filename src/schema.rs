use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Content table - uploaded media items with optional expiry
#[derive(Iden)]
pub enum Content {
    Table,
    Id,
    OriginalName,
    StoredName,
    MimeType,
    FileSize,
    Uploader,
    CreatedAtMs,
    ExpiryAtMs,
    IsExpired,
    ExpiredAtMs,
    FileRemoved,
}

/// Playlists table - named entry sequences, at most one active
#[derive(Iden)]
pub enum Playlists {
    Table,
    Id,
    Name,
    IsActive,
    CreatedAtMs,
}

/// Playlist entries table - ordered content references within a playlist
#[derive(Iden)]
pub enum PlaylistEntries {
    Table,
    Id,
    PlaylistId,
    Position,
    ContentId,
    Kind,
    DurationSec,
}
