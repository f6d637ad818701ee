use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use uuid::Uuid;

use crate::content::{self, ContentItem};
use crate::db::DynError;
use crate::queries::playlists as playlist_queries;

/// Entry variant: videos play for their intrinsic duration, images for an
/// explicit number of seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Video,
    Image,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Video => "video",
            EntryKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(EntryKind::Video),
            "image" => Some(EntryKind::Image),
            _ => None,
        }
    }
}

/// A raw entry as submitted by the operator UI
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntryInput {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "durationSec")]
    pub duration_sec: Option<i64>,
}

/// A validated playlist entry
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistEntry {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "durationSec")]
    pub duration_sec: Option<i64>,
}

/// The active playlist with its ordered entries
#[derive(Debug, Clone)]
pub struct ActivePlaylist {
    pub id: String,
    pub name: String,
    pub created_at_ms: i64,
    pub entries: Vec<PlaylistEntry>,
}

/// Validate a submitted entry sequence before any mutation.
///
/// All-or-nothing: the first invalid entry rejects the whole sequence and
/// nothing is written. Image entries need a positive duration; video entries
/// have their duration normalized away since intrinsic duration governs.
pub fn validate_entries(inputs: &[PlaylistEntryInput]) -> Result<Vec<PlaylistEntry>, String> {
    let mut entries = Vec::with_capacity(inputs.len());

    for (idx, input) in inputs.iter().enumerate() {
        if input.content_id.trim().is_empty() {
            return Err(format!("Entry {}: missing contentId", idx));
        }

        let kind = EntryKind::parse(&input.kind)
            .ok_or_else(|| format!("Entry {}: unknown type '{}'", idx, input.kind))?;

        let duration_sec = match kind {
            EntryKind::Image => match input.duration_sec {
                Some(d) if d >= 1 => Some(d),
                Some(d) => {
                    return Err(format!("Entry {}: image durationSec must be >= 1, got {}", idx, d))
                }
                None => return Err(format!("Entry {}: image entries require durationSec", idx)),
            },
            EntryKind::Video => None,
        };

        entries.push(PlaylistEntry {
            content_id: input.content_id.clone(),
            kind,
            duration_sec,
        });
    }

    Ok(entries)
}

/// Atomically replace the active playlist.
///
/// Deactivate-all plus insert-new-active runs inside one transaction, so a
/// concurrent reader sees either the old active playlist or the new one,
/// never zero or two. Deactivated playlists are kept as history rows.
pub async fn replace_active(
    pool: &SqlitePool,
    name: &str,
    entries: &[PlaylistEntry],
    now_ms: i64,
) -> Result<String, DynError> {
    let playlist_id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    let sql = playlist_queries::deactivate_all();
    sqlx::query(&sql).execute(&mut *tx).await?;

    let sql = playlist_queries::insert_active(&playlist_id, name, now_ms);
    sqlx::query(&sql).execute(&mut *tx).await?;

    for (position, entry) in entries.iter().enumerate() {
        let sql = playlist_queries::insert_entry(
            &playlist_id,
            position as i64,
            &entry.content_id,
            entry.kind.as_str(),
            entry.duration_sec,
        );
        sqlx::query(&sql).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    Ok(playlist_id)
}

/// Load the active playlist and its entries in serving order
pub async fn load_active(pool: &SqlitePool) -> Result<Option<ActivePlaylist>, DynError> {
    let sql = playlist_queries::select_active();
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let id: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let created_at_ms: i64 = row.try_get("created_at_ms")?;

    let sql = playlist_queries::select_entries(&id);
    let entry_rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut entries = Vec::with_capacity(entry_rows.len());
    for row in &entry_rows {
        let kind_str: String = row.try_get("kind")?;
        let kind = match EntryKind::parse(&kind_str) {
            Some(kind) => kind,
            None => continue, // unknown kind in storage, skip rather than fail the read
        };
        entries.push(PlaylistEntry {
            content_id: row.try_get("content_id")?,
            kind,
            duration_sec: row.try_get("duration_sec")?,
        });
    }

    Ok(Some(ActivePlaylist {
        id,
        name,
        created_at_ms,
        entries,
    }))
}

/// Remove every entry referencing `content_id` from active playlists.
/// Called by the purge scheduler before the backing file is deleted.
pub async fn detach_content_from_active(
    pool: &SqlitePool,
    content_id: &str,
) -> Result<u64, DynError> {
    let sql = playlist_queries::delete_entries_for_content_in_active(content_id);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.rows_affected())
}

/// An entry as served to players, enriched with content metadata
#[derive(Debug, Clone, Serialize)]
pub struct ServedEntry {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "durationSec")]
    pub duration_sec: Option<i64>,
    #[serde(rename = "storedFilename")]
    pub stored_name: String,
    #[serde(rename = "publicUrl")]
    pub public_url: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "expiryAt")]
    pub expiry_at_ms: Option<i64>,
}

/// The playlist payload players poll for
#[derive(Debug, Clone, Serialize)]
pub struct ServedPlaylist {
    pub id: Option<String>,
    pub name: Option<String>,
    pub playlist: Vec<ServedEntry>,
}

/// Whether an entry's content may be served at `now_ms`
fn servable(item: &ContentItem, now_ms: i64) -> bool {
    if item.file_removed {
        return false;
    }
    match item.expiry_at_ms {
        Some(expiry) => expiry > now_ms,
        None => true,
    }
}

/// Resolve the active playlist for playback.
///
/// Defense in depth, independent of the purge scheduler: entries whose
/// content row is gone, expired, or mid-purge are silently dropped, so the
/// scheduler's up-to-one-tick lag never surfaces a dead link to a player.
pub async fn resolve_active_for_playback(
    pool: &SqlitePool,
    media_url: impl Fn(&str) -> String,
    now_ms: i64,
) -> Result<ServedPlaylist, DynError> {
    let active = match load_active(pool).await? {
        Some(active) => active,
        None => {
            return Ok(ServedPlaylist {
                id: None,
                name: None,
                playlist: Vec::new(),
            })
        }
    };

    let ids: Vec<String> = active
        .entries
        .iter()
        .map(|e| e.content_id.clone())
        .collect();
    let items = content::find_by_ids(pool, &ids).await?;

    let mut served = Vec::with_capacity(active.entries.len());
    for entry in &active.entries {
        let item = items.iter().find(|c| c.id == entry.content_id);
        let item = match item {
            Some(item) if servable(item, now_ms) => item,
            _ => continue,
        };

        served.push(ServedEntry {
            content_id: entry.content_id.clone(),
            kind: entry.kind,
            duration_sec: entry.duration_sec,
            stored_name: item.stored_name.clone(),
            public_url: media_url(&item.stored_name),
            mime_type: item.mime_type.clone(),
            expiry_at_ms: item.expiry_at_ms,
        });
    }

    Ok(ServedPlaylist {
        id: Some(active.id),
        name: Some(active.name),
        playlist: served,
    })
}
