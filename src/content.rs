use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::db::DynError;
use crate::queries::content as content_queries;

/// A stored media record. Created on upload, mutated only by the purge
/// scheduler, deleted when its purge completes - the is_expired/file_removed
/// flags describe a purge in flight, never a steady state.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(rename = "storedName")]
    pub stored_name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
    pub uploader: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at_ms: i64,
    #[serde(rename = "expiryAt")]
    pub expiry_at_ms: Option<i64>,
    #[serde(rename = "isExpired")]
    pub is_expired: bool,
    #[serde(rename = "expiredAt")]
    pub expired_at_ms: Option<i64>,
    #[serde(rename = "fileRemoved")]
    pub file_removed: bool,
}

/// Fields supplied by an upload; everything else is generated here
pub struct NewContent {
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploader: Option<String>,
    pub created_at_ms: i64,
    pub expiry_at_ms: Option<i64>,
}

fn item_from_row(row: &SqliteRow) -> Result<ContentItem, sqlx::Error> {
    Ok(ContentItem {
        id: row.try_get("id")?,
        original_name: row.try_get("original_name")?,
        stored_name: row.try_get("stored_name")?,
        mime_type: row.try_get("mime_type")?,
        file_size: row.try_get("file_size")?,
        uploader: row.try_get("uploader")?,
        created_at_ms: row.try_get("created_at_ms")?,
        expiry_at_ms: row.try_get("expiry_at_ms")?,
        is_expired: row.try_get::<i64, _>("is_expired")? != 0,
        expired_at_ms: row.try_get("expired_at_ms")?,
        file_removed: row.try_get::<i64, _>("file_removed")? != 0,
    })
}

/// Insert a new content record and return it
pub async fn insert(pool: &SqlitePool, new: NewContent) -> Result<ContentItem, DynError> {
    let id = Uuid::new_v4().to_string();
    let sql = content_queries::insert(
        &id,
        &new.original_name,
        &new.stored_name,
        &new.mime_type,
        new.file_size,
        new.uploader.as_deref(),
        new.created_at_ms,
        new.expiry_at_ms,
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(ContentItem {
        id,
        original_name: new.original_name,
        stored_name: new.stored_name,
        mime_type: new.mime_type,
        file_size: new.file_size,
        uploader: new.uploader,
        created_at_ms: new.created_at_ms,
        expiry_at_ms: new.expiry_at_ms,
        is_expired: false,
        expired_at_ms: None,
        file_removed: false,
    })
}

/// All content records, newest first (admin library view)
pub async fn list(pool: &SqlitePool) -> Result<Vec<ContentItem>, DynError> {
    let sql = content_queries::select_all();
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(item_from_row(row)?);
    }
    Ok(items)
}

/// Fetch a single record by id
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ContentItem>, DynError> {
    let sql = content_queries::select_by_id(id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    match row {
        Some(row) => Ok(Some(item_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Bulk fetch for playlist enrichment
pub async fn find_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<ContentItem>, DynError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = content_queries::select_by_ids(ids);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(item_from_row(row)?);
    }
    Ok(items)
}

/// Records whose expiry instant has passed - the purge scan.
/// Also matches items left mid-purge by an earlier failed pass.
pub async fn find_expired(pool: &SqlitePool, now_ms: i64) -> Result<Vec<ContentItem>, DynError> {
    let sql = content_queries::select_expired(now_ms);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(item_from_row(row)?);
    }
    Ok(items)
}

/// Flag the record as expired (purge in flight)
pub async fn mark_expired(pool: &SqlitePool, id: &str, expired_at_ms: i64) -> Result<(), DynError> {
    let sql = content_queries::mark_expired(id, expired_at_ms);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Flag the backing file as removed (purge nearly complete)
pub async fn mark_file_removed(pool: &SqlitePool, id: &str) -> Result<(), DynError> {
    let sql = content_queries::mark_file_removed(id);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Delete the record - the terminal state of an expired item
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), DynError> {
    let sql = content_queries::delete_by_id(id);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
