use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::Content;

/// Columns selected for a full content row, in ContentItem field order
fn item_columns() -> [Content; 11] {
    [
        Content::Id,
        Content::OriginalName,
        Content::StoredName,
        Content::MimeType,
        Content::FileSize,
        Content::Uploader,
        Content::CreatedAtMs,
        Content::ExpiryAtMs,
        Content::IsExpired,
        Content::ExpiredAtMs,
        Content::FileRemoved,
    ]
}

/// INSERT INTO content (id, original_name, stored_name, mime_type, file_size,
/// uploader, created_at_ms, expiry_at_ms) VALUES (?, ...)
pub fn insert(
    id: &str,
    original_name: &str,
    stored_name: &str,
    mime_type: &str,
    file_size: i64,
    uploader: Option<&str>,
    created_at_ms: i64,
    expiry_at_ms: Option<i64>,
) -> String {
    Query::insert()
        .into_table(Content::Table)
        .columns([
            Content::Id,
            Content::OriginalName,
            Content::StoredName,
            Content::MimeType,
            Content::FileSize,
            Content::Uploader,
            Content::CreatedAtMs,
            Content::ExpiryAtMs,
        ])
        .values_panic([
            id.into(),
            original_name.into(),
            stored_name.into(),
            mime_type.into(),
            file_size.into(),
            uploader.into(),
            created_at_ms.into(),
            expiry_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <item columns> FROM content ORDER BY created_at_ms DESC
pub fn select_all() -> String {
    Query::select()
        .columns(item_columns())
        .from(Content::Table)
        .order_by(Content::CreatedAtMs, Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT <item columns> FROM content WHERE id = ?
pub fn select_by_id(id: &str) -> String {
    Query::select()
        .columns(item_columns())
        .from(Content::Table)
        .and_where(Expr::col(Content::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <item columns> FROM content WHERE id IN (...)
pub fn select_by_ids(ids: &[String]) -> String {
    Query::select()
        .columns(item_columns())
        .from(Content::Table)
        .and_where(Expr::col(Content::Id).is_in(ids.iter().map(String::as_str)))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <item columns> FROM content
/// WHERE expiry_at_ms IS NOT NULL AND expiry_at_ms <= ?
///
/// The purge scan: everything past its expiry instant, including items left
/// mid-purge by an earlier failed pass.
pub fn select_expired(now_ms: i64) -> String {
    Query::select()
        .columns(item_columns())
        .from(Content::Table)
        .and_where(Expr::col(Content::ExpiryAtMs).is_not_null())
        .and_where(Expr::col(Content::ExpiryAtMs).lte(now_ms))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE content SET is_expired = 1, expired_at_ms = ? WHERE id = ?
pub fn mark_expired(id: &str, expired_at_ms: i64) -> String {
    Query::update()
        .table(Content::Table)
        .value(Content::IsExpired, 1)
        .value(Content::ExpiredAtMs, expired_at_ms)
        .and_where(Expr::col(Content::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE content SET file_removed = 1 WHERE id = ?
pub fn mark_file_removed(id: &str) -> String {
    Query::update()
        .table(Content::Table)
        .value(Content::FileRemoved, 1)
        .and_where(Expr::col(Content::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM content WHERE id = ?
pub fn delete_by_id(id: &str) -> String {
    Query::delete()
        .from_table(Content::Table)
        .and_where(Expr::col(Content::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}
