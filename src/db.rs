use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::constants::EXPECTED_DB_VERSION;
use crate::queries::{ddl, metadata};

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Open the server database pool, creating the file if needed
/// Enables WAL mode and foreign keys
pub async fn open_database_pool(data_dir: &Path, name: &str) -> Result<SqlitePool, DynError> {
    let db_path = data_dir.join(format!("{}.sqlite", name));
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    println!("SQLite database: {}", db_path.display());
    Ok(pool)
}

/// Create all tables and indexes if they don't exist and stamp the schema version
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), DynError> {
    let statements = [
        ddl::create_metadata_table(),
        ddl::create_content_table(),
        ddl::create_playlists_table(),
        ddl::create_playlist_entries_table(),
        ddl::create_content_expiry_index(),
        ddl::create_content_created_index(),
        ddl::create_entries_playlist_index(),
        ddl::create_entries_content_index(),
        ddl::create_playlists_active_index(),
    ];

    for sql in statements {
        sqlx::query(&sql).execute(pool).await?;
    }

    let sql = metadata::upsert("version", EXPECTED_DB_VERSION);
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

/// Verify the database schema version matches what this binary expects
pub async fn check_database_version(pool: &SqlitePool) -> Result<(), DynError> {
    let sql = metadata::select_by_key("version");
    let version: String = sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .map_err(|e| format!("Failed to read version from metadata: {}", e))?;

    if version != EXPECTED_DB_VERSION {
        return Err(format!(
            "Unsupported database version: '{}'. This application only supports version '{}'",
            version, EXPECTED_DB_VERSION
        )
        .into());
    }

    Ok(())
}

/// Create a database in a temporary directory for testing
/// Returns (pool, guard) - keep the guard alive to prevent temp file deletion
pub async fn create_test_connection_in_temporary_file(
) -> Result<(SqlitePool, tempfile::TempDir), DynError> {
    let guard = tempfile::tempdir()?;
    let pool = open_database_pool(guard.path(), "test").await?;
    Ok((pool, guard))
}
