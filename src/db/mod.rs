//! Database module for playlist and key-value persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Playlist rows (owner-scoped reads, deletes and export updates)
//! - Short-lived key-value entries with an expiry timestamp
//!
//! Typed access goes through [`crate::playlist::SqlitePlaylistStore`] and
//! [`crate::keystore::SqliteKeyedStore`]; this module only speaks rows.
//!
//! # Example
//!
//! ```ignore
//! use seedmix::db::{init_db, get_playlists_by_owner};
//!
//! let pool = init_db("sqlite:seedmix.db").await?;
//! let rows = get_playlists_by_owner(&pool, "local").await?;
//! ```

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Errors from the typed stores built on this module.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt stored value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "seedmix.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// A playlist row as stored. JSON columns are left encoded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaylistRow {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    /// JSON array of track records
    pub tracks: String,
    /// JSON array of seed ids
    pub seed_tracks: String,
    /// JSON object of generation parameters
    pub generation_params: String,
    /// Milliseconds
    pub total_duration: i64,
    pub remote_playlist_id: Option<String>,
    /// RFC 3339, UTC, fixed precision so text order is time order
    pub created_at: String,
}

/// Columns for a new playlist row.
#[derive(Debug, Clone)]
pub struct NewPlaylistRow<'a> {
    pub owner_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub tracks: &'a str,
    pub seed_tracks: &'a str,
    pub generation_params: &'a str,
    pub total_duration: i64,
    pub created_at: &'a str,
}

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, tracks, seed_tracks, \
     generation_params, total_duration, remote_playlist_id, created_at";

/// Insert a playlist in a single statement and return its ID.
pub async fn insert_playlist(pool: &SqlitePool, row: &NewPlaylistRow<'_>) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO playlists
            (owner_id, name, description, tracks, seed_tracks, generation_params, total_duration, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.owner_id)
    .bind(row.name)
    .bind(row.description)
    .bind(row.tracks)
    .bind(row.seed_tracks)
    .bind(row.generation_params)
    .bind(row.total_duration)
    .bind(row.created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All playlists for an owner, newest first.
pub async fn get_playlists_by_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> sqlx::Result<Vec<PlaylistRow>> {
    sqlx::query_as::<_, PlaylistRow>(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE owner_id = ? \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// One playlist, only if it belongs to `owner_id`.
pub async fn get_playlist(
    pool: &SqlitePool,
    id: i64,
    owner_id: &str,
) -> sqlx::Result<Option<PlaylistRow>> {
    sqlx::query_as::<_, PlaylistRow>(&format!(
        "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

/// Hard-delete an owner's playlist. Returns whether a row was removed.
pub async fn delete_playlist(pool: &SqlitePool, id: i64, owner_id: &str) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Record the remote playlist ID unless one is already set.
///
/// Returns whether the row was updated.
pub async fn set_remote_playlist_id(
    pool: &SqlitePool,
    id: i64,
    owner_id: &str,
    remote_id: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE playlists SET remote_playlist_id = ? \
         WHERE id = ? AND owner_id = ? AND remote_playlist_id IS NULL",
    )
    .bind(remote_id)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert or replace a key-value entry.
pub async fn kv_put(pool: &SqlitePool, key: &str, value: &str, expires_at: i64) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, expires_at) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Value and expiry (unix seconds) for a key, expired or not.
pub async fn kv_get(pool: &SqlitePool, key: &str) -> sqlx::Result<Option<(String, i64)>> {
    sqlx::query_as("SELECT value, expires_at FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn kv_delete(pool: &SqlitePool, key: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove every entry that expired at or before `now`. Returns the count.
pub async fn kv_purge_expired(pool: &SqlitePool, now: i64) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM kv_store WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
