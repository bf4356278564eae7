//! Playlist persistence behind a trait so the service can be tested
//! without a database.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::model::{NewPlaylist, Playlist};
use crate::db::{self, NewPlaylistRow, PlaylistRow, StoreError};

#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Insert atomically and return the stored playlist.
    async fn insert(&self, playlist: NewPlaylist) -> Result<Playlist, StoreError>;

    /// Newest first.
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Playlist>, StoreError>;

    async fn find_one(&self, id: i64, owner_id: &str) -> Result<Option<Playlist>, StoreError>;

    /// Returns whether a playlist was deleted.
    async fn delete_one(&self, id: i64, owner_id: &str) -> Result<bool, StoreError>;

    /// Set the remote id if none is recorded yet. Returns whether it was set.
    async fn set_remote_id(
        &self,
        id: i64,
        owner_id: &str,
        remote_id: &str,
    ) -> Result<bool, StoreError>;
}

/// Creation timestamp with fixed millisecond precision.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// SQLite-backed store. JSON columns hold the nested records.
#[derive(Clone)]
pub struct SqlitePlaylistStore {
    pool: SqlitePool,
}

impl SqlitePlaylistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn decode(row: PlaylistRow) -> Result<Playlist, StoreError> {
        Ok(Playlist {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            tracks: serde_json::from_str(&row.tracks)?,
            seed_tracks: serde_json::from_str(&row.seed_tracks)?,
            generation_params: serde_json::from_str(&row.generation_params)?,
            total_duration: row.total_duration.max(0) as u64,
            remote_playlist_id: row.remote_playlist_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PlaylistStore for SqlitePlaylistStore {
    async fn insert(&self, playlist: NewPlaylist) -> Result<Playlist, StoreError> {
        let tracks = serde_json::to_string(&playlist.tracks)?;
        let seed_tracks = serde_json::to_string(&playlist.seed_tracks)?;
        let generation_params = serde_json::to_string(&playlist.generation_params)?;
        let total_duration = playlist.total_duration();
        let created_at = timestamp_now();

        let id = db::insert_playlist(
            &self.pool,
            &NewPlaylistRow {
                owner_id: &playlist.owner_id,
                name: &playlist.name,
                description: &playlist.description,
                tracks: &tracks,
                seed_tracks: &seed_tracks,
                generation_params: &generation_params,
                total_duration: total_duration as i64,
                created_at: &created_at,
            },
        )
        .await?;

        Ok(Playlist {
            id,
            owner_id: playlist.owner_id,
            name: playlist.name,
            description: playlist.description,
            tracks: playlist.tracks,
            seed_tracks: playlist.seed_tracks,
            generation_params: playlist.generation_params,
            total_duration,
            remote_playlist_id: None,
            created_at,
        })
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<Playlist>, StoreError> {
        db::get_playlists_by_owner(&self.pool, owner_id)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    async fn find_one(&self, id: i64, owner_id: &str) -> Result<Option<Playlist>, StoreError> {
        db::get_playlist(&self.pool, id, owner_id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    async fn delete_one(&self, id: i64, owner_id: &str) -> Result<bool, StoreError> {
        Ok(db::delete_playlist(&self.pool, id, owner_id).await?)
    }

    async fn set_remote_id(
        &self,
        id: i64,
        owner_id: &str,
        remote_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(db::set_remote_playlist_id(&self.pool, id, owner_id, remote_id).await?)
    }
}
