//! Test utilities and fixtures for seedmix tests.
//!
//! This module provides common test helpers, track factories and a
//! throwaway database. HTTP clients are exercised against `wiremock`
//! servers in their own test modules.
//!
//! # Example
//!
//! ```ignore
//! use seedmix::test_utils::{temp_db, candidate};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let track = candidate("t1", "Some Artist", Some(40));
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::catalog::CandidateTrack;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a candidate track with sensible defaults.
///
/// The artist id is derived from the artist name, so tracks built with the
/// same artist count as the same artist. Duration is 200 seconds.
pub fn candidate(id: &str, artist: &str, popularity: Option<u32>) -> CandidateTrack {
    CandidateTrack {
        id: id.to_string(),
        name: format!("Song {id}"),
        primary_artist_name: artist.to_string(),
        artist_id: format!("artist-{}", artist.to_lowercase().replace(' ', "-")),
        album_name: format!("Album by {artist}"),
        album_art_url: None,
        duration_ms: 200_000,
        popularity,
        preview_url: None,
    }
}

/// `n` tracks by one artist with ids `{prefix}0..{prefix}{n-1}`.
pub fn candidates(prefix: &str, artist: &str, n: usize) -> Vec<CandidateTrack> {
    (0..n)
        .map(|i| candidate(&format!("{prefix}{i}"), artist, Some(50)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        let playlists = crate::db::get_playlists_by_owner(&pool, "me").await.unwrap();
        assert!(playlists.is_empty());
    }

    #[test]
    fn test_candidate_defaults() {
        let track = candidate("t1", "Some Artist", Some(10));
        assert_eq!(track.name, "Song t1");
        assert_eq!(track.artist_id, "artist-some-artist");
        assert_eq!(track.duration_ms, 200_000);
    }

    #[test]
    fn test_candidates_ids() {
        let ids: Vec<_> = candidates("x", "A", 3).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["x0", "x1", "x2"]);
    }
}
