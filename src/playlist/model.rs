//! Playlist records, generation requests and the service error type.

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CandidateTrack, CatalogError, MAX_SEEDS, TargetProfile, clean_seed_ids, clean_track_id,
    is_valid_track_id,
};
use crate::db::StoreError;

/// Largest `limit` a request may ask for.
pub const MAX_LIMIT: usize = 100;
/// Largest explicit track selection.
pub const MAX_SELECTED_TRACKS: usize = 100;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A track as persisted inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub spotify_id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    /// Milliseconds
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl TrackRecord {
    /// Stand-in for a track whose metadata could not be resolved.
    pub fn placeholder(spotify_id: impl Into<String>) -> Self {
        Self {
            spotify_id: spotify_id.into(),
            name: UNKNOWN_TRACK.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            duration: 0,
            album_art: None,
            preview_url: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.name == UNKNOWN_TRACK && self.duration == 0
    }
}

impl From<CandidateTrack> for TrackRecord {
    fn from(track: CandidateTrack) -> Self {
        Self {
            spotify_id: track.id,
            name: track.name,
            artist: track.primary_artist_name,
            album: track.album_name,
            duration: track.duration_ms,
            album_art: track.album_art_url,
            preview_url: track.preview_url,
        }
    }
}

/// What a playlist was generated from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_energy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_valence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
}

/// A persisted playlist.
///
/// `total_duration` always equals the sum of the tracks' durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub tracks: Vec<TrackRecord>,
    pub seed_tracks: Vec<String>,
    pub generation_params: GenerationParams,
    /// Milliseconds
    pub total_duration: u64,
    pub remote_playlist_id: Option<String>,
    pub created_at: String,
}

impl Playlist {
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.spotify_id.clone()).collect()
    }
}

/// A playlist about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlaylist {
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub tracks: Vec<TrackRecord>,
    pub seed_tracks: Vec<String>,
    pub generation_params: GenerationParams,
}

impl NewPlaylist {
    pub fn total_duration(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration).sum()
    }
}

/// Input to [`PlaylistService::generate`](super::PlaylistService::generate).
///
/// Deserializes from the camelCase JSON a routing layer would forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateRequest {
    pub seed_ids: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub limit: Option<usize>,
    pub target_energy: Option<f32>,
    pub target_valence: Option<f32>,
    pub generate_smart_title: bool,
    /// When non-empty, these tracks are used as-is and the seeds are
    /// kept only as provenance.
    pub selected_tracks: Vec<String>,
}

impl GenerateRequest {
    pub fn new(seed_ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            seed_ids: seed_ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn target(&self) -> TargetProfile {
        TargetProfile::new(self.target_energy, self.target_valence)
    }

    pub fn generation_params(&self, genres: Option<Vec<String>>) -> GenerationParams {
        GenerationParams {
            target_energy: self.target_energy,
            target_valence: self.target_valence,
            genres,
        }
    }

    /// Check bounds and return the cleaned seed ids.
    pub fn validate(&self) -> Result<Vec<String>, PlaylistError> {
        if self.seed_ids.is_empty() || self.seed_ids.len() > MAX_SEEDS {
            return Err(PlaylistError::invalid(format!(
                "expected 1 to {MAX_SEEDS} seed tracks, got {}",
                self.seed_ids.len()
            )));
        }
        if let Some(bad) = self
            .seed_ids
            .iter()
            .find(|id| !is_valid_track_id(&clean_track_id(id)))
        {
            return Err(PlaylistError::invalid(format!("invalid seed track id {bad:?}")));
        }
        if let Some(limit) = self.limit.filter(|l| !(1..=MAX_LIMIT).contains(l)) {
            return Err(PlaylistError::invalid(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        for (label, value) in [("energy", self.target_energy), ("valence", self.target_valence)] {
            if let Some(v) = value.filter(|v| !(0.0..=1.0).contains(v)) {
                return Err(PlaylistError::invalid(format!(
                    "target {label} must be within [0, 1], got {v}"
                )));
            }
        }
        if self.selected_tracks.len() > MAX_SELECTED_TRACKS {
            return Err(PlaylistError::invalid(format!(
                "at most {MAX_SELECTED_TRACKS} selected tracks, got {}",
                self.selected_tracks.len()
            )));
        }
        Ok(clean_seed_ids(&self.seed_ids))
    }
}

/// Errors surfaced by the playlist service.
#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No recommendations found, try a different seed track")]
    EmptyRecommendations,

    #[error("Playlist {0} not found")]
    NotFound(i64),

    #[error("Playlist {0} was already exported")]
    AlreadyExported(i64),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to save playlist: {0}")]
    Persistence(#[from] StoreError),
}

impl PlaylistError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
