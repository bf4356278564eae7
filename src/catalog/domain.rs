//! Internal domain models for the music catalog.
//!
//! These types are OUR types - they don't change when the Spotify API changes.
//! All catalog responses get converted into these types via the adapter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Length of a catalog track id (base62).
pub const TRACK_ID_LEN: usize = 22;

/// Maximum number of seeds the native recommendation endpoint accepts.
pub const MAX_SEEDS: usize = 5;

const TRACK_URI_PREFIX: &str = "spotify:track:";
const TRACK_URL_MARKER: &str = "open.spotify.com/track/";

/// A track as returned by any catalog capability.
///
/// Every fallback strategy normalizes into this shape before dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTrack {
    pub id: String,
    pub name: String,
    pub primary_artist_name: String,
    pub artist_id: String,
    pub album_name: String,
    pub album_art_url: Option<String>,
    pub duration_ms: u64,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
}

impl CandidateTrack {
    /// Key used when counting tracks per artist.
    ///
    /// Falls back to the artist name when the catalog omitted the id.
    pub fn artist_key(&self) -> &str {
        if self.artist_id.is_empty() {
            &self.primary_artist_name
        } else {
            &self.artist_id
        }
    }
}

/// Per-track audio analysis values, each in `[0, 1]` except tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub energy: f32,
    pub valence: f32,
    pub danceability: f32,
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub liveness: f32,
    pub speechiness: f32,
    pub tempo: Option<f32>,
}

impl AudioFeatures {
    /// Stand-in used when the catalog restricts a track's analysis.
    pub fn neutral() -> Self {
        Self {
            energy: 0.5,
            valence: 0.5,
            danceability: 0.5,
            acousticness: 0.5,
            instrumentalness: 0.5,
            liveness: 0.5,
            speechiness: 0.5,
            tempo: None,
        }
    }
}

/// Requested energy/valence targets for a generation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub energy: Option<f32>,
    pub valence: Option<f32>,
}

impl TargetProfile {
    pub fn new(energy: Option<f32>, valence: Option<f32>) -> Self {
        Self { energy, valence }
    }

    /// Energy with the neutral default applied.
    pub fn energy_or_neutral(&self) -> f32 {
        self.energy.unwrap_or(0.5)
    }

    /// Valence with the neutral default applied.
    pub fn valence_or_neutral(&self) -> f32 {
        self.valence.unwrap_or(0.5)
    }

    pub fn is_unset(&self) -> bool {
        self.energy.is_none() && self.valence.is_none()
    }
}

/// Parameters for the native recommendation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    /// Cleaned seed ids, at most [`MAX_SEEDS`].
    pub seed_track_ids: Vec<String>,
    pub limit: usize,
    pub target_energy: Option<f32>,
    pub target_valence: Option<f32>,
}

/// What kind of entity a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchKind {
    #[default]
    Track,
    Album,
    Artist,
    Playlist,
}

impl SearchKind {
    /// Value of the `type` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Album => "album",
            SearchKind::Artist => "artist",
            SearchKind::Playlist => "playlist",
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "track" | "tracks" => Ok(SearchKind::Track),
            "album" | "albums" => Ok(SearchKind::Album),
            "artist" | "artists" => Ok(SearchKind::Artist),
            "playlist" | "playlists" => Ok(SearchKind::Playlist),
            other => Err(format!("unknown search kind: {other}")),
        }
    }
}

/// A catalog search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub kind: SearchKind,
    pub limit: usize,
    pub offset: usize,
}

impl SearchQuery {
    /// Track search for `limit` results starting at the first hit.
    pub fn tracks(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            kind: SearchKind::Track,
            limit,
            offset: 0,
        }
    }

    pub fn of_kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub image_url: Option<String>,
    pub total_tracks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub owner_name: Option<String>,
    pub track_count: u32,
}

/// One search hit, tagged by the section of the response it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchItem {
    Track(CandidateTrack),
    Album(AlbumSummary),
    Artist(ArtistSummary),
    Playlist(PlaylistSummary),
}

impl SearchItem {
    pub fn into_track(self) -> Option<CandidateTrack> {
        match self {
            SearchItem::Track(track) => Some(track),
            _ => None,
        }
    }
}

/// Which top items to fetch for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopItemKind {
    Tracks,
    Artists,
}

impl TopItemKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            TopItemKind::Tracks => "tracks",
            TopItemKind::Artists => "artists",
        }
    }
}

/// Listening window for top items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_param(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" | "short_term" => Ok(TimeRange::ShortTerm),
            "medium" | "medium_term" => Ok(TimeRange::MediumTerm),
            "long" | "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!("unknown time range: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TopItem {
    Track(CandidateTrack),
    Artist(ArtistSummary),
}

/// App-level access token obtained via the client-credentials flow.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: Duration,
}

/// Errors raised by the catalog gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized - access token missing or expired")]
    Unauthorized,

    #[error("Rate limited - try again later")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Catalog returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timed out")]
    Timeout,
}

impl CatalogError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::RateLimited { .. } | CatalogError::Network(_) | CatalogError::Timeout => {
                true
            }
            CatalogError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Strip a `spotify:track:` URI prefix or an open.spotify.com URL down to the bare id.
pub fn clean_track_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix(TRACK_URI_PREFIX) {
        return rest.to_string();
    }
    if let Some(pos) = trimmed.find(TRACK_URL_MARKER) {
        let rest = &trimmed[pos + TRACK_URL_MARKER.len()..];
        let end = rest.find(['?', '/', '#']).unwrap_or(rest.len());
        return rest[..end].to_string();
    }
    trimmed.to_string()
}

/// Whether `id` has the shape of a catalog track id.
pub fn is_valid_track_id(id: &str) -> bool {
    id.len() == TRACK_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Clean seed ids, drop empties and duplicates, and cap at [`MAX_SEEDS`].
pub fn clean_seed_ids(raw: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(raw.len().min(MAX_SEEDS));
    for id in raw.iter().map(|s| clean_track_id(s)) {
        if id.is_empty() || cleaned.contains(&id) {
            continue;
        }
        cleaned.push(id);
        if cleaned.len() == MAX_SEEDS {
            break;
        }
    }
    cleaned
}
