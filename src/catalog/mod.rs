//! Music catalog gateway - the only way the rest of the crate reaches Spotify.
//!
//! # Architecture
//!
//! - **Domain models** (`domain.rs`) - Internal types used by the engine and service
//! - **Trait** (`traits.rs`) - [`CatalogApi`], one method per catalog capability
//! - **Spotify** (`spotify/`) - DTOs, adapter and HTTP client for the Web API
//!
//! Every failure crossing this boundary is a typed [`CatalogError`].
//!
//! # Usage
//!
//! ```ignore
//! use seedmix::catalog::{CatalogApi, SearchQuery, SpotifyClient};
//!
//! let client = SpotifyClient::new()?;
//! let hits = client.search_tracks(&token, &SearchQuery::tracks("artist:\"Bonobo\"", 10)).await?;
//! ```

pub mod domain;
pub mod spotify;
pub mod traits;

pub use domain::{
    AccessToken, AlbumSummary, ArtistSummary, AudioFeatures, CandidateTrack, CatalogError, MAX_SEEDS,
    PlaylistSummary, RecommendationRequest, SearchItem, SearchKind, SearchQuery, TargetProfile,
    TimeRange, TopItem, TopItemKind, clean_seed_ids, clean_track_id, is_valid_track_id,
};
pub use spotify::{RetryPolicy, SpotifyClient};
pub use traits::CatalogApi;
