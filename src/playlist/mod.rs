//! Playlist assembly and persistence.
//!
//! # Architecture
//!
//! - **Model** (`model.rs`) - Persisted records, requests, [`PlaylistError`]
//! - **Store** (`store.rs`) - [`PlaylistStore`] trait and its SQLite implementation
//! - **Service** (`service.rs`) - [`PlaylistService`], the entry point for
//!   generation, explicit track lists, reads and export
//!
//! # Usage
//!
//! ```ignore
//! use seedmix::playlist::{GenerateRequest, PlaylistService, SqlitePlaylistStore};
//!
//! let service = PlaylistService::new(catalog, Arc::new(SqlitePlaylistStore::new(pool)));
//! let playlist = service.generate(&token, "local", &GenerateRequest::new([seed_id])).await?;
//! ```

pub mod model;
pub mod service;
pub mod store;

pub use model::{
    GenerateRequest, GenerationParams, NewPlaylist, Playlist, PlaylistError, TrackRecord,
};
pub use service::{DEFAULT_LIMIT, PlaylistService};
pub use store::{PlaylistStore, SqlitePlaylistStore};
