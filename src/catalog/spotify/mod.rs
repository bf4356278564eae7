//! Spotify Web API integration
//!
//! Implements [`CatalogApi`](crate::catalog::CatalogApi) against the Spotify
//! Web API: search, track lookup, audio features, recommendations, top items
//! and playlist creation.
//!
//! API docs: https://developer.spotify.com/documentation/web-api

pub mod dto;
mod adapter;
mod client;
mod retry;

pub use client::{DEFAULT_API_BASE, DEFAULT_AUTH_URL, SpotifyClient};
pub use retry::RetryPolicy;
