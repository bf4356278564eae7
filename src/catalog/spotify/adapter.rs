//! Adapter layer: Convert Spotify DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.
//! Search results are tagged by the response section they came from, so
//! downstream code never has to guess an item's kind from its fields.

use super::dto;
use crate::catalog::domain::{
    AlbumSummary, ArtistSummary, AudioFeatures, CandidateTrack, PlaylistSummary, SearchItem,
    TopItem,
};

/// Convert a track, dropping local/unavailable tracks that carry no id
pub fn to_candidate(track: dto::Track) -> Option<CandidateTrack> {
    let id = track.id?;
    let (artist_name, artist_id) = track
        .artists
        .first()
        .map(|a| (a.name.clone(), a.id.clone().unwrap_or_default()))
        .unwrap_or_default();
    let (album_name, album_art_url) = track
        .album
        .map(|album| (album.name, largest_image(&album.images)))
        .unwrap_or_default();

    Some(CandidateTrack {
        id,
        name: track.name,
        primary_artist_name: artist_name,
        artist_id,
        album_name,
        album_art_url,
        duration_ms: track.duration_ms,
        popularity: track.popularity,
        preview_url: track.preview_url,
    })
}

pub fn to_candidates(tracks: Vec<dto::Track>) -> Vec<CandidateTrack> {
    tracks.into_iter().filter_map(to_candidate).collect()
}

/// Flatten every section of a search response into tagged items
pub fn to_search_items(response: dto::SearchResponse) -> Vec<SearchItem> {
    let mut items = Vec::new();

    if let Some(tracks) = response.tracks {
        items.extend(to_candidates(tracks.items).into_iter().map(SearchItem::Track));
    }
    if let Some(albums) = response.albums {
        items.extend(
            albums
                .items
                .into_iter()
                .filter_map(to_album_summary)
                .map(SearchItem::Album),
        );
    }
    if let Some(artists) = response.artists {
        items.extend(
            artists
                .items
                .into_iter()
                .map(to_artist_summary)
                .map(SearchItem::Artist),
        );
    }
    if let Some(playlists) = response.playlists {
        items.extend(
            playlists
                .items
                .into_iter()
                .flatten()
                .map(to_playlist_summary)
                .map(SearchItem::Playlist),
        );
    }

    items
}

pub fn to_top_tracks(paging: dto::Paging<dto::Track>) -> Vec<TopItem> {
    to_candidates(paging.items)
        .into_iter()
        .map(TopItem::Track)
        .collect()
}

pub fn to_top_artists(paging: dto::Paging<dto::Artist>) -> Vec<TopItem> {
    paging
        .items
        .into_iter()
        .map(to_artist_summary)
        .map(TopItem::Artist)
        .collect()
}

pub fn to_audio_features(features: dto::AudioFeatures) -> AudioFeatures {
    AudioFeatures {
        energy: features.energy,
        valence: features.valence,
        danceability: features.danceability,
        acousticness: features.acousticness,
        instrumentalness: features.instrumentalness,
        liveness: features.liveness,
        speechiness: features.speechiness,
        tempo: features.tempo,
    }
}

fn to_album_summary(album: dto::SimplifiedAlbum) -> Option<AlbumSummary> {
    let image_url = largest_image(&album.images);
    Some(AlbumSummary {
        id: album.id?,
        name: album.name,
        artist_name: album
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default(),
        image_url,
        total_tracks: album.total_tracks,
    })
}

fn to_artist_summary(artist: dto::Artist) -> ArtistSummary {
    ArtistSummary {
        id: artist.id,
        name: artist.name,
        genres: artist.genres,
        popularity: artist.popularity,
    }
}

fn to_playlist_summary(playlist: dto::SimplifiedPlaylist) -> PlaylistSummary {
    PlaylistSummary {
        id: playlist.id,
        name: playlist.name,
        owner_name: playlist.owner.and_then(|o| o.display_name),
        track_count: playlist.tracks.map(|t| t.total).unwrap_or(0),
    }
}

/// Spotify lists images widest first, but not every payload is sorted
fn largest_image(images: &[dto::Image]) -> Option<String> {
    images
        .iter()
        .max_by_key(|img| img.width.unwrap_or(0))
        .map(|img| img.url.clone())
}
