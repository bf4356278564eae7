//! Playlist assembly service.
//!
//! Orchestrates the recommendation engine, metadata resolution, naming and
//! persistence for one generation request. Catalog and naming failures are
//! recovered here; only request validation, empty recommendations,
//! persistence and read/export errors reach the caller.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::model::{
    GenerateRequest, MAX_LIMIT, MAX_SELECTED_TRACKS, NewPlaylist, Playlist, PlaylistError, TrackRecord,
};
use super::store::PlaylistStore;
use crate::catalog::{
    CandidateTrack, CatalogApi, TargetProfile, clean_seed_ids, clean_track_id,
};
use crate::naming::{self, TitleGenerator};
use crate::recommend::RecommendationEngine;
use crate::textgen::TextGenerator;

/// Tracks requested when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 20;

/// Name used when neither the caller nor the seed provides one.
pub const FALLBACK_NAME: &str = "Generated Playlist";

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub struct PlaylistService {
    catalog: Arc<dyn CatalogApi>,
    textgen: Option<Arc<dyn TextGenerator>>,
    store: Arc<dyn PlaylistStore>,
    engine: RecommendationEngine,
    titles: Mutex<TitleGenerator<StdRng>>,
    clock: fn() -> NaiveDateTime,
    default_limit: usize,
}

impl PlaylistService {
    pub fn new(catalog: Arc<dyn CatalogApi>, store: Arc<dyn PlaylistStore>) -> Self {
        Self {
            engine: RecommendationEngine::new(catalog.clone()),
            catalog,
            textgen: None,
            store,
            titles: Mutex::new(TitleGenerator::new(StdRng::from_os_rng())),
            clock: local_now,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Enable AI recommendations and AI naming.
    pub fn with_text_generator(mut self, textgen: Option<Arc<dyn TextGenerator>>) -> Self {
        self.engine = self.engine.with_text_generator(textgen.clone());
        self.textgen = textgen;
        self
    }

    /// Overall deadline for the recommendation tiers.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.engine = self.engine.with_deadline(deadline);
        self
    }

    /// Track count used when a request leaves `limit` unset, clamped to `1..=MAX_LIMIT`.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        let clamped = limit.clamp(1, MAX_LIMIT);
        if clamped != limit {
            tracing::warn!(configured = limit, using = clamped, "Default playlist limit out of range");
        }
        self.default_limit = clamped;
        self
    }

    /// Pin template selection.
    pub fn with_rng(self, rng: StdRng) -> Self {
        *self.titles.lock() = TitleGenerator::new(rng);
        self
    }

    /// Pin the clock used for time-of-day and season labels.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Generate and persist a playlist from seed tracks.
    ///
    /// A non-empty `selected_tracks` skips the engine entirely.
    pub async fn generate(
        &self,
        token: &str,
        owner_id: &str,
        request: &GenerateRequest,
    ) -> Result<Playlist, PlaylistError> {
        let seeds = request.validate()?;
        if !request.selected_tracks.is_empty() {
            return self
                .create_with_explicit_tracks(token, owner_id, &request.selected_tracks, request)
                .await;
        }

        let limit = request.limit.unwrap_or(self.default_limit);
        let target = request.target();
        let outcome = self
            .engine
            .get_recommendations(token, &seeds, limit, target)
            .await;

        if outcome.tracks.is_empty() {
            tracing::warn!(
                seed = seeds.first().map(String::as_str).unwrap_or(""),
                "Every recommendation tier came up empty"
            );
            return Err(PlaylistError::EmptyRecommendations);
        }
        tracing::info!(tier = %outcome.tier, count = outcome.tracks.len(), "Recommendations resolved");

        let seed_track = match outcome.seed_track {
            Some(looked_up) => looked_up,
            None => match outcome.tracks.iter().find(|t| Some(&t.id) == seeds.first()) {
                Some(track) => Some(track.clone()),
                None => self.seed_metadata(token, &seeds).await,
            },
        };
        let genres = (!outcome.genres.is_empty()).then_some(outcome.genres);
        let tracks: Vec<TrackRecord> = outcome.tracks.into_iter().map(TrackRecord::from).collect();

        let (name, description) = self
            .name_playlist(seed_track.as_ref(), tracks.len(), target, request)
            .await;

        self.persist(NewPlaylist {
            owner_id: owner_id.to_string(),
            name,
            description,
            tracks,
            seed_tracks: seeds,
            generation_params: request.generation_params(genres),
        })
        .await
    }

    /// Persist a caller-curated track list.
    ///
    /// Tracks whose metadata can't be fetched become placeholders instead of
    /// failing the request. `request`'s seeds and targets are kept as
    /// provenance only.
    pub async fn create_with_explicit_tracks(
        &self,
        token: &str,
        owner_id: &str,
        track_ids: &[String],
        request: &GenerateRequest,
    ) -> Result<Playlist, PlaylistError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = track_ids
            .iter()
            .map(|id| clean_track_id(id))
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        if ids.is_empty() {
            return Err(PlaylistError::invalid("no tracks selected"));
        }
        if ids.len() > MAX_SELECTED_TRACKS {
            return Err(PlaylistError::invalid(format!(
                "at most {MAX_SELECTED_TRACKS} selected tracks, got {}",
                ids.len()
            )));
        }

        let mut resolved: Vec<CandidateTrack> = Vec::with_capacity(ids.len());
        let mut tracks = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.catalog.get_track(token, id).await {
                Ok(track) => {
                    tracks.push(TrackRecord::from(track.clone()));
                    resolved.push(track);
                }
                Err(e) => {
                    tracing::warn!(track_id = %id, error = %e, "Track metadata unavailable, using placeholder");
                    tracks.push(TrackRecord::placeholder(id.clone()));
                }
            }
        }

        let seeds = clean_seed_ids(&request.seed_ids);
        let seed_track = match seeds.first() {
            Some(first) => match resolved.iter().find(|t| &t.id == first) {
                Some(track) => Some(track.clone()),
                None => self.seed_metadata(token, &seeds).await,
            },
            None => resolved.first().cloned(),
        };

        let (name, description) = self
            .name_playlist(seed_track.as_ref(), tracks.len(), request.target(), request)
            .await;

        self.persist(NewPlaylist {
            owner_id: owner_id.to_string(),
            name,
            description,
            tracks,
            seed_tracks: seeds,
            generation_params: request.generation_params(None),
        })
        .await
    }

    /// The owner's playlists, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Playlist>, PlaylistError> {
        Ok(self.store.find_by_owner(owner_id).await?)
    }

    pub async fn get(&self, id: i64, owner_id: &str) -> Result<Playlist, PlaylistError> {
        self.store
            .find_one(id, owner_id)
            .await?
            .ok_or(PlaylistError::NotFound(id))
    }

    pub async fn delete(&self, id: i64, owner_id: &str) -> Result<(), PlaylistError> {
        if self.store.delete_one(id, owner_id).await? {
            tracing::info!(playlist_id = id, "Deleted playlist");
            Ok(())
        } else {
            Err(PlaylistError::NotFound(id))
        }
    }

    /// Push a stored playlist to the catalog and record the remote id.
    ///
    /// Does not re-run generation. A playlist can be exported once.
    pub async fn export(
        &self,
        token: &str,
        id: i64,
        owner_id: &str,
    ) -> Result<Playlist, PlaylistError> {
        let mut playlist = self.get(id, owner_id).await?;
        if playlist.remote_playlist_id.is_some() {
            return Err(PlaylistError::AlreadyExported(id));
        }

        let remote_id = self
            .catalog
            .create_remote_playlist(
                token,
                &playlist.name,
                &playlist.description,
                &playlist.track_ids(),
            )
            .await?;

        if !self.store.set_remote_id(id, owner_id, &remote_id).await? {
            return Err(PlaylistError::AlreadyExported(id));
        }
        tracing::info!(playlist_id = id, remote_id = %remote_id, "Exported playlist");
        playlist.remote_playlist_id = Some(remote_id);
        Ok(playlist)
    }

    async fn seed_metadata(&self, token: &str, seeds: &[String]) -> Option<CandidateTrack> {
        let first = seeds.first()?;
        match self.catalog.get_track(token, first).await {
            Ok(track) => Some(track),
            Err(e) => {
                tracing::warn!(seed = %first, error = %e, "Seed metadata unavailable for naming");
                None
            }
        }
    }

    /// Name and description for a playlist of `track_count` tracks.
    ///
    /// Smart titles try the text generator, then templates; without a seed
    /// track the caller's values (or defaults) are used.
    async fn name_playlist(
        &self,
        seed: Option<&CandidateTrack>,
        track_count: usize,
        target: TargetProfile,
        request: &GenerateRequest,
    ) -> (String, String) {
        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| match seed {
                Some(seed) => format!("Mix: {}", seed.name),
                None => FALLBACK_NAME.to_string(),
            });
        let description = request.description.clone().unwrap_or_else(|| match seed {
            Some(seed) => format!("Generated from {} by {}", seed.name, seed.primary_artist_name),
            None => String::new(),
        });

        if !request.generate_smart_title {
            return (name, description);
        }
        let Some(seed) = seed else {
            tracing::warn!("No seed metadata for smart title, keeping supplied name");
            return (name, description);
        };

        let now = (self.clock)();
        if let Some(textgen) = &self.textgen {
            match naming::generate_with_ai(textgen.as_ref(), seed, track_count, target, now).await {
                Ok(named) => {
                    let description = if named.description.is_empty() {
                        self.titles.lock().description(seed, track_count, target, now)
                    } else {
                        named.description
                    };
                    return (named.name, description);
                }
                Err(e) => tracing::warn!(error = %e, "AI naming failed, using templates"),
            }
        }

        let named = self.titles.lock().name(seed, track_count, target, now);
        (named.name, named.description)
    }

    async fn persist(&self, playlist: NewPlaylist) -> Result<Playlist, PlaylistError> {
        let owner = playlist.owner_id.clone();
        match self.store.insert(playlist).await {
            Ok(stored) => {
                tracing::info!(
                    playlist_id = stored.id,
                    owner = %owner,
                    tracks = stored.tracks.len(),
                    "Saved playlist"
                );
                Ok(stored)
            }
            Err(e) => {
                tracing::error!(owner = %owner, error = %e, "Failed to save playlist");
                Err(PlaylistError::Persistence(e))
            }
        }
    }
}
