//! Search-based heuristic tier.
//!
//! Assembles a track list from three weighted sub-strategies run strictly in
//! order (same artist, inferred genre, mood terms), then dedups and tops up.
//! The mood strategy's diversification reads counts accumulated by the
//! earlier strategies, so the order matters.

use std::collections::HashSet;

use super::heuristics::{
    self, ArtistTally, GENRE_PERCENT, MOOD_PERCENT, SAME_ARTIST_PERCENT,
};
use crate::catalog::{CandidateTrack, CatalogApi, CatalogError, SearchQuery, TargetProfile};

/// Query used to top up a short list.
pub const TOP_UP_QUERY: &str = "year:2024";
const TOP_UP_PAGE_SIZE: usize = 50;
const TOP_UP_MAX_PAGES: usize = 3;

/// Result of the heuristic tier.
#[derive(Debug, Clone)]
pub struct SearchMixResult {
    pub tracks: Vec<CandidateTrack>,
    /// Genres the genre strategy searched for
    pub genres: Vec<String>,
}

/// Accumulator for one heuristic assembly.
pub struct SearchMix<'a> {
    catalog: &'a dyn CatalogApi,
    token: &'a str,
    limit: usize,
    collected: Vec<CandidateTrack>,
    tally: ArtistTally,
    searches: usize,
    last_error: Option<CatalogError>,
    failures: usize,
}

impl<'a> SearchMix<'a> {
    pub fn new(catalog: &'a dyn CatalogApi, token: &'a str, limit: usize) -> Self {
        Self {
            catalog,
            token,
            limit,
            collected: Vec::new(),
            tally: ArtistTally::default(),
            searches: 0,
            last_error: None,
            failures: 0,
        }
    }

    /// Run all sub-strategies against the seed track.
    ///
    /// Fails only when every search issued along the way failed, which the
    /// engine treats as "catalog down" and moves on to the popular tier.
    pub async fn assemble(
        mut self,
        seed: &CandidateTrack,
        target: TargetProfile,
    ) -> Result<SearchMixResult, CatalogError> {
        self.same_artist(seed).await;
        let genres = self.genre(seed).await;
        self.mood(target).await;

        let mut unique = heuristics::dedup_by_id(std::mem::take(&mut self.collected));
        if unique.len() < self.limit {
            self.top_up(&mut unique).await;
        }
        unique.truncate(self.limit);

        if self.searches > 0 && self.failures == self.searches {
            return Err(self.last_error.unwrap_or(CatalogError::Network(
                "all heuristic searches failed".to_string(),
            )));
        }

        Ok(SearchMixResult {
            tracks: unique,
            genres: genres.into_iter().map(String::from).collect(),
        })
    }

    async fn same_artist(&mut self, seed: &CandidateTrack) {
        let quota = heuristics::quota(self.limit, SAME_ARTIST_PERCENT);
        if quota == 0 {
            return;
        }
        let query = format!("artist:\"{}\"", seed.primary_artist_name);
        let mut hits: Vec<_> = self
            .search(SearchQuery::tracks(query, quota * 2))
            .await
            .into_iter()
            .filter(|t| t.id != seed.id)
            .collect();
        heuristics::rank_by_popularity(&mut hits);

        let taken = hits.len().min(quota);
        for track in hits.into_iter().take(quota) {
            self.accept(track);
        }
        tracing::debug!(strategy = "same_artist", quota, taken, "Heuristic strategy done");
    }

    async fn genre(&mut self, seed: &CandidateTrack) -> Vec<&'static str> {
        let quota = heuristics::quota(self.limit, GENRE_PERCENT);
        let genres = heuristics::infer_genres(&seed.name, &seed.primary_artist_name);
        if quota == 0 {
            return genres;
        }
        let per_genre = heuristics::per_bucket(quota, genres.len());

        let mut taken = 0;
        for genre in &genres {
            let hits = self
                .search(SearchQuery::tracks(format!("genre:\"{genre}\""), per_genre))
                .await;
            taken += hits.len();
            for track in hits {
                self.accept(track);
            }
        }
        tracing::debug!(strategy = "genre", ?genres, quota, taken, "Heuristic strategy done");
        genres
    }

    async fn mood(&mut self, target: TargetProfile) {
        let quota = heuristics::quota(self.limit, MOOD_PERCENT);
        if quota == 0 {
            return;
        }
        let terms = heuristics::mood_terms(target);
        let per_term = heuristics::per_bucket(quota, terms.len());

        let mut rejected = 0;
        for term in &terms {
            for track in self.search(SearchQuery::tracks(*term, per_term)).await {
                if self.tally.admits(&track) {
                    self.accept(track);
                } else {
                    rejected += 1;
                }
            }
        }
        tracing::debug!(strategy = "mood", ?terms, quota, rejected, "Heuristic strategy done");
    }

    /// Fill up to `limit` with recent tracks not already present.
    async fn top_up(&mut self, unique: &mut Vec<CandidateTrack>) {
        let mut known: HashSet<String> = unique.iter().map(|t| t.id.clone()).collect();

        for page in 0..TOP_UP_MAX_PAGES {
            if unique.len() >= self.limit {
                break;
            }
            let query =
                SearchQuery::tracks(TOP_UP_QUERY, TOP_UP_PAGE_SIZE).at_offset(page * TOP_UP_PAGE_SIZE);
            let hits = self.search(query).await;
            let exhausted = hits.len() < TOP_UP_PAGE_SIZE;

            for track in hits {
                if unique.len() >= self.limit {
                    break;
                }
                if known.insert(track.id.clone()) {
                    unique.push(track);
                }
            }
            if exhausted {
                break;
            }
        }
    }

    fn accept(&mut self, track: CandidateTrack) {
        self.tally.record(&track);
        self.collected.push(track);
    }

    /// Search, logging and swallowing failures so one strategy can't sink the tier.
    async fn search(&mut self, query: SearchQuery) -> Vec<CandidateTrack> {
        self.searches += 1;
        match self.catalog.search_tracks(self.token, &query).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(query = %query.text, error = %e, "Heuristic search failed");
                self.failures += 1;
                self.last_error = Some(e);
                Vec::new()
            }
        }
    }
}
