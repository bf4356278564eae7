//! Recommendation fallback engine.
//!
//! Tiers run in a fixed order and the first one producing tracks wins:
//! 1. Native recommendations from the catalog
//! 2. AI-assisted suggestions resolved through catalog search
//! 3. Search-based heuristic assembly ([`SearchMix`])
//! 4. Popular tracks
//!
//! Tiers 1-3 share one overall deadline. Running out of time, or every
//! earlier tier failing, lands on tier 4, which always returns (possibly
//! empty). Catalog failures are logged here and never reach the caller.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::ai;
use super::heuristics;
use super::search_mix::SearchMix;
use crate::catalog::{
    CandidateTrack, CatalogApi, CatalogError, RecommendationRequest, SearchQuery, TargetProfile,
    clean_seed_ids,
};
use crate::textgen::{TextGenError, TextGenerator};

/// Default overall deadline for tiers 1-3.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

/// Last-resort queries, tried in order.
pub const POPULAR_QUERIES: [&str; 2] = ["year:2024 tag:hipster", "top hits"];

/// Largest page the catalog search accepts.
const POPULAR_PAGE_SIZE: usize = 50;

/// A fallback tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Native,
    Ai,
    Heuristic,
    Popular,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Native => "native",
            Tier::Ai => "ai",
            Tier::Heuristic => "heuristic",
            Tier::Popular => "popular",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tiers bounded by the overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundedTier {
    Native,
    Ai,
    Heuristic,
}

impl BoundedTier {
    const ORDER: [BoundedTier; 3] = [BoundedTier::Native, BoundedTier::Ai, BoundedTier::Heuristic];

    fn tier(self) -> Tier {
        match self {
            BoundedTier::Native => Tier::Native,
            BoundedTier::Ai => Tier::Ai,
            BoundedTier::Heuristic => Tier::Heuristic,
        }
    }
}

/// Why a tier produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("text generation failed: {0}")]
    TextGen(#[from] TextGenError),

    #[error("unparsable suggestions: {0}")]
    Unparsable(String),

    #[error("only {resolved} of {requested} suggestions resolved")]
    Insufficient { resolved: usize, requested: usize },
}

/// Tracks produced for a request plus where they came from.
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub tracks: Vec<CandidateTrack>,
    pub tier: Tier,
    /// Genres searched by the heuristic tier, empty otherwise
    pub genres: Vec<String>,
    /// First seed's metadata if a tier looked it up: `None` when no tier
    /// needed it, `Some(None)` when the lookup failed
    pub seed_track: Option<Option<CandidateTrack>>,
}

/// Per-request state shared by the tiers.
struct TierContext<'a> {
    token: &'a str,
    seeds: Vec<String>,
    limit: usize,
    target: TargetProfile,
    /// First seed's metadata, fetched once when a tier first needs it
    seed_track: Option<Option<CandidateTrack>>,
    genres: Vec<String>,
}

#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn CatalogApi>,
    textgen: Option<Arc<dyn TextGenerator>>,
    deadline: Duration,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            textgen: None,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_text_generator(mut self, textgen: Option<Arc<dyn TextGenerator>>) -> Self {
        self.textgen = textgen;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Produce up to `limit` tracks for the seeds.
    ///
    /// Never fails; an empty outcome means every tier came up empty.
    pub async fn get_recommendations(
        &self,
        token: &str,
        seed_ids: &[String],
        limit: usize,
        target: TargetProfile,
    ) -> RecommendationOutcome {
        let mut ctx = TierContext {
            token,
            seeds: clean_seed_ids(seed_ids),
            limit,
            target,
            seed_track: None,
            genres: Vec::new(),
        };

        let bounded = tokio::time::timeout(self.deadline, self.run_bounded_tiers(&mut ctx)).await;
        match bounded {
            Ok(Some(outcome)) => return outcome,
            Ok(None) => {}
            Err(_) => tracing::warn!(
                seed = ctx.seeds.first().map(String::as_str).unwrap_or(""),
                deadline_ms = self.deadline.as_millis() as u64,
                "Recommendation deadline exceeded, falling back to popular tracks"
            ),
        }

        let tracks = self.popular(token, limit).await;
        RecommendationOutcome {
            tracks,
            tier: Tier::Popular,
            genres: Vec::new(),
            seed_track: ctx.seed_track.take(),
        }
    }

    async fn run_bounded_tiers(&self, ctx: &mut TierContext<'_>) -> Option<RecommendationOutcome> {
        let seed_id = ctx.seeds.first().cloned().unwrap_or_default();

        for bounded in BoundedTier::ORDER {
            let tier = bounded.tier();
            let attempt = match bounded {
                BoundedTier::Native => self.native(ctx).await,
                BoundedTier::Ai => self.ai_assisted(ctx).await,
                BoundedTier::Heuristic => self.heuristic(ctx).await,
            };

            match attempt {
                None => tracing::debug!(%tier, seed = %seed_id, "Tier not applicable"),
                Some(Ok(tracks)) if !tracks.is_empty() => {
                    let mut tracks = heuristics::dedup_by_id(tracks);
                    tracks.truncate(ctx.limit);
                    tracing::info!(%tier, seed = %seed_id, count = tracks.len(), "Recommendations ready");
                    let genres = if bounded == BoundedTier::Heuristic {
                        std::mem::take(&mut ctx.genres)
                    } else {
                        Vec::new()
                    };
                    return Some(RecommendationOutcome {
                        tracks,
                        tier,
                        genres,
                        seed_track: ctx.seed_track.clone(),
                    });
                }
                Some(Ok(_)) => tracing::warn!(%tier, seed = %seed_id, "Tier returned no tracks"),
                Some(Err(reason)) => {
                    tracing::warn!(%tier, seed = %seed_id, %reason, "Tier failed, falling back")
                }
            }
        }
        None
    }

    async fn native(&self, ctx: &TierContext<'_>) -> Option<Result<Vec<CandidateTrack>, TierError>> {
        if ctx.seeds.is_empty() {
            return None;
        }
        let request = RecommendationRequest {
            seed_track_ids: ctx.seeds.clone(),
            limit: ctx.limit,
            target_energy: ctx.target.energy,
            target_valence: ctx.target.valence,
        };
        Some(
            self.catalog
                .get_recommendations(ctx.token, &request)
                .await
                .map_err(TierError::from),
        )
    }

    async fn ai_assisted(
        &self,
        ctx: &mut TierContext<'_>,
    ) -> Option<Result<Vec<CandidateTrack>, TierError>> {
        let seed = self.seed_track(ctx).await?;
        let textgen = self.textgen.as_ref()?;
        Some(
            self.resolve_suggestions(textgen.as_ref(), ctx.token, &seed, ctx.limit, ctx.target)
                .await,
        )
    }

    /// Ask for suggestions once and resolve each one sequentially.
    async fn resolve_suggestions(
        &self,
        textgen: &dyn TextGenerator,
        token: &str,
        seed: &CandidateTrack,
        limit: usize,
        target: TargetProfile,
    ) -> Result<Vec<CandidateTrack>, TierError> {
        let prompt = ai::build_prompt(seed, limit, target);
        let raw = textgen.generate_text(&prompt).await?;
        let suggestions =
            ai::parse_suggestions(&raw).map_err(|e| TierError::Unparsable(e.to_string()))?;

        let mut seen: HashSet<String> = HashSet::from([seed.id.clone()]);
        let mut resolved = Vec::with_capacity(limit);
        for suggestion in suggestions.iter().take(limit) {
            let query = SearchQuery::tracks(suggestion.search_query(), 1);
            match self.catalog.search_tracks(token, &query).await {
                Ok(hits) => match hits.into_iter().next() {
                    Some(track) if seen.insert(track.id.clone()) => resolved.push(track),
                    Some(_) => {}
                    None => tracing::debug!(query = %query.text, "No match for suggestion"),
                },
                Err(e) => tracing::debug!(query = %query.text, error = %e, "Suggestion search failed"),
            }
        }

        if resolved.len() * 2 < limit {
            return Err(TierError::Insufficient {
                resolved: resolved.len(),
                requested: limit,
            });
        }
        Ok(resolved)
    }

    async fn heuristic(
        &self,
        ctx: &mut TierContext<'_>,
    ) -> Option<Result<Vec<CandidateTrack>, TierError>> {
        let seed = self.seed_track(ctx).await?;
        let result = SearchMix::new(self.catalog.as_ref(), ctx.token, ctx.limit)
            .assemble(&seed, ctx.target)
            .await;
        Some(match result {
            Ok(mix) => {
                ctx.genres = mix.genres;
                Ok(mix.tracks)
            }
            Err(e) => Err(e.into()),
        })
    }

    async fn popular(&self, token: &str, limit: usize) -> Vec<CandidateTrack> {
        for query in POPULAR_QUERIES {
            match self.popular_pages(token, query, limit).await {
                Ok(tracks) if !tracks.is_empty() => {
                    tracing::info!(tier = %Tier::Popular, query, count = tracks.len(), "Using popular tracks");
                    return tracks;
                }
                Ok(_) => tracing::debug!(query, "Popular query returned nothing"),
                Err(e) => tracing::warn!(tier = %Tier::Popular, query, error = %e, "Popular query failed"),
            }
        }
        Vec::new()
    }

    /// Page through one popular query until `limit` tracks or a short page.
    async fn popular_pages(
        &self,
        token: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let mut tracks: Vec<CandidateTrack> = Vec::new();
        let mut offset = 0;
        while tracks.len() < limit {
            let page_size = (limit - tracks.len()).min(POPULAR_PAGE_SIZE);
            let search = SearchQuery::tracks(query, page_size).at_offset(offset);
            let page = match self.catalog.search_tracks(token, &search).await {
                Ok(page) => page,
                Err(e) if tracks.is_empty() => return Err(e),
                Err(e) => {
                    tracing::debug!(query, offset, error = %e, "Popular page failed, keeping earlier pages");
                    break;
                }
            };
            let fetched = page.len();
            tracks = heuristics::dedup_by_id(tracks.into_iter().chain(page).collect());
            if fetched < page_size {
                break;
            }
            offset += fetched;
        }
        tracks.truncate(limit);
        Ok(tracks)
    }

    /// Fetch the first seed's metadata on first use.
    async fn seed_track(&self, ctx: &mut TierContext<'_>) -> Option<CandidateTrack> {
        if ctx.seed_track.is_none() {
            let fetched = match ctx.seeds.first() {
                Some(id) => match self.catalog.get_track(ctx.token, id).await {
                    Ok(track) => Some(track),
                    Err(e) => {
                        tracing::warn!(seed = %id, error = %e, "Could not load seed track metadata");
                        None
                    }
                },
                None => None,
            };
            ctx.seed_track = Some(fetched);
        }
        ctx.seed_track.clone().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::traits::mocks::MockCatalog;
    use crate::recommend::search_mix::TOP_UP_QUERY;
    use crate::test_utils::{candidate, candidates};
    use crate::textgen::mocks::MockTextGenerator;

    const SEED: &str = "4uLU6hMCjMI75M1A2tKUQC";

    fn seed_track() -> CandidateTrack {
        let mut track = candidate(SEED, "Rick Astley", Some(80));
        track.name = "Never Gonna Give You Up".to_string();
        track
    }

    fn engine(mock: MockCatalog) -> (RecommendationEngine, Arc<MockCatalog>) {
        let mock = Arc::new(mock);
        (RecommendationEngine::new(mock.clone()), mock)
    }

    fn seeds() -> Vec<String> {
        vec![SEED.to_string()]
    }

    #[tokio::test]
    async fn test_native_success_short_circuits() {
        let (engine, mock) =
            engine(MockCatalog::new().with_recommendations(candidates("rec", "Various", 20)));

        let outcome = engine
            .get_recommendations("tok", &seeds(), 20, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Native);
        assert_eq!(outcome.tracks.len(), 20);
        let unique: HashSet<_> = outcome.tracks.iter().map(|t| &t.id).collect();
        assert_eq!(unique.len(), 20);
        assert_eq!(mock.calls(), vec![format!("recommendations:{SEED}")]);
    }

    #[tokio::test]
    async fn test_native_call_cleans_and_caps_seeds() {
        let (engine, mock) =
            engine(MockCatalog::new().with_recommendations(candidates("rec", "Various", 5)));
        let raw: Vec<String> = (0..7).map(|i| format!("spotify:track:seed{i}")).collect();

        engine
            .get_recommendations("tok", &raw, 5, TargetProfile::default())
            .await;

        assert_eq!(
            mock.calls()[0],
            "recommendations:seed0,seed1,seed2,seed3,seed4"
        );
    }

    #[tokio::test]
    async fn test_native_request_carries_only_set_targets() {
        let (engine, mock) =
            engine(MockCatalog::new().with_recommendations(candidates("rec", "Various", 5)));

        engine
            .get_recommendations("tok", &seeds(), 5, TargetProfile::default())
            .await;
        engine
            .get_recommendations("tok", &seeds(), 5, TargetProfile::new(Some(0.8), Some(0.3)))
            .await;

        let requests = mock.recommendation_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].target_energy, None);
        assert_eq!(requests[0].target_valence, None);
        assert_eq!(requests[1].target_energy, Some(0.8));
        assert_eq!(requests[1].target_valence, Some(0.3));
        assert_eq!(requests[1].limit, 5);
        assert_eq!(requests[1].seed_track_ids, seeds());
    }

    #[tokio::test]
    async fn test_outcome_carries_seed_lookup() {
        let (engine, mock) = engine(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search(TOP_UP_QUERY, candidates("y", "Artist Y", 60)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 10, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Heuristic);
        assert_eq!(outcome.seed_track, Some(Some(seed_track())));
        assert_eq!(mock.calls().iter().filter(|c| c.starts_with("track:")).count(), 1);

        // Native answers without needing the seed
        let native = RecommendationEngine::new(Arc::new(
            MockCatalog::new().with_recommendations(candidates("rec", "Various", 5)),
        ));
        let outcome = native
            .get_recommendations("tok", &seeds(), 5, TargetProfile::default())
            .await;
        assert_eq!(outcome.seed_track, None);
    }

    #[tokio::test]
    async fn test_without_ai_falls_to_heuristic() {
        let (engine, mock) = engine(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search("artist:\"Rick Astley\"", candidates("ra", "Rick Astley", 10))
                .with_search(TOP_UP_QUERY, candidates("y", "Artist Y", 60)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 20, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Heuristic);
        assert_eq!(outcome.tracks.len(), 20);
        assert_eq!(outcome.genres, vec!["pop", "rock"]);
        assert!(!mock.searched(POPULAR_QUERIES[0]));
    }

    #[tokio::test]
    async fn test_ai_tier_resolves_suggestions() {
        let suggestions = r#"[
            {"title": "Take On Me", "artist": "a-ha"},
            {"title": "Missing Song", "artist": "Nobody"},
            {"title": "Africa", "artist": "Toto"}
        ]"#;
        let textgen = Arc::new(MockTextGenerator::replying(suggestions));
        let mock = Arc::new(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search("track:Take On Me artist:a-ha", vec![candidate("aha", "a-ha", Some(85))])
                .with_search("track:Africa artist:Toto", vec![candidate("toto", "Toto", Some(84))]),
        );
        let engine = RecommendationEngine::new(mock.clone()).with_text_generator(Some(textgen.clone()));

        let outcome = engine
            .get_recommendations("tok", &seeds(), 3, TargetProfile::new(Some(0.9), None))
            .await;

        assert_eq!(outcome.tier, Tier::Ai);
        let ids: Vec<_> = outcome.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["aha", "toto"]);
        assert_eq!(textgen.call_count(), 1);
        assert!(textgen.last_prompt().unwrap().contains("high-energy, upbeat"));
        // Suggestions are looked up one by one, in order
        let calls = mock.calls();
        let searches: Vec<_> = calls.iter().filter(|c| c.starts_with("search:")).collect();
        assert_eq!(searches.len(), 3);
        assert_eq!(searches[0], "search:track:Take On Me artist:a-ha");
    }

    #[tokio::test]
    async fn test_ai_tier_insufficient_falls_through() {
        let suggestions = r#"[
            {"title": "A", "artist": "1"}, {"title": "B", "artist": "2"},
            {"title": "C", "artist": "3"}, {"title": "D", "artist": "4"}
        ]"#;
        let textgen = Arc::new(MockTextGenerator::replying(suggestions));
        let mock = Arc::new(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search("track:A artist:1", vec![candidate("a", "1", None)])
                .with_search(TOP_UP_QUERY, candidates("y", "Artist Y", 10)),
        );
        let engine = RecommendationEngine::new(mock.clone()).with_text_generator(Some(textgen));

        // 1 of 4 resolved is below half
        let outcome = engine
            .get_recommendations("tok", &seeds(), 4, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Heuristic);
        assert!(mock.searched("artist:\"Rick Astley\""));
    }

    #[tokio::test]
    async fn test_ai_unparsable_output_falls_through_without_retry() {
        let textgen = Arc::new(MockTextGenerator::replying("I'd suggest some Toto."));
        let mock = Arc::new(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search(TOP_UP_QUERY, candidates("y", "Artist Y", 10)),
        );
        let engine = RecommendationEngine::new(mock.clone()).with_text_generator(Some(textgen.clone()));

        let outcome = engine
            .get_recommendations("tok", &seeds(), 5, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Heuristic);
        assert_eq!(textgen.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ai_error_falls_through() {
        let textgen = Arc::new(MockTextGenerator::failing(TextGenError::Network("down".into())));
        let mock = Arc::new(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search(TOP_UP_QUERY, candidates("y", "Artist Y", 10)),
        );
        let engine = RecommendationEngine::new(mock).with_text_generator(Some(textgen.clone()));

        let outcome = engine
            .get_recommendations("tok", &seeds(), 5, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Heuristic);
        assert_eq!(textgen.call_count(), 1);
    }

    #[tokio::test]
    async fn test_catalog_down_uses_popular_tier() {
        let (engine, _mock) = engine(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search_error(CatalogError::Network("connection refused".into())),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 10, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Popular);
        assert!(outcome.tracks.is_empty());
    }

    #[tokio::test]
    async fn test_heuristic_failure_invokes_popular_queries() {
        let mut mock = MockCatalog::new().with_track(seed_track());
        for query in [
            "artist:\"Rick Astley\"",
            "genre:\"pop\"",
            "genre:\"rock\"",
            "popular",
            "trending",
            "hits",
            TOP_UP_QUERY,
            POPULAR_QUERIES[0],
        ] {
            mock = mock.with_failing_query(query);
        }
        let mock = mock.with_search("top hits", candidates("hit", "Star", 7));
        let (engine, mock) = engine(mock);

        let outcome = engine
            .get_recommendations("tok", &seeds(), 5, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Popular);
        assert_eq!(outcome.tracks.len(), 5);
        assert!(mock.searched(POPULAR_QUERIES[0]));
        assert!(mock.searched(POPULAR_QUERIES[1]));
    }

    #[tokio::test]
    async fn test_popular_tier_pages_past_search_limit() {
        let (engine, mock) = engine(
            MockCatalog::new().with_search(POPULAR_QUERIES[0], candidates("pop", "Star", 120)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 80, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Popular);
        assert_eq!(outcome.tracks.len(), 80);
        let unique: HashSet<_> = outcome.tracks.iter().map(|t| &t.id).collect();
        assert_eq!(unique.len(), 80);
        let popular_searches = mock
            .calls()
            .iter()
            .filter(|c| *c == &format!("search:{}", POPULAR_QUERIES[0]))
            .count();
        assert_eq!(popular_searches, 2);
        assert!(!mock.searched(POPULAR_QUERIES[1]));
    }

    #[tokio::test]
    async fn test_popular_tier_stops_on_short_page() {
        let (engine, mock) = engine(
            MockCatalog::new().with_search(POPULAR_QUERIES[0], candidates("pop", "Star", 60)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 100, TargetProfile::default())
            .await;

        assert_eq!(outcome.tracks.len(), 60);
        let popular_searches = mock
            .calls()
            .iter()
            .filter(|c| *c == &format!("search:{}", POPULAR_QUERIES[0]))
            .count();
        assert_eq!(popular_searches, 2);
    }

    #[tokio::test]
    async fn test_missing_seed_metadata_skips_to_popular() {
        let (engine, mock) = engine(
            MockCatalog::new().with_search(POPULAR_QUERIES[0], candidates("pop", "Star", 3)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 10, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Popular);
        assert_eq!(outcome.tracks.len(), 3);
        // The seed is fetched once even though two tiers needed it
        let fetches = mock.calls().iter().filter(|c| c.starts_with("track:")).count();
        assert_eq!(fetches, 1);
    }

    #[tokio::test]
    async fn test_graceful_degradation_never_exceeds_limit() {
        let (engine, _mock) = engine(
            MockCatalog::new()
                .with_track(seed_track())
                .with_search("popular", candidates("p", "Artist P", 40)),
        );

        let outcome = engine
            .get_recommendations("tok", &seeds(), 12, TargetProfile::default())
            .await;

        assert!(!outcome.tracks.is_empty());
        assert!(outcome.tracks.len() <= 12);
    }

    /// Catalog that never answers recommendation requests.
    struct StalledCatalog(MockCatalog);

    #[async_trait::async_trait]
    impl CatalogApi for StalledCatalog {
        async fn search(
            &self,
            token: &str,
            query: &SearchQuery,
        ) -> Result<Vec<crate::catalog::SearchItem>, CatalogError> {
            self.0.search(token, query).await
        }
        async fn get_track(&self, token: &str, id: &str) -> Result<CandidateTrack, CatalogError> {
            self.0.get_track(token, id).await
        }
        async fn fetch_audio_features(
            &self,
            token: &str,
            id: &str,
        ) -> Result<crate::catalog::AudioFeatures, CatalogError> {
            self.0.fetch_audio_features(token, id).await
        }
        async fn get_recommendations(
            &self,
            _token: &str,
            _request: &RecommendationRequest,
        ) -> Result<Vec<CandidateTrack>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
        async fn get_top_items(
            &self,
            token: &str,
            kind: crate::catalog::TopItemKind,
            time_range: crate::catalog::TimeRange,
            limit: usize,
        ) -> Result<Vec<crate::catalog::TopItem>, CatalogError> {
            self.0.get_top_items(token, kind, time_range, limit).await
        }
        async fn create_remote_playlist(
            &self,
            token: &str,
            name: &str,
            description: &str,
            track_ids: &[String],
        ) -> Result<String, CatalogError> {
            self.0
                .create_remote_playlist(token, name, description, track_ids)
                .await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_short_circuits_to_popular() {
        let stalled = StalledCatalog(
            MockCatalog::new().with_search(POPULAR_QUERIES[0], candidates("pop", "Star", 4)),
        );
        let engine = RecommendationEngine::new(Arc::new(stalled)).with_deadline(Duration::from_secs(1));

        let outcome = engine
            .get_recommendations("tok", &seeds(), 10, TargetProfile::default())
            .await;

        assert_eq!(outcome.tier, Tier::Popular);
        assert_eq!(outcome.tracks.len(), 4);
    }
}
