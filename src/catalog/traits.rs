//! Trait definition for the external music catalog.
//!
//! The engine and the playlist service only ever talk to [`CatalogApi`].
//! Production code uses [`SpotifyClient`](super::spotify::SpotifyClient),
//! while tests substitute the mock implementation below.

use async_trait::async_trait;

use super::domain::{
    AudioFeatures, CandidateTrack, CatalogError, RecommendationRequest, SearchItem, SearchQuery,
    TimeRange, TopItem, TopItemKind,
};

/// One method per catalog capability.
///
/// Every method takes the caller-supplied access token.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search the catalog.
    async fn search(
        &self,
        token: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchItem>, CatalogError>;

    /// Fetch full metadata for one track.
    async fn get_track(&self, token: &str, id: &str) -> Result<CandidateTrack, CatalogError>;

    /// Fetch audio features exactly as the catalog reports them.
    ///
    /// Callers should use [`CatalogApi::get_audio_features`] instead.
    async fn fetch_audio_features(
        &self,
        token: &str,
        id: &str,
    ) -> Result<AudioFeatures, CatalogError>;

    /// Native recommendations for the given seeds.
    async fn get_recommendations(
        &self,
        token: &str,
        request: &RecommendationRequest,
    ) -> Result<Vec<CandidateTrack>, CatalogError>;

    /// The current user's top tracks or artists.
    async fn get_top_items(
        &self,
        token: &str,
        kind: TopItemKind,
        time_range: TimeRange,
        limit: usize,
    ) -> Result<Vec<TopItem>, CatalogError>;

    /// Create a playlist on the catalog side and return its id.
    async fn create_remote_playlist(
        &self,
        token: &str,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<String, CatalogError>;

    /// Audio features, with restricted tracks reported as neutral.
    ///
    /// Audio features are frequently unavailable per track, so "not found"
    /// and "forbidden" yield [`AudioFeatures::neutral`] rather than an error.
    async fn get_audio_features(
        &self,
        token: &str,
        id: &str,
    ) -> Result<AudioFeatures, CatalogError> {
        match self.fetch_audio_features(token, id).await {
            Err(CatalogError::NotFound(_) | CatalogError::Forbidden(_)) => {
                tracing::debug!(track_id = id, "Audio features restricted, using neutral defaults");
                Ok(AudioFeatures::neutral())
            }
            other => other,
        }
    }

    /// Track search returning only track hits.
    async fn search_tracks(
        &self,
        token: &str,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let items = self.search(token, query).await?;
        Ok(items.into_iter().filter_map(SearchItem::into_track).collect())
    }
}

/// Mock catalog for testing.
///
/// Returns canned responses keyed by query text and records every call so
/// tests can assert which fallback tiers ran.
#[cfg(test)]
pub mod mocks {
    use std::collections::{HashMap, HashSet};

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MockCatalog {
        /// Tracks returned by `get_track`
        pub tracks: HashMap<String, CandidateTrack>,
        /// Search hits keyed by exact query text
        pub search_results: HashMap<String, Vec<SearchItem>>,
        /// Native recommendations (`None` = endpoint fails)
        pub recommendations: Option<Vec<CandidateTrack>>,
        /// Audio features keyed by track id
        pub features: HashMap<String, AudioFeatures>,
        /// Error for every audio features lookup
        pub features_error: Option<CatalogError>,
        /// Top items for the current user
        pub top_items: Vec<TopItem>,
        /// Error for every search (takes precedence over results)
        pub search_error: Option<CatalogError>,
        /// Queries that fail individually
        pub failing_queries: HashSet<String>,
        /// Id returned by `create_remote_playlist` (`None` = fails)
        pub remote_playlist_id: Option<String>,
        calls: Mutex<Vec<String>>,
        recommendation_requests: Mutex<Vec<RecommendationRequest>>,
    }

    impl MockCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_track(mut self, track: CandidateTrack) -> Self {
            self.tracks.insert(track.id.clone(), track);
            self
        }

        pub fn with_search(mut self, query: &str, tracks: Vec<CandidateTrack>) -> Self {
            self.search_results.insert(
                query.to_string(),
                tracks.into_iter().map(SearchItem::Track).collect(),
            );
            self
        }

        pub fn with_search_items(mut self, query: &str, items: Vec<SearchItem>) -> Self {
            self.search_results.insert(query.to_string(), items);
            self
        }

        pub fn with_recommendations(mut self, tracks: Vec<CandidateTrack>) -> Self {
            self.recommendations = Some(tracks);
            self
        }

        pub fn with_search_error(mut self, error: CatalogError) -> Self {
            self.search_error = Some(error);
            self
        }

        pub fn with_failing_query(mut self, query: &str) -> Self {
            self.failing_queries.insert(query.to_string());
            self
        }

        pub fn with_remote_playlist_id(mut self, id: &str) -> Self {
            self.remote_playlist_id = Some(id.to_string());
            self
        }

        /// Every call made so far, in order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        /// Every native recommendation request, in order.
        pub fn recommendation_requests(&self) -> Vec<RecommendationRequest> {
            self.recommendation_requests.lock().clone()
        }

        pub fn searched(&self, query: &str) -> bool {
            self.calls
                .lock()
                .iter()
                .any(|c| c == &format!("search:{query}"))
        }

        pub fn search_count(&self) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|c| c.starts_with("search:"))
                .count()
        }

        fn record(&self, call: String) {
            self.calls.lock().push(call);
        }
    }

    #[async_trait]
    impl CatalogApi for MockCatalog {
        async fn search(
            &self,
            _token: &str,
            query: &SearchQuery,
        ) -> Result<Vec<SearchItem>, CatalogError> {
            self.record(format!("search:{}", query.text));
            if let Some(ref err) = self.search_error {
                return Err(err.clone());
            }
            if self.failing_queries.contains(&query.text) {
                return Err(CatalogError::Upstream {
                    status: 500,
                    message: format!("mock failure for {}", query.text),
                });
            }
            Ok(self
                .search_results
                .get(&query.text)
                .map(|items| {
                    items
                        .iter()
                        .skip(query.offset)
                        .take(query.limit)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn get_track(&self, _token: &str, id: &str) -> Result<CandidateTrack, CatalogError> {
            self.record(format!("track:{id}"));
            self.tracks
                .get(id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("track {id}")))
        }

        async fn fetch_audio_features(
            &self,
            _token: &str,
            id: &str,
        ) -> Result<AudioFeatures, CatalogError> {
            self.record(format!("features:{id}"));
            if let Some(ref err) = self.features_error {
                return Err(err.clone());
            }
            self.features
                .get(id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("audio features {id}")))
        }

        async fn get_recommendations(
            &self,
            _token: &str,
            request: &RecommendationRequest,
        ) -> Result<Vec<CandidateTrack>, CatalogError> {
            self.record(format!("recommendations:{}", request.seed_track_ids.join(",")));
            self.recommendation_requests.lock().push(request.clone());
            match self.recommendations {
                Some(ref tracks) => Ok(tracks.iter().take(request.limit).cloned().collect()),
                None => Err(CatalogError::NotFound("recommendations".to_string())),
            }
        }

        async fn get_top_items(
            &self,
            _token: &str,
            kind: TopItemKind,
            _time_range: TimeRange,
            limit: usize,
        ) -> Result<Vec<TopItem>, CatalogError> {
            self.record(format!("top:{}", kind.as_path()));
            Ok(self.top_items.iter().take(limit).cloned().collect())
        }

        async fn create_remote_playlist(
            &self,
            _token: &str,
            name: &str,
            _description: &str,
            track_ids: &[String],
        ) -> Result<String, CatalogError> {
            self.record(format!("create_playlist:{name}:{}", track_ids.len()));
            self.remote_playlist_id
                .clone()
                .ok_or(CatalogError::Unauthorized)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::candidate;

        #[tokio::test]
        async fn test_forbidden_features_are_neutral() {
            let mock = MockCatalog {
                features_error: Some(CatalogError::Forbidden("restricted".into())),
                ..Default::default()
            };
            let features = mock.get_audio_features("tok", "any").await.unwrap();
            assert_eq!(features, AudioFeatures::neutral());
        }

        #[tokio::test]
        async fn test_missing_features_are_neutral() {
            let mock = MockCatalog::new();
            let features = mock.get_audio_features("tok", "missing").await.unwrap();
            assert_eq!(features, AudioFeatures::neutral());
        }

        #[tokio::test]
        async fn test_other_feature_errors_propagate() {
            let mock = MockCatalog {
                features_error: Some(CatalogError::Unauthorized),
                ..Default::default()
            };
            let result = mock.get_audio_features("tok", "any").await;
            assert!(matches!(result, Err(CatalogError::Unauthorized)));
        }

        #[tokio::test]
        async fn test_search_tracks_filters_other_kinds() {
            let mock = MockCatalog::new().with_search_items(
                "q",
                vec![
                    SearchItem::Track(candidate("t1", "A", None)),
                    SearchItem::Artist(crate::catalog::domain::ArtistSummary {
                        id: "a1".into(),
                        name: "A".into(),
                        genres: vec![],
                        popularity: None,
                    }),
                ],
            );
            let tracks = mock
                .search_tracks("tok", &SearchQuery::tracks("q", 10))
                .await
                .unwrap();
            assert_eq!(tracks.len(), 1);
            assert_eq!(tracks[0].id, "t1");
        }

        #[tokio::test]
        async fn test_search_honours_offset_and_limit() {
            let tracks = (0..5)
                .map(|i| candidate(&format!("t{i}"), "A", None))
                .collect();
            let mock = MockCatalog::new().with_search("q", tracks);
            let page = mock
                .search_tracks("tok", &SearchQuery::tracks("q", 2).at_offset(2))
                .await
                .unwrap();
            let ids: Vec<_> = page.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, vec!["t2", "t3"]);
        }
    }
}
