//! Spotify Web API HTTP client
//!
//! Handles communication with the Spotify Web API.
//! See: https://developer.spotify.com/documentation/web-api
//!
//! ## Error translation
//!
//! Raw transport and HTTP errors never leave this module. Every failure is
//! mapped to a [`CatalogError`] variant so callers can decide per variant
//! whether a fallback applies.
//!
//! ## Retries
//!
//! 5xx responses, 429 and connection errors are retried with capped
//! exponential backoff (see [`RetryPolicy`]). Other 4xx responses are final.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;

use super::retry::RetryPolicy;
use super::{adapter, dto};
use crate::catalog::domain::{
    AccessToken, AudioFeatures, CandidateTrack, CatalogError, RecommendationRequest, SearchItem,
    SearchQuery, TimeRange, TopItem, TopItemKind,
};
use crate::catalog::traits::CatalogApi;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

/// Search accepts at most 50 results per page.
const MAX_SEARCH_LIMIT: usize = 50;
/// Recommendations accept at most 100 tracks.
const MAX_RECOMMENDATION_LIMIT: usize = 100;
/// Tracks added per playlist request.
const ADD_TRACKS_BATCH: usize = 100;

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    auth_url: String,
    retry: RetryPolicy,
}

impl SpotifyClient {
    /// Create a client against the public API with default settings
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_base_url(DEFAULT_API_BASE, Duration::from_secs(10))
    }

    /// Create a client against a custom base URL (proxies, tests)
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| CatalogError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Build a client from the `[catalog]` config section
    pub fn from_config(config: &crate::config::CatalogConfig) -> Result<Self, CatalogError> {
        Ok(
            Self::with_base_url(&config.api_base_url, config.request_timeout())?
                .with_auth_url(&config.auth_url)
                .with_retry(config.retry_policy()),
        )
    }

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Obtain an app token via the client-credentials flow
    ///
    /// App tokens can search and read catalog data but cannot access
    /// user-scoped endpoints (top items, playlist creation).
    pub async fn request_app_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, CatalogError> {
        let response: dto::TokenResponse = self
            .execute(|| {
                self.http_client
                    .post(&self.auth_url)
                    .basic_auth(client_id, Some(client_secret))
                    .form(&[("grant_type", "client_credentials")])
            })
            .await?;

        Ok(AccessToken {
            access_token: response.access_token,
            expires_in: Duration::from_secs(response.expires_in),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
    ) -> Result<T, CatalogError> {
        self.execute(|| self.http_client.get(url).bearer_auth(token))
            .await
    }

    /// Send a request, retrying transient failures per the retry policy
    async fn execute<T, F>(&self, build: F) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match send_once(build()).await {
                Err(err) if err.is_transient() && self.retry.should_retry(attempt) => {
                    let retry_after = match &err {
                        CatalogError::RateLimited { retry_after } => *retry_after,
                        _ => None,
                    };
                    let delay = self.retry.delay_for(attempt, retry_after);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient catalog failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

async fn send_once<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CatalogError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| CatalogError::Parse(e.to_string()))
}

fn map_transport_error(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Network(err.to_string())
    }
}

/// Map non-success statuses to typed errors
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    Err(match status.as_u16() {
        401 => CatalogError::Unauthorized,
        403 => CatalogError::Forbidden(message),
        404 => CatalogError::NotFound(message),
        429 => CatalogError::RateLimited { retry_after },
        code => CatalogError::Upstream {
            status: code,
            message,
        },
    })
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn search(
        &self,
        token: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchItem>, CatalogError> {
        let url = format!(
            "{}/search?q={}&type={}&limit={}&offset={}",
            self.base_url,
            urlencoding::encode(&query.text),
            query.kind.as_param(),
            query.limit.clamp(1, MAX_SEARCH_LIMIT),
            query.offset
        );
        let response: dto::SearchResponse = self.get_json(token, &url).await?;
        Ok(adapter::to_search_items(response))
    }

    async fn get_track(&self, token: &str, id: &str) -> Result<CandidateTrack, CatalogError> {
        let url = format!("{}/tracks/{}", self.base_url, urlencoding::encode(id));
        let response: dto::Track = self.get_json(token, &url).await?;
        adapter::to_candidate(response)
            .ok_or_else(|| CatalogError::Parse(format!("track {id} has no id")))
    }

    async fn fetch_audio_features(
        &self,
        token: &str,
        id: &str,
    ) -> Result<AudioFeatures, CatalogError> {
        let url = format!("{}/audio-features/{}", self.base_url, urlencoding::encode(id));
        let response: dto::AudioFeatures = self.get_json(token, &url).await?;
        Ok(adapter::to_audio_features(response))
    }

    async fn get_recommendations(
        &self,
        token: &str,
        request: &RecommendationRequest,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let mut url = format!(
            "{}/recommendations?seed_tracks={}&limit={}",
            self.base_url,
            urlencoding::encode(&request.seed_track_ids.join(",")),
            request.limit.clamp(1, MAX_RECOMMENDATION_LIMIT)
        );
        if let Some(energy) = request.target_energy {
            url.push_str(&format!("&target_energy={energy:.2}"));
        }
        if let Some(valence) = request.target_valence {
            url.push_str(&format!("&target_valence={valence:.2}"));
        }

        let response: dto::RecommendationsResponse = self.get_json(token, &url).await?;
        Ok(adapter::to_candidates(response.tracks))
    }

    async fn get_top_items(
        &self,
        token: &str,
        kind: TopItemKind,
        time_range: TimeRange,
        limit: usize,
    ) -> Result<Vec<TopItem>, CatalogError> {
        let url = format!(
            "{}/me/top/{}?time_range={}&limit={}",
            self.base_url,
            kind.as_path(),
            time_range.as_param(),
            limit.clamp(1, MAX_SEARCH_LIMIT)
        );
        match kind {
            TopItemKind::Tracks => {
                let paging: dto::Paging<dto::Track> = self.get_json(token, &url).await?;
                Ok(adapter::to_top_tracks(paging))
            }
            TopItemKind::Artists => {
                let paging: dto::Paging<dto::Artist> = self.get_json(token, &url).await?;
                Ok(adapter::to_top_artists(paging))
            }
        }
    }

    async fn create_remote_playlist(
        &self,
        token: &str,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<String, CatalogError> {
        let me: dto::CurrentUser = self
            .get_json(token, &format!("{}/me", self.base_url))
            .await?;

        let create_url = format!(
            "{}/users/{}/playlists",
            self.base_url,
            urlencoding::encode(&me.id)
        );
        let body = dto::CreatePlaylistRequest {
            name,
            description,
            public: false,
        };
        let created: dto::CreatedPlaylist = self
            .execute(|| {
                self.http_client
                    .post(&create_url)
                    .bearer_auth(token)
                    .json(&body)
            })
            .await?;

        let tracks_url = format!("{}/playlists/{}/tracks", self.base_url, created.id);
        for chunk in track_ids.chunks(ADD_TRACKS_BATCH) {
            let body = dto::AddTracksRequest {
                uris: chunk.iter().map(|id| format!("spotify:track:{id}")).collect(),
            };
            let _: dto::SnapshotResponse = self
                .execute(|| {
                    self.http_client
                        .post(&tracks_url)
                        .bearer_auth(token)
                        .json(&body)
                })
                .await?;
        }

        tracing::info!(
            remote_id = %created.id,
            tracks = track_ids.len(),
            "Created remote playlist"
        );
        Ok(created.id)
    }
}
