//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `playlists`: Generate, list, show, delete and export stored playlists
//! - `browse`: Catalog search, top items and audio features

mod browse;
mod playlists;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::catalog::{SearchKind, SpotifyClient, TimeRange};
use crate::config::{self, Config};
use crate::db;
use crate::error::{Error, ResultExt};
use crate::keystore::{KeyedStore, SqliteKeyedStore};
use crate::playlist::{PlaylistService, SqlitePlaylistStore};
use crate::textgen::{OpenAiClient, TextGenerator};

pub use browse::{cmd_features, cmd_search, cmd_top};
pub use playlists::{cmd_delete, cmd_export, cmd_generate, cmd_list, cmd_show};

/// Key under which the client-credentials token is cached.
const APP_TOKEN_KEY: &str = "spotify:app_token";

/// Cached tokens are dropped this long before the catalog expires them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Seedmix CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Spotify access token (user-scoped tokens are needed for `top` and `export`)
    #[arg(long, global = true, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a playlist from up to five seed tracks
    Generate {
        /// Seed track ids or Spotify track URLs
        #[arg(required = true, num_args = 1..)]
        seeds: Vec<String>,
        /// Number of tracks (1-100)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Target energy (0.0-1.0)
        #[arg(long)]
        energy: Option<f32>,
        /// Target valence (0.0-1.0)
        #[arg(long)]
        valence: Option<f32>,
        /// Playlist name
        #[arg(short, long)]
        name: Option<String>,
        /// Playlist description
        #[arg(short, long)]
        description: Option<String>,
        /// Generate a title from the seed track and mood
        #[arg(long)]
        smart_title: bool,
        /// Use these tracks instead of generating recommendations
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        /// Print the stored playlist as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored playlists, newest first
    List,
    /// Show one stored playlist
    Show {
        id: i64,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a stored playlist
    Delete { id: i64 },
    /// Create a stored playlist in the Spotify account of the token's user
    Export { id: i64 },
    /// Search the catalog
    Search {
        query: String,
        /// What to search for: track, album, artist, playlist
        #[arg(short, long, default_value = "track")]
        kind: SearchKind,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Show the current user's top tracks or artists
    Top {
        /// Top artists instead of tracks
        #[arg(long)]
        artists: bool,
        /// Listening window: short, medium, long
        #[arg(short, long, default_value = "medium")]
        range: TimeRange,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show audio features for a track
    Features {
        /// Track id or Spotify track URL
        id: String,
    },
    /// Print the config file location, writing defaults if it doesn't exist
    ConfigPath {
        /// Overwrite an existing file with defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Run the specified CLI command.
///
/// Returns `Ok(true)` if a command was run, `Ok(false)` if no command was
/// specified (meaning help should be printed).
pub fn run_command(cli: &Cli) -> anyhow::Result<bool> {
    let rt = Runtime::new()?;
    let token = cli.token.as_deref();
    let config_file = cli.config.as_ref();

    match &cli.command {
        Some(Commands::Generate {
            seeds,
            limit,
            energy,
            valence,
            name,
            description,
            smart_title,
            select,
            json,
        }) => {
            let request = crate::playlist::GenerateRequest {
                seed_ids: seeds.clone(),
                name: name.clone(),
                description: description.clone(),
                limit: *limit,
                target_energy: *energy,
                target_valence: *valence,
                generate_smart_title: *smart_title,
                selected_tracks: select.clone(),
            };
            cmd_generate(&rt, config_file, token, &request, *json)?;
            Ok(true)
        }
        Some(Commands::List) => {
            cmd_list(&rt, config_file)?;
            Ok(true)
        }
        Some(Commands::Show { id, json }) => {
            cmd_show(&rt, config_file, *id, *json)?;
            Ok(true)
        }
        Some(Commands::Delete { id }) => {
            cmd_delete(&rt, config_file, *id)?;
            Ok(true)
        }
        Some(Commands::Export { id }) => {
            cmd_export(&rt, config_file, token, *id)?;
            Ok(true)
        }
        Some(Commands::Search { query, kind, limit }) => {
            cmd_search(&rt, config_file, token, query, *kind, *limit)?;
            Ok(true)
        }
        Some(Commands::Top {
            artists,
            range,
            limit,
        }) => {
            cmd_top(&rt, config_file, token, *artists, *range, *limit)?;
            Ok(true)
        }
        Some(Commands::Features { id }) => {
            cmd_features(&rt, config_file, token, id)?;
            Ok(true)
        }
        Some(Commands::ConfigPath { reset }) => {
            cmd_config_path(config_file, *reset)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Print the config location, creating a default file when missing
pub fn cmd_config_path(config_file: Option<&PathBuf>, reset: bool) -> anyhow::Result<()> {
    let path = match config_file {
        Some(path) => path.clone(),
        None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
    };

    if reset || !path.exists() {
        config::save_to(&Config::default(), &path)?;
        println!("✓ Wrote default config");
    }
    println!("{}", path.display());
    Ok(())
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Everything a command needs, built from config and environment.
pub(crate) struct AppContext {
    pub config: Config,
    pub catalog: Arc<SpotifyClient>,
    pub tokens: SqliteKeyedStore,
    pub service: PlaylistService,
}

impl AppContext {
    /// Load config, open the database and build the clients.
    pub async fn open(config_file: Option<&PathBuf>) -> crate::error::Result<Self> {
        let mut config = match config_file {
            Some(path) => config::load_from(path),
            None => config::load(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());

        let db_path = config.storage.resolved_database_path();
        if let Some(dir) = db_path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).with_context("creating data directory")?;
        }
        let pool = db::init_db(&db::db_url(Some(&db_path)))
            .await
            .with_context(format!("opening database {}", db_path.display()))?;

        let catalog = Arc::new(SpotifyClient::from_config(&config.catalog)?);
        let service = PlaylistService::new(
            catalog.clone(),
            Arc::new(SqlitePlaylistStore::new(pool.clone())),
        )
        .with_text_generator(build_text_generator(&config))
        .with_deadline(config.generation.deadline())
        .with_default_limit(config.generation.default_limit);

        Ok(Self {
            config,
            catalog,
            tokens: SqliteKeyedStore::new(pool),
            service,
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.config.generation.owner_id
    }

    /// Access token for catalog calls.
    pub async fn token(&self, explicit: Option<&str>) -> crate::error::Result<String> {
        if let Err(e) = self.tokens.purge_expired().await {
            tracing::warn!(error = %e, "Failed to purge expired cache entries");
        }
        resolve_token(explicit, &self.tokens, &self.catalog, &self.config).await
    }
}

/// The text generator, when enabled and keyed.
fn build_text_generator(config: &Config) -> Option<Arc<dyn TextGenerator>> {
    let api_key = config.textgen_api_key()?;
    match OpenAiClient::new(
        api_key,
        &config.textgen.base_url,
        &config.textgen.model,
        config.textgen.request_timeout(),
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "Text generation unavailable");
            None
        }
    }
}

/// Pick an access token: explicit, then cached, then a fresh
/// client-credentials token which is cached until shortly before expiry.
pub(crate) async fn resolve_token(
    explicit: Option<&str>,
    cache: &dyn KeyedStore,
    catalog: &SpotifyClient,
    config: &Config,
) -> crate::error::Result<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    if let Some(token) = cache.get(APP_TOKEN_KEY).await? {
        tracing::debug!("Using cached app token");
        return Ok(token);
    }

    let (client_id, client_secret) = config.client_credentials().ok_or_else(|| {
        Error::auth(format!(
            "pass --token or set {} and {}",
            config::ENV_CLIENT_ID,
            config::ENV_CLIENT_SECRET
        ))
    })?;

    let token = catalog
        .request_app_token(client_id, client_secret)
        .await
        .with_context("requesting app token")?;

    let ttl = token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN);
    if !ttl.is_zero() {
        cache.put(APP_TOKEN_KEY, &token.access_token, ttl).await?;
    }
    tracing::info!(expires_in = ?token.expires_in, "Obtained app token");
    Ok(token.access_token)
}

/// Format milliseconds as `m:ss`, or `h:mm:ss` past an hour
pub(crate) fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::MemoryStore;
    use clap::CommandFactory;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with_credentials() -> Config {
        let mut config = Config::default();
        config.credentials.spotify_client_id = Some("id".to_string());
        config.credentials.spotify_client_secret = Some("secret".to_string());
        config
    }

    /// Token endpoint that must be hit exactly `calls` times.
    async fn token_server(access_token: &str, expires_in: u64, calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": expires_in
            })))
            .expect(calls)
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer) -> SpotifyClient {
        SpotifyClient::with_base_url(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_auth_url(format!("{}/api/token", server.uri()))
            .with_retry(crate::catalog::RetryPolicy::none())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "seedmix", "generate", "a", "b", "--limit", "5", "--energy", "0.8", "--select",
            "x,y",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Generate {
                seeds,
                limit,
                energy,
                select,
                smart_title,
                ..
            }) => {
                assert_eq!(seeds, vec!["a", "b"]);
                assert_eq!(limit, Some(5));
                assert_eq!(energy, Some(0.8));
                assert_eq!(select, vec!["x", "y"]);
                assert!(!smart_title);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_search_kind_and_range() {
        let cli = Cli::try_parse_from(["seedmix", "search", "daft punk", "-k", "artist"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Search {
                kind: SearchKind::Artist,
                limit: 10,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["seedmix", "top", "--range", "short"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Top {
                range: TimeRange::ShortTerm,
                artists: false,
                ..
            })
        ));

        assert!(Cli::try_parse_from(["seedmix", "search", "x", "-k", "podcast"]).is_err());
    }

    #[test]
    fn test_generate_requires_seed() {
        assert!(Cli::try_parse_from(["seedmix", "generate"]).is_err());
    }

    #[tokio::test]
    async fn test_explicit_token_wins() {
        let cache = MemoryStore::new();
        cache
            .put(APP_TOKEN_KEY, "cached", Duration::from_secs(60))
            .await
            .unwrap();
        let server = token_server("unused", 3600, 0).await;
        let client = client_for(&server);

        let token = resolve_token(Some(" user-token "), &cache, &client, &Config::default())
            .await
            .unwrap();
        assert_eq!(token, "user-token");
    }

    #[tokio::test]
    async fn test_cached_token_used() {
        let cache = MemoryStore::new();
        cache
            .put(APP_TOKEN_KEY, "cached", Duration::from_secs(60))
            .await
            .unwrap();
        let server = token_server("unused", 3600, 0).await;
        let client = client_for(&server);

        let token = resolve_token(None, &cache, &client, &Config::default())
            .await
            .unwrap();
        assert_eq!(token, "cached");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_error() {
        let cache = MemoryStore::new();
        let server = token_server("unused", 3600, 0).await;
        let client = client_for(&server);

        let err = resolve_token(None, &cache, &client, &Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_app_token_fetched_and_cached() {
        let cache = MemoryStore::new();
        let server = token_server("fresh", 3600, 1).await;
        let client = client_for(&server);
        let config = config_with_credentials();

        let token = resolve_token(None, &cache, &client, &config).await.unwrap();
        assert_eq!(token, "fresh");
        assert_eq!(cache.get(APP_TOKEN_KEY).await.unwrap().as_deref(), Some("fresh"));

        // Served from the cache; the mock expects a single token request.
        let again = resolve_token(None, &cache, &client, &config).await.unwrap();
        assert_eq!(again, "fresh");
    }

    #[tokio::test]
    async fn test_short_lived_token_not_cached() {
        let cache = MemoryStore::new();
        let server = token_server("brief", 30, 1).await;
        let client = client_for(&server);

        let token = resolve_token(None, &cache, &client, &config_with_credentials())
            .await
            .unwrap();
        assert_eq!(token, "brief");
        assert_eq!(cache.get(APP_TOKEN_KEY).await.unwrap(), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(200_000), "3:20");
        assert_eq!(format_duration(3_725_000), "1:02:05");
    }

    #[test]
    fn test_config_path_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        cmd_config_path(Some(&path), false).unwrap();
        assert!(path.exists());
        assert_eq!(config::load_from(&path), Config::default());
    }
}
