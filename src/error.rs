//! Crate-level error type for the CLI boundary.
//!
//! Each subsystem keeps its own `thiserror` enum ([`CatalogError`],
//! [`PlaylistError`], [`StoreError`], [`TextGenError`]). [`Error`] folds
//! them together for the command layer, which hands them to `anyhow`.
//!
//! ```ignore
//! use seedmix::error::{Result, ResultExt};
//!
//! let pool = init_db(&db_url(Some(&path))).await.with_context("opening playlist database")?;
//! ```

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::db::StoreError;
use crate::playlist::PlaylistError;
use crate::textgen::TextGenError;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure a command can report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Music catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Text generation error
    #[error("Text generation error: {0}")]
    TextGen(#[from] TextGenError),

    /// Playlist service error
    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    /// Keyed or playlist store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing access token or app credentials
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl Error {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, CatalogError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Catalog(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, StoreError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Store(e).context(ctx))
    }
}
