//! Repofolio - Portfolio repository pipeline
//!
//! Repofolio fetches a GitHub account's public repositories, selects the ones
//! worth showing, converts them to a display-ready form and keeps the result
//! in a durable cache.
//!
//! ## Core Features
//!
//! - **Selection**: fork/archived/private exclusion, topic or name pinning
//! - **Caching**: single-slot SQLite cache with a configurable validity window
//! - **Single-flight**: concurrent callers share one network request
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: Repository listing client
//! - [`filter`] / [`format`]: Selection and display conversion
//! - [`cache`]: Durable listing cache
//! - [`pipeline`]: The `get_repositories` entry point

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod github;
pub mod models;
pub mod pipeline;

pub use cache::{CacheStore, MemoryStore, SqliteStore};
pub use config::{Config, FilterConfig, SortBy};
pub use error::FolioError;
pub use github::{GitHubClient, RepositoryFetcher};
pub use models::{CacheEntry, DisplayRepository, RawRepository};
pub use pipeline::Pipeline;
