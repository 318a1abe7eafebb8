//! Repository pipeline: cache check, fetch, filter, format, store.
//!
//! Concurrent callers that miss the cache share one in-flight fetch per
//! `(username, sort_by)`; only the first issues a network request. A cached
//! listing is only served to the account it was fetched for.

use anyhow::Result as AnyResult;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, KeyValueStore, MemoryStore, SqliteStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, FilterConfig, SortBy};
use crate::error::Result;
use crate::filter::filter_repositories;
use crate::format::format_repository;
use crate::github::{GitHubClient, RepositoryFetcher};
use crate::models::{CacheEntry, DisplayRepository};

type SharedFetch = Shared<BoxFuture<'static, Result<Vec<DisplayRepository>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    username: String,
    sort_by: SortBy,
}

enum Lookup {
    Cached(Vec<DisplayRepository>),
    Pending(SharedFetch),
}

/// Entry point for retrieving the portfolio's repositories
pub struct Pipeline {
    fetcher: Arc<dyn RepositoryFetcher>,
    cache: Arc<CacheStore>,
    config: Arc<FilterConfig>,
    serve_stale_on_error: bool,
    in_flight: Arc<Mutex<HashMap<FetchKey, SharedFetch>>>,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        cache: Arc<CacheStore>,
        config: FilterConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            config: Arc::new(config),
            serve_stale_on_error: false,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return an expired listing instead of the error when a fetch fails
    pub fn serve_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    /// Build the GitHub client and SQLite cache described by `config`.
    ///
    /// If the cache database cannot be opened the pipeline runs with an
    /// in-memory cache instead.
    pub fn from_config(config: &Config) -> AnyResult<Self> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(config: &Config, clock: Arc<dyn Clock>) -> AnyResult<Self> {
        let fetcher = Arc::new(GitHubClient::new(&config.github)?);
        let store = open_store(&config.cache.database_path);
        let cache = Arc::new(CacheStore::new(
            store,
            clock,
            config.portfolio.cache_timeout_ms,
        ));

        Ok(Self::new(fetcher, cache, config.portfolio.clone())
            .serve_stale_on_error(config.cache.serve_stale_on_error))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Return the cached listing while it is valid; otherwise fetch, filter,
    /// format and cache a fresh one. Fetch errors are returned unchanged.
    pub async fn get_repositories(&self) -> Result<Vec<DisplayRepository>> {
        let fetch = match self.lookup() {
            Lookup::Cached(repos) => return Ok(repos),
            Lookup::Pending(fetch) => fetch,
        };

        match fetch.await {
            Ok(repos) => Ok(repos),
            Err(err) if self.serve_stale_on_error => match self.cached_for_account() {
                Some(entry) => {
                    warn!(
                        "Fetch failed ({}); serving {} cached repositories from {}",
                        err,
                        entry.payload.len(),
                        entry.stored_at
                    );
                    Ok(entry.payload)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    fn lookup(&self) -> Lookup {
        let key = FetchKey {
            username: self.config.username.clone(),
            sort_by: self.config.sort_by,
        };

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

        if self.cache.is_valid_for(&key.username) {
            if let Some(entry) = self.cached_for_account() {
                info!("Using cached repositories ({} entries)", entry.payload.len());
                return Lookup::Cached(entry.payload);
            }
        }

        if let Some(pending) = in_flight.get(&key) {
            debug!("Joining in-flight fetch for {}", key.username);
            return Lookup::Pending(pending.clone());
        }

        let fetch = fetch_and_store(
            self.fetcher.clone(),
            self.cache.clone(),
            self.config.clone(),
            self.in_flight.clone(),
            key.clone(),
        )
        .boxed()
        .shared();
        in_flight.insert(key, fetch.clone());
        Lookup::Pending(fetch)
    }

    fn cached_for_account(&self) -> Option<CacheEntry> {
        self.cache
            .read()
            .filter(|entry| entry.account.as_deref() == Some(self.config.username.as_str()))
    }
}

async fn fetch_and_store(
    fetcher: Arc<dyn RepositoryFetcher>,
    cache: Arc<CacheStore>,
    config: Arc<FilterConfig>,
    in_flight: Arc<Mutex<HashMap<FetchKey, SharedFetch>>>,
    key: FetchKey,
) -> Result<Vec<DisplayRepository>> {
    let result = match fetcher.fetch(&key.username, key.sort_by).await {
        Ok(raw) => {
            let repos: Vec<DisplayRepository> = filter_repositories(raw, &config)
                .iter()
                .map(|repo| format_repository(repo, &config))
                .collect();
            store_listing(cache, &key.username, &repos).await;
            info!("Prepared {} repositories for {}", repos.len(), key.username);
            Ok(repos)
        }
        Err(err) => Err(err),
    };

    // Removed only after the cache write so late callers see fresh data.
    in_flight
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(&key);

    result
}

/// Write the listing off the async executor; the backend may block on disk.
async fn store_listing(cache: Arc<CacheStore>, account: &str, repos: &[DisplayRepository]) {
    let account = account.to_string();
    let payload = repos.to_vec();
    if let Err(e) =
        tokio::task::spawn_blocking(move || cache.write_for(&account, &payload)).await
    {
        warn!("Cache write task failed: {}", e);
    }
}

fn open_store(database_path: &str) -> Arc<dyn KeyValueStore> {
    match SqliteStore::open_at(PathBuf::from(database_path)) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Cache database unavailable at {} ({}); using in-memory cache",
                database_path, e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
