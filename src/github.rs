use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::{GitHubConfig, SortBy};
use crate::error::{FolioError, Result};
use crate::models::RawRepository;

/// Items requested per call. Accounts with more public repositories are
/// truncated to this many.
pub const PAGE_SIZE: usize = 100;

/// Source of raw repository listings
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Fetch the public repositories of `username`, ordered by `sort_by`
    async fn fetch(&self, username: &str, sort_by: SortBy) -> Result<Vec<RawRepository>>;
}

/// Unauthenticated client for the GitHub REST API
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new GitHub client from configuration
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FolioError::transport(None, format!("invalid user agent: {}", e)))?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn repos_url(&self, username: &str) -> String {
        format!("{}/users/{}/repos", self.base_url, username)
    }
}

/// Map a non-success status to the error the caller sees.
/// Returns `None` for success statuses.
fn status_error(status: StatusCode) -> Option<FolioError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Some(FolioError::RateLimited),
        status => Some(FolioError::transport(Some(status.as_u16()), status.to_string())),
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubClient {
    async fn fetch(&self, username: &str, sort_by: SortBy) -> Result<Vec<RawRepository>> {
        let url = self.repos_url(username);
        debug!("Fetching repositories: {} (sort={})", url, sort_by);

        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("per_page", page_size.as_str()), ("sort", sort_by.as_str())])
            .send()
            .await?;

        let status = response.status();
        if let Some(err) = status_error(status) {
            warn!("Repository listing for {} failed: {}", username, status);
            return Err(err);
        }

        let body = response.text().await?;
        let repositories: Vec<RawRepository> = serde_json::from_str(&body).map_err(|e| {
            FolioError::transport(
                Some(status.as_u16()),
                format!("malformed repository listing: {}", e),
            )
        })?;

        if repositories.len() >= PAGE_SIZE {
            warn!(
                "Received {} repositories for {}; listing may be truncated",
                repositories.len(),
                username
            );
        }

        info!("Found {} repositories for {}", repositories.len(), username);
        Ok(repositories)
    }
}
