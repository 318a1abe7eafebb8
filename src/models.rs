//! Repository records as received from the API and as handed to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository entry from `GET /users/{username}/repos`.
///
/// Only the fields the pipeline reads are kept; everything else in the
/// response is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRepository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub language: Option<String>,
    pub topics: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub private: bool,
}

impl RawRepository {
    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics
            .as_ref()
            .is_some_and(|topics| topics.iter().any(|t| t == topic))
    }
}

/// Display-ready repository.
///
/// Serialized with camelCase keys; this is the layout stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRepository {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub url: String,
    pub homepage: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_featured: bool,
}

impl DisplayRepository {
    /// Name with dashes turned into spaces and each word capitalised.
    pub fn title(&self) -> String {
        self.name
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Last update as "Mon YYYY".
    pub fn updated_label(&self) -> String {
        self.updated_at.format("%b %Y").to_string()
    }

    pub fn top_topics(&self, n: usize) -> &[String] {
        &self.topics[..self.topics.len().min(n)]
    }
}

/// The single cached listing, when it was written, and for which account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub payload: Vec<DisplayRepository>,
    pub stored_at: DateTime<Utc>,
    pub account: Option<String>,
}
