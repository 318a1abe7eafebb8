//! Common test utilities and helpers for Repofolio tests

#![allow(dead_code)]

use repofolio::config::{FilterConfig, GitHubConfig};
use serde_json::{json, Value};

/// Mock GitHub repository data for testing
#[derive(Debug, Clone)]
pub struct MockRepository {
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub stars: u64,
    pub is_fork: bool,
    pub is_archived: bool,
    pub is_private: bool,
}

impl MockRepository {
    pub fn new(name: &str, owner: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: owner.to_string(),
            description: None,
            topics: Vec::new(),
            stars: 0,
            is_fork: false,
            is_archived: false,
            is_private: false,
        }
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topics.push(topic.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_stars(mut self, stars: u64) -> Self {
        self.stars = stars;
        self
    }

    pub fn as_fork(mut self) -> Self {
        self.is_fork = true;
        self
    }

    pub fn as_archived(mut self) -> Self {
        self.is_archived = true;
        self
    }

    pub fn as_private(mut self) -> Self {
        self.is_private = true;
        self
    }

    /// Shape of an entry in `GET /users/{username}/repos`
    pub fn to_json(&self) -> Value {
        json!({
            "id": 1,
            "name": self.name,
            "full_name": format!("{}/{}", self.owner, self.name),
            "description": self.description,
            "html_url": format!("https://github.com/{}/{}", self.owner, self.name),
            "homepage": null,
            "stargazers_count": self.stars,
            "forks_count": 0,
            "language": "Rust",
            "topics": self.topics,
            "updated_at": "2025-01-15T10:00:00Z",
            "created_at": "2024-02-01T08:00:00Z",
            "fork": self.is_fork,
            "archived": self.is_archived,
            "private": self.is_private,
            "visibility": if self.is_private { "private" } else { "public" },
        })
    }
}

pub fn listing(repos: &[MockRepository]) -> Value {
    Value::Array(repos.iter().map(MockRepository::to_json).collect())
}

/// Test data sets for common scenarios
pub struct TestDataSets;

impl TestDataSets {
    /// A mix of pinned, plain, forked, archived and private repositories
    pub fn mixed_repositories() -> Vec<MockRepository> {
        vec![
            MockRepository::new("plain-project", "user").with_stars(2),
            MockRepository::new("django-todo", "user").with_description("Todo app"),
            MockRepository::new("featured-project", "user").with_topic("portfolio-featured"),
            MockRepository::new("forked-project", "user")
                .with_topic("portfolio-featured")
                .as_fork(),
            MockRepository::new("archived-project", "user").as_archived(),
            MockRepository::new("private-project", "user")
                .with_topic("portfolio-featured")
                .as_private(),
        ]
    }
}

pub fn github_config(base_url: &str) -> GitHubConfig {
    GitHubConfig {
        api_base_url: base_url.to_string(),
        ..GitHubConfig::default()
    }
}

pub fn filter_config(show_only_pinned: bool) -> FilterConfig {
    FilterConfig {
        username: "user".to_string(),
        show_only_pinned,
        manual_repo_names: ["django-todo".to_string()].into_iter().collect(),
        ..FilterConfig::default()
    }
}
