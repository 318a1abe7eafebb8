//! Conversion from API records to display records.

use crate::config::FilterConfig;
use crate::filter::is_pinned;
use crate::models::{DisplayRepository, RawRepository};

pub const NO_DESCRIPTION: &str = "No description available";

/// Map one API record to its display form. Pure: depends only on `repo` and
/// `config`.
pub fn format_repository(repo: &RawRepository, config: &FilterConfig) -> DisplayRepository {
    let description = repo
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
        .to_string();

    let homepage = repo.homepage.clone().filter(|h| !h.is_empty());

    DisplayRepository {
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        description,
        url: repo.html_url.clone(),
        homepage,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        language: repo.language.clone(),
        topics: repo.topics.clone().unwrap_or_default(),
        updated_at: repo.updated_at,
        created_at: repo.created_at,
        is_featured: is_pinned(repo, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw() -> RawRepository {
        RawRepository {
            name: "strapi-blue-green".to_string(),
            full_name: "user/strapi-blue-green".to_string(),
            description: Some("Blue/green deploys for Strapi".to_string()),
            html_url: "https://github.com/user/strapi-blue-green".to_string(),
            homepage: Some("https://demo.example.com".to_string()),
            stargazers_count: 12,
            forks_count: 3,
            language: Some("JavaScript".to_string()),
            topics: Some(vec!["devops".to_string(), "portfolio-featured".to_string()]),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap(),
            fork: false,
            archived: false,
            private: false,
        }
    }

    #[test]
    fn test_field_mapping() {
        let out = format_repository(&raw(), &FilterConfig::default());

        assert_eq!(out.name, "strapi-blue-green");
        assert_eq!(out.full_name, "user/strapi-blue-green");
        assert_eq!(out.description, "Blue/green deploys for Strapi");
        assert_eq!(out.url, "https://github.com/user/strapi-blue-green");
        assert_eq!(out.homepage.as_deref(), Some("https://demo.example.com"));
        assert_eq!(out.stars, 12);
        assert_eq!(out.forks, 3);
        assert_eq!(out.language.as_deref(), Some("JavaScript"));
        assert_eq!(out.topics, vec!["devops", "portfolio-featured"]);
        assert_eq!(out.updated_at, raw().updated_at);
        assert_eq!(out.created_at, raw().created_at);
        assert!(out.is_featured);
    }

    #[test]
    fn test_missing_description_uses_placeholder() {
        let mut repo = raw();
        repo.description = None;
        assert_eq!(format_repository(&repo, &FilterConfig::default()).description, NO_DESCRIPTION);

        repo.description = Some(String::new());
        assert_eq!(format_repository(&repo, &FilterConfig::default()).description, NO_DESCRIPTION);
    }

    #[test]
    fn test_blank_strings_are_kept() {
        let mut repo = raw();
        repo.description = Some("   ".to_string());
        repo.homepage = Some(" ".to_string());

        let out = format_repository(&repo, &FilterConfig::default());
        assert_eq!(out.description, "   ");
        assert_eq!(out.homepage.as_deref(), Some(" "));
    }

    #[test]
    fn test_missing_topics_and_empty_homepage() {
        let mut repo = raw();
        repo.topics = None;
        repo.homepage = Some(String::new());

        let out = format_repository(&repo, &FilterConfig::default());
        assert!(out.topics.is_empty());
        assert!(out.homepage.is_none());
        assert!(!out.is_featured);
    }

    #[test]
    fn test_featured_by_manual_name() {
        let mut repo = raw();
        repo.topics = Some(vec![]);
        let mut config = FilterConfig::default();
        config.manual_repo_names.insert("strapi-blue-green".to_string());

        assert!(format_repository(&repo, &config).is_featured);
    }

    #[test]
    fn test_format_is_deterministic() {
        let config = FilterConfig::default();
        assert_eq!(format_repository(&raw(), &config), format_repository(&raw(), &config));
    }
}
