//! Repository selection: exclusion rules and pinning.

use tracing::debug;

use crate::config::FilterConfig;
use crate::models::RawRepository;

/// A repository is pinned when it carries the featured topic or is named in
/// the manual list.
pub fn is_pinned(repo: &RawRepository, config: &FilterConfig) -> bool {
    repo.has_topic(&config.featured_topic) || config.manual_repo_names.contains(&repo.name)
}

/// Whether the exclusion rules drop this repository. Private repositories
/// are always dropped.
fn is_excluded(repo: &RawRepository, config: &FilterConfig) -> bool {
    (config.exclude_forked && repo.fork) || (config.exclude_archived && repo.archived) || repo.private
}

/// Apply exclusion and pinning rules, keeping input order within each group.
///
/// With `show_only_pinned` only pinned repositories are returned (possibly
/// none). Otherwise pinned repositories come first, followed by the rest.
pub fn filter_repositories(repos: Vec<RawRepository>, config: &FilterConfig) -> Vec<RawRepository> {
    let total = repos.len();

    let (pinned, others): (Vec<_>, Vec<_>) = repos
        .into_iter()
        .filter(|repo| {
            let excluded = is_excluded(repo, config);
            if excluded {
                debug!("Excluding repository: {}", repo.name);
            }
            !excluded
        })
        .partition(|repo| is_pinned(repo, config));

    debug!(
        "Filtered {} repositories: {} pinned, {} other",
        total,
        pinned.len(),
        others.len()
    );

    if config.show_only_pinned {
        return pinned;
    }

    let mut result = pinned;
    result.extend(others);
    result
}
