// src/platforms/mod.rs
use crate::session::Fetcher;
use crate::types::{FootprintError, ProbeResult};
use std::sync::Arc;

mod generic;
mod github;

pub use generic::check_existence;
pub use github::{check_github, GitHubUser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStrategy {
    /// HTTP 200 on the profile URL means the profile exists.
    GenericExistence,
    /// JSON API lookup; `api_template` is queried instead of the profile URL.
    StructuredApi { api_template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec {
    pub name: String,
    pub url_template: String,
    pub strategy: CheckStrategy,
}

impl PlatformSpec {
    pub fn generic(name: &str, url_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            strategy: CheckStrategy::GenericExistence,
        }
    }

    pub fn structured(name: &str, url_template: &str, api_template: &str) -> Self {
        Self {
            name: name.to_string(),
            url_template: url_template.to_string(),
            strategy: CheckStrategy::StructuredApi {
                api_template: api_template.to_string(),
            },
        }
    }

    pub fn profile_url(&self, variation: &str) -> String {
        crate::utils::fill_template(&self.url_template, variation)
    }
}

/// Read-only platform registry shared by every analysis run.
pub type Catalog = Arc<[PlatformSpec]>;

pub fn default_catalog() -> Catalog {
    vec![
        PlatformSpec::structured(
            "GitHub",
            "https://github.com/{username}",
            "https://api.github.com/users/{username}",
        ),
        PlatformSpec::generic("Instagram", "https://www.instagram.com/{username}/"),
        PlatformSpec::generic("Twitter", "https://twitter.com/{username}"),
        PlatformSpec::generic("LinkedIn", "https://www.linkedin.com/in/{username}/"),
        PlatformSpec::generic("Medium", "https://medium.com/@{username}"),
        PlatformSpec::generic("Reddit", "https://www.reddit.com/user/{username}"),
        PlatformSpec::generic("TikTok", "https://www.tiktok.com/@{username}"),
        PlatformSpec::generic("Pinterest", "https://www.pinterest.com/{username}"),
        PlatformSpec::generic("Twitch", "https://www.twitch.tv/{username}"),
        PlatformSpec::generic("DeviantArt", "https://www.deviantart.com/{username}"),
        PlatformSpec::generic("Behance", "https://www.behance.net/{username}"),
        PlatformSpec::generic("Steam", "https://steamcommunity.com/id/{username}"),
        PlatformSpec::generic("Spotify", "https://open.spotify.com/user/{username}"),
        PlatformSpec::generic("SoundCloud", "https://soundcloud.com/{username}"),
        PlatformSpec::generic("Vimeo", "https://vimeo.com/{username}"),
        PlatformSpec::generic("Facebook", "https://www.facebook.com/{username}"),
        PlatformSpec::generic("YouTube", "https://www.youtube.com/@{username}"),
        PlatformSpec::generic("Telegram", "https://t.me/{username}"),
    ]
    .into()
}

/// Probe one platform for one variation.
pub async fn check_platform(
    spec: &PlatformSpec,
    variation: &str,
    fetcher: &dyn Fetcher,
) -> Result<ProbeResult, FootprintError> {
    match &spec.strategy {
        CheckStrategy::GenericExistence => check_existence(spec, variation, fetcher).await,
        CheckStrategy::StructuredApi { api_template } => {
            check_github(spec, api_template, variation, fetcher).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 18);

        let names: HashSet<&str> = catalog.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), catalog.len());

        let structured: Vec<&PlatformSpec> = catalog
            .iter()
            .filter(|p| matches!(p.strategy, CheckStrategy::StructuredApi { .. }))
            .collect();
        assert_eq!(structured.len(), 1);
        assert_eq!(structured[0].name, "GitHub");

        assert!(catalog.iter().all(|p| p.url_template.contains("{username}")));
    }

    #[test]
    fn test_profile_url() {
        let spec = PlatformSpec::generic("Medium", "https://medium.com/@{username}");
        assert_eq!(spec.profile_url("jdoe"), "https://medium.com/@jdoe");
    }
}
