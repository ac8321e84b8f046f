// src/platforms/github.rs
use crate::platforms::PlatformSpec;
use crate::session::Fetcher;
use crate::types::{FootprintError, ProbeResult};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Public fields of a GitHub user; every one of them may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct GitHubUser {
    pub login: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub public_repos: Option<u64>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub html_url: Option<String>,
    pub email: Option<String>,
}

impl GitHubUser {
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let fields = [
            ("login", self.login.clone()),
            ("name", self.name.clone()),
            ("bio", self.bio.clone()),
            ("location", self.location.clone()),
            ("public_repos", self.public_repos.map(|n| n.to_string())),
            ("followers", self.followers.map(|n| n.to_string())),
            ("following", self.following.map(|n| n.to_string())),
            ("html_url", self.html_url.clone()),
            ("email", self.email.clone()),
        ];

        fields
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (key.to_string(), v))
            })
            .collect()
    }
}

pub async fn check_github(
    spec: &PlatformSpec,
    api_template: &str,
    variation: &str,
    fetcher: &dyn Fetcher,
) -> Result<ProbeResult, FootprintError> {
    let api_url = crate::utils::fill_template(api_template, variation);
    let page = fetcher.fetch(&api_url).await?;

    if !page.is_ok() {
        return Ok(ProbeResult::missing());
    }

    let user: GitHubUser = serde_json::from_str(&page.body)
        .map_err(|e| FootprintError::Parse(format!("{} response from {}: {}", spec.name, api_url, e)))?;

    Ok(ProbeResult::found_with(spec.profile_url(variation), user.attributes()))
}
