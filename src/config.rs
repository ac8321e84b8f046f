use crate::error::{ErrorContext, Result};
use crate::types::{Config, FootprintError};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// On-disk shape of the TOML config. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    timeout_secs: Option<u64>,
    whois_timeout_secs: Option<u64>,
    concurrency: Option<usize>,
    tlds: Option<Vec<String>>,
    user_agents: Option<Vec<String>>,
    proxy: Option<String>,
    search: Option<FileSearchConfig>,
    server: Option<FileServerConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSearchConfig {
    endpoint: Option<String>,
    results_per_query: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServerConfig {
    bind: Option<String>,
}

/// Defaults, then the TOML file at `path` (if it exists), then `FOOTPRINT_*`
/// environment variables. CLI flags are layered on afterwards by the caller.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = path {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let file: FileConfig = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            apply_file(&mut config, file);
        } else {
            log::debug!("Config file {} not found, using defaults", path.display());
        }
    }

    apply_env_overrides(&mut config, |key| env::var(key).ok())?;
    normalize_tlds(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn apply_file(config: &mut Config, file: FileConfig) {
    if let Some(secs) = file.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.whois_timeout_secs {
        config.whois_timeout = Duration::from_secs(secs);
    }
    if let Some(concurrency) = file.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(tlds) = file.tlds {
        config.tlds = tlds;
    }
    if let Some(user_agents) = file.user_agents {
        config.user_agents = user_agents;
    }
    if file.proxy.is_some() {
        config.proxy = file.proxy;
    }
    if let Some(search) = file.search {
        if let Some(endpoint) = search.endpoint {
            config.search.endpoint = endpoint;
        }
        if let Some(limit) = search.results_per_query {
            config.search.results_per_query = limit;
        }
    }
    if let Some(bind) = file.server.and_then(|s| s.bind) {
        config.server.bind = bind;
    }
}

/// Apply `FOOTPRINT_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("FOOTPRINT_CONCURRENCY") {
        config.concurrency = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid FOOTPRINT_CONCURRENCY '{}'", value))?;
    }
    if let Some(value) = lookup("FOOTPRINT_TIMEOUT_SECS") {
        let secs: u64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid FOOTPRINT_TIMEOUT_SECS '{}'", value))?;
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(bind) = lookup("FOOTPRINT_BIND") {
        config.server.bind = bind.trim().to_string();
    }
    if let Some(proxy) = lookup("FOOTPRINT_PROXY") {
        let proxy = proxy.trim();
        config.proxy = (!proxy.is_empty()).then(|| proxy.to_string());
    }
    Ok(())
}

/// Lowercase, trim, and make sure every TLD starts with a dot.
pub fn normalize_tlds(config: &mut Config) {
    let mut tlds: Vec<String> = config
        .tlds
        .iter()
        .map(|tld| tld.trim().trim_start_matches('.').to_lowercase())
        .filter(|tld| !tld.is_empty())
        .map(|tld| format!(".{}", tld))
        .collect();
    let mut seen = std::collections::HashSet::new();
    tlds.retain(|tld| seen.insert(tld.clone()));
    config.tlds = tlds;
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.timeout.is_zero() {
        return Err(FootprintError::Config("Timeout must be greater than 0".to_string()));
    }
    if config.whois_timeout.is_zero() {
        return Err(FootprintError::Config(
            "WHOIS timeout must be greater than 0".to_string(),
        ));
    }
    if config.concurrency == 0 {
        return Err(FootprintError::Config(
            "Concurrency must be greater than 0".to_string(),
        ));
    }
    if config.tlds.is_empty() {
        return Err(FootprintError::Config("At least one TLD is required".to_string()));
    }
    if config.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        return Err(FootprintError::Config(
            "At least one user agent is required".to_string(),
        ));
    }
    Ok(())
}
