// src/types.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub timeout: Duration,
    pub whois_timeout: Duration,
    pub concurrency: usize,
    pub user_agents: Vec<String>,
    pub proxy: Option<String>,
    pub tlds: Vec<String>,
    pub search: SearchConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(10),
            concurrency: 5,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0".to_string(),
                "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 Edg/124.0".to_string(),
            ],
            proxy: None,
            tlds: vec![
                ".com".to_string(),
                ".net".to_string(),
                ".org".to_string(),
                ".io".to_string(),
                ".me".to_string(),
                ".dev".to_string(),
            ],
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            results_per_query: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Response of a single outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Outcome of one (variation, platform) probe.
///
/// Exactly one shape is meaningful: `exists` with a `profile_url`, a plain
/// miss, or a miss carrying the `error` that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn found(profile_url: impl Into<String>) -> Self {
        Self {
            exists: true,
            profile_url: Some(profile_url.into()),
            attributes: BTreeMap::new(),
            error: None,
        }
    }

    pub fn found_with(profile_url: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            attributes,
            ..Self::found(profile_url)
        }
    }

    pub fn missing() -> Self {
        Self {
            exists: false,
            profile_url: None,
            attributes: BTreeMap::new(),
            error: None,
        }
    }

    pub fn failed(error: &FootprintError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::missing()
        }
    }
}

/// Registration data for a domain that WHOIS reports as taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub domain: String,
    pub url: String,
    pub registrar: Option<String>,
    pub creation_date: Option<String>,
    pub expiration_date: Option<String>,
    pub emails: Vec<String>,
}

impl DomainRecord {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            url: format!("http://{}", domain),
            domain,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFinding {
    pub emails: BTreeSet<String>,
    pub phone_numbers: BTreeSet<String>,
}

impl ContactFinding {
    pub fn merge(&mut self, other: ContactFinding) {
        self.emails.extend(other.emails);
        self.phone_numbers.extend(other.phone_numbers);
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phone_numbers.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationReport {
    pub domains: BTreeMap<String, DomainRecord>,
    pub profiles: BTreeMap<String, ProbeResult>,
    pub contacts: ContactFinding,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phase_errors: Vec<String>,
}

impl VariationReport {
    pub fn found_profiles(&self) -> impl Iterator<Item = (&String, &ProbeResult)> {
        self.profiles.iter().filter(|(_, result)| result.exists)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintReport {
    pub identity: String,
    pub variations: BTreeMap<String, VariationReport>,
}

/// Reduced report served by the HTTP endpoint: the raw username only, no
/// variations and no contact scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickScanReport {
    pub username: String,
    pub domains: BTreeMap<String, DomainRecord>,
    pub social_profiles: BTreeMap<String, ProbeResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Domains,
    Platforms,
    Contacts,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Domains => write!(f, "domain registrations"),
            Phase::Platforms => write!(f, "social media presence"),
            Phase::Contacts => write!(f, "contact information"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FootprintError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error for {url}: {message}")]
    Transport {
        url: String,
        message: String,
    },

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lookup miss: {0}")]
    LookupMiss(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl FootprintError {
    pub fn transport(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("GET {}", url))
        } else {
            Self::transport(url, err)
        }
    }
}
