// src/whois.rs
use crate::contacts::EMAIL_PATTERN;
use crate::types::{DomainRecord, FootprintError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WHOIS_PORT: u16 = 43;
const IANA_WHOIS: &str = "whois.iana.org";
const MAX_RESPONSE_BYTES: u64 = 256 * 1024;

/// Registration lookup collaborator.
///
/// `Ok(Some)` means registered, `Ok(None)` means the registry reports no
/// such domain, and `Err` means the lookup itself failed.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<Option<DomainRecord>, FootprintError>;
}

/// Port-43 client. Registry servers for the default TLDs are built in,
/// other TLDs are resolved through IANA, and a registrar referral in the
/// registry answer is followed once.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
    port: u16,
    servers: HashMap<String, String>,
    iana_server: String,
}

impl WhoisClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            port: WHOIS_PORT,
            servers: default_servers(),
            iana_server: IANA_WHOIS.to_string(),
        }
    }

    /// Replace the TLD -> server table and the default port. Server names
    /// may carry their own `host:port`.
    pub fn with_servers(mut self, port: u16, servers: HashMap<String, String>) -> Self {
        self.port = port;
        self.servers = servers;
        self
    }

    pub fn with_iana_server(mut self, server: impl Into<String>) -> Self {
        self.iana_server = server.into();
        self
    }

    fn endpoint(&self, server: &str) -> (String, u16) {
        if let Some((host, port)) = server.rsplit_once(':') {
            if !host.contains(':') {
                if let Ok(port) = port.parse() {
                    return (host.to_string(), port);
                }
            }
        }
        (server.to_string(), self.port)
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, FootprintError> {
        let operation = format!("WHOIS {} @ {}", query, server);
        let (host, port) = self.endpoint(server);

        let mut stream = timeout(self.timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| FootprintError::Timeout(operation.clone()))?
            .map_err(|e| FootprintError::transport(server, e))?;

        timeout(self.timeout, stream.write_all(format!("{}\r\n", query).as_bytes()))
            .await
            .map_err(|_| FootprintError::Timeout(operation.clone()))?
            .map_err(|e| FootprintError::transport(server, e))?;

        let mut response = Vec::new();
        timeout(
            self.timeout,
            (&mut stream).take(MAX_RESPONSE_BYTES).read_to_end(&mut response),
        )
        .await
        .map_err(|_| FootprintError::Timeout(operation))?
        .map_err(|e| FootprintError::transport(server, e))?;

        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    async fn server_for(&self, domain: &str) -> Result<String, FootprintError> {
        let tld = domain
            .rsplit('.')
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FootprintError::Validation(format!("no TLD in {}", domain)))?
            .to_lowercase();

        if let Some(server) = self.servers.get(&tld) {
            return Ok(server.clone());
        }

        let response = self.query(&self.iana_server, &tld).await?;
        parse_iana_refer_response(&response)
            .ok_or_else(|| FootprintError::LookupMiss(format!("no WHOIS server for .{}", tld)))
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisLookup for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<Option<DomainRecord>, FootprintError> {
        let server = self.server_for(domain).await?;
        let response = self.query(&server, domain).await?;

        let mut record = match parse_whois_response(domain, &response) {
            Some(record) => record,
            None => return Ok(None),
        };

        if let Some(referral) = registrar_server(&response).filter(|r| !r.eq_ignore_ascii_case(&server)) {
            match self.query(&referral, domain).await {
                Ok(detail) => {
                    if let Some(extra) = parse_whois_response(domain, &detail) {
                        merge_records(&mut record, extra);
                    }
                }
                Err(e) => debug!("{}: registrar referral to {} failed: {}", domain, referral, e),
            }
        }

        Ok(Some(record))
    }
}

fn default_servers() -> HashMap<String, String> {
    [
        ("com", "whois.verisign-grs.com"),
        ("net", "whois.verisign-grs.com"),
        ("org", "whois.pir.org"),
        ("io", "whois.nic.io"),
        ("me", "whois.nic.me"),
        ("dev", "whois.nic.google"),
        ("app", "whois.nic.google"),
        ("info", "whois.afilias.net"),
        ("co", "whois.nic.co"),
    ]
    .into_iter()
    .map(|(tld, server)| (tld.to_string(), server.to_string()))
    .collect()
}

/// Free-text answers meaning the registry has no such domain.
const AVAILABLE_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "not registered",
    "no matching record",
    "no object found",
    "object does not exist",
    "this domain name has not been registered",
];

const REGISTRAR_KEYS: &[&str] = &["registrar", "sponsoring registrar", "registrar name"];

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "registered on",
    "registration time",
    "domain registration date",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires",
    "expires on",
    "paid-till",
];

/// Parse a WHOIS answer; `None` when the domain is not registered.
pub fn parse_whois_response(domain: &str, response: &str) -> Option<DomainRecord> {
    if reports_available(response) {
        return None;
    }

    let fields = key_values(response);
    let has_domain_line = fields
        .iter()
        .any(|(key, _)| key == "domain name" || key == "domain");
    if !has_domain_line {
        return None;
    }

    let mut record = DomainRecord::new(domain);
    record.registrar = first_value(&fields, REGISTRAR_KEYS);
    record.creation_date = first_value(&fields, CREATION_KEYS).map(|d| normalize_whois_date(&d));
    record.expiration_date = first_value(&fields, EXPIRATION_KEYS).map(|d| normalize_whois_date(&d));
    record.emails = EMAIL_PATTERN
        .find_iter(response)
        .map(|m| m.as_str().to_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Some(record)
}

/// Look for an availability notice. `Status:` fields count anywhere;
/// free-text phrases only count before the `Domain Name:` line, and field
/// values never do, so registrar names and legal footers cannot flip the
/// verdict.
fn reports_available(response: &str) -> bool {
    let mut in_head = true;
    for line in response.lines().map(str::trim) {
        let lowered = line.to_lowercase();
        match lowered.split_once(':') {
            Some((key, value)) => match key.trim() {
                "domain name" | "domain" => in_head = false,
                "status" | "domain status" => {
                    if matches!(value.trim(), "available" | "free") {
                        return true;
                    }
                }
                _ => {}
            },
            None if in_head => {
                if AVAILABLE_PATTERNS.iter().any(|p| lowered.contains(p)) {
                    return true;
                }
            }
            None => {}
        }
    }
    false
}

fn key_values(response: &str) -> Vec<(String, String)> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('%') && !line.starts_with('#') && !line.starts_with(">>>"))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

fn first_value(fields: &[(String, String)], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|wanted| {
        fields
            .iter()
            .find(|(key, _)| key == wanted)
            .map(|(_, value)| value.clone())
    })
}

fn registrar_server(response: &str) -> Option<String> {
    key_values(response)
        .into_iter()
        .find(|(key, _)| key == "registrar whois server" || key == "whois server")
        .map(|(_, value)| value.trim_start_matches("whois://").to_string())
}

fn merge_records(base: &mut DomainRecord, extra: DomainRecord) {
    if base.registrar.is_none() {
        base.registrar = extra.registrar;
    }
    if base.creation_date.is_none() {
        base.creation_date = extra.creation_date;
    }
    if base.expiration_date.is_none() {
        base.expiration_date = extra.expiration_date;
    }
    let emails: BTreeSet<String> = base.emails.drain(..).chain(extra.emails).collect();
    base.emails = emails.into_iter().collect();
}

/// Render common WHOIS date shapes as `YYYY-MM-DD HH:MM:SS`; unknown shapes
/// are returned unchanged.
pub fn normalize_whois_date(raw: &str) -> String {
    let raw = raw.trim();
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.naive_utc().format(FORMAT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(FORMAT).to_string();
        }
    }
    for pattern in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, pattern) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return dt.format(FORMAT).to_string();
            }
        }
    }
    raw.to_string()
}

/// Parse an IANA answer for the authoritative WHOIS server, preferring `refer:`.
pub fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line = line.trim();
        if let Some(server) = line.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}
