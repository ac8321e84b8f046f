// src/session.rs
use crate::types::{Config, FootprintError, Page};
use async_trait::async_trait;
use log::debug;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Response bodies beyond this are truncated.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Plain GET collaborator used by every HTTP probe.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, FootprintError>;
}

#[derive(Clone)]
pub struct Session {
    pub client: Client,
    user_agents: Arc<Vec<String>>,
    max_body_bytes: usize,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self, FootprintError> {
        if config.user_agents.is_empty() {
            return Err(FootprintError::Config(
                "At least one user agent is required".to_string(),
            ));
        }

        // Every request carries the client-level timeout
        let mut client_builder = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10);

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| FootprintError::Config(format!("Invalid proxy URL: {}", e)))?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder
            .build()
            .map_err(|e| FootprintError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Session {
            client,
            user_agents: Arc::new(config.user_agents.clone()),
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Pick a user agent for the next request.
    pub fn random_user_agent(&self) -> &str {
        let mut rng = rand::thread_rng();
        self.user_agents
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub async fn get(&self, url: &str) -> Result<reqwest::Response, FootprintError> {
        let user_agent = self.random_user_agent().to_string();
        self.client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FootprintError::from_reqwest(url, e))
    }
}

#[async_trait]
impl Fetcher for Session {
    async fn fetch(&self, url: &str) -> Result<Page, FootprintError> {
        let mut response = self.get(url).await?;
        let status = response.status().as_u16();

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FootprintError::from_reqwest(url, e))?
        {
            let room = self.max_body_bytes - bytes.len();
            if chunk.len() > room {
                bytes.extend_from_slice(&chunk[..room]);
                debug!("GET {}: body truncated at {} bytes", url, self.max_body_bytes);
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(Page { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/profile")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let session = Session::new(&Config::default()).unwrap();
        let page = session
            .fetch(&format!("{}/profile", server.url()))
            .await
            .unwrap();

        assert_eq!(page, Page { status: 200, body: "hello".to_string() });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_sends_pooled_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ua")
            .match_header("user-agent", "pooled-agent/1.0")
            .with_status(404)
            .create_async()
            .await;

        let config = Config {
            user_agents: vec!["pooled-agent/1.0".to_string()],
            ..Config::default()
        };
        let session = Session::new(&config).unwrap();
        let page = session.fetch(&format!("{}/ua", server.url())).await.unwrap();

        assert_eq!(page.status, 404);
        assert!(!page.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_truncates_oversized_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/huge")
            .with_status(200)
            .with_body("a".repeat(10_000))
            .create_async()
            .await;

        let session = Session::new(&Config::default())
            .unwrap()
            .with_max_body_bytes(1024);
        let page = session.fetch(&format!("{}/huge", server.url())).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body.len(), 1024);
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let session = Session::new(&Config::default()).unwrap();
        // Port 9 on loopback: nothing listens there
        let result = session.fetch("http://127.0.0.1:9/").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_user_agent_pool_rejected() {
        let config = Config {
            user_agents: Vec::new(),
            ..Config::default()
        };
        assert!(Session::new(&config).is_err());
    }
}
