// src/search.rs
use crate::session::Fetcher;
use crate::types::{FootprintError, SearchConfig};
use crate::utils::{dedup_preserving_order, is_http_url};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Resolves a free-text query to result page URLs.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, FootprintError>;
}

static RESULT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"class="result__a"[^>]*href="([^"]+)"|href="([^"]+)"[^>]*class="result__a""#)
        .expect("result link pattern is valid")
});

/// Scrapes the DuckDuckGo HTML front end.
#[derive(Clone)]
pub struct DuckDuckGoSearch {
    fetcher: Arc<dyn Fetcher>,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &SearchConfig) -> Self {
        Self {
            fetcher,
            endpoint: config.endpoint.clone(),
        }
    }

    fn query_url(&self, query: &str) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}q={}", self.endpoint, separator, urlencoding::encode(query))
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, FootprintError> {
        let url = self.query_url(query);
        let page = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| FootprintError::Search(format!("'{}': {}", query, e)))?;

        if !page.is_ok() {
            return Err(FootprintError::Search(format!(
                "'{}': search endpoint answered {}",
                query, page.status
            )));
        }

        let mut links = parse_result_links(&page.body);
        links.truncate(limit);
        Ok(links)
    }
}

/// Extract absolute result URLs from a DuckDuckGo HTML results page.
pub fn parse_result_links(html: &str) -> Vec<String> {
    let links = RESULT_LINK
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .filter_map(|m| unwrap_redirect(&m.as_str().replace("&amp;", "&")))
        .filter(|link| is_http_url(link))
        .collect();

    dedup_preserving_order(links)
}

/// Result anchors point at `/l/?uddg=<target>`; return the decoded target.
fn unwrap_redirect(href: &str) -> Option<String> {
    let Some(start) = href.find("uddg=") else {
        return Some(href.to_string());
    };
    let encoded = href[start + "uddg=".len()..].split('&').next()?;
    urlencoding::decode(encoded).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::types::Config;

    const RESULTS_PAGE: &str = r#"
<div class="result"><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fcontact&amp;rut=abc">Contact</a></div>
<div class="result"><a rel="nofollow" class="result__a" href="https://direct.example.org/about">About</a></div>
<div class="result"><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fcontact&amp;rut=def">Dup</a></div>
<div class="result"><a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=ftp%3A%2F%2Ffiles.example.com">Ftp</a></div>
"#;

    #[test]
    fn test_parse_result_links() {
        let links = parse_result_links(RESULTS_PAGE);
        assert_eq!(
            links,
            vec![
                "https://example.com/contact".to_string(),
                "https://direct.example.org/about".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_result_links("<html><body>No results.</body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_search_queries_endpoint_and_limits() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/html/")
            .match_query(mockito::Matcher::UrlEncoded(
                "q".to_string(),
                "jdoe contact information".to_string(),
            ))
            .with_status(200)
            .with_body(RESULTS_PAGE)
            .create_async()
            .await;

        let config = SearchConfig {
            endpoint: format!("{}/html/", server.url()),
            results_per_query: 5,
        };
        let session = Session::new(&Config::default()).unwrap();
        let search = DuckDuckGoSearch::new(Arc::new(session), &config);

        let links = search.search("jdoe contact information", 1).await.unwrap();

        assert_eq!(links, vec!["https://example.com/contact".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let config = SearchConfig {
            endpoint: format!("{}/html/", server.url()),
            results_per_query: 5,
        };
        let session = Session::new(&Config::default()).unwrap();
        let search = DuckDuckGoSearch::new(Arc::new(session), &config);

        let result = search.search("anything", 5).await;
        assert!(matches!(result, Err(FootprintError::Search(_))));
    }
}
