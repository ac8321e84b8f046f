// src/domains.rs
use crate::dispatcher::ProbeDispatcher;
use crate::types::{DomainRecord, FootprintError};
use crate::utils::is_valid_domain;
use crate::whois::WhoisLookup;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct DomainChecker {
    whois: Arc<dyn WhoisLookup>,
    tlds: Arc<[String]>,
    dispatcher: ProbeDispatcher,
}

impl DomainChecker {
    pub fn new(whois: Arc<dyn WhoisLookup>, tlds: &[String], dispatcher: ProbeDispatcher) -> Self {
        Self {
            whois,
            tlds: tlds.into(),
            dispatcher,
        }
    }

    /// Candidate domains for `name`, one per configured TLD.
    pub fn candidates(&self, name: &str) -> Vec<String> {
        self.tlds
            .iter()
            .map(|tld| format!("{}{}", name, tld))
            .collect()
    }

    /// Look up every candidate and keep only the registered ones.
    ///
    /// Unregistered domains, failed lookups and candidates that are not
    /// valid DNS names are all simply absent from the result.
    pub async fn check_domains(&self, name: &str) -> BTreeMap<String, DomainRecord> {
        let (valid, invalid): (Vec<String>, Vec<String>) = self
            .candidates(name)
            .into_iter()
            .partition(|domain| is_valid_domain(domain));

        for domain in &invalid {
            debug!("{}: not a valid domain name, skipping lookup", domain);
        }

        let tasks = valid.into_iter().map(|domain| {
            let whois = Arc::clone(&self.whois);
            let target = domain.clone();
            let task = async move { whois.lookup(&target).await };
            (domain, task)
        });

        let mut registered = BTreeMap::new();
        for (domain, outcome) in self.dispatcher.run(tasks).await {
            match outcome {
                Ok(Some(record)) => {
                    registered.insert(domain, record);
                }
                Ok(None) => debug!("{}: not registered", domain),
                Err(e) => debug!("{}: WHOIS lookup failed: {}", domain, e),
            }
        }
        registered
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubWhois;
    use super::*;
    use crate::types::Config;

    fn checker(whois: StubWhois) -> DomainChecker {
        DomainChecker::new(Arc::new(whois), &Config::default().tlds, ProbeDispatcher::new(5))
    }

    #[test]
    fn test_candidates() {
        let checker = checker(StubWhois::default());
        assert_eq!(
            checker.candidates("jdoe"),
            vec!["jdoe.com", "jdoe.net", "jdoe.org", "jdoe.io", "jdoe.me", "jdoe.dev"]
        );
    }

    #[tokio::test]
    async fn test_nothing_registered() {
        let checker = checker(StubWhois::default());
        assert!(checker
            .check_domains("uniqueunregisteredname12345")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_omitted_without_blocking_others() {
        let mut whois = StubWhois::with_registered(&["jdoe.com", "jdoe.dev", "jdoe.io"]);
        whois.failing.insert("jdoe.io".to_string());
        whois.failing.insert("jdoe.net".to_string());

        let domains = checker(whois).check_domains("jdoe").await;

        assert_eq!(domains.keys().collect::<Vec<_>>(), vec!["jdoe.com", "jdoe.dev"]);
        assert_eq!(domains["jdoe.com"].url, "http://jdoe.com");
    }

    #[tokio::test]
    async fn test_invalid_names_are_not_looked_up() {
        let mut whois = StubWhois::with_registered(&["john doe.com"]);
        whois.failing.insert("john doe.net".to_string());

        assert!(checker(whois).check_domains("john doe").await.is_empty());
    }
}
