// src/contacts.rs
use crate::dispatcher::ProbeDispatcher;
use crate::phone::PhoneNormalizer;
use crate::session::Fetcher;
use crate::types::{ContactFinding, FootprintError};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("email pattern is valid")
});

pub static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?[1-9][0-9]{7,14}").expect("phone pattern is valid"));

/// Pull emails and validated phone numbers out of raw page text.
pub fn extract_contacts(text: &str, normalizer: &dyn PhoneNormalizer) -> ContactFinding {
    let mut finding = ContactFinding::default();

    finding
        .emails
        .extend(EMAIL_PATTERN.find_iter(text).map(|m| m.as_str().to_string()));

    finding.phone_numbers.extend(
        PHONE_PATTERN
            .find_iter(text)
            .filter_map(|m| normalizer.normalize(m.as_str())),
    );

    finding
}

#[derive(Clone)]
pub struct ContactScraper {
    fetcher: Arc<dyn Fetcher>,
    normalizer: Arc<dyn PhoneNormalizer>,
    dispatcher: ProbeDispatcher,
}

impl ContactScraper {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        normalizer: Arc<dyn PhoneNormalizer>,
        dispatcher: ProbeDispatcher,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            dispatcher,
        }
    }

    /// Fetch every URL through the dispatcher and union what they contain.
    ///
    /// A URL that fails to load, or answers with anything but 200,
    /// contributes nothing.
    pub async fn scrape_contacts(&self, urls: &[String]) -> ContactFinding {
        let tasks = urls.iter().map(|url| {
            let fetcher = Arc::clone(&self.fetcher);
            let normalizer = Arc::clone(&self.normalizer);
            let target = url.clone();
            let task = async move {
                let page = fetcher.fetch(&target).await?;
                if !page.is_ok() {
                    return Ok::<_, FootprintError>(ContactFinding::default());
                }
                Ok(extract_contacts(&page.body, normalizer.as_ref()))
            };
            (url.clone(), task)
        });

        let mut finding = ContactFinding::default();
        for (url, outcome) in self.dispatcher.run(tasks).await {
            match outcome {
                Ok(found) => finding.merge(found),
                Err(e) => debug!("Skipping {}: {}", url, e),
            }
        }
        finding
    }
}
