use crate::contacts::ContactScraper;
use crate::dispatcher::ProbeDispatcher;
use crate::domains::DomainChecker;
use crate::expander::Identity;
use crate::phone::{LibPhoneNormalizer, PhoneNormalizer};
use crate::platforms::{check_platform, default_catalog, Catalog};
use crate::search::{DuckDuckGoSearch, SearchEngine};
use crate::session::{Fetcher, Session};
use crate::types::{
    Config, ContactFinding, DomainRecord, FootprintError, FootprintReport, Phase, ProbeResult,
    QuickScanReport, VariationReport,
};
use crate::whois::{WhoisClient, WhoisLookup};
use crate::utils::{dedup_preserving_order, is_http_url};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Receives progress while an analysis runs. Every hook defaults to a no-op.
pub trait AnalysisObserver: Send + Sync {
    fn on_start(&self, _identity: &Identity) {}
    fn on_variation(&self, _variation: &str) {}
    fn on_phase(&self, _variation: &str, _phase: Phase) {}
    fn on_domains(&self, _variation: &str, _domains: &BTreeMap<String, DomainRecord>) {}
    fn on_profiles(&self, _variation: &str, _profiles: &BTreeMap<String, ProbeResult>) {}
    fn on_contacts(&self, _variation: &str, _contacts: &ContactFinding) {}
    fn on_phase_error(&self, _variation: &str, _phase: Phase, _message: &str) {}
    fn on_finish(&self, _report: &FootprintReport) {}
}

pub struct NoopObserver;

impl AnalysisObserver for NoopObserver {}

/// External services the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub whois: Arc<dyn WhoisLookup>,
    pub search: Arc<dyn SearchEngine>,
    pub phone: Arc<dyn PhoneNormalizer>,
}

impl Collaborators {
    /// Network-backed collaborators built from `config`.
    pub fn from_config(config: &Config) -> Result<Self, FootprintError> {
        let session: Arc<dyn Fetcher> = Arc::new(Session::new(config)?);
        let search = DuckDuckGoSearch::new(Arc::clone(&session), &config.search);

        Ok(Self {
            fetcher: session,
            whois: Arc::new(WhoisClient::with_timeout(config.whois_timeout)),
            search: Arc::new(search),
            phone: Arc::new(LibPhoneNormalizer),
        })
    }
}

pub struct FootprintEngine {
    config: Config,
    catalog: Catalog,
    fetcher: Arc<dyn Fetcher>,
    search: Arc<dyn SearchEngine>,
    dispatcher: ProbeDispatcher,
    domain_checker: DomainChecker,
    contact_scraper: ContactScraper,
}

impl FootprintEngine {
    pub fn new(config: Config) -> Result<Self, FootprintError> {
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::with_collaborators(config, default_catalog(), collaborators))
    }

    pub fn with_collaborators(config: Config, catalog: Catalog, collaborators: Collaborators) -> Self {
        let dispatcher = ProbeDispatcher::new(config.concurrency);
        let domain_checker =
            DomainChecker::new(collaborators.whois, &config.tlds, dispatcher.clone());
        let contact_scraper = ContactScraper::new(
            Arc::clone(&collaborators.fetcher),
            collaborators.phone,
            dispatcher.clone(),
        );

        Self {
            config,
            catalog,
            fetcher: collaborators.fetcher,
            search: collaborators.search,
            dispatcher,
            domain_checker,
            contact_scraper,
        }
    }

    pub async fn analyze(&self, identity: &str) -> FootprintReport {
        self.analyze_observed(identity, &NoopObserver).await
    }

    /// Full analysis: every variation, all three phases.
    ///
    /// Variations are handled one after another; within a variation the
    /// domain and platform phases run together and contact discovery
    /// follows once both have joined.
    pub async fn analyze_observed(
        &self,
        identity: &str,
        observer: &dyn AnalysisObserver,
    ) -> FootprintReport {
        let identity = Identity::new(identity);
        let start_time = Instant::now();
        info!(
            "Analyzing {} ({} variations)",
            identity.input(),
            identity.variations().len()
        );
        observer.on_start(&identity);

        let mut variations = BTreeMap::new();
        for variation in identity.variations() {
            observer.on_variation(variation);
            let entry = self.analyze_variation(variation, observer).await;
            variations.insert(variation.clone(), entry);
        }

        let report = FootprintReport {
            identity: identity.input().to_string(),
            variations,
        };
        info!(
            "Completed analysis for {} in {:.2}s",
            report.identity,
            start_time.elapsed().as_secs_f64()
        );
        observer.on_finish(&report);
        report
    }

    async fn analyze_variation(
        &self,
        variation: &str,
        observer: &dyn AnalysisObserver,
    ) -> VariationReport {
        let mut entry = VariationReport::default();

        observer.on_phase(variation, Phase::Domains);
        observer.on_phase(variation, Phase::Platforms);
        let (domains, profiles) = tokio::join!(
            self.domain_checker.check_domains(variation),
            self.check_platforms(variation)
        );
        observer.on_domains(variation, &domains);
        observer.on_profiles(variation, &profiles);
        entry.domains = domains;
        entry.profiles = profiles;

        observer.on_phase(variation, Phase::Contacts);
        match self.discover_contacts(variation).await {
            Ok(contacts) => {
                observer.on_contacts(variation, &contacts);
                entry.contacts = contacts;
            }
            Err(e) => {
                let message = e.to_string();
                warn!("{}: skipping contact discovery: {}", variation, message);
                observer.on_phase_error(variation, Phase::Contacts, &message);
                entry.phase_errors.push(format!("{}: {}", Phase::Contacts, message));
            }
        }

        entry
    }

    /// Probe every catalog platform for `variation`.
    pub async fn check_platforms(&self, variation: &str) -> BTreeMap<String, ProbeResult> {
        let tasks = self.catalog.iter().map(|spec| {
            let spec = spec.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let variation = variation.to_string();
            let name = spec.name.clone();
            let task = async move { check_platform(&spec, &variation, fetcher.as_ref()).await };
            (name, task)
        });

        self.dispatcher.run_probes(tasks).await
    }

    pub fn contact_queries(variation: &str) -> Vec<String> {
        vec![
            format!("{} contact information", variation),
            format!("{} email address", variation),
            format!("{} contact details", variation),
            format!("contact {}", variation),
        ]
    }

    /// Search for pages about `variation` and scrape them for contacts.
    ///
    /// Individual query failures are tolerated; the phase fails only when
    /// every query failed.
    pub async fn discover_contacts(&self, variation: &str) -> Result<ContactFinding, FootprintError> {
        let queries = Self::contact_queries(variation);
        let limit = self.config.search.results_per_query;

        let mut urls = Vec::new();
        let mut failures = Vec::new();
        for query in &queries {
            match self.search.search(query, limit).await {
                Ok(found) => urls.extend(found.into_iter().filter(|u| is_http_url(u))),
                Err(e) => {
                    warn!("Search for '{}' failed: {}", query, e);
                    failures.push(e.to_string());
                }
            }
        }

        if failures.len() == queries.len() {
            return Err(FootprintError::Search(format!(
                "all {} queries failed; last error: {}",
                queries.len(),
                failures.last().map(String::as_str).unwrap_or("unknown")
            )));
        }

        let urls = dedup_preserving_order(urls);
        info!("{}: scraping {} pages for contact details", variation, urls.len());
        Ok(self.contact_scraper.scrape_contacts(&urls).await)
    }

    /// Reduced-scope scan used by the HTTP endpoint: the raw username only,
    /// registered domains and platform hits, no contact scraping.
    pub async fn quick_scan(&self, username: &str) -> QuickScanReport {
        let (domains, profiles) = tokio::join!(
            self.domain_checker.check_domains(username),
            self.check_platforms(username)
        );

        QuickScanReport {
            username: username.to_string(),
            domains,
            social_profiles: profiles.into_iter().filter(|(_, r)| r.exists).collect(),
        }
    }
}
