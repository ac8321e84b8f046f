// src/dispatcher.rs
use crate::types::{FootprintError, ProbeResult};
use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded fan-out: at most `max_concurrency` task bodies in flight, and a
/// failing or panicking task only affects its own entry.
#[derive(Clone)]
pub struct ProbeDispatcher {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl ProbeDispatcher {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every task and pair each outcome with its key.
    ///
    /// Completion order is unspecified. Tasks must not dispatch further work
    /// through the same dispatcher while holding a permit.
    pub async fn run<K, T, Fut, I>(&self, tasks: I) -> Vec<(K, Result<T, FootprintError>)>
    where
        I: IntoIterator<Item = (K, Fut)>,
        K: Send + 'static,
        T: Send + 'static,
        Fut: Future<Output = Result<T, FootprintError>> + Send + 'static,
    {
        let mut pending = FuturesUnordered::new();

        for (key, task) in tasks {
            let semaphore = Arc::clone(&self.semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FootprintError::Probe(format!("dispatcher closed: {}", e)))?;
                task.await
            });

            pending.push(async move {
                let outcome = match handle.await {
                    Ok(result) => result,
                    Err(join_error) => Err(FootprintError::Probe(format!(
                        "probe task aborted: {}",
                        join_error
                    ))),
                };
                (key, outcome)
            });
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(entry) = pending.next().await {
            results.push(entry);
        }
        results
    }

    /// Run probe tasks, downgrading every error to a negative `ProbeResult`.
    pub async fn run_probes<K, Fut, I>(&self, tasks: I) -> BTreeMap<K, ProbeResult>
    where
        I: IntoIterator<Item = (K, Fut)>,
        K: Ord + Display + Send + 'static,
        Fut: Future<Output = Result<ProbeResult, FootprintError>> + Send + 'static,
    {
        self.run(tasks)
            .await
            .into_iter()
            .map(|(key, outcome)| {
                let result = outcome.unwrap_or_else(|e| {
                    debug!("{}: probe failed: {}", key, e);
                    ProbeResult::failed(&e)
                });
                (key, result)
            })
            .collect()
    }
}

impl Default for ProbeDispatcher {
    fn default() -> Self {
        Self::new(5)
    }
}
