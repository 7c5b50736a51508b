//! Concurrent per-component lag computation
//!
//! A producer feeds components into a bounded job queue drained by a fixed
//! pool of workers. Each worker fetches the component's release history and
//! computes both lag metrics. Results flow back over a second channel and
//! are collected keyed by component reference, so completion order does not
//! matter. A failing component is recorded and left out of the result; it
//! never aborts the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{DEFAULT_MAX_WORKERS, FETCH_TIMEOUT_MS};
use crate::lag::report::TechnicalLag;
use crate::sbom::types::{Component, Manifest};
use crate::version::distance::{release_distance, time_distance, to_days};
use crate::version::error::{DistanceError, RegistryError};
use crate::version::registry::VersionRegistry;

/// Batch-level failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LagError {
    #[error("no components found in manifest")]
    NoComponents,
}

/// Why a single component has no lag
#[derive(Debug, Error)]
pub enum ComponentLagError {
    #[error("component {0} has no package URL")]
    MissingPurl(String),

    #[error("component {0} has no version")]
    MissingVersion(String),

    #[error("failed to get versions for {purl}: {source}")]
    Registry {
        purl: String,
        #[source]
        source: RegistryError,
    },

    #[error("fetching versions for {purl} timed out after {timeout_ms} ms")]
    Timeout { purl: String, timeout_ms: u64 },

    #[error("no versions found for component {0}")]
    NoVersions(String),

    #[error("failed to calculate {metric} for {name}: {source}")]
    Distance {
        name: String,
        metric: &'static str,
        #[source]
        source: DistanceError,
    },

    #[error("cancelled")]
    Cancelled,
}

/// A component left out of the result
#[derive(Debug)]
pub struct ComponentFailure {
    pub bom_ref: String,
    pub name: String,
    pub error: ComponentLagError,
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct LagCalculation {
    /// Lag of every component that completed, keyed by component reference
    pub lags: HashMap<String, TechnicalLag>,
    pub failures: Vec<ComponentFailure>,
    /// Whether the batch was cut short by cancellation
    pub cancelled: bool,
}

struct ComponentResult {
    component: Component,
    outcome: Result<TechnicalLag, ComponentLagError>,
}

pub struct LagCalculator {
    registry: Arc<dyn VersionRegistry>,
    max_workers: usize,
    fetch_timeout: Duration,
}

impl LagCalculator {
    pub fn new(registry: Arc<dyn VersionRegistry>) -> Self {
        Self {
            registry,
            max_workers: DEFAULT_MAX_WORKERS,
            fetch_timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
        }
    }

    /// Sets the worker pool size. Zero selects the default.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = if max_workers == 0 {
            DEFAULT_MAX_WORKERS
        } else {
            max_workers
        };
        self
    }

    /// Sets the per-request registry timeout.
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Computes the lag of every component of `manifest`.
    ///
    /// Fails only when the manifest has no components section. Cancelling
    /// `cancel` stops dispatching new components and abandons in-flight
    /// registry requests; whatever completed is returned.
    pub async fn calculate(
        &self,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> Result<LagCalculation, LagError> {
        let components = manifest.components.as_ref().ok_or(LagError::NoComponents)?;
        if components.is_empty() {
            return Ok(LagCalculation::default());
        }

        let workers = self.max_workers.min(components.len());
        info!(
            "Starting technical lag calculation: {} components, {} workers",
            components.len(),
            workers
        );

        let (job_tx, job_rx) = mpsc::channel::<Component>(workers);
        let (result_tx, mut result_rx) = mpsc::channel::<ComponentResult>(components.len());
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            let worker = Worker {
                registry: Arc::clone(&self.registry),
                fetch_timeout: self.fetch_timeout,
                jobs: Arc::clone(&job_rx),
                results: result_tx.clone(),
                cancel: cancel.clone(),
            };
            tasks.spawn(
                worker
                    .run()
                    .instrument(info_span!("lag_worker", worker = id))
                    .with_current_subscriber(),
            );
        }
        // Results close once every worker has dropped its sender.
        drop(result_tx);

        let pending = components.clone();
        let producer_cancel = cancel.clone();
        tasks.spawn(
            async move {
                for component in pending {
                    tokio::select! {
                        biased;
                        _ = producer_cancel.cancelled() => {
                            debug!("Cancelled, stopping job dispatch");
                            break;
                        }
                        sent = job_tx.send(component) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            .with_current_subscriber(),
        );

        let mut calculation = LagCalculation::default();
        while let Some(result) = result_rx.recv().await {
            match result.outcome {
                Ok(lag) => {
                    calculation.lags.insert(result.component.bom_ref, lag);
                }
                Err(e) => {
                    warn!(
                        "Failed to calculate lag for component {} ({}): {}",
                        result.component.name, result.component.purl, e
                    );
                    calculation.failures.push(ComponentFailure {
                        bom_ref: result.component.bom_ref,
                        name: result.component.name,
                        error: e,
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Lag worker task failed: {}", e);
            }
        }

        calculation.cancelled = cancel.is_cancelled();
        if !calculation.failures.is_empty() {
            warn!(
                "Some components failed processing: {} of {}",
                calculation.failures.len(),
                components.len()
            );
        }
        info!(
            "Technical lag calculation completed: processed {}, failed {}, total {}{}",
            calculation.lags.len(),
            calculation.failures.len(),
            components.len(),
            if calculation.cancelled { " (cancelled)" } else { "" }
        );

        Ok(calculation)
    }
}

/// Computes lags with the default pool size and no external cancellation.
pub async fn calculate(
    registry: Arc<dyn VersionRegistry>,
    manifest: &Manifest,
) -> Result<LagCalculation, LagError> {
    LagCalculator::new(registry)
        .calculate(manifest, &CancellationToken::new())
        .await
}

struct Worker {
    registry: Arc<dyn VersionRegistry>,
    fetch_timeout: Duration,
    jobs: Arc<Mutex<mpsc::Receiver<Component>>>,
    results: mpsc::Sender<ComponentResult>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            let job = {
                let mut jobs = self.jobs.lock().await;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    job = jobs.recv() => job,
                }
            };
            let Some(component) = job else {
                break;
            };

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(ComponentLagError::Cancelled),
                outcome = self.component_lag(&component) => outcome,
            };

            if self
                .results
                .send(ComponentResult { component, outcome })
                .await
                .is_err()
            {
                break;
            }
        }
    }

    /// Lag of a single component
    ///
    /// Handles:
    /// - Rejecting components without purl or version
    /// - Fetching the release history within the per-request timeout
    /// - Computing time lag (libdays) and release lag
    async fn component_lag(&self, component: &Component) -> Result<TechnicalLag, ComponentLagError> {
        if component.purl.is_empty() {
            return Err(ComponentLagError::MissingPurl(component.name.clone()));
        }
        if component.version.is_empty() {
            return Err(ComponentLagError::MissingVersion(component.name.clone()));
        }

        let records = tokio::time::timeout(
            self.fetch_timeout,
            self.registry.fetch_versions(&component.purl),
        )
        .await
        .map_err(|_| ComponentLagError::Timeout {
            purl: component.purl.clone(),
            timeout_ms: self.fetch_timeout.as_millis() as u64,
        })?
        .map_err(|source| ComponentLagError::Registry {
            purl: component.purl.clone(),
            source,
        })?;

        if records.is_empty() {
            return Err(ComponentLagError::NoVersions(component.name.clone()));
        }

        let distance_error = |metric: &'static str| {
            move |source: DistanceError| ComponentLagError::Distance {
                name: component.name.clone(),
                metric,
                source,
            }
        };

        let elapsed =
            time_distance(&component.version, &records).map_err(distance_error("libyear"))?;

        let candidates: Vec<String> = records.into_iter().map(|record| record.version).collect();
        let version_distance = release_distance(&component.version, &candidates)
            .map_err(distance_error("version distance"))?;

        debug!(
            "Lag for {}@{}: {:.2} libdays, {} missed releases",
            component.name,
            component.version,
            to_days(elapsed),
            version_distance.missed_releases
        );

        Ok(TechnicalLag::new(to_days(elapsed), version_distance))
    }
}
