//! Batch reconciliation driver
//!
//! Fans fetch + reconcile + store out over many identities with bounded
//! concurrency. Identities are deduped before fan-out, so no two merges for
//! the same identity ever run concurrently; everything else touches disjoint
//! keys and runs in parallel.

use crate::error::HearthError;
use crate::reconcile::{Merged, ReconcileEngine};
use crate::source::SourceRegistry;
use crate::store::ListingStore;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// How the driver reacts to a per-identity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Record the failure and keep going (default).
    SkipAndContinue,
    /// Stop dispatching after the first failure.
    StopOnFatal,
}

/// Outcome of reconciling one identity in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IdentityOutcome {
    /// Merged and stored; counts exclude the timestamp refresh.
    Applied { adopted: usize, kept: usize },
    /// Nothing adopted because every differing field was protected.
    SkippedProtected,
    /// No candidate was available or storage failed for this identity.
    Failed { reason: String },
}

/// Per-identity outcomes plus summary accessors.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub results: Vec<(String, IdentityOutcome)>,
    /// True when a stop-on-fatal run aborted before covering every identity.
    pub stopped_early: bool,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, IdentityOutcome::Applied { .. }))
            .count()
    }

    pub fn skipped_protected(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, IdentityOutcome::SkippedProtected))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, IdentityOutcome::Failed { .. }))
            .count()
    }
}

/// Drives fetch and reconciliation across identities.
pub struct BatchDriver {
    sources: SourceRegistry,
    store: Arc<dyn ListingStore>,
    engine: ReconcileEngine,
    concurrency: usize,
    policy: BatchPolicy,
}

impl BatchDriver {
    pub fn new(
        sources: SourceRegistry,
        store: Arc<dyn ListingStore>,
        engine: ReconcileEngine,
        concurrency: usize,
    ) -> Self {
        BatchDriver {
            sources,
            store,
            engine,
            concurrency: concurrency.max(1),
            policy: BatchPolicy::SkipAndContinue,
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch, reconcile, and store a single identity.
    pub async fn collect(&self, url: &str, ignore_protection: bool) -> Result<Merged, HearthError> {
        let candidate = self.sources.fetch_listing(url).await?;
        let prior = self.store.get(url)?;
        let merged = if ignore_protection {
            self.engine.reconcile_forced(url, prior.as_ref(), candidate)?
        } else {
            self.engine.reconcile(url, prior.as_ref(), candidate)?
        };
        self.store.put(&merged.listing)?;
        Ok(merged)
    }

    /// Reconcile every given identity, reporting per-identity outcomes.
    pub async fn run(&self, urls: &[String], ignore_protection: bool) -> BatchReport {
        let identities = dedupe(urls);
        let mut results = Vec::with_capacity(identities.len());
        let mut stopped_early = false;

        let mut outcomes = stream::iter(identities.into_iter().map(|url| async move {
            let outcome = match self.collect(&url, ignore_protection).await {
                Ok(merged) => outcome_of(&merged),
                Err(err) => {
                    warn!(url = %url, error = %err, "Reconciliation failed for identity");
                    IdentityOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            (url, outcome)
        }))
        .buffer_unordered(self.concurrency);

        while let Some((url, outcome)) = outcomes.next().await {
            let failed = matches!(outcome, IdentityOutcome::Failed { .. });
            results.push((url, outcome));
            if failed && self.policy == BatchPolicy::StopOnFatal {
                stopped_early = true;
                break;
            }
        }

        results.sort_by(|(a, _), (b, _)| a.cmp(b));
        let report = BatchReport {
            results,
            stopped_early,
        };
        info!(
            total = report.total(),
            applied = report.applied(),
            skipped = report.skipped_protected(),
            failed = report.failed(),
            "Batch reconcile finished"
        );
        report
    }
}

fn outcome_of(merged: &Merged) -> IdentityOutcome {
    if merged.adopted_changed == 0 && merged.kept_protected > 0 {
        IdentityOutcome::SkippedProtected
    } else {
        IdentityOutcome::Applied {
            adopted: merged.adopted_changed,
            kept: merged.kept_protected,
        }
    }
}

fn dedupe(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}
