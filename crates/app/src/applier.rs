//! Batch Applier
//!
//! Sends the pending changes queue to the remote services, one batch per
//! resource, and clears the queue only when every change was applied.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use battant::{
    changes::{
        BatchReport, ChangesQueue, QueueError, Resource, ResourceBatch,
        batch::{prepare_batches, reduce_results},
    },
    storage::Storage,
};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::resources::ResourceService;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("changes are already being applied")]
    AlreadyApplying,

    #[error("failed to clear applied changes")]
    Queue(#[from] QueueError),
}

/// Applies the pending changes queue.
pub struct BatchApplier {
    services: FxHashMap<Resource, Arc<dyn ResourceService>>,
    applying: AtomicBool,
}

impl BatchApplier {
    #[must_use]
    pub fn new(services: FxHashMap<Resource, Arc<dyn ResourceService>>) -> Self {
        Self {
            services,
            applying: AtomicBool::new(false),
        }
    }

    /// Whether an [`apply`](Self::apply) call is in flight.
    pub fn is_applying(&self) -> bool {
        self.applying.load(Ordering::Acquire)
    }

    /// Submit every pending change and report the outcome of each.
    ///
    /// An empty queue yields an empty report and sends nothing. When every
    /// change succeeds the queue is cleared and closed; otherwise it is left
    /// untouched so the admin can retry. A transport or server failure stops
    /// the remaining batches and is reported as a single `global` outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::AlreadyApplying`] when another apply is running,
    /// or [`ApplyError::Queue`] when the applied queue cannot be cleared.
    pub async fn apply<S: Storage>(
        &self,
        queue: &mut ChangesQueue<S>,
    ) -> Result<BatchReport, ApplyError> {
        let _guard = ApplyingGuard::acquire(&self.applying)?;

        let batches = prepare_batches(queue.entries());

        if batches.is_empty() {
            return Ok(BatchReport::new());
        }

        info!(
            changes = queue.len(),
            batches = batches.len(),
            "applying pending changes"
        );

        let report = self.dispatch(&batches).await;

        for failure in report.failures() {
            warn!(id = %failure.id, msg = %failure.msg, "change not applied");
        }

        if report.is_success() {
            queue.clear()?;
            queue.close();
        }

        info!(
            applied = report.outcomes().len() - report.failures().count(),
            failed = report.failures().count(),
            "pending changes processed"
        );

        Ok(report)
    }

    async fn dispatch(&self, batches: &[ResourceBatch]) -> BatchReport {
        let mut report = BatchReport::new();

        for batch in batches {
            let Some(service) = self.services.get(&batch.resource) else {
                error!(resource = %batch.resource, "no service for resource");

                return BatchReport::global_failure(format!(
                    "no service configured for {}",
                    batch.resource.plural()
                ));
            };

            match service.apply_batch(batch.changes.clone()).await {
                Ok(response) => report.extend(reduce_results(batch, &response.results)),
                Err(err) => {
                    error!(resource = %batch.resource, error = %err, "batch submission failed");

                    return BatchReport::global_failure(err.to_string());
                }
            }
        }

        report
    }
}

struct ApplyingGuard<'a>(&'a AtomicBool);

impl<'a> ApplyingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ApplyError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ApplyError::AlreadyApplying);
        }

        Ok(Self(flag))
    }
}

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
