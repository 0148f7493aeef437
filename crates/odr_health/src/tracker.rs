//! Live state of one Run.
//!
//! The tracker owns the Run's `Aggregate` and publishes every change on a watch channel, so a
//! presentation layer can observe outcomes and the overall status while probes are running.

use odr_shared::{Aggregate, Outcome, OutcomeError, ProbeId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct RunTracker {
    order: Vec<ProbeId>,
    tx: watch::Sender<Aggregate>,
}

impl RunTracker {
    /// Tracker for the full modulator health check.
    pub fn new() -> Self {
        Self::with_order(&ProbeId::ORDER)
    }

    pub fn with_order(order: &[ProbeId]) -> Self {
        let (tx, _rx) = watch::channel(Aggregate::new(order));
        Self {
            order: order.to_vec(),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Aggregate> {
        self.tx.subscribe()
    }

    /// Start a fresh Run: all outcomes Pending, failure latch cleared.
    pub fn reset(&self) {
        self.tx.send_replace(Aggregate::new(&self.order));
    }

    pub fn snapshot(&self) -> Aggregate {
        self.tx.borrow().clone()
    }

    /// Update the progress comment of a pending probe. Ignored once the probe is terminal.
    pub fn progress(&self, id: ProbeId, comment: impl Into<String>) {
        let comment = comment.into();
        debug!(probe = %id, "{}", comment);
        self.tx.send_if_modified(|agg| match agg.set_progress(id, comment) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping progress update: {}", e);
                false
            }
        });
    }

    /// Record the terminal outcome of a probe.
    pub fn resolve(&self, id: ProbeId, outcome: Outcome) -> Result<(), OutcomeError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|agg| {
            result = agg.resolve(id, outcome.clone());
            result.is_ok()
        });

        if result.is_ok() {
            match &outcome {
                Outcome::Fail(reason) => warn!(probe = %id, "FAIL: {}", reason),
                other => info!(probe = %id, "{}{}", other.label(), other.comment().map(|c| format!(": {}", c)).unwrap_or_default()),
            }
        }
        result
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
