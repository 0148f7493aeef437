//! Aggregation of probe outcomes into one overall status.
//!
//! One `Aggregate` belongs to exactly one Run. It starts with every probe Pending and the
//! failure latch cleared. The latch is set by the first Fail and never cleared, so the overall
//! status can only reach Ok once every probe has resolved Ok.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OutcomeError;
use crate::outcome::{Outcome, ProbeId};

/// Overall verdict of a Run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// No failure yet, some probes still pending.
    Running,
    /// Every probe resolved Ok.
    Ok,
    /// At least one probe failed.
    Degraded,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Running => write!(f, "RUNNING"),
            OverallStatus::Ok => write!(f, "OK"),
            OverallStatus::Degraded => write!(f, "DEGRADED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeEntry {
    pub id: ProbeId,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    probes: Vec<ProbeEntry>,
    failure_seen: bool,
}

impl Aggregate {
    /// Fresh aggregate: all probes Pending, latch cleared.
    pub fn new(order: &[ProbeId]) -> Self {
        let mut probes: Vec<ProbeEntry> = Vec::with_capacity(order.len());
        for id in order {
            if probes.iter().all(|p| p.id != *id) {
                probes.push(ProbeEntry {
                    id: *id,
                    outcome: Outcome::default(),
                });
            }
        }
        Self {
            probes,
            failure_seen: false,
        }
    }

    /// The full modulator health check.
    pub fn standard() -> Self {
        Self::new(&ProbeId::ORDER)
    }

    pub fn entries(&self) -> &[ProbeEntry] {
        &self.probes
    }

    pub fn outcome(&self, id: ProbeId) -> Option<&Outcome> {
        self.probes.iter().find(|p| p.id == id).map(|p| &p.outcome)
    }

    fn entry_mut(&mut self, id: ProbeId) -> Result<&mut ProbeEntry, OutcomeError> {
        self.probes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(OutcomeError::UnknownProbe(id))
    }

    /// Update the progress comment of a probe that is still pending.
    pub fn set_progress(&mut self, id: ProbeId, comment: impl Into<String>) -> Result<(), OutcomeError> {
        let entry = self.entry_mut(id)?;
        if entry.outcome.is_terminal() {
            return Err(OutcomeError::AlreadyTerminal(id));
        }
        entry.outcome = Outcome::Pending(Some(comment.into()));
        Ok(())
    }

    /// Move a probe to its outcome. Terminal outcomes are final for the Run.
    pub fn resolve(&mut self, id: ProbeId, outcome: Outcome) -> Result<(), OutcomeError> {
        let entry = self.entry_mut(id)?;
        if entry.outcome.is_terminal() {
            return Err(OutcomeError::AlreadyTerminal(id));
        }
        let failed = outcome.is_fail();
        entry.outcome = outcome;
        if failed {
            self.failure_seen = true;
        }
        Ok(())
    }

    pub fn mark_ok(&mut self, id: ProbeId, comment: Option<String>) -> Result<(), OutcomeError> {
        self.resolve(id, Outcome::Ok(comment))
    }

    pub fn mark_fail(&mut self, id: ProbeId, reason: impl Into<String>) -> Result<(), OutcomeError> {
        self.resolve(id, Outcome::Fail(reason.into()))
    }

    /// The "any failure seen" latch.
    pub fn failure_seen(&self) -> bool {
        self.failure_seen
    }

    pub fn is_complete(&self) -> bool {
        self.probes.iter().all(|p| p.outcome.is_terminal())
    }

    pub fn overall(&self) -> OverallStatus {
        if self.failure_seen {
            OverallStatus::Degraded
        } else if self.probes.iter().all(|p| p.outcome.is_ok()) {
            OverallStatus::Ok
        } else {
            OverallStatus::Running
        }
    }

    /// True iff the latch is clear and every probe resolved Ok.
    pub fn overall_ok(&self) -> bool {
        self.overall() == OverallStatus::Ok
    }

    /// (ok, failed, pending)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.probes.iter().fold((0, 0, 0), |(ok, fail, pending), p| match p.outcome {
            Outcome::Ok(_) => (ok + 1, fail, pending),
            Outcome::Fail(_) => (ok, fail + 1, pending),
            Outcome::Pending(_) => (ok, fail, pending + 1),
        })
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::standard()
    }
}
