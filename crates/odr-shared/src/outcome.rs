//! Probe identifiers and per-probe outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The probes of the modulator health check, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeId {
    RcReachable,
    Modulating,
    GpsdoQuality,
    Underruns,
    LatePackets,
    SampleRate,
    DpdEngine,
}

impl ProbeId {
    /// Fixed order in which a Run reports its probes.
    pub const ORDER: [ProbeId; 7] = [
        ProbeId::RcReachable,
        ProbeId::Modulating,
        ProbeId::GpsdoQuality,
        ProbeId::Underruns,
        ProbeId::LatePackets,
        ProbeId::SampleRate,
        ProbeId::DpdEngine,
    ];

    /// Stable identifier, used for UI correlation and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeId::RcReachable => "rc_reachable",
            ProbeId::Modulating => "modulating",
            ProbeId::GpsdoQuality => "gpsdo_quality",
            ProbeId::Underruns => "underruns",
            ProbeId::LatePackets => "late_packets",
            ProbeId::SampleRate => "sample_rate",
            ProbeId::DpdEngine => "dpd_engine",
        }
    }

    /// One-line human description.
    pub fn description(&self) -> &'static str {
        match self {
            ProbeId::RcReachable => "Remote control reachable",
            ProbeId::Modulating => "Modulator producing frames",
            ProbeId::GpsdoQuality => "GPSDO satellite lock",
            ProbeId::Underruns => "No underruns",
            ProbeId::LatePackets => "No late packets",
            ProbeId::SampleRate => "Sample rate is 8192 ksps",
            ProbeId::DpdEngine => "Predistortion engine running",
        }
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of one probe within one Run.
///
/// `Pending` may carry a progress comment. `Ok` and `Fail` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "comment", rename_all = "snake_case")]
pub enum Outcome {
    Pending(Option<String>),
    Ok(Option<String>),
    Fail(String),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Pending(_))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Outcome::Pending(c) | Outcome::Ok(c) => c.as_deref(),
            Outcome::Fail(reason) => Some(reason),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pending(_) => "PENDING",
            Outcome::Ok(_) => "OK",
            Outcome::Fail(_) => "FAIL",
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Pending(None)
    }
}
