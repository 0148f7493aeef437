//! Error types for the ODR health tooling.

use thiserror::Error;

use crate::outcome::ProbeId;

/// Failure of a single Parameter Client call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No usable response: connection refused, timeout, malformed body.
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The device answered with a non-"ok" envelope.
    #[error("{0}")]
    Device(String),
}

impl ClientError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Unreachable(_))
    }
}

/// Why a probe failed. All variants collapse into `Outcome::Fail` via `Display`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Device(String),

    /// The read succeeded but the predicate rejected the observed value.
    #[error("{reason}")]
    Threshold { observed: String, reason: String },
}

impl HealthError {
    pub fn threshold(observed: impl ToString, reason: impl Into<String>) -> Self {
        HealthError::Threshold {
            observed: observed.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            HealthError::Unreachable(_) => "unreachable",
            HealthError::Device(_) => "device_error",
            HealthError::Threshold { .. } => "threshold",
        }
    }
}

impl From<ClientError> for HealthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unreachable(msg) => HealthError::Unreachable(msg),
            ClientError::Device(reason) => HealthError::Device(reason),
        }
    }
}

/// Illegal Outcome transition inside one Run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("Probe {0} is not part of this run")]
    UnknownProbe(ProbeId),

    #[error("Probe {0} already reached a terminal outcome")]
    AlreadyTerminal(ProbeId),
}

/// Invalid parameter reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Controllable name must not be empty")]
    EmptyControllable,

    #[error("Parameter name must not be empty")]
    EmptyParam,
}
