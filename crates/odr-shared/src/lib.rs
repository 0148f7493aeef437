//! Shared types for the ODR modulator health tooling.
//!
//! Parameter addressing, the web API envelope, probe outcomes and their aggregation.

pub mod aggregate;
pub mod dpd;
pub mod envelope;
pub mod error;
pub mod outcome;
pub mod param;
pub mod report;

pub use aggregate::{Aggregate, OverallStatus, ProbeEntry};
pub use dpd::{DpdCommand, DpdResults};
pub use error::{ClientError, HealthError, OutcomeError, ParamError};
pub use outcome::{Outcome, ProbeId};
pub use param::{ParamRef, ParamValue, RcParameter, RcParameters};
pub use report::RunReport;

/// Default base URL of the modulator web GUI.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8099";

/// Sample rate the modulator must run at, in samples per second.
pub const EXPECTED_SAMPLE_RATE: i64 = 8_192_000;
